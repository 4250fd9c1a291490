//! Synchronized content entities.
//!
//! Questions and course modules are the two entity kinds mirrored between
//! the local cache and the remote store. Each kind has one versioned local
//! storage key and one remote collection.

use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::QuizError;
use crate::model::{CourseModule, Question, UnitBody, OPTION_COUNT};
use crate::seed::SeedData;

/// The kinds of content kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Questions,
    CourseModules,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Questions, EntityKind::CourseModules];

    /// Local storage key. Bump the version suffix whenever the stored shape
    /// changes so old blobs are never decoded into the new shape.
    pub fn storage_key(&self) -> &'static str {
        match self {
            EntityKind::Questions => "perlan_questions_v2",
            EntityKind::CourseModules => "perlan_learning_modules_v1",
        }
    }

    /// Remote collection name.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Questions => "questions",
            EntityKind::CourseModules => "learning_modules",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Questions => write!(f, "questions"),
            EntityKind::CourseModules => write!(f, "course modules"),
        }
    }
}

/// A content entity addressable by id.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    /// Singular name used in error messages.
    const NAME: &'static str;

    fn id(&self) -> &str;

    /// Shape checks beyond what deserialization enforces.
    fn validate(&self) -> Result<(), String>;

    /// This kind's slice of the bundled seed dataset.
    fn bundled(seed: &SeedData) -> &[Self];

    /// Validate, mapping the failure to `MalformedEntity`.
    fn check(&self) -> Result<(), QuizError> {
        self.validate()
            .map_err(|reason| QuizError::malformed(Self::NAME, self.id(), reason))
    }
}

impl Entity for Question {
    const KIND: EntityKind = EntityKind::Questions;
    const NAME: &'static str = "question";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is empty".into());
        }
        if self.text.trim().is_empty() {
            return Err("text is empty".into());
        }
        if self.correct_index >= OPTION_COUNT {
            return Err(format!(
                "correctIndex {} is outside 0..{OPTION_COUNT}",
                self.correct_index
            ));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err("options must not be empty".into());
        }
        Ok(())
    }

    fn bundled(seed: &SeedData) -> &[Self] {
        &seed.questions
    }
}

impl Entity for CourseModule {
    const KIND: EntityKind = EntityKind::CourseModules;
    const NAME: &'static str = "course module";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is empty".into());
        }
        let mut seen = HashSet::new();
        for unit in &self.units {
            if !seen.insert(unit.id.as_str()) {
                return Err(format!("duplicate unit id {}", unit.id));
            }
            match &unit.body {
                UnitBody::Text { .. } => {}
                UnitBody::Flashcards { flashcards } if flashcards.is_empty() => {
                    return Err(format!("unit {} has no flashcards", unit.id));
                }
                UnitBody::Flashcards { .. } => {}
                UnitBody::Quiz { quiz } => {
                    if quiz.options.len() < 2 {
                        return Err(format!("quiz unit {} needs at least 2 options", unit.id));
                    }
                    if quiz.correct_index >= quiz.options.len() {
                        return Err(format!(
                            "quiz unit {} has correctIndex {} for {} options",
                            unit.id,
                            quiz.correct_index,
                            quiz.options.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn bundled(seed: &SeedData) -> &[Self] {
        &seed.modules
    }
}

/// Decode raw documents, skipping (and logging) any that are malformed.
///
/// A single bad record never blocks the rest of the content load.
pub fn decode_entities<E: Entity>(values: Vec<serde_json::Value>) -> (Vec<E>, Vec<QuizError>) {
    let mut entities = Vec::with_capacity(values.len());
    let mut skipped = Vec::new();

    for value in values {
        let id = value
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>")
            .to_string();
        let decoded = serde_json::from_value::<E>(value)
            .map_err(|e| QuizError::malformed(E::NAME, id, e.to_string()))
            .and_then(|entity| entity.check().map(|_| entity));
        match decoded {
            Ok(entity) => entities.push(entity),
            Err(e) => {
                tracing::warn!("skipping {e}");
                skipped.push(e);
            }
        }
    }

    (entities, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Difficulty, LearningQuiz, LearningUnit};
    use serde_json::json;

    fn question(id: &str) -> Question {
        Question {
            id: id.into(),
            category: Category::Perlan,
            difficulty: Difficulty::Easy,
            text: "What is Perlan built on?".into(),
            options: ["Hot water tanks".into(), "A glacier".into(), "A ship".into()],
            correct_index: 0,
            fact: "The dome sits on six water tanks.".into(),
        }
    }

    #[test]
    fn question_validation() {
        assert!(question("q1").validate().is_ok());

        let mut bad = question("q2");
        bad.correct_index = 3;
        assert!(bad.validate().unwrap_err().contains("correctIndex"));

        let mut blank = question("q3");
        blank.options[1] = "  ".into();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn module_rejects_duplicate_units_and_bad_quiz() {
        let unit = |id: &str, body: UnitBody| LearningUnit {
            id: id.into(),
            title: "t".into(),
            duration: "1 min".into(),
            body,
        };
        let mut module = CourseModule {
            id: "mod".into(),
            category: Category::Glaciers,
            description: "d".into(),
            units: vec![
                unit("u1", UnitBody::Text { content: "c".into() }),
                unit("u1", UnitBody::Text { content: "c".into() }),
            ],
        };
        assert!(module.validate().unwrap_err().contains("duplicate"));

        module.units[1] = unit(
            "u2",
            UnitBody::Quiz {
                quiz: LearningQuiz {
                    question: "?".into(),
                    options: vec!["a".into(), "b".into()],
                    correct_index: 2,
                },
            },
        );
        assert!(module.validate().is_err());
    }

    #[test]
    fn decode_skips_malformed_records() {
        let good = serde_json::to_value(question("ok")).unwrap();
        let wrong_shape = json!({"id": "broken", "text": "missing everything"});
        let mut out_of_range = serde_json::to_value(question("range")).unwrap();
        out_of_range["correctIndex"] = json!(7);

        let (questions, skipped) =
            decode_entities::<Question>(vec![good, wrong_shape, out_of_range]);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "ok");
        assert_eq!(skipped.len(), 2);
        assert!(skipped
            .iter()
            .all(|e| matches!(e, QuizError::MalformedEntity { .. })));
    }

    #[test]
    fn storage_keys_are_versioned() {
        for kind in EntityKind::ALL {
            assert!(kind.storage_key().contains("_v"));
        }
    }
}
