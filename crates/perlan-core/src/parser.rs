//! TOML content pack parser.
//!
//! Content packs let admins author questions and course modules as files and
//! import them in bulk. Malformed entries are skipped with a warning so one
//! bad entry never blocks the rest of the pack.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::Entity;
use crate::model::{
    Category, CourseModule, Difficulty, Flashcard, LearningQuiz, LearningUnit, Question, UnitBody,
};

/// Questions and modules loaded from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPack {
    pub name: String,
    pub questions: Vec<Question>,
    pub modules: Vec<CourseModule>,
    /// One message per entry that was left out.
    pub skipped: Vec<String>,
}

/// Intermediate TOML structure for a pack file.
#[derive(Debug, Deserialize)]
struct TomlPackFile {
    #[serde(default)]
    pack: Option<TomlPackHeader>,
    #[serde(default)]
    questions: Vec<toml::Value>,
    #[serde(default)]
    modules: Vec<toml::Value>,
}

#[derive(Debug, Deserialize)]
struct TomlPackHeader {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    #[serde(default)]
    id: Option<String>,
    category: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    text: String,
    options: Vec<String>,
    correct_index: usize,
    #[serde(default)]
    fact: String,
}

fn default_difficulty() -> String {
    "Medium".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlModule {
    id: String,
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    units: Vec<TomlUnit>,
}

#[derive(Debug, Deserialize)]
struct TomlUnit {
    id: String,
    title: String,
    #[serde(default)]
    duration: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    flashcards: Vec<Flashcard>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_index: Option<usize>,
}

impl TomlQuestion {
    fn into_question(self) -> Result<Question, String> {
        let category: Category = self.category.parse()?;
        let difficulty: Difficulty = self.difficulty.parse()?;
        let count = self.options.len();
        let options = <[String; 3]>::try_from(self.options)
            .map_err(|_| format!("expected 3 options, found {count}"))?;
        Ok(Question {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            category,
            difficulty,
            text: self.text,
            options,
            correct_index: self.correct_index,
            fact: self.fact,
        })
    }
}

impl TomlUnit {
    fn into_unit(self) -> Result<LearningUnit, String> {
        let body = match self.kind.as_str() {
            "text" => UnitBody::Text {
                content: self
                    .content
                    .ok_or_else(|| format!("text unit {} has no content", self.id))?,
            },
            "flashcards" => UnitBody::Flashcards {
                flashcards: self.flashcards,
            },
            "quiz" => UnitBody::Quiz {
                quiz: LearningQuiz {
                    question: self
                        .question
                        .ok_or_else(|| format!("quiz unit {} has no question", self.id))?,
                    options: self.options,
                    correct_index: self
                        .correct_index
                        .ok_or_else(|| format!("quiz unit {} has no correct_index", self.id))?,
                },
            },
            other => return Err(format!("unit {} has unknown type '{other}'", self.id)),
        };
        Ok(LearningUnit {
            id: self.id,
            title: self.title,
            duration: self.duration,
            body,
        })
    }
}

impl TomlModule {
    fn into_module(self) -> Result<CourseModule, String> {
        let units = self
            .units
            .into_iter()
            .map(TomlUnit::into_unit)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CourseModule {
            id: self.id,
            category: self.category.parse()?,
            description: self.description,
            units,
        })
    }
}

/// Convert one raw entry, validating the result.
fn convert<T, E>(
    value: toml::Value,
    index: usize,
    build: impl FnOnce(T) -> Result<E, String>,
) -> Result<E, String>
where
    T: serde::de::DeserializeOwned,
    E: Entity,
{
    let raw: T = value
        .try_into()
        .map_err(|e| format!("{} {index}: {e}", E::NAME))?;
    let entity = build(raw).map_err(|e| format!("{} {index}: {e}", E::NAME))?;
    entity
        .validate()
        .map_err(|e| format!("{} {}: {e}", E::NAME, entity.id()))?;
    Ok(entity)
}

/// Parse a single TOML file into a `ContentPack`.
pub fn parse_content_pack(path: &Path) -> Result<ContentPack> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read content pack: {}", path.display()))?;

    parse_content_pack_str(&content, path)
}

/// Parse a TOML string into a `ContentPack`.
///
/// Without a `[pack]` header the pack is named after the file stem.
pub fn parse_content_pack_str(content: &str, source_path: &Path) -> Result<ContentPack> {
    let parsed: TomlPackFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let name = match parsed.pack {
        Some(header) => header.name,
        None => source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let mut pack = ContentPack {
        name,
        ..ContentPack::default()
    };

    for (i, value) in parsed.questions.into_iter().enumerate() {
        match convert(value, i, TomlQuestion::into_question) {
            Ok(q) => pack.questions.push(q),
            Err(e) => pack.skipped.push(e),
        }
    }
    for (i, value) in parsed.modules.into_iter().enumerate() {
        match convert(value, i, TomlModule::into_module) {
            Ok(m) => pack.modules.push(m),
            Err(e) => pack.skipped.push(e),
        }
    }

    for reason in &pack.skipped {
        tracing::warn!("{}: skipping {reason}", source_path.display());
    }
    Ok(pack)
}

/// Recursively load all `.toml` content packs from a directory.
pub fn load_content_directory(dir: &Path) -> Result<Vec<ContentPack>> {
    let mut packs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            packs.extend(load_content_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_content_pack(&path) {
                Ok(pack) => packs.push(pack),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(packs)
}

/// A warning from content pack validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The entity id (if applicable).
    pub entity_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn entity(id: &str, message: impl Into<String>) -> Self {
        Self {
            entity_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a content pack for authoring mistakes that still parse.
pub fn validate_content_pack(pack: &ContentPack) -> Vec<ValidationWarning> {
    let mut warnings: Vec<ValidationWarning> = pack
        .skipped
        .iter()
        .map(|reason| ValidationWarning {
            entity_id: None,
            message: format!("skipped {reason}"),
        })
        .collect();

    let mut seen = HashSet::new();
    for q in &pack.questions {
        if !seen.insert(q.id.as_str()) {
            warnings.push(ValidationWarning::entity(&q.id, format!("duplicate question ID: {}", q.id)));
        }
        if q.fact.trim().is_empty() {
            warnings.push(ValidationWarning::entity(&q.id, "fact is empty"));
        }
        let distinct: HashSet<String> = q.options.iter().map(|o| o.trim().to_lowercase()).collect();
        if distinct.len() < q.options.len() {
            warnings.push(ValidationWarning::entity(&q.id, "options are not distinct"));
        }
    }

    let mut seen = HashSet::new();
    for m in &pack.modules {
        if !seen.insert(m.id.as_str()) {
            warnings.push(ValidationWarning::entity(&m.id, format!("duplicate module ID: {}", m.id)));
        }
        if m.units.is_empty() {
            warnings.push(ValidationWarning::entity(&m.id, "module has no units"));
        }
        if m.description.trim().is_empty() {
            warnings.push(ValidationWarning::entity(&m.id, "description is empty"));
        }
    }

    warnings
}
