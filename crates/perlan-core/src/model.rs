//! Core data model types for perlan.
//!
//! Field names serialize in camelCase so documents written by earlier
//! clients of the remote store stay readable.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of answer options on every question.
pub const OPTION_COUNT: usize = 3;

/// Question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "General")]
    General,
    #[serde(rename = "Northern Lights")]
    NorthernLights,
    #[serde(rename = "Volcanoes & Geology")]
    Volcanoes,
    #[serde(rename = "Glaciers & Ice Caves")]
    Glaciers,
    #[serde(rename = "Wildlife & Birds")]
    Wildlife,
    #[serde(rename = "Icelandic History")]
    History,
    #[serde(rename = "Water & Nature")]
    Water,
    #[serde(rename = "Perlan")]
    Perlan,
    #[serde(rename = "Christmas")]
    Christmas,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::General,
        Category::NorthernLights,
        Category::Volcanoes,
        Category::Glaciers,
        Category::Wildlife,
        Category::History,
        Category::Water,
        Category::Perlan,
        Category::Christmas,
    ];

    /// Display label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::NorthernLights => "Northern Lights",
            Category::Volcanoes => "Volcanoes & Geology",
            Category::Glaciers => "Glaciers & Ice Caves",
            Category::Wildlife => "Wildlife & Birds",
            Category::History => "Icelandic History",
            Category::Water => "Water & Nature",
            Category::Perlan => "Perlan",
            Category::Christmas => "Christmas",
        }
    }

    /// Short command-line friendly name.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::NorthernLights => "northern-lights",
            Category::Volcanoes => "volcanoes",
            Category::Glaciers => "glaciers",
            Category::Wildlife => "wildlife",
            Category::History => "history",
            Category::Water => "water",
            Category::Perlan => "perlan",
            Category::Christmas => "christmas",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == wanted || c.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A trivia question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub text: String,
    pub options: [String; OPTION_COUNT],
    /// Index of the correct option in `options`.
    pub correct_index: usize,
    /// The "did you know" fact revealed after answering.
    pub fact: String,
}

/// Settings chosen on the home screen; fixed for the whole round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub username: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub is_challenge_mode: bool,
}

/// One answered (or timed-out) question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAnswer {
    pub question_id: String,
    /// Original, pre-shuffle option index; `None` when the timer ran out.
    #[serde(with = "timeout_index")]
    pub selected_option_index: Option<usize>,
    pub is_correct: bool,
    /// Ticks spent on the question before answering.
    pub time_taken: u32,
}

/// Serializes a missing selection as `-1`.
mod timeout_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(index) => s.serialize_i64(*index as i64),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(d)?;
        Ok(usize::try_from(raw).ok())
    }
}

/// The outcome of a completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub config: GameConfig,
    /// Always equal to the number of correct answers.
    pub score: u32,
    pub total_questions: u32,
    pub answers: Vec<PlayerAnswer>,
    pub streak_max: u32,
}

/// Running totals for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub username: String,
    pub total_games: u32,
    pub total_score: u32,
    pub total_questions_answered: u32,
    pub total_correct: u32,
    pub best_category: Option<Category>,
    pub streak_record: u32,
    pub last_played: Option<DateTime<Utc>>,
}

impl PlayerStats {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            total_games: 0,
            total_score: 0,
            total_questions_answered: 0,
            total_correct: 0,
            best_category: None,
            streak_record: 0,
            last_played: None,
        }
    }

    /// Fraction of answered questions that were correct.
    pub fn accuracy(&self) -> f64 {
        if self.total_questions_answered == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_questions_answered as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Learning content
// ---------------------------------------------------------------------------

/// A two-sided study card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// A single knowledge-check question inside a course module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningQuiz {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// What a learning unit contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UnitBody {
    Text { content: String },
    Flashcards { flashcards: Vec<Flashcard> },
    Quiz { quiz: LearningQuiz },
}

impl UnitBody {
    pub fn kind(&self) -> &'static str {
        match self {
            UnitBody::Text { .. } => "text",
            UnitBody::Flashcards { .. } => "flashcards",
            UnitBody::Quiz { .. } => "quiz",
        }
    }
}

/// One step of a course module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningUnit {
    pub id: String,
    pub title: String,
    /// Human-readable estimate such as "2 min".
    pub duration: String,
    #[serde(flatten)]
    pub body: UnitBody,
}

/// An ordered, gated sequence of learning units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: String,
    pub category: Category,
    pub description: String,
    #[serde(default)]
    pub units: Vec<LearningUnit>,
}

/// Which learning units a player has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub username: String,
    #[serde(default)]
    pub completed_unit_ids: Vec<String>,
}

impl UserProgress {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            completed_unit_ids: Vec::new(),
        }
    }

    pub fn is_complete(&self, unit_id: &str) -> bool {
        self.completed_unit_ids.iter().any(|id| id == unit_id)
    }
}
