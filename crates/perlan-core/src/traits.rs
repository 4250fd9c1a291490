//! Collaborator traits for content, remote storage, results and question
//! generation.
//!
//! The async traits are implemented by the `perlan-remote` crate; the
//! content repository is implemented by [`crate::cache::ContentCache`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::QuizError;
use crate::model::{Category, CourseModule, Difficulty, GameResult, PlayerStats, Question, UserProgress};

// ---------------------------------------------------------------------------
// Content repository
// ---------------------------------------------------------------------------

/// Read-only snapshot access to playable content.
pub trait ContentRepository: Send + Sync {
    fn list_questions(&self) -> Result<Vec<Question>, QuizError>;

    fn list_course_modules(&self) -> Result<Vec<CourseModule>, QuizError>;

    /// Learning progress for one player; empty if they never started.
    fn player_progress(&self, username: &str) -> Result<UserProgress, QuizError>;
}

// ---------------------------------------------------------------------------
// Remote store
// ---------------------------------------------------------------------------

/// One stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: serde_json::Value,
}

/// The authoritative document store content is mirrored from.
///
/// Collections are flat maps from document id to a JSON value. Failures are
/// reported as [`crate::error::RemoteError`] wrapped in `anyhow::Error`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// Every document in a collection. An unknown collection is empty.
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Document>>;

    /// Create or replace a document.
    async fn put(&self, collection: &str, id: &str, data: &serde_json::Value) -> anyhow::Result<()>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Results sink
// ---------------------------------------------------------------------------

/// Where completed rounds and player records are persisted.
#[async_trait]
pub trait ResultsSink: Send + Sync {
    async fn persist_result(&self, result: &GameResult) -> anyhow::Result<()>;

    async fn persist_stats(&self, stats: &PlayerStats) -> anyhow::Result<()>;

    async fn persist_progress(&self, progress: &UserProgress) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Question generator
// ---------------------------------------------------------------------------

/// Backends that draft new questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Human-readable generator name (e.g. "openai").
    fn name(&self) -> &str;

    /// Draft questions. Returned questions have fresh ids and have passed
    /// validation.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>>;
}

/// Request to draft questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub category: Category,
    pub difficulty: Difficulty,
    /// Number of questions to ask for.
    pub count: usize,
    /// Model identifier; the generator's default when `None`.
    #[serde(default)]
    pub model: Option<String>,
}

impl GenerateRequest {
    pub fn new(category: Category, difficulty: Difficulty, count: usize) -> Self {
        Self {
            category,
            difficulty,
            count,
            model: None,
        }
    }
}

/// System prompt for question generation.
pub const GENERATION_SYSTEM_PROMPT: &str = "You write trivia questions for the Perlan museum in Reykjavik, Iceland. Respond ONLY with a JSON array. Each element has the fields \"text\", \"options\" (exactly 3 strings), \"correctIndex\" (0-2) and \"fact\".";

/// Build the user prompt for a generation request.
pub fn build_generation_prompt(request: &GenerateRequest) -> String {
    format!(
        "Generate {count} ultra-short, fast-paced trivia questions about \"{category}\" for the Perlan museum in Iceland.\n\
         Difficulty: {difficulty}.\n\
         \n\
         Rules for 15-second gameplay:\n\
         1. QUESTION: at most 12 words. Direct, instant to read. Avoid \"Which of the following\".\n\
         2. OPTIONS: exactly 3, each 1-4 words. No sentences.\n\
         3. FACT: at most 20 words. Fun and surprising.\n\
         4. STYLE: pub quiz. Casual, not academic.\n\
         \n\
         Example element:\n\
         {{\"text\": \"What color is the aurora usually?\", \"options\": [\"Green\", \"Red\", \"Blue\"], \"correctIndex\": 0, \"fact\": \"Green comes from oxygen atoms about 100km up!\"}}",
        count = request.count,
        category = request.category.label(),
        difficulty = request.difficulty,
    )
}

/// A question as returned by a generator, before it gets an id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftQuestion {
    text: String,
    options: Vec<String>,
    correct_index: usize,
    #[serde(default)]
    fact: String,
}

/// Parse a generator response into validated questions.
///
/// Drafts with the wrong number of options or an out-of-range answer are
/// skipped with a warning. Fails only if the response holds no JSON array.
pub fn parse_generated_questions(
    response: &str,
    request: &GenerateRequest,
) -> Result<Vec<Question>, QuizError> {
    let json = extract_json_from_markdown(response);
    let values: Vec<serde_json::Value> = serde_json::from_str(json.trim())?;

    let mut questions = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        let draft: DraftQuestion = match serde_json::from_value(value) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("skipping generated question {i}: {e}");
                continue;
            }
        };
        let Ok(options) = <[String; 3]>::try_from(draft.options) else {
            tracing::warn!("skipping generated question {i}: expected 3 options");
            continue;
        };
        let question = Question {
            id: Uuid::new_v4().to_string(),
            category: request.category,
            difficulty: request.difficulty,
            text: draft.text,
            options,
            correct_index: draft.correct_index,
            fact: draft.fact,
        };
        match question.check() {
            Ok(()) => questions.push(question),
            Err(e) => tracing::warn!("skipping generated {e}"),
        }
    }
    Ok(questions)
}

// ---------------------------------------------------------------------------
// Markdown JSON extraction
// ---------------------------------------------------------------------------

/// Extract JSON from a markdown-formatted model response.
///
/// Handles:
/// - A ```json``` block (the first one wins)
/// - A generic ``` block if no json-specific block is present
/// - Raw JSON with no markdown (returned as-is)
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_block = None;
    let mut generic_block = None;
    let mut in_block = false;
    let mut lang = String::new();
    let mut current = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            current.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if lang == "json" && json_block.is_none() {
                json_block = Some(current.clone());
            } else if lang.is_empty() && generic_block.is_none() {
                generic_block = Some(current.clone());
            }
            continue;
        }

        if in_block {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }

    // An unclosed block still counts.
    if in_block && !current.is_empty() {
        if lang == "json" && json_block.is_none() {
            json_block = Some(current);
        } else if lang.is_empty() && generic_block.is_none() {
            generic_block = Some(current);
        }
    }

    json_block
        .or(generic_block)
        .unwrap_or_else(|| response.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateRequest {
        GenerateRequest::new(Category::NorthernLights, Difficulty::Easy, 2)
    }

    #[test]
    fn extract_json_block() {
        let input = "Here you go:\n\n```json\n[{\"a\": 1}]\n```\n\nEnjoy!";
        assert_eq!(extract_json_from_markdown(input), "[{\"a\": 1}]");
    }

    #[test]
    fn extract_prefers_json_over_generic() {
        let input = "```\nnot this\n```\n\n```json\n[]\n```";
        assert_eq!(extract_json_from_markdown(input), "[]");
    }

    #[test]
    fn extract_raw_json_passes_through() {
        let input = "[{\"text\": \"q\"}]";
        assert_eq!(extract_json_from_markdown(input), input);
    }

    #[test]
    fn extract_unclosed_block() {
        let input = "```json\n[1, 2]";
        assert_eq!(extract_json_from_markdown(input), "[1, 2]");
    }

    #[test]
    fn prompt_mentions_category_and_count() {
        let prompt = build_generation_prompt(&request());
        assert!(prompt.contains("Generate 2"));
        assert!(prompt.contains("Northern Lights"));
        assert!(prompt.contains("Difficulty: Easy"));
    }

    #[test]
    fn parse_keeps_valid_and_skips_bad_drafts() {
        let response = r#"```json
[
  {"text": "What color is the aurora usually?", "options": ["Green", "Red", "Blue"], "correctIndex": 0, "fact": "Oxygen."},
  {"text": "Two options only?", "options": ["Yes", "No"], "correctIndex": 0, "fact": "x"},
  {"text": "Index out of range?", "options": ["a", "b", "c"], "correctIndex": 5, "fact": "x"},
  {"options": ["a", "b", "c"]}
]
```"#;
        let questions = parse_generated_questions(response, &request()).unwrap();
        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.category, Category::NorthernLights);
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert_eq!(q.correct_index, 0);
        assert!(Uuid::parse_str(&q.id).is_ok());
    }

    #[test]
    fn parse_rejects_non_array() {
        let err = parse_generated_questions("I cannot help with that.", &request()).unwrap_err();
        assert!(matches!(err, QuizError::Serialization(_)));
    }
}
