//! Mock question generator for testing and offline demos.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use perlan_core::model::Question;
use perlan_core::traits::{parse_generated_questions, GenerateRequest, QuestionGenerator};

/// A generator that answers every request with a canned model response.
///
/// The response goes through the same parsing as a real backend, so a
/// malformed fixture fails the way a misbehaving model would.
pub struct MockGenerator {
    response: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockGenerator {
    /// A generator that invents `request.count` placeholder questions.
    pub fn new() -> Self {
        Self {
            response: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A generator that always returns the same raw response.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn placeholder_response(request: &GenerateRequest) -> String {
    let drafts: Vec<serde_json::Value> = (1..=request.count)
        .map(|n| {
            serde_json::json!({
                "text": format!("{} question {n}?", request.category),
                "options": ["Yes", "No", "Maybe"],
                "correctIndex": 0,
                "fact": format!("Placeholder fact {n}."),
            })
        })
        .collect();
    serde_json::Value::Array(drafts).to_string()
}

#[async_trait]
impl QuestionGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        let content = match &self.response {
            Some(fixed) => fixed.clone(),
            None => placeholder_response(request),
        };
        Ok(parse_generated_questions(&content, request)?)
    }
}
