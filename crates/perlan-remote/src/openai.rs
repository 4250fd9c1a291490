//! OpenAI-compatible question generator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use perlan_core::error::RemoteError;
use perlan_core::model::Question;
use perlan_core::traits::{
    build_generation_prompt, parse_generated_questions, GenerateRequest, QuestionGenerator,
    GENERATION_SYSTEM_PROMPT,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_TOKENS: u32 = 2048;

/// Drafts questions through a chat-completions endpoint.
pub struct OpenAiGenerator {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str, base_url: Option<String>, model: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| RemoteError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        })
    }
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage>,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

#[async_trait]
impl QuestionGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(category = %request.category, count = request.count))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>> {
        let body = OpenAiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            max_tokens: MAX_TOKENS,
            temperature: 0.8,
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: GENERATION_SYSTEM_PROMPT.to_string(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: build_generation_prompt(request),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    RemoteError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::AuthenticationFailed(body).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: OpenAiResponse =
            response.json().await.map_err(|e| RemoteError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();
        let questions = parse_generated_questions(content, request)?;
        tracing::info!("generated {} of {} requested questions", questions.len(), request.count);
        Ok(questions)
    }
}
