use async_trait::async_trait;
use common::types::Language;
use configs::OpenAiConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Translator;
use crate::errors::ServiceError;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional translator. \
Translate all input text strictly and exclusively into {target_name} ({target_code}). \
Ensure no other language is used, and maintain accuracy and consistency. \
Please respect punctuation: do not add punctuations if not present in source text. \
Please treat phrases terminating with \"_one\" as the singular form of the phrase. \
Please treat phrases terminating with \"_many\" as the plural form of the phrase. \
Please treat phrases terminating with \"_other\" as the \"other\" (usually the same as plural) form of the phrase. \
Please keep strings inside \"{{\" and \"}}\" braces \"as-is\".";

const ERROR_BODY_LIMIT: usize = 200;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Translator backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl ChatCompletionTranslator {
    pub fn new(cfg: &OpenAiConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| ServiceError::Translation(format!("cannot build http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            system_prompt: cfg.system_prompt.clone().unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// System prompt with the target language filled in.
    pub fn system_prompt(&self, target: &Language) -> String {
        self.system_prompt
            .replace("{target_name}", &target.name)
            .replace("{target_code}", &target.code)
    }
}

#[async_trait]
impl Translator for ChatCompletionTranslator {
    async fn translate(&self, text: &str, target: &Language) -> Result<String, ServiceError> {
        let system = self.system_prompt(target);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &system },
                ChatMessage { role: "user", content: text },
            ],
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Translation(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ServiceError::Translation(format!("api returned {status}: {detail}")));
        }

        let parsed = resp
            .json::<ChatResponse>()
            .await
            .map_err(|e| ServiceError::Translation(format!("invalid response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ServiceError::Translation("api returned no translation".into()));
        }

        debug!(language = %target.code, chars = content.chars().count(), "translation received");
        Ok(content)
    }
}
