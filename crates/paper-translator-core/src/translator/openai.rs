use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::traits::{Translator, TranslatorInfo};
use crate::config::{Lang, TranslatorConfig};
use crate::error::{Error, Result};

/// Wait used on HTTP 429 when the server sends no `retry-after`
const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 5;

/// OpenAI-compatible chat-completions translator.
/// Works with: llama.cpp server, Ollama, vLLM, OpenAI, etc.
pub struct OpenAiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Total attempts per chunk
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    /// Generation cap per chunk
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Outcome of a single failed attempt
enum AttemptError {
    /// Server asked us to back off for this long
    RateLimited(Error, Duration),
    Failed(Error),
}

impl OpenAiTranslator {
    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::TranslationRequest(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            retry_count: config.retry_count.max(1),
            retry_delay_ms: config.retry_delay_ms,
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn create_messages(text: &str, source: &Lang, target: &Lang) -> Vec<Message> {
        vec![
            Message {
                role: "system",
                content: format!(
                    "You translate academic papers from {} into {}. \
                     Output only the translation, no explanations, no quotes.",
                    language_name(source),
                    language_name(target),
                ),
            },
            Message {
                role: "user",
                content: text.to_string(),
            },
        ]
    }

    async fn attempt(&self, url: &str, request: &ChatRequest<'_>) -> std::result::Result<String, AttemptError> {
        let mut req = self.client.post(url).json(request);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.send().await.map_err(|e| {
            AttemptError::Failed(if e.is_timeout() {
                Error::TranslationTimeout
            } else {
                Error::TranslationRequest(e.to_string())
            })
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let wait = Duration::from_secs(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS));
            return Err(AttemptError::RateLimited(
                Error::TranslationRateLimited { retry_after },
                wait,
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Failed(Error::TranslationRequest(format!(
                "HTTP {status}: {body}"
            ))));
        }

        let chat = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| AttemptError::Failed(Error::TranslationInvalidResponse(e.to_string())))?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| clean_response(&choice.message.content))
            .ok_or_else(|| {
                AttemptError::Failed(Error::TranslationInvalidResponse(
                    "No choices in response".to_string(),
                ))
            })
    }

    async fn request(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let url = self.endpoint();
        let request = ChatRequest {
            model: &self.model,
            messages: Self::create_messages(text, source, target),
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let mut last_error = None;
        for attempt in 1..=self.retry_count {
            debug!("Translation attempt {}/{} to {}", attempt, self.retry_count, url);

            let wait = match self.attempt(&url, &request).await {
                Ok(translated) => return Ok(translated),
                Err(AttemptError::RateLimited(e, wait)) => {
                    warn!("Rate limited, waiting {:?}", wait);
                    last_error = Some(e);
                    wait
                }
                Err(AttemptError::Failed(e)) => {
                    warn!("Translation attempt failed: {}", e);
                    last_error = Some(e);
                    Duration::from_millis(self.retry_delay_ms)
                }
            };

            if attempt < self.retry_count {
                tokio::time::sleep(wait).await;
            }
        }

        error!("Translation failed after {} attempt(s)", self.retry_count);
        Err(last_error.unwrap_or(Error::TranslationMaxRetriesExceeded))
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "OpenAI Compatible",
            // Local servers run without a key
            requires_api_key: false,
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        self.request(text, source, target).await
    }
}

/// Strip whitespace and the quotes chat models like to wrap answers in.
fn clean_response(content: &str) -> String {
    content
        .trim()
        .trim_start_matches(['"', '“'])
        .trim_end_matches(['"', '”'])
        .trim()
        .to_string()
}

/// Language name for prompts
fn language_name(lang: &Lang) -> &'static str {
    match lang.as_str() {
        "en" => "English",
        "ja" => "Japanese",
        _ => "the specified language",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_language_name() {
        assert_eq!(language_name(&Lang::new("en")), "English");
        assert_eq!(language_name(&Lang::new("ja")), "Japanese");
        assert_eq!(language_name(&Lang::new("xx")), "the specified language");
    }

    #[test]
    fn test_clean_response() {
        assert_eq!(clean_response("  \"こんにちは\"\n"), "こんにちは");
        assert_eq!(clean_response("“引用”"), "引用");
        assert_eq!(clean_response("そのまま"), "そのまま");
    }

    #[test]
    fn test_request_carries_token_cap() {
        let translator = OpenAiTranslator::from_config(&TranslatorConfig::default()).unwrap();
        let request = ChatRequest {
            model: &translator.model,
            messages: OpenAiTranslator::create_messages("Hello.", &Lang::new("en"), &Lang::new("ja")),
            temperature: 0.0,
            max_tokens: translator.max_tokens,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["messages"][1]["content"], "Hello.");
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = TranslatorConfig::new("http://localhost:8080/v1/", None, "m");
        let translator = OpenAiTranslator::from_config(&config).unwrap();
        assert_eq!(translator.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
