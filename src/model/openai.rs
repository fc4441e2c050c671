use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::PromptEnhancer;
use crate::config::OpenAiConfig;
use crate::error::{GenError, Result};
use crate::service::retry::{retry_with_backoff_if, RetryPolicy};

const PROVIDER: &str = "OpenAI";
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

pub struct OpenAiEnhancer {
    api_key: Option<String>,
    api_base: String,
    model: String,
    client: Client,
    retry: RetryPolicy,
}

impl OpenAiEnhancer {
    pub fn new(config: &OpenAiConfig, client: Client, retry: RetryPolicy) -> Self {
        if config.api_key.is_none() {
            info!("OPENAI_API_KEY not set; enhanced models will fail until it is");
        }

        Self {
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
            retry,
        }
    }

    fn instruction(prompt: &str) -> String {
        format!(
            "Create a detailed and vivid image generation prompt based on this description: {}. \
             The prompt should be suitable for Stable Diffusion and include style, lighting, \
             and composition details.",
            prompt
        )
    }

    async fn send(&self, api_key: &str, payload: &ChatRequest<'_>) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await
            .map_err(|source| GenError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} API returned {}: {}", PROVIDER, status, body);
            return Err(GenError::ProviderStatus {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| GenError::Provider {
            provider: PROVIDER,
            message: format!("failed to decode response: {e}"),
        })
    }
}

#[async_trait]
impl PromptEnhancer for OpenAiEnhancer {
    async fn enhance(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let payload = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: Role::User,
                content: Self::instruction(prompt),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        info!("Enhancing prompt with {}", self.model);
        debug!("Raw prompt: {}", prompt);

        let response = retry_with_backoff_if(
            &self.retry,
            || self.send(api_key, &payload),
            GenError::is_transient,
        )
        .await?;

        if let Some(err) = response.error {
            return Err(GenError::Provider {
                provider: PROVIDER,
                message: err.message,
            });
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(GenError::EmptyResponse { provider: PROVIDER })?;

        debug!("Enhanced prompt: {}", choice.message.content);
        Ok(choice.message.content)
    }
}
