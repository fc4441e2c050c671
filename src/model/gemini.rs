use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GeneratedImage, ImageProvider};
use crate::config::GeminiConfig;
use crate::error::{GenError, Result};
use crate::service::retry::{retry_with_backoff_if, RetryPolicy};
use crate::storage::ImageStore;

const PROVIDER: &str = "Gemini";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
    seed: i32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<Blob>,
}

#[derive(Debug, Deserialize)]
struct Blob {
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Image generation through Gemini's `generateContent` endpoint.
pub struct GeminiImageClient {
    api_key: String,
    api_base: String,
    model: String,
    client: Client,
    store: ImageStore,
    retry: RetryPolicy,
    concurrency: usize,
}

impl GeminiImageClient {
    pub fn new(
        config: &GeminiConfig,
        client: Client,
        store: ImageStore,
        retry: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        info!("Using Gemini model {} at {}", config.model, config.api_base);

        Self {
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
            store,
            retry,
            concurrency: concurrency.max(1),
        }
    }

    pub fn variation_prompt(prompt: &str, index: usize, count: usize) -> String {
        if count > 1 {
            format!("{} (variation {})", prompt, index + 1)
        } else {
            prompt.to_string()
        }
    }

    async fn send(&self, payload: &GenerateContentRequest<'_>) -> Result<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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

    // Ok(None) when the model answered with text only
    async fn generate_one(
        &self,
        index: usize,
        prompt: &str,
        seed: i64,
    ) -> Result<Option<GeneratedImage>> {
        let payload = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
                // Gemini takes a 32-bit seed
                seed: (seed & i64::from(i32::MAX)) as i32,
            },
        };

        debug!("Image {} prompt: {}", index, prompt);

        let response =
            retry_with_backoff_if(&self.retry, || self.send(&payload), GenError::is_transient)
                .await?;

        if let Some(err) = response.error {
            return Err(GenError::Provider {
                provider: PROVIDER,
                message: err.message,
            });
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or(GenError::NoCandidates)?;

        let mut blob = None;
        for part in candidate.content.parts {
            if let Some(text) = part.text {
                debug!("Image {} caption: {}", index, text);
            }
            if blob.is_none() {
                blob = part.inline_data.filter(|b| !b.data.is_empty());
            }
        }

        let Some(blob) = blob else {
            warn!("Image {} came back without image data", index);
            return Ok(None);
        };

        let bytes = BASE64.decode(blob.data.as_bytes()).map_err(|e| GenError::Provider {
            provider: PROVIDER,
            message: format!("invalid image data: {e}"),
        })?;

        let reference = self.store.save(index, &bytes).await?;
        Ok(Some(GeneratedImage { reference, seed }))
    }
}

#[async_trait]
impl ImageProvider for GeminiImageClient {
    async fn generate_images(&self, prompt: &str, seeds: &[i64]) -> Result<Vec<GeneratedImage>> {
        let count = seeds.len();
        info!(
            "Generating {} image(s) with {} (concurrency {})",
            count, self.model, self.concurrency
        );

        let calls = seeds.iter().copied().enumerate().map(|(i, seed)| {
            let prompt = Self::variation_prompt(prompt, i, count);
            async move { self.generate_one(i + 1, &prompt, seed).await }
        });

        // `buffered` yields in submission order, so references stay aligned
        // with the request index regardless of completion order.
        let images: Vec<Option<GeneratedImage>> = stream::iter(calls)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let images: Vec<GeneratedImage> = images.into_iter().flatten().collect();
        if images.is_empty() {
            return Err(GenError::NoImagesGenerated);
        }

        Ok(images)
    }
}
