pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use serde::Serialize;
use std::str::FromStr;

use crate::error::{GenError, Result};

pub use gemini::GeminiImageClient;
pub use openai::OpenAiEnhancer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub reference: String,
    pub seed: i64,
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    // One upstream call per seed, results in seed order
    async fn generate_images(&self, prompt: &str, seeds: &[i64]) -> Result<Vec<GeneratedImage>>;
}

#[async_trait]
pub trait PromptEnhancer: Send + Sync {
    async fn enhance(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Direct,
    Enhanced,
}

/// Models this service accepts in `GenerationRequest::model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageModel {
    GeminiFlash,
    Gpt4Enhanced,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub provider: &'static str,
}

impl ImageModel {
    pub const ALL: [ImageModel; 2] = [ImageModel::GeminiFlash, ImageModel::Gpt4Enhanced];

    pub fn id(self) -> &'static str {
        match self {
            ImageModel::GeminiFlash => "gemini-2.0-flash",
            ImageModel::Gpt4Enhanced => "gpt-4-image",
        }
    }

    pub fn pipeline(self) -> Pipeline {
        match self {
            ImageModel::GeminiFlash => Pipeline::Direct,
            ImageModel::Gpt4Enhanced => Pipeline::Enhanced,
        }
    }

    pub fn descriptor(self) -> ModelDescriptor {
        match self {
            ImageModel::GeminiFlash => ModelDescriptor {
                id: self.id(),
                name: "Gemini 2.0 Flash",
                description: "Fast and powerful image generation with Gemini",
                provider: "Google Gemini",
            },
            ImageModel::Gpt4Enhanced => ModelDescriptor {
                id: self.id(),
                name: "GPT-4 Enhanced Generation",
                description: "Uses GPT-4 to enhance prompts, then generates with Gemini",
                provider: "OpenAI + Google Gemini",
            },
        }
    }

    pub fn descriptors() -> Vec<ModelDescriptor> {
        Self::ALL.iter().map(|m| m.descriptor()).collect()
    }
}

impl FromStr for ImageModel {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gemini-2.0-flash" | "gemini-image" => Ok(ImageModel::GeminiFlash),
            "gpt-4-image" => Ok(ImageModel::Gpt4Enhanced),
            other => Err(GenError::UnsupportedModel(other.to_string())),
        }
    }
}
