use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

pub const DEFAULT_STEPS: u32 = 50;
pub const DEFAULT_CFG_SCALE: f32 = 7.5;
pub const DEFAULT_COUNT: u32 = 1;
pub const DEFAULT_SIZE: u32 = 768;

const MAX_COUNT: u32 = 10;
const MAX_STEPS: u32 = 150;
const CFG_SCALE_RANGE: (f32, f32) = (1.0, 20.0);
const ALLOWED_SIZES: [u32; 3] = [512, 768, 1024];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub cfg_scale: f32,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub width: u32,
}

impl GenerationRequest {
    /// Fills zero/absent fields with server defaults. Explicit values are
    /// left alone.
    pub fn apply_defaults(&mut self) {
        if self.steps == 0 {
            self.steps = DEFAULT_STEPS;
        }
        if self.cfg_scale == 0.0 {
            self.cfg_scale = DEFAULT_CFG_SCALE;
        }
        if self.count == 0 {
            self.count = DEFAULT_COUNT;
        }
        if self.height == 0 {
            self.height = DEFAULT_SIZE;
        }
        if self.width == 0 {
            self.width = DEFAULT_SIZE;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(GenError::Validation("prompt is required".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(GenError::Validation("model is required".to_string()));
        }
        if !(1..=MAX_COUNT).contains(&self.count) {
            return Err(GenError::Validation(format!(
                "count must be between 1 and {MAX_COUNT}, got {}",
                self.count
            )));
        }
        if !(1..=MAX_STEPS).contains(&self.steps) {
            return Err(GenError::Validation(format!(
                "steps must be between 1 and {MAX_STEPS}, got {}",
                self.steps
            )));
        }
        let (min_cfg, max_cfg) = CFG_SCALE_RANGE;
        if !(min_cfg..=max_cfg).contains(&self.cfg_scale) {
            return Err(GenError::Validation(format!(
                "cfg_scale must be between {min_cfg} and {max_cfg}, got {}",
                self.cfg_scale
            )));
        }
        for (name, value) in [("height", self.height), ("width", self.width)] {
            if !ALLOWED_SIZES.contains(&value) {
                return Err(GenError::Validation(format!(
                    "{name} must be one of 512, 768, 1024, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn normalized(mut self) -> Result<Self> {
        self.apply_defaults();
        self.validate()?;
        Ok(self)
    }

    pub fn parameters(&self) -> GenerationParameters {
        GenerationParameters {
            count: self.count,
            seed: self.seed,
            steps: self.steps,
            cfg_scale: self.cfg_scale,
            negative_prompt: self.negative_prompt.clone(),
            height: self.height,
            width: self.width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub count: u32,
    pub seed: Option<i64>,
    pub steps: u32,
    pub cfg_scale: f32,
    pub negative_prompt: Option<String>,
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default)]
    pub results: Vec<ImageResult>,
    pub parameters: GenerationParameters,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    pub id: String,
    pub task_id: String,
    pub url: String,
    pub seed: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "taskId")]
    pub task_id: String,
    pub status: TaskStatus,
}
