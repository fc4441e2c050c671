pub mod retry;
pub mod seed;

use chrono::Utc;
use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{GenError, Result};
use crate::model::{ImageModel, ImageProvider, Pipeline, PromptEnhancer};
use crate::web::models::{GenerationRequest, GenerationResponse, ImageResult, TaskStatus};
use seed::SeedSource;

pub struct ImageGenerator {
    images: Arc<dyn ImageProvider>,
    enhancer: Arc<dyn PromptEnhancer>,
    seeds: SeedSource,
}

impl ImageGenerator {
    pub fn new(
        images: Arc<dyn ImageProvider>,
        enhancer: Arc<dyn PromptEnhancer>,
        seeds: SeedSource,
    ) -> Self {
        Self {
            images,
            enhancer,
            seeds,
        }
    }

    /// Expects a request that already went through
    /// [`GenerationRequest::normalized`].
    pub async fn generate(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
        let model: ImageModel = req.model.parse()?;
        let task_id = Uuid::new_v4().to_string();
        let seeds = self.seeds.seeds_for(req.seed, req.count as usize);

        info!(
            "Task {}: generating {} image(s) with {}",
            task_id,
            req.count,
            model.id()
        );

        let prompt = match model.pipeline() {
            Pipeline::Direct => req.prompt.clone(),
            Pipeline::Enhanced => self.enhancer.enhance(&req.prompt).await.map_err(|e| {
                error!("Task {}: prompt enhancement failed: {}", task_id, e);
                GenError::Enhancement(Box::new(e))
            })?,
        };
        debug!("Task {}: final prompt: {}", task_id, prompt);

        let generated = self.images.generate_images(&prompt, &seeds).await?;

        let created_at = Utc::now();
        let results = generated
            .iter()
            .map(|image| ImageResult {
                id: Uuid::new_v4().to_string(),
                task_id: task_id.clone(),
                url: image.reference.clone(),
                seed: image.seed,
                created_at,
            })
            .collect();

        info!("Task {}: {} image(s) ready", task_id, generated.len());

        Ok(GenerationResponse {
            task_id,
            status: TaskStatus::Completed,
            images: generated.into_iter().map(|image| image.reference).collect(),
            results,
            parameters: req.parameters(),
            created_at,
        })
    }
}
