use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use serde_json::json;

use crate::error::GenError;
use crate::model::ImageModel;
use crate::service::ImageGenerator;
use crate::web::models::{GenerationRequest, StatusResponse, TaskStatus};

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Image generation endpoint
pub async fn generate(
    generator: web::Data<ImageGenerator>,
    req: web::Json<GenerationRequest>,
) -> Result<HttpResponse, GenError> {
    let req = req.into_inner().normalized()?;

    info!(
        "Generate request: model={} count={} steps={} size={}x{}",
        req.model, req.count, req.steps, req.width, req.height
    );

    match generator.generate(&req).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            error!("Generation failed: {}", e);
            Err(e)
        }
    }
}

pub async fn list_models() -> impl Responder {
    HttpResponse::Ok().json(json!({ "models": ImageModel::descriptors() }))
}

// Tasks are not tracked yet, so every id reports as pending
pub async fn task_status(task_id: web::Path<String>) -> impl Responder {
    HttpResponse::Ok().json(StatusResponse {
        task_id: task_id.into_inner(),
        status: TaskStatus::Pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::seed::SeedSource;
    use crate::service::testing::{CallLog, FakeEnhancer, FakeImages};
    use crate::web::routes;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn generator(log: &Arc<CallLog>) -> web::Data<ImageGenerator> {
        web::Data::new(ImageGenerator::new(
            Arc::new(FakeImages { log: log.clone() }),
            Arc::new(FakeEnhancer {
                log: log.clone(),
                fail: false,
            }),
            SeedSource::from_entropy(),
        ))
    }

    macro_rules! app {
        ($log:expr) => {
            test::init_service(
                App::new()
                    .app_data(generator($log))
                    .configure(routes::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let log = Arc::new(CallLog::default());
        let app = app!(&log);

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
                .await;

        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[actix_web::test]
    async fn generate_fills_defaults_and_returns_images() {
        let log = Arc::new(CallLog::default());
        let app = app!(&log);

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({ "prompt": "a cat", "model": "gemini-2.0-flash", "count": 2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "completed");
        assert!(!body["task_id"].as_str().unwrap().is_empty());
        assert_eq!(body["images"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["parameters"]["steps"], 50);
        assert_eq!(body["parameters"]["cfg_scale"], 7.5);
        assert_eq!(body["parameters"]["count"], 2);
        assert_eq!(body["parameters"]["height"], 768);
        assert_eq!(body["parameters"]["width"], 768);
        assert_eq!(log.image_calls().len(), 2);
    }

    #[actix_web::test]
    async fn out_of_range_request_is_a_bad_request() {
        let log = Arc::new(CallLog::default());
        let app = app!(&log);

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({ "prompt": "a cat", "model": "gemini-2.0-flash", "count": 11 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("count"));
        assert!(log.calls().is_empty());
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request_with_error_body() {
        let log = Arc::new(CallLog::default());
        let app = app!(&log);

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"model": "gemini-2.0-flash"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn unsupported_model_is_a_server_error() {
        let log = Arc::new(CallLog::default());
        let app = app!(&log);

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({ "prompt": "a cat", "model": "nonexistent-model" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "unsupported model: nonexistent-model" }));
        assert!(log.calls().is_empty());
    }

    #[actix_web::test]
    async fn models_lists_both_pipelines() {
        let log = Arc::new(CallLog::default());
        let app = app!(&log);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/models").to_request(),
        )
        .await;

        let models = body["models"].as_array().unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0]["id"], "gemini-2.0-flash");
        assert_eq!(models[1]["id"], "gpt-4-image");
        assert_eq!(models[1]["provider"], "OpenAI + Google Gemini");
    }

    #[actix_web::test]
    async fn status_is_always_pending() {
        let log = Arc::new(CallLog::default());
        let app = app!(&log);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/status/task-123").to_request(),
        )
        .await;

        assert_eq!(body, json!({ "taskId": "task-123", "status": "pending" }));
    }
}
