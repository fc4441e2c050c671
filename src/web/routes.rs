use actix_web::{error::InternalError, web, HttpResponse};
use serde_json::json;

use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/api")
                .route("/generate", web::post().to(handlers::generate))
                .route("/models", web::get().to(handlers::list_models))
                .route("/status/{task_id}", web::get().to(handlers::task_status)),
        )
        .route("/health", web::get().to(handlers::health_check));
}

// Body errors answer with the same `{error}` shape as validation failures
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": err.to_string() });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}
