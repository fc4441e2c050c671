mod config;
mod error;
mod model;
mod service;
mod storage;
mod web;

use actix_files as fs;
use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use log::info;
use std::sync::Arc;

use config::Config;
use model::{GeminiImageClient, OpenAiEnhancer};
use service::retry::RetryPolicy;
use service::seed::SeedSource;
use service::ImageGenerator;
use storage::ImageStore;
use web::routes;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting image generation service");

    let config = Config::from_env().context("failed to load configuration")?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create image output directory {}",
            config.output_dir.display()
        )
    })?;

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;
    let retry = RetryPolicy::new(config.max_retries, config.retry_base_delay);

    let images = GeminiImageClient::new(
        &config.gemini,
        http.clone(),
        ImageStore::new(&config.output_dir, &config.file_prefix),
        retry,
        config.image_concurrency,
    );
    let enhancer = OpenAiEnhancer::new(&config.openai, http, retry);

    let generator = Data::new(ImageGenerator::new(
        Arc::new(images),
        Arc::new(enhancer),
        SeedSource::from_entropy(),
    ));

    let output_dir = config.output_dir.clone();
    let (host, port) = config.bind_addr();
    info!("Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(generator.clone())
            .configure(routes::configure)
            .service(fs::Files::new("/images", &output_dir))
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
