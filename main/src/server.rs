use std::sync::Arc;

use api_router::{api_state::ApiState, exam_routes_v1};
use axum::Router;
use common::utils::config::get_config;
use exam_pipeline::ExamPipeline;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let pipeline = Arc::new(ExamPipeline::new(openai_client, &config));
    let api_state = ApiState::new(pipeline, config.upload_max_body_bytes);

    let app = Router::new().nest("/api/v1", exam_routes_v1(&api_state));

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
