use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use clap_serde_derive::ClapSerde;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::DigitResult;
use crate::inference::classifier::DigitClassifier;
use crate::inference::models::digit_model::DigitModel;
use crate::inference::task::predict::{PredictHandler, PredictResponse, PredictionInput};
use crate::telemetry::init_telemetry;

mod config;
mod error;
mod inference;
mod telemetry;

#[cfg(unix)]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const DEFAULT_CONFIG_FILE: &str = "DigitRunner.toml";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

#[derive(Clone)]
pub(crate) struct AppState {
    model: Arc<dyn DigitClassifier>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match Config::from_toml(&args.config_file) {
        Ok(conf) => conf.merge(args.opt_config),
        Err(_) if args.config_file == DEFAULT_CONFIG_FILE => {
            Config::default().merge(args.opt_config)
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("Failed to read configuration file {}", args.config_file)
            })
        }
    };
    init_telemetry(config.otlp_endpoint())?;

    info!(
        "Supported features: avx: {}, neon: {}, simd128: {}, f16c: {}",
        candle_core::utils::with_avx(),
        candle_core::utils::with_neon(),
        candle_core::utils::with_simd128(),
        candle_core::utils::with_f16c()
    );

    let source = config.weight_source();
    let model = DigitModel::load(config.architecture, &source)
        .with_context(|| format!("Failed to load {} model from {source}", config.architecture))?;
    info!("Loaded {} model from {source}", config.architecture);

    let state = AppState {
        model: Arc::new(model),
    };

    let listener = TcpListener::bind(format!("{}:{}", config.address, config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state, config.body_limit))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(state: AppState, body_limit: usize) -> Router {
    // Browsers probe with a preflight before posting from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .route("/predict", post(handle_predict_image))
        .route("/predict_json", post(handle_predict_json))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[axum_macros::debug_handler]
async fn handle_predict_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> DigitResult<Json<PredictResponse>> {
    let input = PredictionInput::from_multipart(multipart).await?;
    run_prediction(state, input).await
}

#[axum_macros::debug_handler]
async fn handle_predict_json(
    State(state): State<AppState>,
    body: Bytes,
) -> DigitResult<Json<PredictResponse>> {
    let input = PredictionInput::from_json(&body)?;
    run_prediction(state, input).await
}

async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn run_prediction(
    state: AppState,
    input: PredictionInput,
) -> DigitResult<Json<PredictResponse>> {
    let kind = input.kind();
    // Inference is CPU bound, keep it off the async workers
    let prediction =
        tokio::task::spawn_blocking(move || state.model.run_predict(input)).await??;
    info!(
        monotonic_counter.predictions = 1,
        input = kind,
        digit = prediction.digit,
        "Served prediction"
    );
    Ok(Json(prediction))
}
