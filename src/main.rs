//! Object-detection service.
//!
//! - Single process, CPU-bound work on tokio's blocking pool
//! - Per-request thresholds, no shared mutable state
//! - SIMD-optimized letterbox resize

use rust_detect::classes::ClassNames;
use rust_detect::config::Config;
use rust_detect::engine::{InferenceEngine, OnnxEngine};
use rust_detect::error::AppError;
use rust_detect::handlers::predict::AppState;
use rust_detect::pipeline::{Detector, Thresholds};
use rust_detect::render::Renderer;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), AppError> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rust_detect=info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    eprintln!("[STARTUP] Detection service starting...");

    // Use all cores for workers; inference runs on the blocking pool
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .max_blocking_threads(64)
        .enable_all()
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build runtime: {e}")))?;

    eprintln!(
        "[STARTUP] Tokio runtime configured: {} worker threads, 64 max blocking threads",
        num_cpus::get()
    );

    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), AppError> {
    let config = Config::from_env();
    info!("Starting rust-detect service");
    info!("Model: {}", config.model_path.display());
    info!("Input size: {}", config.img_size);
    info!("Default thresholds: conf={} iou={}", config.conf_thres, config.iou_thres);
    info!("Engine pool size: {}", config.engine_pool_size);

    eprintln!("[STARTUP] Loading model from {}...", config.model_path.display());
    let engine = match OnnxEngine::load(
        &config.model_path,
        config.engine_pool_size,
        config.engine_threads,
    ) {
        Ok(engine) => {
            eprintln!("[STARTUP] Model loaded successfully");
            engine
        }
        Err(e) => {
            eprintln!("[STARTUP ERROR] {e}");
            return Err(e);
        }
    };
    let engine: Arc<dyn InferenceEngine> = Arc::new(engine);

    let classes = match &config.classes_path {
        Some(path) => ClassNames::from_file(path)?,
        None => ClassNames::coco(),
    };
    info!("Class names: {}", classes.len());

    let state = Arc::new(AppState {
        detector: Detector::new(engine, classes, config.img_size),
        renderer: Renderer::load(&config.font_path),
        defaults: Thresholds {
            conf: config.conf_thres,
            iou: config.iou_thres,
        },
        model_name: config.model_name(),
    });

    let app = rust_detect::router(state, config.max_upload_bytes());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    eprintln!("[STARTUP] Server ready! Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    eprintln!("[SHUTDOWN] Server stopped");
    Ok(())
}
