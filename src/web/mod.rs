pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{
    models::{ModelContext, ModelManager},
    store::ScanStore,
    utils::error::ScanError,
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// 应用上下文：启动时构建，通过引用传给各处理器
pub struct AppState {
    pub config: Config,
    pub models: ModelManager,
    pub store: ScanStore,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = ScanStore::new(config.data_file.clone());
        let models = ModelManager::new(config.clone());
        Self {
            config,
            models,
            store,
        }
    }

    /// 使用现成的模型上下文（测试或替换推理后端）
    pub fn with_context(config: Config, context: ModelContext) -> Self {
        let store = ScanStore::new(config.data_file.clone());
        let models = ModelManager::with_context(config.clone(), context);
        Self {
            config,
            models,
            store,
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // 预加载模型；失败不影响服务启动，扫描时会重试
    {
        let state = Arc::clone(&state);
        tokio::task::spawn_blocking(move || state.models.warm_up())
            .await
            .map_err(|e| ScanError::Internal(format!("Model warm-up task failed: {}", e)))?;
    }

    let app = create_app(state);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ScanError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Scan data file: {}", config.data_file.display());
    tracing::info!("API endpoints:");
    tracing::info!("  POST   /api/scan        - Multipart image upload");
    tracing::info!("  POST   /api/scan/base64 - JSON base64 upload");
    tracing::info!("  POST   /api/confirm     - Confirm and save a scan");
    tracing::info!("  GET    /api/data        - Scan totals");
    tracing::info!("  DELETE /api/data        - Clear all data");
    tracing::info!("  GET    /                - Web UI");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ScanError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: SharedState) -> Router {
    let server_config = &state.config.server_config;
    let body_limit = server_config.max_request_size;
    let timeout = Duration::from_secs(server_config.request_timeout);

    Router::new()
        // 扫描 / 确认 / 数据
        .route("/api/scan", post(handlers::scan_upload_handler))
        .route("/api/scan/base64", post(handlers::scan_json_handler))
        .route("/api/confirm", post(handlers::confirm_handler))
        .route(
            "/api/data",
            get(handlers::data_handler).delete(handlers::clear_handler),
        )
        // Web UI
        .route("/", get(ui::index_handler))
        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(DefaultBodyLimit::disable())
        // base64 编码后体积约增加 1/3
        .layer(RequestBodyLimitLayer::new(body_limit + body_limit / 2))
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": state.models.is_loaded(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 服务信息端点
async fn info_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let stats = state.models.get_stats();
    Json(json!({
        "service": "Fresh Scan",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "layout": state.config.layout,
        "rescaling": state.config.rescaling,
        "data_file": state.config.data_file.display().to_string(),
    }))
}
