use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use ecode_core::{CodeManager, CodeRecord, CodeSummary, CodeUpdate, Field, NewCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ApiError, Result, Route};

pub struct ServiceState {
    pub config: ServerConfig,
    pub manager: Arc<CodeManager>,
}

impl ServiceState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let manager =
            CodeManager::connect_with_timeout(config.lifecycle.clone(), config.store_timeout_secs)?;
        info!(
            "Codes expire after {}h by default",
            config.lifecycle.default_expiry_hours
        );

        Ok(Self::with_manager(config, manager))
    }

    pub fn with_manager(config: ServerConfig, manager: CodeManager) -> Self {
        Self {
            config,
            manager: Arc::new(manager),
        }
    }
}

pub fn router(state: Arc<ServiceState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/check", post(check))
        .route("/redeem", post(redeem))
        // Admin
        .route("/codes", get(list_codes))
        .route("/update", post(update))
        .route("/revoke", post(revoke))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(state: Arc<ServiceState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Exchange code service listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// A missing or non-string code is looked up as the empty code, which never
/// matches.
fn code_of(field: &Field<String>) -> &str {
    match field {
        Field::Given(code) => code,
        _ => "",
    }
}

#[derive(Deserialize)]
struct CodeRequest {
    #[serde(default)]
    code: Field<String>,
}

#[derive(Deserialize)]
struct UpdateRequest {
    #[serde(default)]
    code: Field<String>,
    #[serde(flatten)]
    changes: CodeUpdate,
}

#[derive(Serialize)]
struct GenerateResponse {
    success: bool,
    code: String,
}

#[derive(Serialize)]
struct CheckResponse {
    success: bool,
    #[serde(flatten)]
    summary: CodeSummary,
}

#[derive(Serialize)]
struct RedeemResponse {
    success: bool,
    receipt: CodeRecord,
}

#[derive(Serialize)]
struct AckResponse {
    success: bool,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn generate(
    State(state): State<Arc<ServiceState>>,
    Json(req): Json<NewCode>,
) -> Result<Json<GenerateResponse>> {
    let code = state
        .manager
        .generate(req)
        .await
        .map_err(ApiError::on(Route::Generate))?;
    Ok(Json(GenerateResponse {
        success: true,
        code,
    }))
}

async fn check(
    State(state): State<Arc<ServiceState>>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<CheckResponse>> {
    let summary = state
        .manager
        .check(code_of(&req.code))
        .await
        .map_err(ApiError::on(Route::Check))?;
    Ok(Json(CheckResponse {
        success: true,
        summary,
    }))
}

async fn redeem(
    State(state): State<Arc<ServiceState>>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<RedeemResponse>> {
    let receipt = state
        .manager
        .redeem(code_of(&req.code))
        .await
        .map_err(ApiError::on(Route::Redeem))?;
    Ok(Json(RedeemResponse {
        success: true,
        receipt,
    }))
}

async fn list_codes(State(state): State<Arc<ServiceState>>) -> Result<Json<Vec<CodeRecord>>> {
    let records = state
        .manager
        .list()
        .await
        .map_err(ApiError::on(Route::List))?;
    tracing::debug!("Listing {} codes", records.len());
    Ok(Json(records))
}

async fn update(
    State(state): State<Arc<ServiceState>>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<AckResponse>> {
    state
        .manager
        .update(code_of(&req.code), req.changes)
        .await
        .map_err(ApiError::on(Route::Update))?;
    Ok(Json(AckResponse { success: true }))
}

async fn revoke(
    State(state): State<Arc<ServiceState>>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<AckResponse>> {
    state
        .manager
        .revoke(code_of(&req.code))
        .await
        .map_err(ApiError::on(Route::Revoke))?;
    Ok(Json(AckResponse { success: true }))
}
