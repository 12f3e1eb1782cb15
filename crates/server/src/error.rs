use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ecode_core::CodeError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Generate,
    Check,
    Redeem,
    List,
    Update,
    Revoke,
}

#[derive(Error, Debug)]
#[error("{route:?} failed: {source}")]
pub struct ApiError {
    route: Route,
    #[source]
    source: CodeError,
}

impl ApiError {
    pub fn new(route: Route, source: CodeError) -> Self {
        Self { route, source }
    }

    /// For `map_err`: tags a lifecycle error with the route that raised it.
    pub fn on(route: Route) -> impl Fn(CodeError) -> Self {
        move |source| Self::new(route, source)
    }

    /// Wire message. A few routes have historically used their own wording.
    pub fn message(&self) -> String {
        match (self.route, &self.source) {
            (Route::Redeem, CodeError::Expired) => "Expired".to_string(),
            (Route::Update | Route::Revoke, CodeError::NotFound) => "Not found".to_string(),
            (_, source) => source.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Rule violations travel as successful responses; callers inspect
        // the payload. Only infrastructure failures change the status.
        let status = if self.source.is_rejection() {
            tracing::warn!("{:?} rejected: {}", self.route, self.source);
            StatusCode::OK
        } else {
            tracing::error!("{:?} unavailable: {}", self.route, self.source);
            StatusCode::SERVICE_UNAVAILABLE
        };

        let body = Json(json!({
            "success": false,
            "error": self.message(),
        }));

        (status, body).into_response()
    }
}
