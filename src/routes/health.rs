use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize, Deserialize)]
pub struct HealthChecks {
    pub extraction: ComponentHealth,
    pub storage: ComponentHealth,
}

#[derive(Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            detail: None,
        }
    }

    fn error(detail: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            detail: Some(detail.into()),
        }
    }
}

/// GET /health — readiness of the extraction provider and image storage.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let extraction = if state.extractor.is_configured() {
        ComponentHealth::ok()
    } else {
        ComponentHealth::error("extraction provider not configured")
    };

    let storage = match tokio::fs::metadata(state.storage.root()).await {
        Ok(meta) if meta.is_dir() => ComponentHealth::ok(),
        Ok(_) => ComponentHealth::error("upload path is not a directory"),
        Err(e) => ComponentHealth::error(e.to_string()),
    };

    let all_healthy = extraction.status == "ok" && storage.status == "ok";
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            extraction,
            storage,
        },
    };

    (status_code, Json(response))
}
