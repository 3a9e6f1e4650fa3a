use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, AppState, SystemStatus};

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SystemStatus>, ApiError> {
    let database = match state.store().ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::warn!("Database ping failed: {}", e);
            "unreachable".to_string()
        }
    };

    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database,
    }))
}
