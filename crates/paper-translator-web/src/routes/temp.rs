//! Scratch directory maintenance.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::helpers::{ResultExt, RouteResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Remove the leftovers of earlier translations.
pub async fn clear_temp_dir(State(state): State<Arc<AppState>>) -> RouteResult<Json<MessageResponse>> {
    let removed = state.clear_temp_dir().await.or_internal_error()?;
    info!("Cleared {} entries from the scratch directory", removed);

    Ok(Json(MessageResponse {
        message: "temp dir cleared",
    }))
}
