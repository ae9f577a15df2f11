use crate::app::AppState;
use crate::error::AppError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

/// Body: `{"channels": ["name", "https://twitch.tv/name", ...]}`.
pub async fn check_live_status(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload
        .map_err(|_| AppError::BadRequest("Missing 'channels' in request body".to_string()))?;
    let channels = match body.get("channels") {
        Some(channels) => channels,
        None => {
            return Err(AppError::BadRequest(
                "Missing 'channels' in request body".to_string(),
            ))
        }
    };
    let channels: Vec<&str> = match channels.as_array() {
        Some(list) if !list.is_empty() => list.iter().filter_map(Value::as_str).collect(),
        _ => {
            return Err(AppError::BadRequest(
                "Channels must be a non-empty list".to_string(),
            ))
        }
    };

    let report = state.twitch.live_status(channels.as_slice()).await;
    tracing::debug!(
        channels = report.data.len(),
        cached = report.cached,
        source = ?report.source,
        "twitch live status"
    );
    Ok(Json(json!({
        "success": true,
        "cached": report.cached,
        "source": report.source,
        "data": report.data,
        "last_updated": report.last_updated.to_rfc3339(),
    })))
}
