use crate::app::AppState;
use crate::db::clips::{get_clips_for_broadcaster, get_recent_clips, upsert_clip, NewClip};
use crate::error::AppError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ClipQuery {
    broadcaster: Option<String>,
    limit: Option<u32>,
}

pub async fn list_clips(
    State(state): State<AppState>,
    query: Result<Query<ClipQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query
        .map_err(|e| AppError::BadRequest(format!("Invalid clip query: {}", e.body_text())))?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let broadcaster = query
        .broadcaster
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty());
    let clips = state.db.with_conn(|conn| match broadcaster {
        Some(login) => get_clips_for_broadcaster(conn, login, limit),
        None => get_recent_clips(conn, limit),
    })?;
    Ok(Json(json!({
        "success": true,
        "count": clips.len(),
        "clips": clips,
    })))
}

pub async fn save_clip(
    State(state): State<AppState>,
    payload: Result<Json<NewClip>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(new_clip) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid clip: {}", e.body_text())))?;
    for (field, value) in [
        ("external_id", &new_clip.external_id),
        ("url", &new_clip.url),
        ("broadcaster_login", &new_clip.broadcaster_login),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }
    let clip = state.db.with_conn(|conn| upsert_clip(conn, &new_clip))?;
    tracing::info!(external_id = %clip.external_id, broadcaster = %clip.broadcaster_login, "clip saved");
    Ok(Json(json!({
        "success": true,
        "clip": clip,
    })))
}
