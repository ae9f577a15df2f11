use crate::app::AppState;
use crate::db::users::{self, NewUser};
use crate::error::AppError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(new_user) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid user: {}", e.body_text())))?;
    if new_user.username.trim().is_empty() || !new_user.email.contains('@') {
        return Err(AppError::BadRequest(
            "A username and a valid email are required".to_string(),
        ));
    }
    let user = state.db.with_conn(|conn| users::insert_user(conn, &new_user))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": user,
        })),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) =
        id.map_err(|e| AppError::BadRequest(format!("Invalid user id: {}", e.body_text())))?;
    let user = state
        .db
        .with_conn(|conn| users::get_user(conn, id))?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    Ok(Json(json!({
        "success": true,
        "user": user,
    })))
}
