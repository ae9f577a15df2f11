use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Instant;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let started = Instant::now();
    let now = Utc::now().to_rfc3339();

    let database = match state.db.ping() {
        Ok(()) => json!({
            "healthy": true,
            "message": "Database reachable",
            "timestamp": now,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            json!({
                "healthy": false,
                "message": format!("Database check failed: {e}"),
                "timestamp": now,
            })
        }
    };
    let healthy = database["healthy"].as_bool().unwrap_or(false);
    let overall = if healthy { "healthy" } else { "unhealthy" };

    let body = json!({
        "status": overall,
        "timestamp": now,
        "checks": {
            "api": {
                "healthy": true,
                "message": "API responding normally",
                "timestamp": now,
            },
            "environment": {
                "healthy": true,
                "message": "Service environment",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": now,
            },
            "database": database,
        },
        "response_time_ms": started.elapsed().as_secs_f64() * 1000.0,
    });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

pub async fn ping() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "message": "pong",
    }))
}

pub async fn status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
