use crate::app::AppState;
use crate::feature_flags::fetch_flags;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// Public keys the frontend needs, passed through verbatim.
pub async fn public_env(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "NEXT_PUBLIC_SUPABASE_URL": state.config.public_supabase_url,
            "NEXT_PUBLIC_SUPABASE_ANON_KEY": state.config.public_supabase_anon_key,
        }
    }))
}

pub async fn flags(State(state): State<AppState>) -> Json<Value> {
    let set = fetch_flags(&state.http, state.config.config_service_url.as_deref()).await;
    Json(json!({
        "success": true,
        "data": set.flags,
        "source": set.source,
    }))
}
