use crate::app::AppState;
use crate::error::AppError;
use crate::link_resolver::{LinkResolver, LinkSource, ResolvedPlayer};
use crate::link_rules::LINK_RULES;
use crate::override_store::OverrideEntry;
use crate::twitch_live::channel_login;
use crate::twitch_link::normalize_twitch_link;
use crate::twitch_username::extract_twitch_username;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    player_name: Option<String>,
    /// Bare name or any link form; `twitch_link` is accepted as an alias.
    #[serde(alias = "twitch_link")]
    twitch_username: Option<String>,
    display_name: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn add_override(
    State(state): State<AppState>,
    payload: Result<Json<OverrideRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) =
        payload.map_err(|_| AppError::BadRequest("Request must be JSON".to_string()))?;
    let (player_name, raw_link) = match (
        non_blank(request.player_name),
        non_blank(request.twitch_username),
    ) {
        (Some(name), Some(link)) => (name, link),
        _ => {
            return Err(AppError::BadRequest(
                "Player name and Twitch username are required".to_string(),
            ))
        }
    };

    let twitch_link = normalize_twitch_link(&raw_link);
    let entry = OverrideEntry::new(twitch_link).with_display_name(non_blank(request.display_name));
    let record = state.overrides.upsert(&player_name, entry)?;
    state.twitch.clear_cache();

    let username = extract_twitch_username(&record.twitch_link);
    let mut body = json!({
        "success": true,
        "message": "Twitch override saved successfully",
        "player_name": record.player_name,
        "twitch_link": record.twitch_link,
        "twitch_username": username,
    });
    if let Some(display_name) = record.display_name {
        body["display_name"] = json!(display_name);
    }
    if let Some(login) = username.as_deref().and_then(channel_login) {
        let mut report = state.twitch.live_status(&[login.as_str()]).await;
        if let Some(status) = report.data.remove(&login) {
            body["live_status"] = json!(status);
        }
    }
    Ok(Json(body))
}

pub async fn list_overrides(State(state): State<AppState>) -> Json<Value> {
    let overrides = state.overrides.records();
    Json(json!({
        "success": true,
        "count": overrides.len(),
        "overrides": overrides,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ScrapedPlayer {
    player_name: String,
    #[serde(default)]
    twitch_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    players: Vec<ScrapedPlayer>,
}

/// Applies overrides and fixed rules to a batch of scraped players.
pub async fn resolve_players(
    State(state): State<AppState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid resolve request: {}", e.body_text())))?;

    let overrides = state.overrides.load();
    let resolver = LinkResolver::new(&overrides, &LINK_RULES);
    let players: Vec<ResolvedPlayer> = request
        .players
        .iter()
        .map(|p| resolver.resolve(&p.player_name, p.twitch_link.as_deref()))
        .collect();
    let overridden = players
        .iter()
        .filter(|p| p.source == LinkSource::Override)
        .count();
    tracing::debug!(players = players.len(), overridden, "resolved twitch links");

    Ok(Json(json!({
        "success": true,
        "players": players,
    })))
}
