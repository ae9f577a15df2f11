use crate::config::Config;
use crate::db::Database;
use crate::override_store::OverrideStore;
use crate::routes::{clips, env, health, twitch_live, twitch_override, users};
use crate::twitch_live::TwitchLive;
use crate::utility::Utility;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub overrides: OverrideStore,
    pub db: Database,
    pub http: reqwest::Client,
    pub twitch: TwitchLive,
}

impl AppState {
    pub fn new(config: Config, overrides: OverrideStore, db: Database) -> Result<Self> {
        let http = Utility::get_reqwest_client(Duration::from_secs(config.outbound_timeout_secs))?;
        let twitch = TwitchLive::new(http.clone(), &config);
        Ok(Self {
            config: Arc::new(config),
            overrides,
            db,
            http,
            twitch,
        })
    }

    /// Override file and SQLite database as configured.
    pub fn from_config(config: Config) -> Result<Self> {
        let overrides = OverrideStore::json_file(&config.twitch_overrides_path);
        let db_path = config.sqlite_path();
        tracing::info!(path = %db_path.display(), "opening database");
        let db = Database::open(&db_path)?;
        Self::new(config, overrides, db)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ping", get(health::ping))
        .route("/api/status", get(health::status))
        .route("/public-env", get(env::public_env))
        .route("/flags", get(env::flags))
        .route("/twitch/override", post(twitch_override::add_override))
        .route("/twitch/overrides", get(twitch_override::list_overrides))
        .route("/twitch/resolve", post(twitch_override::resolve_players))
        .route("/twitch/live-status", post(twitch_live::check_live_status))
        .route("/clips", get(clips::list_clips).post(clips::save_clip))
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
