#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use envconfig::Envconfig;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use streamer_links::app::{router, AppState};
use streamer_links::config::Config;
use streamer_links::db::Database;
use streamer_links::OverrideStore;
use tempfile::TempDir;
use tower::ServiceExt;

/// The full router on a temporary override file and an in-memory database.
pub struct TestApp {
    pub app: Router,
    pub overrides_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        let overrides_path = dir.path().join("twitch_overrides.json");
        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env.insert(
            "TWITCH_OVERRIDES_PATH".to_string(),
            overrides_path.display().to_string(),
        );
        let config = Config::init_from_hashmap(&env).unwrap();
        Self::with_config(config, dir, overrides_path)
    }

    pub fn with_config(config: Config, dir: TempDir, overrides_path: PathBuf) -> Self {
        let overrides = OverrideStore::json_file(&overrides_path);
        let db = Database::open_in_memory().unwrap();
        let state = AppState::new(config, overrides, db).unwrap();
        Self {
            app: router(state),
            overrides_path,
            _dir: dir,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, &body.to_string(), "application/json").await
    }

    pub async fn post_raw(&self, uri: &str, body: &str, content_type: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
