use crate::utility::Utility;
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagSource {
    Default,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagSet {
    pub flags: Map<String, Value>,
    pub source: FlagSource,
}

/// What clients get when the config service is unset or unreachable.
pub fn default_flags() -> Map<String, Value> {
    let defaults = json!({
        "enableLiveStatus": true,
        "enableLeaderboard": true,
        "enableClips": true,
        "enableTwitchOverrides": true,
        "enableVodDownloader": false,
        "maintenanceMode": false,
        "leaderboardRefreshSeconds": 300,
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Remote keys replace defaults one by one; anything but a JSON object is ignored.
pub fn merge_flags(mut defaults: Map<String, Value>, remote: &Value) -> Map<String, Value> {
    if let Some(remote) = remote.as_object() {
        for (key, value) in remote {
            defaults.insert(key.to_owned(), value.to_owned());
        }
    }
    defaults
}

/// Never fails; a missing URL or a failed fetch just means the defaults.
pub async fn fetch_flags(client: &reqwest::Client, config_service_url: Option<&str>) -> FlagSet {
    let defaults = FlagSet {
        flags: default_flags(),
        source: FlagSource::Default,
    };
    let url = match config_service_url.map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => return defaults,
    };
    match Utility::get_json(client, url).await {
        Ok(remote) if remote.is_object() => FlagSet {
            flags: merge_flags(defaults.flags, &remote),
            source: FlagSource::Remote,
        },
        Ok(_) => {
            tracing::debug!(url, "config service did not return an object, keeping defaults");
            defaults
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "config service unavailable, keeping defaults");
            defaults
        }
    }
}
