//! Live status of Twitch channels, looked up through the Helix streams API.
//!
//! Lookups never fail from the caller's point of view. Without credentials,
//! or when Twitch cannot be reached, a canned status is returned instead.

use crate::config::Config;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Helix accepts at most this many `user_login` parameters per request.
pub const MAX_CHANNELS_PER_REQUEST: usize = 100;

const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const THUMBNAIL_WIDTH: &str = "320";
const THUMBNAIL_HEIGHT: &str = "180";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamData {
    pub title: String,
    pub game_name: String,
    pub viewer_count: u64,
    pub started_at: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveStatus {
    pub is_live: bool,
    pub stream_data: Option<StreamData>,
}

impl LiveStatus {
    pub fn offline() -> Self {
        Self {
            is_live: false,
            stream_data: None,
        }
    }

    pub fn live(stream_data: StreamData) -> Self {
        Self {
            is_live: true,
            stream_data: Some(stream_data),
        }
    }
}

/// Keyed by lowercase channel login.
pub type LiveStatusMap = BTreeMap<String, LiveStatus>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveSource {
    Twitch,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveReport {
    pub data: LiveStatusMap,
    pub source: LiveSource,
    pub cached: bool,
    pub last_updated: DateTime<Utc>,
}

/// Login name from a bare channel name or a `twitch.tv/...` link.
pub fn channel_login(channel: &str) -> Option<String> {
    let channel = channel.trim();
    let rest = match channel.rfind("twitch.tv/") {
        Some(pos) => &channel[pos + "twitch.tv/".len()..],
        None => channel,
    };
    let login = rest.split('/').next()?.split('?').next()?;
    (!login.is_empty()).then(|| login.to_lowercase())
}

/// Distinct logins in request order, capped at [`MAX_CHANNELS_PER_REQUEST`].
pub fn channel_logins<S: AsRef<str>>(channels: &[S]) -> Vec<String> {
    let mut logins: Vec<String> = vec![];
    for login in channels.iter().filter_map(|c| channel_login(c.as_ref())) {
        if !logins.contains(&login) {
            logins.push(login);
        }
    }
    logins.truncate(MAX_CHANNELS_PER_REQUEST);
    logins
}

/// Canned status used when Twitch is unavailable: `naughty` is live, everyone else offline.
pub fn mock_live_status(logins: &[String]) -> LiveStatusMap {
    logins
        .iter()
        .map(|login| {
            let status = match login.as_str() {
                "naughty" => LiveStatus::live(StreamData {
                    title: "Apex Legends Ranked - Master Tier Gameplay".to_string(),
                    game_name: "Apex Legends".to_string(),
                    viewer_count: 1247,
                    started_at: Utc::now().to_rfc3339(),
                    thumbnail_url:
                        "https://static-cdn.jtvnw.net/previews-ttv/live_user_naughty-320x180.jpg"
                            .to_string(),
                }),
                _ => LiveStatus::offline(),
            };
            (login.to_owned(), status)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct AppAccessToken {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct HelixStreams {
    #[serde(default)]
    data: Vec<HelixStream>,
}

#[derive(Debug, Deserialize)]
struct HelixStream {
    user_login: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    game_name: String,
    #[serde(default)]
    viewer_count: u64,
    #[serde(default)]
    started_at: String,
    #[serde(default)]
    thumbnail_url: String,
}

impl HelixStream {
    fn into_status(self) -> (String, LiveStatus) {
        let thumbnail_url = self
            .thumbnail_url
            .replace("{width}", THUMBNAIL_WIDTH)
            .replace("{height}", THUMBNAIL_HEIGHT);
        let status = LiveStatus::live(StreamData {
            title: self.title,
            game_name: self.game_name,
            viewer_count: self.viewer_count,
            started_at: self.started_at,
            thumbnail_url,
        });
        (self.user_login.to_lowercase(), status)
    }
}

#[derive(Clone)]
struct Credentials {
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
struct CachedReport {
    data: LiveStatusMap,
    source: LiveSource,
    fetched_at: DateTime<Utc>,
    stored: Instant,
}

#[derive(Debug)]
struct TwitchLiveInner {
    http: reqwest::Client,
    credentials: Option<Credentials>,
    auth_url: String,
    api_url: String,
    cache_ttl: Duration,
    token: Mutex<Option<CachedToken>>,
    reports: Mutex<HashMap<String, CachedReport>>,
}

/// Shared handle; clones use the same token and report caches.
#[derive(Debug, Clone)]
pub struct TwitchLive {
    inner: Arc<TwitchLiveInner>,
}

impl TwitchLive {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        let credentials = match (
            non_empty(config.twitch_client_id.as_deref()),
            non_empty(config.twitch_client_secret.as_deref()),
        ) {
            (Some(client_id), Some(client_secret)) => Some(Credentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        Self {
            inner: Arc::new(TwitchLiveInner {
                http,
                credentials,
                auth_url: config.twitch_auth_url.to_owned(),
                api_url: config.twitch_api_url.trim_end_matches('/').to_string(),
                cache_ttl: Duration::from_secs(config.twitch_live_cache_secs),
                token: Mutex::new(None),
                reports: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.inner.credentials.is_some()
    }

    /// Forgets every cached report; the access token is kept.
    pub fn clear_cache(&self) {
        if let Ok(mut reports) = self.inner.reports.lock() {
            reports.clear();
        }
    }

    /// Live status for every distinct channel in `channels`.
    pub async fn live_status<S: AsRef<str>>(&self, channels: &[S]) -> LiveReport {
        let logins = channel_logins(channels);
        let mut sorted = logins.to_owned();
        sorted.sort();
        let cache_key = sorted.join(",");

        if let Some(report) = self.cached_report(&cache_key) {
            return report;
        }

        let (data, source) = match self.inner.credentials.as_ref() {
            None => {
                tracing::debug!("no twitch credentials configured, using mock live status");
                (mock_live_status(&logins), LiveSource::Mock)
            }
            Some(_) if logins.is_empty() => (LiveStatusMap::new(), LiveSource::Twitch),
            Some(credentials) => match self.fetch_streams(credentials, &logins).await {
                Ok(data) => (data, LiveSource::Twitch),
                Err(e) => {
                    tracing::warn!(error = %e, "twitch live status lookup failed, using mock data");
                    (mock_live_status(&logins), LiveSource::Mock)
                }
            },
        };

        let fetched_at = Utc::now();
        if let Ok(mut reports) = self.inner.reports.lock() {
            reports.insert(
                cache_key,
                CachedReport {
                    data: data.to_owned(),
                    source,
                    fetched_at,
                    stored: Instant::now(),
                },
            );
        }
        LiveReport {
            data,
            source,
            cached: false,
            last_updated: fetched_at,
        }
    }

    fn cached_report(&self, cache_key: &str) -> Option<LiveReport> {
        let reports = self.inner.reports.lock().ok()?;
        let report = reports.get(cache_key)?;
        if report.stored.elapsed() >= self.inner.cache_ttl {
            return None;
        }
        Some(LiveReport {
            data: report.data.to_owned(),
            source: report.source,
            cached: true,
            last_updated: report.fetched_at,
        })
    }

    async fn access_token(&self, credentials: &Credentials) -> Result<String> {
        if let Ok(token) = self.inner.token.lock() {
            if let Some(token) = token.as_ref().filter(|t| Instant::now() < t.expires_at) {
                return Ok(token.access_token.to_owned());
            }
        }

        let token: AppAccessToken = self
            .inner
            .http
            .post(&self.inner.auth_url)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        if let Ok(mut cached) = self.inner.token.lock() {
            *cached = Some(CachedToken {
                access_token: token.access_token.to_owned(),
                expires_at: Instant::now() + lifetime,
            });
        }
        Ok(token.access_token)
    }

    async fn fetch_streams(
        &self,
        credentials: &Credentials,
        logins: &[String],
    ) -> Result<LiveStatusMap> {
        let access_token = self.access_token(credentials).await?;
        let query: Vec<(&str, &str)> = logins.iter().map(|l| ("user_login", l.as_str())).collect();
        let streams: HelixStreams = self
            .inner
            .http
            .get(format!("{}/streams", self.inner.api_url))
            .query(&query)
            .bearer_auth(&access_token)
            .header("Client-Id", &credentials.client_id)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut data: LiveStatusMap = logins
            .iter()
            .map(|login| (login.to_owned(), LiveStatus::offline()))
            .collect();
        data.extend(streams.data.into_iter().map(HelixStream::into_status));
        Ok(data)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
