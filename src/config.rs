use envconfig::Envconfig;
use std::path::PathBuf;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "5000")]
    pub port: u16,

    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    /// Cloud database URL; only `sqlite://` URLs (or plain paths) are usable here.
    #[envconfig(from = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[envconfig(from = "DATABASE_PATH", default = "app.db")]
    pub database_path: String,

    #[envconfig(from = "TWITCH_OVERRIDES_PATH", default = "twitch_overrides.json")]
    pub twitch_overrides_path: String,

    #[envconfig(from = "CONFIG_SERVICE_URL")]
    pub config_service_url: Option<String>,

    #[envconfig(from = "NEXT_PUBLIC_SUPABASE_URL")]
    pub public_supabase_url: Option<String>,

    #[envconfig(from = "NEXT_PUBLIC_SUPABASE_ANON_KEY")]
    pub public_supabase_anon_key: Option<String>,

    #[envconfig(from = "OUTBOUND_TIMEOUT_SECS", default = "3")]
    pub outbound_timeout_secs: u64,

    /// Without both credentials live status falls back to canned data.
    #[envconfig(from = "TWITCH_CLIENT_ID")]
    pub twitch_client_id: Option<String>,

    #[envconfig(from = "TWITCH_CLIENT_SECRET")]
    pub twitch_client_secret: Option<String>,

    #[envconfig(from = "TWITCH_AUTH_URL", default = "https://id.twitch.tv/oauth2/token")]
    pub twitch_auth_url: String,

    #[envconfig(from = "TWITCH_API_URL", default = "https://api.twitch.tv/helix")]
    pub twitch_api_url: String,

    #[envconfig(from = "TWITCH_LIVE_CACHE_SECS", default = "120")]
    pub twitch_live_cache_secs: u64,
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Where the embedded database lives.
    ///
    /// `DATABASE_URL` wins when it points at SQLite; any other scheme (the
    /// hosted Postgres URL, for instance) falls back to the local file.
    pub fn sqlite_path(&self) -> PathBuf {
        let url = match self.database_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => return PathBuf::from(&self.database_path),
        };
        if let Some(path) = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            return PathBuf::from(path);
        }
        if !url.contains("://") {
            return PathBuf::from(url);
        }
        tracing::warn!(
            fallback = %self.database_path,
            "DATABASE_URL is not a SQLite URL, using the local database file"
        );
        PathBuf::from(&self.database_path)
    }
}
