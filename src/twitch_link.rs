pub const TWITCH_BASE_URL: &str = "https://twitch.tv";

const SCHEME_PREFIXES: [&str; 2] = ["http://", "https://"];
const HOST_PREFIXES: [&str; 2] = ["www.twitch.tv/", "twitch.tv/"];

/// Turns a raw override value into a full Twitch URL.
///
/// Full URLs are kept as they are, `twitch.tv/...` with or without `www.` gets
/// an `https://` scheme, everything else is treated as a bare username.
/// Callers are expected to skip empty values.
pub fn normalize_twitch_link(raw: &str) -> String {
    if SCHEME_PREFIXES.iter().any(|p| raw.starts_with(p)) {
        return raw.to_string();
    }
    if HOST_PREFIXES.iter().any(|p| raw.starts_with(p)) {
        return format!("https://{raw}");
    }
    twitch_link_for_username(raw.trim_start_matches('/'))
}

pub fn twitch_link_for_username(username: &str) -> String {
    format!("{TWITCH_BASE_URL}/{username}")
}
