use regex::Regex;

lazy_static! {
    // NOTE: Order matters, the first pattern that matches anywhere in the input wins
    static ref USERNAME_REGEXPS: Vec<Regex> = vec![
        Regex::new(r"apexlegendsstatus\.com/core/out\?type=twitch&id=([a-zA-Z0-9_]+)").unwrap(),
        Regex::new(r"(?:https?://)?(?:www\.)?twitch\.tv/([a-zA-Z0-9_]+)").unwrap(),
        // Fallback: the input is (or starts with) a bare username
        Regex::new(r"([a-zA-Z0-9_]+)").unwrap(),
    ];

    // NOTE: Longer tokens have to come before the shorter ones they contain ("InMatch" before "In")
    static ref STATUS_SUFFIX_REGEXPS: Vec<Regex> = STATUS_SUFFIXES
        .iter()
        .map(|suffix| Regex::new(&format!(r"(?i)_?{suffix}$")).unwrap())
        .collect();
}

pub const STATUS_SUFFIXES: [&str; 9] = [
    "InMatch",
    "InLobby",
    "Offline",
    "Lobby",
    "In",
    "Match",
    "Playing",
    "History",
    "Performance",
];

/// Extracts a Twitch username from a link or a bare name.
///
/// Recognizes `apexlegendsstatus.com` redirect links and `twitch.tv` links
/// with or without scheme and `www.`. Anything else falls through to the
/// first run of word characters, so nearly every non-empty input yields a
/// username; `None` is only returned for empty input or input without a
/// single `[a-zA-Z0-9_]` character.
pub fn extract_twitch_username(link: &str) -> Option<String> {
    if link.is_empty() {
        return None;
    }
    USERNAME_REGEXPS
        .iter()
        .filter_map(|re| re.captures(link))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .next()
}

/// Removes live-status words that scraped names pick up, e.g.
/// `RogueOffline` -> `Rogue`, `ZeekoTV_InMatch` -> `ZeekoTV`.
///
/// Each suffix in [`STATUS_SUFFIXES`] is tried once, in order, against the
/// already shortened name.
pub fn strip_status_suffix(username: &str) -> String {
    STATUS_SUFFIX_REGEXPS
        .iter()
        .fold(username.to_string(), |name, re| re.replace(&name, "").to_string())
}
