use crate::link_rules::{first_matching_rule, LinkRule};
use crate::override_store::OverrideMap;
use crate::twitch_link::{normalize_twitch_link, twitch_link_for_username};
use crate::twitch_username::{extract_twitch_username, strip_status_suffix};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSource {
    Scraped,
    Override,
    Rule,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPlayer {
    pub player_name: String,
    pub display_name: String,
    pub twitch_link: Option<String>,
    pub twitch_username: Option<String>,
    pub source: LinkSource,
}

/// Cleans up a scraped link into `https://twitch.tv/<user>`.
///
/// Scraped usernames tend to have the player's live status glued on; if
/// stripping that would leave nothing, the unstripped name is kept.
pub fn scraped_twitch_link(raw: &str) -> Option<String> {
    let username = extract_twitch_username(raw.trim())?;
    let stripped = strip_status_suffix(&username);
    let username = if stripped.is_empty() { username } else { stripped };
    Some(twitch_link_for_username(&username))
}

/// Scraped link, then manual override, then the fixed rules.
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver<'a> {
    overrides: &'a OverrideMap,
    rules: &'a [LinkRule],
}

impl<'a> LinkResolver<'a> {
    pub fn new(overrides: &'a OverrideMap, rules: &'a [LinkRule]) -> Self {
        Self { overrides, rules }
    }

    pub fn resolve(&self, player_name: &str, scraped_link: Option<&str>) -> ResolvedPlayer {
        let mut display_name = player_name.to_string();
        let mut twitch_link = scraped_link.and_then(scraped_twitch_link);
        let mut source = match twitch_link {
            Some(_) => LinkSource::Scraped,
            None => LinkSource::None,
        };

        if let Some(entry) = self.overrides.get(player_name) {
            if !entry.twitch_link.trim().is_empty() {
                twitch_link = Some(normalize_twitch_link(entry.twitch_link.trim()));
                source = LinkSource::Override;
            }
            if let Some(name) = entry.display_name.as_deref().filter(|n| !n.is_empty()) {
                display_name = name.to_string();
            }
        }

        if let Some(rule) = first_matching_rule(self.rules, player_name) {
            tracing::debug!(player_name, rule = rule.label(), "fixed twitch link rule applied");
            twitch_link = Some(rule.twitch_link().to_string());
            source = LinkSource::Rule;
        }

        let twitch_username = twitch_link.as_deref().and_then(extract_twitch_username);
        ResolvedPlayer {
            player_name: player_name.to_string(),
            display_name,
            twitch_link,
            twitch_username,
            source,
        }
    }
}
