lazy_static! {
    /// Checked after scraping and overrides; the first matching rule wins.
    pub static ref LINK_RULES: Vec<LinkRule> = vec![
        // Scrapes and overrides both kept getting this one wrong
        LinkRule::exact_player("LG_Naughty", "https://www.twitch.tv/Naughty"),
    ];
}

type PlayerPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// A fixed Twitch link for every player the predicate accepts.
pub struct LinkRule {
    label: String,
    predicate: PlayerPredicate,
    twitch_link: String,
}

impl std::fmt::Debug for LinkRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkRule")
            .field("label", &self.label)
            .field("twitch_link", &self.twitch_link)
            .finish()
    }
}

impl LinkRule {
    pub fn new(
        label: &str,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        twitch_link: &str,
    ) -> Self {
        Self {
            label: label.into(),
            predicate: Box::new(predicate),
            twitch_link: twitch_link.into(),
        }
    }

    /// Case-sensitive match on the player name.
    pub fn exact_player(player_name: &str, twitch_link: &str) -> Self {
        let wanted = player_name.to_string();
        Self::new(player_name, move |name| name == wanted, twitch_link)
    }

    pub fn applies_to(&self, player_name: &str) -> bool {
        (self.predicate)(player_name)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn twitch_link(&self) -> &str {
        &self.twitch_link
    }
}

pub fn first_matching_rule<'a>(rules: &'a [LinkRule], player_name: &str) -> Option<&'a LinkRule> {
    rules.iter().find(|rule| rule.applies_to(player_name))
}
