use std::{fmt, str::FromStr};

use crate::{config::CustomizationConfig, error::NoReelError};

/// One hideable entry point of the site's navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Reels,
    Shop,
    Explore,
    Threads,
}

impl Section {
    /// Registry order. Rules, signatures and the generated script all follow it.
    pub const ALL: [Section; 4] = [
        Section::Reels,
        Section::Shop,
        Section::Explore,
        Section::Threads,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Section::Reels => "/reels/",
            Section::Shop => "/shop/",
            Section::Explore => "/explore/",
            Section::Threads => "/threads_app/",
        }
    }

    /// Key under which the flag is persisted.
    pub fn pref_key(self) -> &'static str {
        match self {
            Section::Reels => "pref_hide_reels",
            Section::Shop => "pref_hide_shop",
            Section::Explore => "pref_hide_explore",
            Section::Threads => "pref_hide_threads",
        }
    }

    /// Field name in the config JSON handed to the page.
    pub fn config_key(self) -> &'static str {
        match self {
            Section::Reels => "hideReels",
            Section::Shop => "hideShop",
            Section::Explore => "hideExplore",
            Section::Threads => "hideThreads",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Section::Reels => "reels",
            Section::Shop => "shop",
            Section::Explore => "explore",
            Section::Threads => "threads",
        }
    }

    pub fn from_pref_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.pref_key() == key)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Section {
    type Err = NoReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|section| section.name() == wanted)
            .ok_or_else(|| NoReelError::UnknownSection(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub section: Section,
    pub enabled: bool,
    pub path: &'static str,
}

/// Compiles a config into its four rules, in registry order.
pub fn registry(config: &CustomizationConfig) -> [Rule; 4] {
    Section::ALL.map(|section| Rule {
        section,
        enabled: config.hides(section),
        path: section.path(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_fixed_and_ordered() {
        let config = CustomizationConfig {
            hide_reels: false,
            hide_shop: true,
            hide_explore: false,
            hide_threads: true,
        };
        let rules = registry(&config);

        let paths: Vec<_> = rules.iter().map(|r| r.path).collect();
        assert_eq!(paths, ["/reels/", "/shop/", "/explore/", "/threads_app/"]);

        let enabled: Vec<_> = rules.iter().map(|r| r.enabled).collect();
        assert_eq!(enabled, [false, true, false, true]);
    }

    #[test]
    fn paths_are_disjoint() {
        let rules = registry(&CustomizationConfig::default());
        for (i, a) in rules.iter().enumerate() {
            for b in &rules[i + 1..] {
                assert_ne!(a.path, b.path);
            }
        }
    }

    #[test]
    fn section_parsing() {
        assert_eq!("Reels".parse::<Section>().ok(), Some(Section::Reels));
        assert_eq!(" threads ".parse::<Section>().ok(), Some(Section::Threads));
        assert!(matches!(
            "stories".parse::<Section>(),
            Err(NoReelError::UnknownSection(name)) if name == "stories"
        ));
        assert_eq!(
            Section::from_pref_key("pref_hide_shop"),
            Some(Section::Shop)
        );
        assert_eq!(Section::from_pref_key("pref_clear_data"), None);
    }
}
