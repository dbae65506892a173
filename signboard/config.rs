use crate::error::App;
use crate::feeds::FeedKind;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Player-side settings. Owned and edited by the dashboard; the player only reads them.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub city: String,
    pub kiosk: bool,
    pub muted: bool,
    pub fetch_timeout_secs: u64,
    pub log_level: String,
    pub integrations: Vec<Integration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            city: "London".to_string(),
            kiosk: false,
            muted: false,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            log_level: "info".to_string(),
            integrations: Vec::new(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Integration {
    pub feed: FeedKind,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub refresh_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Integration {
    /// Period of the repeating refetch, or `None` when this feed only gets the start-up fetch.
    /// Intervals too large for a `Duration` never fire, so they get no timer either.
    pub fn refresh_period(&self) -> Option<Duration> {
        if self.enabled && self.refresh_minutes.is_finite() && self.refresh_minutes > 0.0 {
            Duration::try_from_secs_f64(self.refresh_minutes * 60.0).ok()
        } else {
            None
        }
    }
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self, App> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub async fn load_or_create(path: &Path) -> Result<Self, App> {
        if !path.exists() {
            info!("Writing default settings to {}", path.display());
            let defaults = Settings::default();
            tokio::fs::write(path, toml::to_string_pretty(&defaults)?).await?;
            return Ok(defaults);
        }
        let content = tokio::fs::read_to_string(path).await?;
        Settings::parse(&content)
    }

    pub fn integration(&self, kind: FeedKind) -> Option<&Integration> {
        self.integrations.iter().find(|i| i.feed == kind)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn validate(&self) -> Result<(), App> {
        if self.fetch_timeout_secs == 0 {
            return Err(App::Config("fetch_timeout_secs must be positive".to_string()));
        }
        let mut seen = HashSet::new();
        for integration in &self.integrations {
            if integration.enabled
                && integration.refresh_minutes > 0.0
                && integration.refresh_period().is_none()
            {
                return Err(App::Config(format!(
                    "refresh_minutes for {} is out of range",
                    integration.feed
                )));
            }
            if !seen.insert(integration.feed) {
                return Err(App::Config(format!(
                    "integration for {} declared more than once",
                    integration.feed
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
city = "Madrid"
kiosk = true

[[integrations]]
feed = "news"
enabled = true
refresh_minutes = 15
endpoint = "http://feeds.local/news"

[[integrations]]
feed = "weather"
enabled = false
refresh_minutes = 30
"#;

    #[test]
    fn parses_integrations_and_fills_defaults() {
        let settings = Settings::parse(SAMPLE).unwrap();
        assert_eq!(settings.city, "Madrid");
        assert!(settings.kiosk);
        assert!(!settings.muted);
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(settings.integrations.len(), 2);
        assert_eq!(
            settings.integration(FeedKind::News).unwrap().endpoint.as_deref(),
            Some("http://feeds.local/news")
        );
        assert!(settings.integration(FeedKind::Sports).is_none());
    }

    #[test]
    fn refresh_period_requires_enabled_and_positive_interval() {
        let settings = Settings::parse(SAMPLE).unwrap();
        assert_eq!(
            settings.integration(FeedKind::News).unwrap().refresh_period(),
            Some(Duration::from_secs(15 * 60))
        );
        assert_eq!(
            settings.integration(FeedKind::Weather).unwrap().refresh_period(),
            None
        );

        let zero = Integration {
            feed: FeedKind::Sports,
            enabled: true,
            refresh_minutes: 0.0,
            endpoint: None,
        };
        assert_eq!(zero.refresh_period(), None);
        let negative = Integration {
            refresh_minutes: -5.0,
            ..zero.clone()
        };
        assert_eq!(negative.refresh_period(), None);
        let half = Integration {
            refresh_minutes: 0.5,
            ..zero
        };
        assert_eq!(half.refresh_period(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn sample_settings_parse() {
        let settings = Settings::parse(include_str!("../samples/settings.toml")).unwrap();
        assert_eq!(settings.integrations.len(), 3);
        assert!(settings
            .integration(FeedKind::Sports)
            .unwrap()
            .refresh_period()
            .is_none());
    }

    #[test]
    fn huge_refresh_interval_gets_no_timer() {
        let huge = Integration {
            feed: FeedKind::News,
            enabled: true,
            refresh_minutes: 1e300,
            endpoint: None,
        };
        assert_eq!(huge.refresh_period(), None);

        let content = "[[integrations]]\nfeed = \"news\"\nenabled = true\nrefresh_minutes = 1e300\n";
        assert!(matches!(Settings::parse(content), Err(App::Config(_))));
        let disabled = content.replace("enabled = true", "enabled = false");
        assert!(Settings::parse(&disabled).is_ok());
    }

    #[test]
    fn rejects_duplicate_integrations() {
        let content = r#"
[[integrations]]
feed = "sports"

[[integrations]]
feed = "sports"
"#;
        assert!(matches!(Settings::parse(content), Err(App::Config(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(matches!(
            Settings::parse("fetch_timeout_secs = 0"),
            Err(App::Config(_))
        ));
    }

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        assert_eq!(Settings::parse(&text).unwrap(), Settings::default());
    }
}
