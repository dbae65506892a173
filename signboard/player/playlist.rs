use crate::error::App;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_SLIDE_SECS: u32 = 10;
const DEFAULT_TICKER_SECS: u32 = 20;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Weather,
    News,
    Sports,
    Lottery,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct OverlayStyle {
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub bold: Option<bool>,
    pub size: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Slide {
    pub kind: MediaKind,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_slide_secs")]
    pub duration: u32,
    #[serde(default)]
    pub overlay_text: Option<String>,
    #[serde(default)]
    pub style: Option<OverlayStyle>,
    #[serde(default)]
    pub footer_message: Option<String>,
    #[serde(default)]
    pub audio_enabled: bool,
}

impl Slide {
    pub fn display_time(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration))
    }

    pub fn footer_override(&self) -> Option<&str> {
        self.footer_message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Daily window in which the playlist is meant to be on air. Wraps past midnight when `start > end`.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct ActiveWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                .unwrap_or(NaiveTime::MIN),
        }
    }
}

impl ActiveWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Playlist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub schedule: ActiveWindow,
    #[serde(default)]
    pub background_audio: Option<String>,
    #[serde(default = "default_ticker_secs")]
    pub ticker_speed: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Playlist {
    pub fn parse(content: &str) -> Result<Self, App> {
        let playlist: Playlist = toml::from_str(content)?;
        if playlist.slides.is_empty() {
            return Err(App::EmptyPlaylist(format!(
                "'{}' contains no slides",
                playlist.name
            )));
        }
        if !playlist.active {
            return Err(App::EmptyPlaylist(format!(
                "'{}' is not active",
                playlist.name
            )));
        }
        Ok(playlist)
    }

    pub async fn load_from_file(file_path: &Path) -> Result<Self, App> {
        log::info!("Loading playlist from {}", file_path.display());
        let content = tokio::fs::read_to_string(file_path).await?;
        Playlist::parse(&content)
    }

    pub fn background_source(&self) -> Option<&str> {
        self.background_audio
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

fn default_slide_secs() -> u32 {
    DEFAULT_SLIDE_SECS
}

fn default_ticker_secs() -> u32 {
    DEFAULT_TICKER_SECS
}

fn default_active() -> bool {
    true
}
