use crate::feeds::{FeedBoard, SportsMatch, Weather};
use crate::player::playlist::Slide;
use serde::Serialize;

pub const SEPARATOR: &str = "  •  ";

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "mode", content = "segments", rename_all = "lowercase")]
pub enum TickerContent {
    /// The slide's own footer text. Suppresses every feed.
    Override(String),
    Feeds(Vec<String>),
    Empty,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Ticker {
    pub content: TickerContent,
    pub scroll_secs: u32,
}

impl Ticker {
    pub fn text(&self) -> String {
        match &self.content {
            TickerContent::Override(text) => text.clone(),
            TickerContent::Feeds(segments) => segments.join(SEPARATOR),
            TickerContent::Empty => String::new(),
        }
    }
}

pub fn select(slide: &Slide, board: &FeedBoard, scroll_secs: u32) -> Ticker {
    let content = match slide.footer_override() {
        Some(text) => TickerContent::Override(text.to_string()),
        None => feed_segments(board),
    };
    Ticker {
        content,
        scroll_secs,
    }
}

fn feed_segments(board: &FeedBoard) -> TickerContent {
    let mut segments: Vec<String> = board
        .news
        .iter()
        .map(|item| format!("{}: {}", item.source, item.headline))
        .collect();
    if let Some(result) = board.sports.first() {
        segments.push(match_line(result));
    }
    if let Some(weather) = &board.weather {
        segments.push(weather_line(weather));
    }
    if segments.is_empty() {
        TickerContent::Empty
    } else {
        TickerContent::Feeds(segments)
    }
}

fn match_line(result: &SportsMatch) -> String {
    format!(
        "{} {} - {} {} ({})",
        result.home_team, result.home_score, result.away_score, result.away_team, result.status
    )
}

fn weather_line(weather: &Weather) -> String {
    format!(
        "{} {:.0}°C {}",
        weather.city, weather.temperature, weather.condition
    )
}
