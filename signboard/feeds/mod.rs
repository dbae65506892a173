pub mod http;
pub mod scheduler;

use crate::error::App;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    News,
    Weather,
    Sports,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [FeedKind::News, FeedKind::Weather, FeedKind::Sports];
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedKind::News => "news",
            FeedKind::Weather => "weather",
            FeedKind::Sports => "sports",
        };
        f.write_str(name)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub source: String,
    pub headline: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub day: String,
    pub temperature: f64,
    pub condition: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub city: String,
    pub temperature: f64,
    pub condition: String,
    #[serde(default)]
    pub forecast: Vec<Forecast>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    Live,
    Finished,
    Scheduled,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStatus::Live => "LIVE",
            MatchStatus::Finished => "FINISHED",
            MatchStatus::Scheduled => "SCHEDULED",
        };
        f.write_str(label)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SportsMatch {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub status: MatchStatus,
    #[serde(default)]
    pub league: String,
}

/// Result of one successful poll. Each variant replaces that feed wholesale.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedSnapshot {
    News(Vec<NewsItem>),
    Weather(Option<Weather>),
    Sports(Vec<SportsMatch>),
}

impl FeedSnapshot {
    pub fn kind(&self) -> FeedKind {
        match self {
            FeedSnapshot::News(_) => FeedKind::News,
            FeedSnapshot::Weather(_) => FeedKind::Weather,
            FeedSnapshot::Sports(_) => FeedKind::Sports,
        }
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct FeedBoard {
    pub news: Vec<NewsItem>,
    pub weather: Option<Weather>,
    pub sports: Vec<SportsMatch>,
}

impl FeedBoard {
    pub fn apply(&mut self, snapshot: FeedSnapshot) {
        match snapshot {
            FeedSnapshot::News(items) => self.news = items,
            FeedSnapshot::Weather(weather) => self.weather = weather,
            FeedSnapshot::Sports(matches) => self.sports = matches,
        }
    }
}

/// Latest snapshot of every feed, written by the refresh tasks and read by the player.
#[derive(Clone, Debug, Default)]
pub struct FeedStore(Arc<RwLock<FeedBoard>>);

impl FeedStore {
    pub async fn apply(&self, snapshot: FeedSnapshot) {
        self.0.write().await.apply(snapshot);
    }

    pub async fn board(&self) -> FeedBoard {
        self.0.read().await.clone()
    }
}

pub trait FeedFetcher: Send + Sync + 'static {
    fn fetch(&self, kind: FeedKind) -> impl Future<Output = Result<FeedSnapshot, App>> + Send;
}
