use crate::feeds::{FeedBoard, NewsItem, SportsMatch, Weather};
use crate::player::audio::AudioMix;
use crate::player::overlay::{self, ResolvedStyle};
use crate::player::playback::PlaybackState;
use crate::player::playlist::{MediaKind, Playlist};
use crate::player::ticker::{self, Ticker};
use chrono::NaiveTime;
use serde::Serialize;

/// Player-wide flags that are not part of the playlist.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub muted: bool,
    pub online: bool,
    pub kiosk: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum WidgetView {
    Weather(Option<Weather>),
    News(Vec<NewsItem>),
    Sports(Vec<SportsMatch>),
    Lottery,
}

/// Everything a display surface needs to draw the current moment of the slideshow.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Frame {
    pub playlist: String,
    pub index: usize,
    pub total: usize,
    pub progress: f64,
    pub kind: MediaKind,
    pub source: Option<String>,
    pub widget: Option<WidgetView>,
    pub overlay_text: Option<String>,
    pub style: ResolvedStyle,
    pub audio: AudioMix,
    pub ticker: Ticker,
    pub muted: bool,
    pub online: bool,
    pub on_air: bool,
    pub exit_available: bool,
}

impl Frame {
    pub fn compose(
        playlist: &Playlist,
        state: &PlaybackState,
        board: &FeedBoard,
        status: Status,
        now: NaiveTime,
    ) -> Self {
        let slide = &playlist.slides[state.index()];
        let widget = match slide.kind {
            MediaKind::Image | MediaKind::Video => None,
            MediaKind::Weather => Some(WidgetView::Weather(board.weather.clone())),
            MediaKind::News => Some(WidgetView::News(board.news.clone())),
            MediaKind::Sports => Some(WidgetView::Sports(board.sports.clone())),
            MediaKind::Lottery => Some(WidgetView::Lottery),
        };
        Self {
            playlist: playlist.name.clone(),
            index: state.index(),
            total: state.slide_count(),
            progress: state.progress(),
            kind: slide.kind,
            source: slide.source.clone(),
            widget,
            overlay_text: slide.overlay_text.clone(),
            style: overlay::resolve(slide),
            audio: AudioMix::resolve(playlist.background_source(), slide, status.muted),
            ticker: ticker::select(slide, board, playlist.ticker_speed),
            muted: status.muted,
            online: status.online,
            on_air: playlist.schedule.contains(now),
            exit_available: !status.kiosk,
        }
    }
}
