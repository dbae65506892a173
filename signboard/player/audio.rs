use crate::error::App;
use crate::player::playlist::{MediaKind, Slide};
use serde::Serialize;

/// Background volume while a video plays its own soundtrack.
pub const DUCKED_VOLUME: f64 = 0.1;
pub const NORMAL_VOLUME: f64 = 0.4;

/// What every audio source should be doing while a given slide is on screen.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct AudioMix {
    /// Background volume, `None` when background audio must be paused.
    pub background: Option<f64>,
    pub video_muted: bool,
}

impl AudioMix {
    pub fn resolve(background_source: Option<&str>, slide: &Slide, muted: bool) -> Self {
        let video_with_sound = slide.kind == MediaKind::Video && slide.audio_enabled;
        let background = match background_source {
            Some(_) if !muted => Some(if video_with_sound {
                DUCKED_VOLUME
            } else {
                NORMAL_VOLUME
            }),
            _ => None,
        };
        Self {
            background,
            video_muted: !slide.audio_enabled || muted,
        }
    }
}

/// Sink for the playlist's background track.
pub trait AudioOutput: Send + Sync {
    fn load(&mut self, uri: &str) -> Result<(), App>;
    fn apply(&mut self, mix: &AudioMix) -> Result<(), App>;
    fn stop(&mut self) -> Result<(), App>;
}

/// Used when a playlist has no background track or GStreamer is unavailable.
pub struct Silent;

impl AudioOutput for Silent {
    fn load(&mut self, _uri: &str) -> Result<(), App> {
        Ok(())
    }

    fn apply(&mut self, _mix: &AudioMix) -> Result<(), App> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), App> {
        Ok(())
    }
}
