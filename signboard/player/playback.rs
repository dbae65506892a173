use crate::error::App;
use std::time::Duration;

/// Fixed progress tick of the playback loop.
pub const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Progress(f64),
    Advanced(usize),
}

/// Position of the slideshow: which slide is current and how far through it we are.
///
/// `index` always stays below `len` and `progress` always stays within `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    index: usize,
    len: usize,
    elapsed: Duration,
    progress: f64,
}

impl PlaybackState {
    pub fn new(start_index: usize, len: usize) -> Result<Self, App> {
        if len == 0 {
            return Err(App::EmptyPlaylist("nothing to play".to_string()));
        }
        Ok(Self {
            index: start_index % len,
            len,
            elapsed: Duration::ZERO,
            progress: 0.0,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slide_count(&self) -> usize {
        self.len
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Updates progress from the time the current slide has been on screen.
    /// Reaching 100% moves to the next slide at once. Progress never moves backwards within a slide.
    pub fn observe(&mut self, elapsed: Duration, slide_duration: Duration) -> Step {
        self.elapsed = self.elapsed.max(elapsed);
        let progress = if slide_duration.is_zero() {
            100.0
        } else {
            (self.elapsed.as_secs_f64() / slide_duration.as_secs_f64() * 100.0).min(100.0)
        };
        if progress >= 100.0 {
            Step::Advanced(self.advance())
        } else {
            self.progress = progress;
            Step::Progress(progress)
        }
    }

    pub fn advance(&mut self) -> usize {
        self.index = (self.index + 1) % self.len;
        self.reset_clock();
        self.index
    }

    pub fn retreat(&mut self) -> usize {
        self.index = (self.index + self.len - 1) % self.len;
        self.reset_clock();
        self.index
    }

    fn reset_clock(&mut self) {
        self.elapsed = Duration::ZERO;
        self.progress = 0.0;
    }
}
