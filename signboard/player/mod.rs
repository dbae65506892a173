pub mod audio;
pub mod frame;
pub mod gst_logic;
pub mod overlay;
pub mod playback;
pub mod playlist;
pub mod ticker;

use crate::config::Settings;
use crate::error::App;
use crate::feeds::scheduler::RefreshScheduler;
use crate::feeds::{FeedFetcher, FeedStore};
use audio::{AudioMix, AudioOutput};
use chrono::Local;
use frame::{Frame, Status};
use log::{debug, error, info, warn};
use playback::{PlaybackState, Step, TICK};
use playlist::{Playlist, Slide};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Previous,
    ToggleMute,
    SetOnline(bool),
    ReloadPlaylist,
    MediaError { index: usize, message: String },
    Exit,
}

/// Owns every piece of mutable playback state. Only `run` mutates it.
pub struct Player<F: FeedFetcher> {
    playlist: Playlist,
    playlist_path: PathBuf,
    settings: Settings,
    state: PlaybackState,
    status: Status,
    fetcher: Arc<F>,
    feeds: FeedStore,
    scheduler: Option<RefreshScheduler>,
    audio: Box<dyn AudioOutput>,
    frames: watch::Sender<Frame>,
}

impl<F: FeedFetcher> Player<F> {
    pub fn new(
        playlist: Playlist,
        playlist_path: PathBuf,
        settings: Settings,
        fetcher: Arc<F>,
        audio: Box<dyn AudioOutput>,
    ) -> Result<(Self, watch::Receiver<Frame>), App> {
        let state = PlaybackState::new(0, playlist.slides.len())?;
        let status = Status {
            muted: settings.muted,
            online: true,
            kiosk: settings.kiosk,
        };
        let feeds = FeedStore::default();
        let first = Frame::compose(
            &playlist,
            &state,
            &Default::default(),
            status,
            Local::now().time(),
        );
        let (frames, receiver) = watch::channel(first);

        Ok((
            Self {
                playlist,
                playlist_path,
                settings,
                state,
                status,
                fetcher,
                feeds,
                scheduler: None,
                audio,
                frames,
            },
            receiver,
        ))
    }

    /// Drives the slideshow until `Exit` or the stop signal, then clears every timer.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        stop_signal: watch::Sender<()>,
    ) -> Result<(), App> {
        let mut stop_receiver = stop_signal.subscribe();
        self.start_feeds();
        self.load_background();

        let mut ticker = time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut started = Instant::now();
        let mut deadline = self.slide_changed(started).await;
        ticker.reset();

        loop {
            let changed = tokio::select! {
                _ = ticker.tick() => {
                    let duration = self.current_slide().display_time();
                    match self.state.observe(started.elapsed(), duration) {
                        Step::Advanced(_) => true,
                        Step::Progress(_) => {
                            self.publish().await;
                            false
                        }
                    }
                }
                () = time::sleep_until(deadline) => {
                    self.state.advance();
                    true
                }
                command = commands.recv() => match command {
                    None => break,
                    Some(Command::Exit) if self.status.kiosk => {
                        warn!("Exit requested in kiosk mode, ignoring");
                        false
                    }
                    Some(Command::Exit) => {
                        info!("Exit requested");
                        break;
                    }
                    Some(command) => self.handle(command).await,
                },
                _ = stop_receiver.changed() => break,
            };
            if changed {
                started = Instant::now();
                deadline = self.slide_changed(started).await;
                ticker.reset();
            }
        }

        self.teardown();
        let _ = stop_signal.send(());
        Ok(())
    }

    /// Returns true when the current slide changed.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Next => {
                self.state.advance();
                true
            }
            Command::Previous => {
                self.state.retreat();
                true
            }
            Command::ToggleMute => {
                self.status.muted = !self.status.muted;
                info!("Mute {}", if self.status.muted { "on" } else { "off" });
                self.apply_audio();
                self.publish().await;
                false
            }
            Command::SetOnline(online) => {
                if online != self.status.online {
                    info!("Network is {}", if online { "online" } else { "offline" });
                }
                self.status.online = online;
                self.publish().await;
                false
            }
            Command::ReloadPlaylist => self.reload().await,
            Command::MediaError { index, message } => {
                error!("Media error on slide {index}: {message}");
                false
            }
            Command::Exit => false,
        }
    }

    async fn reload(&mut self) -> bool {
        match Playlist::load_from_file(&self.playlist_path).await {
            Ok(playlist) => match PlaybackState::new(0, playlist.slides.len()) {
                Ok(state) => {
                    info!(
                        "Switching to playlist '{}' ({} slides)",
                        playlist.name,
                        playlist.slides.len()
                    );
                    self.stop_feeds();
                    self.playlist = playlist;
                    self.state = state;
                    self.start_feeds();
                    self.load_background();
                    true
                }
                Err(e) => {
                    error!("Failed to reload playlist: {}", e);
                    false
                }
            },
            Err(e) => {
                error!("Failed to reload playlist, keeping current one: {}", e);
                false
            }
        }
    }

    fn current_slide(&self) -> &Slide {
        &self.playlist.slides[self.state.index()]
    }

    /// Announces the new slide and returns when it ends. Short slides still get one full tick on screen.
    async fn slide_changed(&mut self, started: Instant) -> Instant {
        let slide = self.current_slide();
        info!(
            "Slide {}/{} ({:?}, {}s)",
            self.state.index() + 1,
            self.state.slide_count(),
            slide.kind,
            slide.duration
        );
        let deadline = started + slide.display_time().max(TICK);
        self.apply_audio();
        self.publish().await;
        debug!("Ticker: {}", self.frames.borrow().ticker.text());
        deadline
    }

    fn apply_audio(&mut self) {
        let mix = AudioMix::resolve(
            self.playlist.background_source(),
            &self.playlist.slides[self.state.index()],
            self.status.muted,
        );
        if let Err(e) = self.audio.apply(&mix) {
            error!("Failed to apply audio mix: {}", e);
        }
    }

    fn load_background(&mut self) {
        let result = match self.playlist.background_source() {
            Some(uri) => self.audio.load(uri),
            None => self.audio.stop(),
        };
        if let Err(e) = result {
            error!("Background audio unavailable: {}", e);
        }
    }

    async fn publish(&self) {
        let board = self.feeds.board().await;
        let frame = Frame::compose(
            &self.playlist,
            &self.state,
            &board,
            self.status,
            Local::now().time(),
        );
        self.frames.send_replace(frame);
    }

    fn start_feeds(&mut self) {
        self.scheduler = Some(RefreshScheduler::start(
            &self.fetcher,
            &self.feeds,
            &self.settings,
        ));
    }

    fn stop_feeds(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.shutdown();
        }
    }

    fn teardown(&mut self) {
        self.stop_feeds();
        if let Err(e) = self.audio.stop() {
            error!("Failed to stop background audio: {}", e);
        }
        info!("Player stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::audio::tests::{Event, Recorder};
    use super::audio::{DUCKED_VOLUME, NORMAL_VOLUME};
    use super::*;
    use crate::config::Integration;
    use crate::feeds::scheduler::tests::MockFetcher;
    use crate::feeds::FeedKind;
    use crate::player::ticker::TickerContent;
    use std::time::Duration;
    use tokio::task::{self, JoinHandle};

    const SHOWCASE: &str = r#"
name = "Showcase"
background_audio = "file:///srv/music/ambient.ogg"

[[slides]]
kind = "image"
source = "https://cdn.local/a.png"
duration = 5

[[slides]]
kind = "video"
source = "https://cdn.local/b.mp4"
duration = 5
audio_enabled = true

[[slides]]
kind = "news"
duration = 5
footer_message = "SALE TODAY"
"#;

    struct Harness {
        commands: mpsc::Sender<Command>,
        frames: watch::Receiver<Frame>,
        stop: watch::Receiver<()>,
        audio: Recorder,
        fetcher: Arc<MockFetcher>,
        handle: JoinHandle<Result<(), App>>,
    }

    impl Harness {
        fn frame(&self) -> Frame {
            self.frames.borrow().clone()
        }
    }

    fn settings(kiosk: bool) -> Settings {
        Settings {
            kiosk,
            integrations: vec![Integration {
                feed: FeedKind::News,
                enabled: true,
                refresh_minutes: 1.0,
                endpoint: None,
            }],
            ..Settings::default()
        }
    }

    fn start(content: &str, path: PathBuf, settings: Settings) -> Harness {
        let audio = Recorder::default();
        let fetcher = Arc::new(MockFetcher::default());
        let playlist = Playlist::parse(content).unwrap();
        let (player, frames) = Player::new(
            playlist,
            path,
            settings,
            Arc::clone(&fetcher),
            Box::new(audio.clone()),
        )
        .unwrap();
        let (commands, receiver) = mpsc::channel(8);
        let (stop_sender, stop) = watch::channel(());
        let handle = task::spawn(player.run(receiver, stop_sender));
        Harness {
            commands,
            frames,
            stop,
            audio,
            fetcher,
            handle,
        }
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("signboard-{}-{name}.toml", std::process::id()))
    }

    #[tokio::test(start_paused = true)]
    async fn sixteen_seconds_lands_in_second_cycle() {
        let harness = start(SHOWCASE, scratch_path("cycle"), settings(false));

        time::sleep(Duration::from_secs(16)).await;

        let frame = harness.frame();
        assert_eq!(frame.index, 0);
        assert!((frame.progress - 20.0).abs() <= 2.0 + 1e-9, "{}", frame.progress);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_slides_change_once_per_tick() {
        let flash = "[[slides]]\nkind = \"image\"\nduration = 0\n\n[[slides]]\nkind = \"image\"\nduration = 0\n";
        let harness = start(flash, scratch_path("flash"), settings(false));

        time::sleep(Duration::from_secs(1)).await;

        let changes = harness
            .audio
            .events()
            .iter()
            .filter(|event| matches!(event, Event::Apply(_)))
            .count();
        assert!((8..=12).contains(&changes), "{changes} slide changes in 1s");
        assert!(!harness.handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn progress_tracks_time_on_screen() {
        let harness = start(SHOWCASE, scratch_path("clock"), settings(false));

        time::sleep(Duration::from_millis(2550)).await;

        let frame = harness.frame();
        assert_eq!(frame.index, 0);
        assert!((frame.progress - 50.0).abs() <= 2.0 + 1e-9, "{}", frame.progress);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_refresh_interval_keeps_playing() {
        let mut settings = settings(false);
        settings.integrations[0].refresh_minutes = 1e300;
        let harness = start(SHOWCASE, scratch_path("huge"), settings);

        time::sleep(Duration::from_secs(6)).await;

        assert!(!harness.handle.is_finished());
        assert_eq!(harness.frame().index, 1);
        assert_eq!(harness.fetcher.calls(FeedKind::News), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn background_ducks_under_video_and_pauses_on_mute() {
        let harness = start(SHOWCASE, scratch_path("duck"), settings(false));

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            harness.audio.events().first(),
            Some(&Event::Load("file:///srv/music/ambient.ogg".to_string()))
        );
        assert_eq!(harness.audio.last_mix().unwrap().background, Some(NORMAL_VOLUME));

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(harness.frame().index, 1);
        assert_eq!(harness.audio.last_mix().unwrap().background, Some(DUCKED_VOLUME));

        harness.commands.send(Command::ToggleMute).await.unwrap();
        time::sleep(Duration::from_millis(50)).await;
        let mix = harness.audio.last_mix().unwrap();
        assert_eq!(mix.background, None);
        assert!(mix.video_muted);
        assert!(harness.frame().muted);
    }

    #[tokio::test(start_paused = true)]
    async fn footer_override_wins_over_loaded_news() {
        let harness = start(SHOWCASE, scratch_path("footer"), settings(false));

        time::sleep(Duration::from_secs(11)).await;

        let frame = harness.frame();
        assert_eq!(frame.index, 2);
        assert_eq!(
            frame.ticker.content,
            TickerContent::Override("SALE TODAY".to_string())
        );

        harness.commands.send(Command::Next).await.unwrap();
        time::sleep(Duration::from_millis(50)).await;
        let frame = harness.frame();
        assert_eq!(frame.index, 0);
        assert!(matches!(frame.ticker.content, TickerContent::Feeds(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn media_error_does_not_stall_playback() {
        let harness = start(SHOWCASE, scratch_path("media"), settings(false));

        harness
            .commands
            .send(Command::MediaError {
                index: 0,
                message: "decoder failed".to_string(),
            })
            .await
            .unwrap();
        time::sleep(Duration::from_millis(5100)).await;

        assert_eq!(harness.frame().index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connectivity_and_manual_navigation() {
        let harness = start(SHOWCASE, scratch_path("nav"), settings(false));

        harness.commands.send(Command::SetOnline(false)).await.unwrap();
        harness.commands.send(Command::Previous).await.unwrap();
        time::sleep(Duration::from_millis(50)).await;

        let frame = harness.frame();
        assert!(!frame.online);
        assert_eq!(frame.index, 2);
        assert!(frame.progress.abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn exit_clears_every_timer() {
        let mut harness = start(SHOWCASE, scratch_path("exit"), settings(false));
        time::sleep(Duration::from_secs(1)).await;
        let news_calls = harness.fetcher.calls(FeedKind::News);

        harness.commands.send(Command::Exit).await.unwrap();
        harness.stop.changed().await.unwrap();
        harness.handle.await.unwrap().unwrap();

        assert_eq!(harness.audio.events().last(), Some(&Event::Stop));
        time::sleep(Duration::from_secs(600)).await;
        assert_eq!(harness.fetcher.calls(FeedKind::News), news_calls);
    }

    #[tokio::test(start_paused = true)]
    async fn kiosk_mode_ignores_exit() {
        let harness = start(SHOWCASE, scratch_path("kiosk"), settings(true));

        harness.commands.send(Command::Exit).await.unwrap();
        time::sleep(Duration::from_secs(6)).await;

        assert!(!harness.handle.is_finished());
        assert_eq!(harness.frame().index, 1);
        assert!(!harness.frame().exit_available);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_switches_playlist_and_restarts_feeds() {
        let path = scratch_path("reload");
        let harness = start(SHOWCASE, path.clone(), settings(false));
        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(harness.frame().index, 1);

        tokio::fs::write(&path, "name = \"Empty\"").await.unwrap();
        harness.commands.send(Command::ReloadPlaylist).await.unwrap();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(harness.frame().playlist, "Showcase");

        tokio::fs::write(
            &path,
            "name = \"Night\"\n[[slides]]\nkind = \"weather\"\nduration = 30\n",
        )
        .await
        .unwrap();
        let calls_before = harness.fetcher.calls(FeedKind::Weather);
        harness.commands.send(Command::ReloadPlaylist).await.unwrap();
        time::sleep(Duration::from_millis(50)).await;

        let frame = harness.frame();
        assert_eq!(frame.playlist, "Night");
        assert_eq!(frame.index, 0);
        assert_eq!(frame.total, 1);
        assert_eq!(harness.fetcher.calls(FeedKind::Weather), calls_before + 1);
        assert_eq!(harness.audio.events().last(), Some(&Event::Apply(frame.audio)));
        assert!(harness.audio.events().contains(&Event::Stop));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
