mod config;
mod dbus;
mod error;
mod feeds;
mod player;
mod temp_dbus;

use crate::config::Settings;
use crate::dbus::PlayerDBus;
use crate::error::App;
use crate::feeds::http::HttpFetcher;
use crate::player::audio::{AudioOutput, Silent};
use crate::player::gst_logic::Background;
use crate::player::playlist::Playlist;
use crate::player::Player;
use crate::temp_dbus::{Standby, Wake};
use clap::Parser;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{mpsc, watch};
use tokio::task;

#[derive(Parser)]
#[command(
    name = "signboard",
    about = "Run the signage player on this screen.",
    version
)]
struct Args {
    #[arg(short = 's', long = "settings", help = "Settings file to use")]
    settings: Option<PathBuf>,
    #[arg(short = 'p', long = "playlist", help = "Playlist file to play")]
    playlist: Option<PathBuf>,
    #[arg(short = 'k', long = "kiosk", help = "Unattended mode, exit requests are refused")]
    kiosk: bool,
    #[arg(short = 'v', long = "verbose", help = "Also log to stderr")]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), App> {
    let args = Args::parse();
    let home_dir = std::env::var("HOME")
        .map_err(|e| App::Io(format!("Failed to get HOME environment variable: {e}")))?;

    let base_dir = PathBuf::from(format!("{home_dir}/.config/signboard"));
    let log_dir = base_dir.join("logs");
    let playlist_dir = base_dir.join("playlists");
    for dir in [&log_dir, &playlist_dir] {
        fs::create_dir_all(dir).await?;
    }

    let settings_path = args
        .settings
        .unwrap_or_else(|| base_dir.join("settings.toml"));
    let mut settings = Settings::load_or_create(&settings_path).await?;
    settings.kiosk |= args.kiosk;

    let _logger = Logger::try_with_str(&settings.log_level)?
        .log_to_file(FileSpec::default().directory(&log_dir))
        .rotate(
            Criterion::Size(1_000_000),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(3),
        )
        .duplicate_to_stderr(if args.verbose {
            Duplicate::Info
        } else {
            Duplicate::None
        })
        .start()?;

    let playlist_path = args
        .playlist
        .unwrap_or_else(|| playlist_dir.join("playlist.toml"));
    if !playlist_path.exists() {
        fs::write(&playlist_path, "").await?;
    }

    let Some(playlist) = load_playable(&playlist_path, settings.kiosk).await? else {
        info!("Exit requested before anything was playable");
        return Ok(());
    };

    let fetcher = Arc::new(HttpFetcher::new(&settings)?);
    let audio: Box<dyn AudioOutput> = match Background::new() {
        Ok(background) => Box::new(background),
        Err(e) => {
            warn!("Background audio disabled: {}", e);
            Box::new(Silent)
        }
    };
    let kiosk = settings.kiosk;
    let (player, frames) = Player::new(playlist, playlist_path, settings, fetcher, audio)?;

    let (command_sender, command_receiver) = mpsc::channel(8);
    let (stop_sender, stop_receiver) = watch::channel(());

    task::spawn({
        let player_dbus = PlayerDBus::new(command_sender, frames, kiosk);
        let stop_signal = stop_sender.clone();
        async move {
            if let Err(e) = dbus::run_dbus_server(player_dbus, stop_signal).await {
                error!("DBus server error: {}", e);
            }
        }
    });

    task::spawn({
        let stop_signal = stop_sender.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, shutting down");
                let _ = stop_signal.send(());
            }
        }
    });

    let player_task = task::spawn(player.run(command_receiver, stop_sender));
    wait_for_stop_signal(stop_receiver).await;

    match player_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Player stopped with error: {}", e),
        Err(e) => error!("Player task failed: {}", e),
    }
    Ok(())
}

async fn wait_for_stop_signal(mut stop_receiver: watch::Receiver<()>) {
    let _ = stop_receiver.changed().await;
}

/// Loads the playlist. While it is not playable, parks on the standby DBus interface and retries
/// on every reload request until one succeeds or an exit is asked for.
async fn load_playable(path: &Path, kiosk: bool) -> Result<Option<Playlist>, App> {
    match Playlist::load_from_file(path).await {
        Ok(playlist) => return Ok(Some(playlist)),
        Err(e @ (App::EmptyPlaylist(_) | App::Toml(_))) => warn!("{}", e),
        Err(e) => return Err(e),
    }

    let mut standby = Standby::serve(kiosk).await?;
    let playlist = loop {
        let wake = tokio::select! {
            wake = standby.next_wake() => wake,
            _ = tokio::signal::ctrl_c() => Wake::Exit,
        };
        match wake {
            Wake::Exit => break None,
            Wake::Reload => match Playlist::load_from_file(path).await {
                Ok(playlist) => break Some(playlist),
                Err(e) => warn!("Playlist still not playable: {}", e),
            },
        }
    };
    standby.release().await?;
    Ok(playlist)
}
