use crate::error::App;
use crate::player::frame::Frame;
use crate::player::Command;
use log::info;
use tokio::sync::{mpsc, watch};
use zbus::{connection, fdo, interface};

pub const BUS_NAME: &str = "org.signboard.Player";
pub const OBJECT_PATH: &str = "/org/signboard/Player";

#[derive(Clone)]
pub struct PlayerDBus {
    tx: mpsc::Sender<Command>,
    frames: watch::Receiver<Frame>,
    kiosk: bool,
}

impl PlayerDBus {
    pub fn new(tx: mpsc::Sender<Command>, frames: watch::Receiver<Frame>, kiosk: bool) -> Self {
        Self { tx, frames, kiosk }
    }

    async fn send(&self, command: Command) -> fdo::Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }
}

#[interface(name = "org.signboard.Player")]
impl PlayerDBus {
    async fn test_connection(&self) -> fdo::Result<()> {
        Ok(())
    }

    async fn next(&self) -> fdo::Result<()> {
        self.send(Command::Next).await
    }

    async fn previous(&self) -> fdo::Result<()> {
        self.send(Command::Previous).await
    }

    async fn toggle_mute(&self) -> fdo::Result<()> {
        self.send(Command::ToggleMute).await
    }

    /// Pushed by the platform's network notifier.
    async fn set_online(&self, online: bool) -> fdo::Result<()> {
        self.send(Command::SetOnline(online)).await
    }

    async fn reload_playlist(&self) -> fdo::Result<()> {
        self.send(Command::ReloadPlaylist).await
    }

    /// Called by the display surface when a slide's image or video fails to decode.
    async fn report_media_error(&self, index: u32, message: String) -> fdo::Result<()> {
        self.send(Command::MediaError {
            index: index as usize,
            message,
        })
        .await
    }

    async fn exit(&self) -> fdo::Result<()> {
        if self.kiosk {
            return Err(fdo::Error::AccessDenied(
                "exit is disabled in kiosk mode".to_string(),
            ));
        }
        self.send(Command::Exit).await
    }

    async fn current_frame(&self) -> fdo::Result<String> {
        let frame = self.frames.borrow().clone();
        serde_json::to_string(&frame).map_err(|e| fdo::Error::Failed(e.to_string()))
    }
}

pub async fn run_dbus_server(
    player_dbus: PlayerDBus,
    stop_signal: watch::Sender<()>,
) -> Result<(), App> {
    let _connection = connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, player_dbus)?
        .build()
        .await?;

    let mut stop_receiver = stop_signal.subscribe();
    let _ = stop_receiver.changed().await;
    info!("Stop signal received, shutting down DBus server...");

    Ok(())
}
