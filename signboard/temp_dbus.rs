use crate::dbus::{BUS_NAME, OBJECT_PATH};
use crate::error::App;
use log::info;
use tokio::sync::mpsc;
use zbus::{connection, fdo, interface, Connection};

/// Why the standby interface woke the daemon up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Reload,
    Exit,
}

/// Served under the player's bus name while there is no playable playlist, so `sbctl` can
/// still check on the daemon, ask it to retry the playlist or make it leave.
pub struct StandbyDBus {
    wake: mpsc::Sender<Wake>,
    kiosk: bool,
}

impl StandbyDBus {
    async fn wake(&self, reason: Wake) -> fdo::Result<()> {
        self.wake
            .send(reason)
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }
}

#[interface(name = "org.signboard.Player")]
impl StandbyDBus {
    async fn test_connection(&self) -> fdo::Result<()> {
        Ok(())
    }

    async fn reload_playlist(&self) -> fdo::Result<()> {
        self.wake(Wake::Reload).await
    }

    async fn exit(&self) -> fdo::Result<()> {
        if self.kiosk {
            return Err(fdo::Error::AccessDenied(
                "exit is disabled in kiosk mode".to_string(),
            ));
        }
        self.wake(Wake::Exit).await
    }

    /// Nothing is on screen yet.
    async fn current_frame(&self) -> fdo::Result<String> {
        Ok("null".to_string())
    }
}

pub struct Standby {
    connection: Connection,
    wakes: mpsc::Receiver<Wake>,
}

impl Standby {
    pub async fn serve(kiosk: bool) -> Result<Self, App> {
        let (wake, wakes) = mpsc::channel(4);
        let connection = connection::Builder::session()?
            .name(BUS_NAME)?
            .serve_at(OBJECT_PATH, StandbyDBus { wake, kiosk })?
            .build()
            .await?;
        info!("No playable playlist, waiting on DBus for a reload");
        Ok(Self { connection, wakes })
    }

    pub async fn next_wake(&mut self) -> Wake {
        self.wakes.recv().await.unwrap_or(Wake::Exit)
    }

    /// Gives the bus name back so the player interface can take it over.
    pub async fn release(self) -> Result<(), App> {
        self.connection.release_name(BUS_NAME).await?;
        Ok(())
    }
}
