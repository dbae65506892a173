mod error;

use clap::{Parser, Subcommand};
use error::App;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use zbus::{proxy, Connection};

/// How long `start` waits for the new daemon to answer on the bus.
const STARTUP_WAIT: Duration = Duration::from_secs(3);
const STARTUP_POLL: Duration = Duration::from_millis(100);

type StdResult<T> = std::result::Result<T, App>;

#[proxy(
    interface = "org.signboard.Player",
    default_service = "org.signboard.Player",
    default_path = "/org/signboard/Player"
)]
trait SignboardPlayer {
    async fn test_connection(&self) -> zbus::Result<()>;
    async fn next(&self) -> zbus::Result<()>;
    async fn previous(&self) -> zbus::Result<()>;
    async fn toggle_mute(&self) -> zbus::Result<()>;
    async fn set_online(&self, online: bool) -> zbus::Result<()>;
    async fn reload_playlist(&self) -> zbus::Result<()>;
    async fn report_media_error(&self, index: u32, message: &str) -> zbus::Result<()>;
    async fn exit(&self) -> zbus::Result<()>;
    async fn current_frame(&self) -> zbus::Result<String>;
}

#[derive(Parser)]
#[command(name = "sbctl", about = "Control the signboard player.", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Skip to the next slide")]
    Next,

    #[command(about = "Go back to the previous slide")]
    Previous,

    #[command(about = "Toggle the global mute")]
    Mute,

    #[command(about = "Signal that the network is reachable")]
    Online,

    #[command(about = "Signal that the network is unreachable")]
    Offline,

    #[command(about = "Reload the playlist file")]
    Reload,

    #[command(about = "Report a slide whose media failed to play")]
    MediaError(MediaErrorCommand),

    #[command(about = "Leave the player")]
    Exit,

    #[command(about = "Print the frame currently on screen")]
    Status,

    #[command(about = "Start signboard")]
    Start(StartCommand),
}

#[derive(Parser)]
struct MediaErrorCommand {
    #[arg(short = 'i', long = "index", help = "Slide index")]
    index: u32,
    #[arg(short = 'm', long = "message", default_value = "media failed to load")]
    message: String,
}

#[derive(Parser, Debug, Default, PartialEq)]
struct StartCommand {
    #[arg(short = 's', long = "settings", help = "Settings file for the daemon")]
    settings: Option<PathBuf>,
    #[arg(short = 'p', long = "playlist", help = "Playlist file for the daemon")]
    playlist: Option<PathBuf>,
    #[arg(short = 'k', long = "kiosk", help = "Start in kiosk mode")]
    kiosk: bool,
}

impl StartCommand {
    /// Daemon flags matching this request. Relative paths are resolved here, since the daemon
    /// keeps no notion of the caller's directory once detached.
    fn daemon_args(&self) -> StdResult<Vec<OsString>> {
        let mut args = Vec::new();
        for (flag, path) in [("--settings", &self.settings), ("--playlist", &self.playlist)] {
            if let Some(path) = path {
                args.push(OsString::from(flag));
                args.push(std::path::absolute(path)?.into_os_string());
            }
        }
        if self.kiosk {
            args.push(OsString::from("--kiosk"));
        }
        Ok(args)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> StdResult<()> {
    let cli = Cli::parse();
    let connection = Connection::session().await?;
    let proxy = SignboardPlayerProxy::new(&connection).await?;
    handle_command(cli, &proxy).await
}

async fn handle_command(cli: Cli, proxy: &SignboardPlayerProxy<'_>) -> StdResult<()> {
    if !matches!(cli.command, Commands::Start(_)) && !is_signboard_running(proxy).await {
        eprintln!("signboard is not running");
        return Ok(());
    }
    match cli.command {
        Commands::Next => proxy.next().await?,
        Commands::Previous => proxy.previous().await?,
        Commands::Mute => proxy.toggle_mute().await?,
        Commands::Online => proxy.set_online(true).await?,
        Commands::Offline => proxy.set_online(false).await?,
        Commands::Reload => {
            proxy.reload_playlist().await?;
            println!("Playlist reload requested");
        }
        Commands::MediaError(cmd) => proxy.report_media_error(cmd.index, &cmd.message).await?,
        Commands::Exit => match proxy.exit().await {
            Ok(()) => println!("signboard is exiting"),
            Err(zbus::Error::FDO(e)) => eprintln!("{e}"),
            Err(e) => return Err(e.into()),
        },
        Commands::Status => print_status(proxy).await?,
        Commands::Start(cmd) => start_signboard(proxy, &cmd).await?,
    }
    Ok(())
}

async fn is_signboard_running(proxy: &SignboardPlayerProxy<'_>) -> bool {
    proxy.test_connection().await.is_ok()
}

async fn print_status(proxy: &SignboardPlayerProxy<'_>) -> StdResult<()> {
    let frame: serde_json::Value = serde_json::from_str(&proxy.current_frame().await?)?;
    if frame.is_null() {
        println!("signboard is waiting for a playable playlist");
    } else {
        println!("{}", serde_json::to_string_pretty(&frame)?);
    }
    Ok(())
}

async fn start_signboard(proxy: &SignboardPlayerProxy<'_>, cmd: &StartCommand) -> StdResult<()> {
    if is_signboard_running(proxy).await {
        println!("signboard is already running");
        return Ok(());
    }

    let current_exe_path = std::env::current_exe()?;
    let exe_dir = current_exe_path.parent().ok_or_else(|| {
        App::InvalidInput("Failed to get the directory of the executable".to_string())
    })?;
    let signboard_path = exe_dir.join("signboard");

    if !signboard_path.exists() {
        return Err(App::InvalidInput(
            "signboard executable not found in the same directory".to_string(),
        ));
    }

    let child = Command::new(signboard_path)
        .args(cmd.daemon_args()?)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()
        .map_err(App::Io)?;
    let pid = child.id().unwrap_or_default();

    let mut waited = Duration::ZERO;
    while waited < STARTUP_WAIT {
        if is_signboard_running(proxy).await {
            println!("signboard started, process ID: {pid}");
            return Ok(());
        }
        time::sleep(STARTUP_POLL).await;
        waited += STARTUP_POLL;
    }
    println!("signboard launched (process ID: {pid}) but is not answering on the bus yet");
    Ok(())
}
