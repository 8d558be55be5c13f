use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use meshcall::RoomKey;
use meshcall::client::{CallEvent, CallMode, EngineConfig, StaticMembership, connect};
use meshcall::model::IceServerConfig;
use meshcall::server::{ServerConfig, SignalingService, router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshcall", version, about = "Mesh group calls over a WebSocket signal relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve {
        /// JSON config file; flags below override it.
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        bind: Option<SocketAddr>,

        /// STUN/TURN url handed to clients. Repeatable.
        #[arg(long = "ice")]
        ice: Vec<String>,
    },

    /// Join a call as a headless participant and print what happens.
    Join {
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
        url: String,

        /// Group id; the room key becomes `call:<group>`.
        #[arg(long)]
        group: String,

        #[arg(long)]
        user: String,

        #[arg(long)]
        name: Option<String>,

        /// Audio only.
        #[arg(long)]
        voice: bool,

        /// Join with the microphone muted.
        #[arg(long)]
        muted: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { config, bind, ice } => run_server(config, bind, ice).await,
        Commands::Join {
            url,
            group,
            user,
            name,
            voice,
            muted,
        } => {
            let name = name.unwrap_or_else(|| user.clone());
            let mode = if voice { CallMode::Voice } else { CallMode::Video };
            run_participant(url, RoomKey::for_group(group), user, name, mode, muted).await
        }
    }
}

async fn run_server(config: Option<PathBuf>, bind: Option<SocketAddr>, ice: Vec<String>) -> Result<()> {
    let mut config = match config {
        Some(path) => ServerConfig::load(&path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = bind {
        config.bind = bind;
    }
    if !ice.is_empty() {
        config.ice_servers = ice.into_iter().map(IceServerConfig::stun).collect();
    }
    config.validate()?;

    let service = SignalingService::new(config.ice_servers.clone());
    let app = router(service, config.max_message_bytes);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    println!(
        "{} {}",
        "📡 Signaling server listening on".green().bold(),
        format!("ws://{}/ws", config.bind).cyan()
    );
    info!("ICE servers: {:?}", config.ice_servers);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    println!("{}", "Server stopped".yellow());
    Ok(())
}

async fn run_participant(
    url: String,
    room: RoomKey,
    user: String,
    name: String,
    mode: CallMode,
    muted: bool,
) -> Result<()> {
    let membership = Arc::new(StaticMembership::new(user, name.clone()));
    let (handle, mut events) = connect(
        EngineConfig {
            url,
            ice_servers: None,
        },
        membership,
    )
    .await?;

    handle
        .join(room.clone(), mode)
        .await
        .with_context(|| format!("Failed to join {room}"))?;
    if muted {
        handle.set_muted(true).await?;
    }
    println!("{} {} as {}", "📞 Joined".green().bold(), room, name.bold());

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if print_event(&event) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.leave().await?;
                println!("{}", "👋 Left the call".yellow());
                break;
            }
        }
    }
    Ok(())
}

/// Returns `true` once the call is over.
fn print_event(event: &CallEvent) -> bool {
    match event {
        CallEvent::Connected { connection_id } => {
            println!("   connection {}", connection_id.to_string().dimmed());
        }
        CallEvent::PeerJoined(peer) => {
            println!("{} {} ({:?})", "+".green(), peer.display_name.bold(), peer.role);
        }
        CallEvent::PeerConnected(id) => println!("{} media up with {}", "✔".green(), id),
        CallEvent::PeerFailed {
            connection_id,
            error,
        } => println!("{} {}: {}", "✖".red(), connection_id, error),
        CallEvent::PeerLeft(id) => println!("{} {}", "-".yellow(), id),
        CallEvent::RemoteTrack {
            connection_id,
            track,
        } => println!("   {:?} track {} from {}", track.kind, track.id, connection_id),
        CallEvent::ScreenShareStopped => println!("   screen share stopped"),
        CallEvent::CallEnded { room, reason } => {
            println!("{} {} ({:?})", "Call ended:".yellow().bold(), room, reason);
            return true;
        }
    }
    false
}
