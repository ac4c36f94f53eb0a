//! Headless bot that joins a running server, wanders left and right while
//! shooting, and logs what the server sends back.

use arcade_shared::{ClientEvent, Direction, ServerEvent};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use rand::Rng;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short, long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Display name to join with
    #[arg(short, long, default_value = "bot")]
    name: String,

    /// Seconds to play before disconnecting
    #[arg(short, long, default_value = "10")]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    let args = Args::parse();

    info!("Connecting to {}", args.server);
    let (socket, _) = connect_async(args.server.as_str()).await?;
    let (mut sender, mut receiver) = socket.split();

    let join = ClientEvent::NewPlayer(Some(args.name.clone()));
    sender.send(Message::Text(join.to_json()?)).await?;

    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut act = interval(Duration::from_millis(70));
    let mut direction = Direction::Left;
    let mut updates = 0u64;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,

            _ = act.tick() => {
                let intent = {
                    let mut rng = rand::thread_rng();
                    if rng.gen_bool(0.1) {
                        direction = match direction {
                            Direction::Left => Direction::Right,
                            Direction::Right => Direction::Left,
                        };
                    }
                    if rng.gen_bool(0.3) {
                        ClientEvent::Shoot
                    } else {
                        ClientEvent::Move(direction)
                    }
                };
                sender.send(Message::Text(intent.to_json()?)).await?;
            }

            frame = receiver.next() => {
                let Some(frame) = frame else {
                    warn!("Server closed the connection");
                    break;
                };
                if let Message::Text(text) = frame? {
                    match ServerEvent::from_json(&text) {
                        Ok(ServerEvent::Update(snapshot)) => {
                            updates += 1;
                            if updates % 30 == 0 {
                                info!(
                                    "{} players, {} bullets, {} aliens",
                                    snapshot.players.len(),
                                    snapshot.bullets.len(),
                                    snapshot.aliens.len()
                                );
                            }
                        }
                        Ok(ServerEvent::AlienCollision(message)) => {
                            info!("Alien collision: {:?}", message);
                        }
                        Ok(ServerEvent::ReloadPage) => {
                            info!("Server asked for a reload, leaving");
                            break;
                        }
                        Err(e) => warn!("Unreadable frame: {}", e),
                    }
                }
            }
        }
    }

    info!("Received {} updates, disconnecting", updates);
    sender.close().await?;
    Ok(())
}
