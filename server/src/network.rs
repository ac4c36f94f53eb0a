//! Server network layer handling WebSocket sessions and game loop coordination

use crate::client_manager::ClientManager;
use crate::game::GameState;
use arcade_shared::{
    ClientEvent, ServerEvent, SessionId, COLLISION_MESSAGE, DEFAULT_PORT, RELOAD_DELAY_SECS,
    TICK_RATE,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How often tick statistics are logged at debug level
const STATS_EVERY_TICKS: u64 = 300;

/// Runtime settings for a [`Server`]
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub tick_duration: Duration,
    pub max_clients: usize,
    /// Delay between the collision message and the reload instruction
    pub reload_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            tick_duration: Duration::from_secs(1) / TICK_RATE,
            max_clients: 32,
            reload_delay: Duration::from_secs(RELOAD_DELAY_SECS),
        }
    }
}

/// Messages sent from connection tasks and timers to the game loop
#[derive(Debug)]
pub enum ServerMessage {
    /// A WebSocket handshake completed; the game loop answers with the
    /// assigned session id, or None when the server is full.
    Connected {
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Message>,
        reply: oneshot::Sender<Option<SessionId>>,
    },
    EventReceived {
        session_id: SessionId,
        event: ClientEvent,
    },
    Disconnected {
        session_id: SessionId,
    },
    /// The post-collision delay has elapsed.
    ReloadDue,
    /// Stops the game loop; `run` returns after the current message.
    Shutdown,
}

/// Main server coordinating networking and game simulation
///
/// All game state lives inside the `run` task. Connection tasks only talk to
/// it through `ServerMessage`s, so every intent and every tick runs to
/// completion before the next one starts.
pub struct Server {
    listener: Arc<TcpListener>,
    clients: ClientManager,
    game_state: GameState,
    config: ServerConfig,
    rng: StdRng,
    /// A reload timer is scheduled and has not fired yet
    reload_pending: bool,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    /// Binds the listener and prepares an empty game.
    ///
    /// Nothing is accepted or simulated until [`Server::run`] is awaited.
    /// Binding to port 0 picks a free port; see [`Server::local_addr`].
    pub async fn new(config: ServerConfig) -> Result<Self, BoxError> {
        let listener = Arc::new(TcpListener::bind(&config.addr).await?);
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            clients: ClientManager::new(config.max_clients),
            game_state: GameState::new(),
            config,
            rng: StdRng::from_entropy(),
            reload_pending: false,
            server_tx,
            server_rx,
        })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Returns a handle for feeding messages into the game loop.
    ///
    /// Sending [`ServerMessage::Shutdown`] through it makes `run` return,
    /// which is how `main` stops the server on Ctrl+C.
    pub fn sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that accepts TCP connections and upgrades them
    ///
    /// Each accepted socket gets its own task running the WebSocket
    /// handshake and the session itself.
    fn spawn_acceptor(&self) {
        let listener = Arc::clone(&self.listener);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let server_tx = server_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, server_tx).await {
                                warn!("Connection from {} failed: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Encodes `event` and queues it for every session
    fn broadcast(&self, event: &ServerEvent) {
        let text = match event.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode broadcast: {}", e);
                return;
            }
        };

        for session_id in self.clients.broadcast(&text) {
            debug!("Session {} mailbox closed, awaiting disconnect", session_id);
        }
    }

    fn broadcast_game_state(&self) {
        self.broadcast(&ServerEvent::Update(self.game_state.snapshot()));
    }

    /// Processes one message from a connection task or timer
    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected {
                addr,
                sender,
                reply,
            } => {
                let session_id = self.clients.add_session(addr, sender);
                if reply.send(session_id).is_err() {
                    debug!("Connection task for {} went away before registration", addr);
                    if let Some(id) = session_id {
                        self.clients.remove_session(&id);
                    }
                    return;
                }

                if let Some(id) = session_id {
                    self.clients.activate(id);
                    self.game_state.add_player(id);
                    self.broadcast_game_state();
                }
            }

            ServerMessage::EventReceived { session_id, event } => {
                self.handle_event(session_id, event);
            }

            ServerMessage::Disconnected { session_id } => {
                if self.clients.remove_session(&session_id).is_some() {
                    self.game_state.remove_player(&session_id);
                    self.broadcast_game_state();
                }
            }

            ServerMessage::ReloadDue => {
                self.reload_pending = false;
                self.broadcast(&ServerEvent::AlienCollision(String::new()));
                self.broadcast(&ServerEvent::ReloadPage);
            }

            // Consumed by `run` before it gets here
            ServerMessage::Shutdown => {}
        }
    }

    /// Applies an intent and publishes the result immediately
    fn handle_event(&mut self, session_id: SessionId, event: ClientEvent) {
        if !self.clients.is_active(&session_id) {
            debug!("Ignoring {:?} from inactive session {}", event, session_id);
            return;
        }

        let applied = match event {
            ClientEvent::NewPlayer(name) => {
                self.game_state.set_player_name(session_id, name);
                true
            }
            ClientEvent::Move(direction) => self.game_state.move_player(session_id, direction),
            ClientEvent::Shoot => self.game_state.shoot(session_id),
        };

        if applied {
            self.broadcast_game_state();
        } else {
            debug!("Session {} has no player, intent dropped", session_id);
        }
    }

    /// Advances the simulation one tick and publishes the result
    pub fn run_tick(&mut self) {
        let outcome = self.game_state.step(&mut self.rng);

        if let Some(collision) = outcome.collision {
            info!(
                "Alien {} reached player {}",
                collision.alien_index, collision.player_id
            );
            self.broadcast(&ServerEvent::AlienCollision(COLLISION_MESSAGE.to_string()));

            // A frozen alien keeps colliding every tick until clients reload
            if !self.reload_pending {
                self.reload_pending = true;
                spawn_reload_timer(self.server_tx.clone(), self.config.reload_delay);
            }
        }

        self.broadcast_game_state();

        if self.game_state.tick % STATS_EVERY_TICKS == 0 {
            debug!(
                "Tick {}: {} sessions, {} bullets, {} aliens",
                self.game_state.tick,
                self.clients.len(),
                self.game_state.bullets.len(),
                self.game_state.aliens.len()
            );
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(mut self) -> Result<(), BoxError> {
        self.spawn_acceptor();

        let mut tick_interval = interval(self.config.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Server started: {:.0}Hz, up to {} sessions",
            1.0 / self.config.tick_duration.as_secs_f64(),
            self.config.max_clients
        );

        loop {
            tokio::select! {
                // `self.server_tx` keeps the channel open, so recv never yields None
                Some(message) = self.server_rx.recv() => {
                    if let ServerMessage::Shutdown = message {
                        info!("Server shutting down");
                        break;
                    }
                    self.handle_message(message);
                },

                _ = tick_interval.tick() => {
                    self.run_tick();
                },
            }
        }

        Ok(())
    }
}

/// Schedules the second half of the game-over sequence
///
/// Fires independently of anything that happens to the game in the meantime.
pub fn spawn_reload_timer(
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if server_tx.send(ServerMessage::ReloadDue).is_err() {
            warn!("Game loop stopped before reload could be sent");
        }
    })
}

/// Runs one WebSocket session until either side hangs up
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) -> Result<(), BoxError> {
    let mut socket = accept_async(stream).await?;

    let (mailbox_tx, mut mailbox_rx) = mpsc::unbounded_channel::<Message>();
    let (reply_tx, reply_rx) = oneshot::channel();
    server_tx
        .send(ServerMessage::Connected {
            addr,
            sender: mailbox_tx,
            reply: reply_tx,
        })
        .map_err(|_| "game loop has stopped")?;

    let Ok(Some(session_id)) = reply_rx.await else {
        socket.close(None).await?;
        return Ok(());
    };

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(message) = mailbox_rx.recv().await {
            if ws_sender.send(message).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut reader = {
        let server_tx = server_tx.clone();
        tokio::spawn(async move {
            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ClientEvent::from_json(&text) {
                        Ok(event) => {
                            let message = ServerMessage::EventReceived { session_id, event };
                            if server_tx.send(message).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Dropping malformed frame from session {}: {}", session_id, e);
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Session {} read error: {}", session_id, e);
                        break;
                    }
                }
            }
        })
    };

    // Either half finishing means the session is over
    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    let _ = server_tx.send(ServerMessage::Disconnected { session_id });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_shared::{Alien, Direction, TeamColor, ALIEN_SPEED};
    use tokio_test::assert_ok;

    fn test_config() -> ServerConfig {
        ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        }
    }

    fn test_addr() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    /// Registers a fake session directly with the game loop
    fn connect(
        server: &mut Server,
    ) -> (SessionId, mpsc::UnboundedReceiver<Message>) {
        let (sender, mailbox) = mpsc::unbounded_channel();
        let (reply, mut reply_rx) = oneshot::channel();
        server.handle_message(ServerMessage::Connected {
            addr: test_addr(),
            sender,
            reply,
        });
        let id = reply_rx.try_recv().unwrap().expect("server should accept");
        (id, mailbox)
    }

    fn drain(mailbox: &mut mpsc::UnboundedReceiver<Message>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(Message::Text(text)) = mailbox.try_recv() {
            events.push(ServerEvent::from_json(&text).unwrap());
        }
        events
    }

    fn last_update(events: &[ServerEvent]) -> &arcade_shared::GameSnapshot {
        events
            .iter()
            .rev()
            .find_map(|event| match event {
                ServerEvent::Update(snapshot) => Some(snapshot),
                _ => None,
            })
            .expect("no update broadcast")
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.addr, "0.0.0.0:3000");
        assert_eq!(config.tick_duration.as_micros(), 33_333);
        assert_eq!(config.reload_delay, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_connect_creates_player_and_broadcasts() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (id, mut mailbox) = connect(&mut server);

        let events = drain(&mut mailbox);
        let snapshot = last_update(&events);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[&id].color, TeamColor::Blue);
    }

    #[tokio::test]
    async fn test_second_session_is_red() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (first, _m1) = connect(&mut server);
        let (second, mut m2) = connect(&mut server);

        let events = drain(&mut m2);
        let snapshot = last_update(&events);
        assert_eq!(snapshot.players[&first].color, TeamColor::Blue);
        assert_eq!(snapshot.players[&second].color, TeamColor::Red);
    }

    #[tokio::test]
    async fn test_server_full_rejects() {
        let mut server = Server::new(ServerConfig {
            max_clients: 1,
            ..test_config()
        })
        .await
        .unwrap();
        connect(&mut server);

        let (sender, _mailbox) = mpsc::unbounded_channel();
        let (reply, mut reply_rx) = oneshot::channel();
        server.handle_message(ServerMessage::Connected {
            addr: test_addr(),
            sender,
            reply,
        });

        assert_eq!(reply_rx.try_recv().unwrap(), None);
        assert_eq!(server.game_state().players.len(), 1);
    }

    #[tokio::test]
    async fn test_move_broadcasts_immediately() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (id, mut mailbox) = connect(&mut server);
        drain(&mut mailbox);

        server.handle_message(ServerMessage::EventReceived {
            session_id: id,
            event: ClientEvent::Move(Direction::Left),
        });

        let events = drain(&mut mailbox);
        assert_eq!(events.len(), 1);
        assert!(last_update(&events).players[&id].x < 0.5);
    }

    #[tokio::test]
    async fn test_shoot_and_name() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (id, mut mailbox) = connect(&mut server);

        server.handle_message(ServerMessage::EventReceived {
            session_id: id,
            event: ClientEvent::NewPlayer(Some("alice".to_string())),
        });
        server.handle_message(ServerMessage::EventReceived {
            session_id: id,
            event: ClientEvent::Shoot,
        });

        let events = drain(&mut mailbox);
        let snapshot = last_update(&events);
        assert_eq!(snapshot.bullets.len(), 1);
        assert_eq!(snapshot.players[&id].username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_intent_from_unknown_session_ignored() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (_id, mut mailbox) = connect(&mut server);
        drain(&mut mailbox);

        server.handle_message(ServerMessage::EventReceived {
            session_id: 77,
            event: ClientEvent::Shoot,
        });

        assert!(drain(&mut mailbox).is_empty());
        assert!(server.game_state().bullets.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_resets_and_broadcasts_empty_state() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (first, _m1) = connect(&mut server);
        let (_second, mut m2) = connect(&mut server);
        server.handle_message(ServerMessage::EventReceived {
            session_id: first,
            event: ClientEvent::Shoot,
        });
        drain(&mut m2);

        server.handle_message(ServerMessage::Disconnected { session_id: first });

        let events = drain(&mut m2);
        assert!(last_update(&events).is_empty());
        assert!(server.game_state().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_tick_publishes_update() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (_id, mut mailbox) = connect(&mut server);
        drain(&mut mailbox);

        server.run_tick();

        let events = drain(&mut mailbox);
        assert_eq!(events.len(), 1);
        assert_eq!(server.game_state().tick, 1);
    }

    #[tokio::test]
    async fn test_collision_emits_message_before_update() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (_id, mut mailbox) = connect(&mut server);
        drain(&mut mailbox);
        server.game_state.aliens.push(Alien {
            x: 0.5,
            y: 0.9,
            speed: ALIEN_SPEED,
        });

        server.run_tick();

        let events = drain(&mut mailbox);
        assert_eq!(
            events[0],
            ServerEvent::AlienCollision(COLLISION_MESSAGE.to_string())
        );
        assert!(matches!(events[1], ServerEvent::Update(_)));
        assert_eq!(server.game_state().players.len(), 1);
        assert!(server.game_state().aliens[0].is_frozen());
    }

    #[tokio::test]
    async fn test_reload_due_broadcasts_clear_and_reload() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (_id, mut mailbox) = connect(&mut server);
        drain(&mut mailbox);

        server.handle_message(ServerMessage::ReloadDue);

        let events = drain(&mut mailbox);
        assert_eq!(
            events,
            vec![
                ServerEvent::AlienCollision(String::new()),
                ServerEvent::ReloadPage
            ]
        );
        assert_eq!(server.game_state().players.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_collisions_schedule_one_reload() {
        let mut server = assert_ok!(Server::new(test_config()).await);
        let (_id, mut mailbox) = connect(&mut server);
        drain(&mut mailbox);
        server.game_state.aliens.push(Alien {
            x: 0.5,
            y: 0.9,
            speed: ALIEN_SPEED,
        });

        server.run_tick();
        assert!(server.reload_pending);
        server.run_tick();

        // The frozen alien collides again, but only one timer is outstanding
        let collisions = drain(&mut mailbox)
            .into_iter()
            .filter(|e| *e == ServerEvent::AlienCollision(COLLISION_MESSAGE.to_string()))
            .count();
        assert_eq!(collisions, 2);
        assert!(server.reload_pending);

        server.handle_message(ServerMessage::ReloadDue);
        assert!(!server.reload_pending);
    }

    #[tokio::test]
    async fn test_shutdown_stops_run() {
        let server = assert_ok!(Server::new(test_config()).await);
        let shutdown = server.sender();
        let running = tokio::spawn(server.run());

        assert_ok!(shutdown.send(ServerMessage::Shutdown));

        let result = tokio::time::timeout(Duration::from_secs(5), running).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_reload_timer(tx, Duration::from_secs(RELOAD_DELAY_SECS));

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::ReloadDue)));
    }
}
