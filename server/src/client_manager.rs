//! Session registry for the game server
//!
//! This module tracks every WebSocket session the server knows about:
//! - Session id assignment and capacity limits
//! - The per-session lifecycle (`Connecting -> Active -> Disconnected`)
//! - Each session's outbound mailbox, used for broadcasting
//!
//! The registry is owned by the game task, so it needs no locking of its own.

use arcade_shared::SessionId;
use log::{info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Lifecycle of a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted by the transport, no player assigned yet.
    Connecting,
    /// Has a player and may send intents.
    Active,
    /// Terminal.
    Disconnected,
}

/// A connected session and its outbound mailbox
#[derive(Debug)]
pub struct Session {
    /// Server-assigned id, never reused within a process
    pub id: SessionId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    pub state: SessionState,
    /// Frames queued here are written to the socket by the session's writer task
    pub sender: mpsc::UnboundedSender<Message>,
}

impl Session {
    pub fn new(id: SessionId, addr: SocketAddr, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            state: SessionState::Connecting,
            sender,
        }
    }

    /// Queues a frame for this session.
    ///
    /// Returns false when the writer task has already gone away, which means
    /// the session is about to be reported as disconnected.
    pub fn send(&self, message: Message) -> bool {
        self.sender.send(message).is_ok()
    }

    /// True while the session has a player and its intents are applied.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}

/// Manages all connected sessions
///
/// Enforces the session limit and hands out ids. Broadcasting goes through
/// here so every session sees frames in the order the game task emitted them.
pub struct ClientManager {
    sessions: HashMap<SessionId, Session>,
    next_session_id: SessionId,
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty registry. Ids start from 1.
    pub fn new(max_clients: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
            max_clients,
        }
    }

    /// Registers a new session in the `Connecting` state.
    ///
    /// Returns None if the server is at capacity.
    pub fn add_session(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Message>,
    ) -> Option<SessionId> {
        if self.sessions.len() >= self.max_clients {
            warn!("Rejecting {}: server full ({} sessions)", addr, self.max_clients);
            return None;
        }

        let id = self.next_session_id;
        self.next_session_id += 1;

        info!("Session {} connected from {}", id, addr);
        self.sessions.insert(id, Session::new(id, addr, sender));
        Some(id)
    }

    /// Moves a `Connecting` session to `Active`.
    pub fn activate(&mut self, id: SessionId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) if session.state == SessionState::Connecting => {
                session.state = SessionState::Active;
                true
            }
            _ => false,
        }
    }

    /// Removes a session, returning it in the `Disconnected` state.
    pub fn remove_session(&mut self, id: &SessionId) -> Option<Session> {
        let mut session = self.sessions.remove(id)?;
        session.state = SessionState::Disconnected;
        info!(
            "Session {} disconnected after {:.1}s",
            session.id,
            session.connected_at.elapsed().as_secs_f32()
        );
        Some(session)
    }

    /// Checks whether intents from `id` should be applied.
    ///
    /// Unknown ids and sessions still in `Connecting` are both treated as
    /// inactive.
    pub fn is_active(&self, id: &SessionId) -> bool {
        self.sessions.get(id).is_some_and(Session::is_active)
    }

    /// Queues `text` for every session, returning ids whose mailbox is closed.
    pub fn broadcast(&self, text: &str) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|session| !session.send(Message::Text(text.to_owned())))
            .map(|session| session.id)
            .collect()
    }

    /// Returns the number of registered sessions
    ///
    /// Counts sessions in every live state, which is also what the capacity
    /// limit in [`ClientManager::add_session`] is checked against.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
