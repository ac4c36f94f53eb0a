//! JSON wire protocol spoken over the WebSocket.
//!
//! Every frame is one event in an `{"event": ..., "data": ...}` envelope:
//!
//! ```text
//! -> {"event":"newPlayer","data":"alice"}
//! -> {"event":"move","data":"left"}
//! -> {"event":"shoot"}
//! <- {"event":"update","data":{"players":{...},"bullets":[...],"aliens":[...]}}
//! <- {"event":"alienCollision","data":"..."}
//! <- {"event":"reloadPage"}
//! ```

use crate::entity::{Alien, Bullet, Direction, Player, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Intents sent by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    NewPlayer(Option<String>),
    Move(Direction),
    Shoot,
}

impl ClientEvent {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Full game state as broadcast to every session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub players: HashMap<SessionId, Player>,
    pub bullets: Vec<Bullet>,
    pub aliens: Vec<Alien>,
}

impl GameSnapshot {
    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.bullets.is_empty() && self.aliens.is_empty()
    }
}

/// Events broadcast by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Update(GameSnapshot),
    AlienCollision(String),
    ReloadPage,
}

impl ServerEvent {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
