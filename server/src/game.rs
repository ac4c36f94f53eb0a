//! Authoritative game state and the intent handlers that mutate it.
//!
//! `GameState` is the single owned aggregate of a round. Every entry point
//! takes it by `&mut self`, so whoever owns the value decides how access is
//! serialized; the network layer owns it from a single task.

use arcade_shared::{
    first_alien_hit, Alien, Bullet, Direction, GameSnapshot, Player, SessionId, TeamColor,
};
use log::{debug, info};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub tick: u64,
    pub players: HashMap<SessionId, Player>,
    pub bullets: Vec<Bullet>,
    pub aliens: Vec<Alien>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player for `client_id` at the spawn point.
    ///
    /// The color depends on how many players are currently in the round, so
    /// the first player after a reset is blue again.
    pub fn add_player(&mut self, client_id: SessionId) -> &Player {
        let color = TeamColor::for_join(self.players.len());
        info!("Added player {} ({:?})", client_id, color);
        self.players
            .entry(client_id)
            .or_insert_with(|| Player::new(color))
    }

    /// Removes the player and ends the round for everyone.
    pub fn remove_player(&mut self, client_id: &SessionId) {
        if self.players.remove(client_id).is_some() {
            info!("Removed player {}", client_id);
        }
        self.reset();
    }

    /// Clears players, bullets and aliens. The tick counter keeps running.
    pub fn reset(&mut self) {
        self.players.clear();
        self.bullets.clear();
        self.aliens.clear();
        info!("Game state reset");
    }

    /// Names the player, re-joining first if the round was reset under it.
    pub fn set_player_name(&mut self, client_id: SessionId, name: Option<String>) {
        if !self.players.contains_key(&client_id) {
            self.add_player(client_id);
        }
        if let Some(player) = self.players.get_mut(&client_id) {
            debug!("Player {} is now {:?}", client_id, name);
            player.username = name;
        }
    }

    /// Applies a `move` intent. Unknown players are ignored.
    pub fn move_player(&mut self, client_id: SessionId, direction: Direction) -> bool {
        match self.players.get_mut(&client_id) {
            Some(player) => {
                player.step(direction);
                true
            }
            None => false,
        }
    }

    /// Applies a `shoot` intent.
    ///
    /// The new bullet is checked against the aliens straight away, so a
    /// point-blank shot resolves before the next tick.
    pub fn shoot(&mut self, client_id: SessionId) -> bool {
        let Some(player) = self.players.get(&client_id) else {
            return false;
        };

        let bullet = Bullet::fired_by(player, client_id);
        if let Some(index) = first_alien_hit(&bullet, &self.aliens) {
            debug!("Point-blank hit by player {}", client_id);
            self.aliens.remove(index);
        } else {
            self.bullets.push(bullet);
        }
        true
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.players.clone(),
            bullets: self.bullets.clone(),
            aliens: self.aliens.clone(),
        }
    }
}
