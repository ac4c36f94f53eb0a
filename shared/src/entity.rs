//! Player, bullet and alien records plus the few rules that belong to a
//! single entity (movement, clamping, hitboxes).

use crate::collision::Aabb;
use crate::{
    ALIEN_SPEED, BULLET_SPAWN_OFFSET, BULLET_SPEED, PLAYER_MAX_X, PLAYER_MIN_X, PLAYER_SPAWN_X,
    PLAYER_SPAWN_Y, PLAYER_SPEED,
};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a connected session, stable for its lifetime.
pub type SessionId = u32;

/// Team color, assigned by join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamColor {
    Blue,
    Red,
}

impl TeamColor {
    /// First player of a round is blue, everyone after that is red.
    pub fn for_join(active_players: usize) -> Self {
        if active_players == 0 {
            TeamColor::Blue
        } else {
            TeamColor::Red
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub color: TeamColor,
    /// Display name; `None` until the client sends `newPlayer`.
    pub username: Option<String>,
    pub score: u32,
}

impl Player {
    /// Creates a player at the spawn point.
    pub fn new(color: TeamColor) -> Self {
        Self {
            x: PLAYER_SPAWN_X,
            y: PLAYER_SPAWN_Y,
            color,
            username: None,
            score: 0,
        }
    }

    /// Moves one step in `direction`.
    ///
    /// A step is only taken while the player is still inside the bound on
    /// that side, and the result is clamped so a step never overshoots.
    pub fn step(&mut self, direction: Direction) {
        match direction {
            Direction::Left if self.x > PLAYER_MIN_X => self.x -= PLAYER_SPEED,
            Direction::Right if self.x < PLAYER_MAX_X => self.x += PLAYER_SPEED,
            _ => {}
        }
        self.x = self.x.clamp(PLAYER_MIN_X, PLAYER_MAX_X);
    }

    /// Where a bullet fired by this player appears.
    pub fn muzzle(&self) -> (f32, f32) {
        (self.x, self.y - BULLET_SPAWN_OFFSET)
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::hitbox(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    /// Session that fired the bullet.
    pub owner: Option<SessionId>,
}

impl Bullet {
    pub fn new(x: f32, y: f32, owner: Option<SessionId>) -> Self {
        Self {
            x,
            y,
            speed: BULLET_SPEED,
            owner,
        }
    }

    /// Spawns a bullet at the player's muzzle.
    pub fn fired_by(player: &Player, owner: SessionId) -> Self {
        let (x, y) = player.muzzle();
        Self::new(x, y, Some(owner))
    }

    /// Moves the bullet up by its speed.
    ///
    /// Does not check for hits or the field edge; the tick does both after
    /// every move.
    pub fn advance(&mut self) {
        self.y -= self.speed;
    }

    /// True once the bullet has left the visible field vertically.
    pub fn is_off_field(&self) -> bool {
        self.y < 0.0 || self.y > 1.0
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::hitbox(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alien {
    pub x: f32,
    pub y: f32,
    /// Descent per tick; zero once the alien has been frozen by a collision.
    pub speed: f32,
}

impl Alien {
    /// Spawns an alien at the top edge of the field.
    pub fn spawn_at(x: f32) -> Self {
        Self {
            x,
            y: 0.0,
            speed: ALIEN_SPEED,
        }
    }

    /// Moves the alien down by its speed. A frozen alien stays where it is.
    pub fn advance(&mut self) {
        self.y += self.speed;
    }

    /// Stops the alien in place after it reaches a player.
    ///
    /// The alien stays in the list and keeps being checked against players,
    /// so it collides again on every later tick while a player is under it.
    pub fn freeze(&mut self) {
        self.speed = 0.0;
    }

    pub fn is_frozen(&self) -> bool {
        self.speed == 0.0
    }

    /// True once the alien has descended past the bottom edge.
    pub fn is_past_bottom(&self) -> bool {
        self.y > 1.0
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::hitbox(self.x, self.y)
    }
}
