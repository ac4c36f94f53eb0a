//! # Shared Game Definitions
//!
//! Types and rules used by both the authoritative server and anything that
//! speaks to it (the headless test client, integration tests, the browser
//! front-end through the JSON protocol).
//!
//! All positions are normalized: `(0, 0)` is the top-left corner of the
//! playfield and `(1, 1)` the bottom-right, independent of the pixel size of
//! whatever viewport renders it. Every size and speed below is expressed as a
//! fraction of that unit square.

pub mod collision;
pub mod entity;
pub mod protocol;

pub use collision::{first_alien_hit, first_player_hit, overlaps, overlaps_strict, Aabb};
pub use entity::{Alien, Bullet, Direction, Player, SessionId, TeamColor};
pub use protocol::{ClientEvent, GameSnapshot, ServerEvent};

/// Vertical distance a bullet travels per tick (upwards).
pub const BULLET_SPEED: f32 = 0.025;
/// Horizontal distance a player moves per `move` intent.
pub const PLAYER_SPEED: f32 = 0.0125;
/// Vertical distance an alien descends per tick.
pub const ALIEN_SPEED: f32 = 0.005;

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 30;
/// Chance that a single tick spawns one alien.
pub const ALIEN_SPAWN_CHANCE: f64 = 0.02;

/// Leftmost x a player may occupy.
pub const PLAYER_MIN_X: f32 = 0.025;
/// Rightmost x a player may occupy.
pub const PLAYER_MAX_X: f32 = 0.97;
pub const PLAYER_SPAWN_X: f32 = 0.5;
pub const PLAYER_SPAWN_Y: f32 = 0.95;

/// Bullets appear this far above the firing player.
pub const BULLET_SPAWN_OFFSET: f32 = 0.05;

/// Half-extent of every hitbox, for bullets, aliens and players alike.
pub const HITBOX_HALF_EXTENT: f32 = 0.025;

pub const DEFAULT_PORT: u16 = 3000;

/// Seconds between the collision message and the reload instruction.
pub const RELOAD_DELAY_SECS: u64 = 3;

/// Text carried by the first `alienCollision` event of a game over.
pub const COLLISION_MESSAGE: &str = "get rekt baka!!! >:3";
