//! One fixed simulation tick.
//!
//! A tick runs four phases in order: advance bullets (resolving bullet/alien
//! hits as each bullet moves), advance aliens (stopping at the first alien
//! that reaches a player), maybe spawn an alien, and report what happened so
//! the caller can publish the new state.

use crate::game::GameState;
use arcade_shared::{first_alien_hit, first_player_hit, Alien, SessionId, ALIEN_SPAWN_CHANCE};
use rand::Rng;

/// An alien reached a player this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlienCollision {
    pub alien_index: usize,
    pub player_id: SessionId,
}

/// What a single tick did, beyond moving things.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub collision: Option<AlienCollision>,
    pub spawned_alien: bool,
    pub aliens_destroyed: usize,
    pub bullets_removed: usize,
}

impl GameState {
    /// Advances the whole game by one tick.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        let (destroyed, removed) = self.advance_bullets();
        outcome.aliens_destroyed = destroyed;
        outcome.bullets_removed = removed;
        outcome.collision = self.advance_aliens();
        outcome.spawned_alien = self.spawn_alien(rng);

        self.tick += 1;
        outcome
    }

    /// Moves every bullet up and resolves its hit, if any.
    ///
    /// Removal is collect-then-remove so indices stay valid during the scan.
    /// Returns the number of aliens destroyed and bullets removed.
    pub fn advance_bullets(&mut self) -> (usize, usize) {
        let mut spent = vec![false; self.bullets.len()];
        let mut destroyed = 0;

        for (index, bullet) in self.bullets.iter_mut().enumerate() {
            bullet.advance();

            if let Some(alien_index) = first_alien_hit(bullet, &self.aliens) {
                self.aliens.remove(alien_index);
                destroyed += 1;
                spent[index] = true;
            }

            if bullet.is_off_field() {
                spent[index] = true;
            }
        }

        let before = self.bullets.len();
        let mut flags = spent.into_iter();
        self.bullets.retain(|_| !flags.next().unwrap_or(false));

        (destroyed, before - self.bullets.len())
    }

    /// Moves every alien down and checks it against the players.
    ///
    /// The first alien to reach a player is frozen and the scan stops there;
    /// aliens later in the list do not move this tick. A frozen alien still
    /// advances (by zero) and is checked like any other, so one resting on a
    /// player collides again every tick. Aliens that drop below the field are
    /// removed.
    pub fn advance_aliens(&mut self) -> Option<AlienCollision> {
        let mut collision = None;

        for (index, alien) in self.aliens.iter_mut().enumerate() {
            alien.advance();

            if let Some(player_id) = first_player_hit(alien, &self.players) {
                alien.freeze();
                collision = Some(AlienCollision {
                    alien_index: index,
                    player_id,
                });
                break;
            }
        }

        self.aliens.retain(|alien| !alien.is_past_bottom());
        collision
    }

    /// Spawns one alien at the top edge with probability
    /// [`ALIEN_SPAWN_CHANCE`].
    pub fn spawn_alien<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if rng.gen_bool(ALIEN_SPAWN_CHANCE) {
            self.aliens.push(Alien::spawn_at(rng.gen::<f32>()));
            true
        } else {
            false
        }
    }
}
