//! Axis-aligned bounding box tests between entities.
//!
//! Every entity uses the same centered hitbox of half-extent
//! [`HITBOX_HALF_EXTENT`](crate::HITBOX_HALF_EXTENT), regardless of how large
//! it is drawn on screen.

use crate::entity::{Alien, Bullet, Player, SessionId};
use crate::HITBOX_HALF_EXTENT;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    /// Builds a square box around `(x, y)`.
    ///
    /// `half_extent` is the distance from the center to each edge, so the
    /// box is `2 * half_extent` wide and tall in normalized units.
    pub fn centered(x: f32, y: f32, half_extent: f32) -> Self {
        Self {
            min_x: x - half_extent,
            min_y: y - half_extent,
            max_x: x + half_extent,
            max_y: y + half_extent,
        }
    }

    /// Standard entity hitbox centered on `(x, y)`.
    pub fn hitbox(x: f32, y: f32) -> Self {
        Self::centered(x, y, HITBOX_HALF_EXTENT)
    }
}

/// Closed-interval overlap test
///
/// Boxes that merely touch on an edge count as overlapping. Used for
/// bullet-vs-alien hits, where two standard hitboxes collide once their
/// centers are within `2 * HITBOX_HALF_EXTENT` on both axes.
pub fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    !(a.max_x < b.min_x || b.max_x < a.min_x || a.max_y < b.min_y || b.max_y < a.min_y)
}

/// Open-interval overlap test
///
/// Same as [`overlaps`] except that boxes sharing only an edge do not
/// collide. Used for alien-vs-player checks.
pub fn overlaps_strict(a: &Aabb, b: &Aabb) -> bool {
    !(a.max_x <= b.min_x || b.max_x <= a.min_x || a.max_y <= b.min_y || b.max_y <= a.min_y)
}

/// Index of the first alien, in stored order, that `bullet` hits.
pub fn first_alien_hit(bullet: &Bullet, aliens: &[Alien]) -> Option<usize> {
    let hitbox = bullet.hitbox();
    aliens
        .iter()
        .position(|alien| overlaps(&hitbox, &alien.hitbox()))
}

/// Finds the first player that `alien` overlaps
///
/// Iteration order is whatever `players` yields; with a `HashMap` that is
/// unspecified, which only matters when one alien touches two players.
pub fn first_player_hit<'a, I>(alien: &Alien, players: I) -> Option<SessionId>
where
    I: IntoIterator<Item = (&'a SessionId, &'a Player)>,
{
    let hitbox = alien.hitbox();
    players
        .into_iter()
        .find(|(_, player)| overlaps_strict(&hitbox, &player.hitbox()))
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::TeamColor;
    use assert_approx_eq::assert_approx_eq;
    use std::collections::HashMap;

    #[test]
    fn test_centered_box() {
        let aabb = Aabb::centered(0.5, 0.25, 0.1);
        assert_approx_eq!(aabb.min_x, 0.4, 1e-6);
        assert_approx_eq!(aabb.max_x, 0.6, 1e-6);
        assert_approx_eq!(aabb.min_y, 0.15, 1e-6);
        assert_approx_eq!(aabb.max_y, 0.35, 1e-6);
    }

    #[test]
    fn test_overlap_same_position() {
        let a = Aabb::hitbox(0.5, 0.5);
        let b = Aabb::hitbox(0.5, 0.5);
        assert!(overlaps(&a, &b));
        assert!(overlaps_strict(&a, &b));
    }

    #[test]
    fn test_no_overlap_when_apart() {
        let a = Aabb::hitbox(0.1, 0.1);
        let b = Aabb::hitbox(0.5, 0.1);
        let c = Aabb::hitbox(0.1, 0.5);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&a, &c));
        assert!(!overlaps_strict(&a, &b));
    }

    #[test]
    fn test_touching_edges() {
        let a = Aabb::centered(0.0, 0.0, 0.5);
        let b = Aabb::centered(1.0, 0.0, 0.5);
        assert!(overlaps(&a, &b));
        assert!(!overlaps_strict(&a, &b));
    }

    #[test]
    fn test_requires_both_axes() {
        let a = Aabb::hitbox(0.5, 0.5);
        let b = Aabb::hitbox(0.52, 0.9);
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn test_first_alien_hit_picks_first_in_order() {
        let bullet = Bullet::new(0.5, 0.5, None);
        let aliens = vec![
            Alien::spawn_at(0.1),
            Alien { x: 0.51, y: 0.5, speed: 0.0 },
            Alien { x: 0.5, y: 0.5, speed: 0.0 },
        ];
        assert_eq!(first_alien_hit(&bullet, &aliens), Some(1));
    }

    #[test]
    fn test_first_alien_hit_empty() {
        let bullet = Bullet::new(0.5, 0.5, None);
        assert_eq!(first_alien_hit(&bullet, &[]), None);
    }

    #[test]
    fn test_first_player_hit() {
        let mut players = HashMap::new();
        players.insert(1, Player::new(TeamColor::Blue));
        let mut far = Player::new(TeamColor::Red);
        far.x = 0.1;
        players.insert(2, far);

        let alien = Alien { x: 0.51, y: 0.93, speed: 0.005 };
        assert_eq!(first_player_hit(&alien, &players), Some(1));

        let missed = Alien { x: 0.8, y: 0.93, speed: 0.005 };
        assert_eq!(first_player_hit(&missed, &players), None);
    }
}
