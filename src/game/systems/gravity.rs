//! Gravitational force accumulation.
//!
//! Every body attracts with `F = G * m1 * m2 / d`, with two empirical
//! cutoffs: a body it overlaps the center of exerts no pull (collision owns
//! that range) and a body more than four of its radii away is out of reach.
//! Photons neither feel nor exert gravity, and a player is not pulled by its
//! own hazard.

use crate::game::constants::gravity::FAR_RADIUS_FACTOR;
use crate::game::entity::Entity;
use crate::util::vec2::Vec2;

/// Sum the gravitational force on `entities[i]` from every live body.
///
/// `removed` marks entities already absorbed this tick; they no longer pull.
pub fn accumulate(entities: &[Entity], removed: &[bool], i: usize, g: f32) -> Vec2 {
    let me = &entities[i];
    let mut force = Vec2::ZERO;

    for (j, other) in entities.iter().enumerate() {
        if j == i || removed[j] {
            continue;
        }
        if other.is_photon() || me.is_photon() {
            continue;
        }
        if other.id == me.id && other.id != 0 {
            continue;
        }

        let dist = me.distance_to(other);
        if dist < me.radius || dist > other.radius * FAR_RADIUS_FACTOR {
            continue;
        }

        let magnitude = g * other.mass * me.mass / dist;
        let theta = (other.position.y - me.position.y).atan2(other.position.x - me.position.x);
        force += Vec2::from_angle(theta) * magnitude;
    }

    force
}
