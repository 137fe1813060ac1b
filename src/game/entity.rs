//! Entity definitions: free particles, players, hazards and photons.
//!
//! A single struct with an explicit kind tag; the per-kind update rules live
//! in the world step, which dispatches on the tag.

#![allow(dead_code)] // accessors that are part of the public entity API

use crate::game::constants::{entity, photon};
use crate::util::vec2::Vec2;

/// Entity variant tag. The discriminant is the wire `type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntityKind {
    Particle = 0,
    Player = 1,
    Hazard = 2,
    Photon = 3,
}

impl EntityKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Player movement flags, decoded from the control-input bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Control {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Control {
    /// bit0=up, bit1=down, bit2=left, bit3=right
    pub fn from_bits(bits: u8) -> Self {
        Self {
            up: bits & 0b0001 != 0,
            down: bits & 0b0010 != 0,
            left: bits & 0b0100 != 0,
            right: bits & 0b1000 != 0,
        }
    }

    pub fn bits(self) -> u8 {
        (self.up as u8) | (self.down as u8) << 1 | (self.left as u8) << 2 | (self.right as u8) << 3
    }
}

/// A body in the world.
///
/// `id` is 0 for anonymous entities (free particles, photons); players and
/// hazards carry the owning session's PID. Variant-only fields (`control`,
/// `base_radius`, `age_ms`, `name`) sit flat and idle at their defaults for
/// the kinds that do not use them.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: u8,
    pub kind: EntityKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub radius: f32,
    /// Hazards grow: radius = base_radius + mass, recomputed each tick
    pub base_radius: f32,
    /// Index into the fixed palette
    pub color: u8,
    pub mass: f32,
    /// Players only
    pub control: Control,
    /// Photons only: milliseconds since emission
    pub age_ms: f32,
    /// Display name for players and hazards, empty otherwise
    pub name: String,
}

impl Entity {
    /// Free feeder particle with a small random drift
    pub fn particle(position: Vec2, velocity: Vec2, color: u8) -> Self {
        Self {
            id: 0,
            kind: EntityKind::Particle,
            position,
            velocity,
            acceleration: Vec2::ZERO,
            radius: entity::FEEDER_RADIUS,
            base_radius: entity::FEEDER_RADIUS,
            color,
            mass: entity::FEEDER_MASS,
            control: Control::default(),
            age_ms: 0.0,
            name: String::new(),
        }
    }

    pub fn player(id: u8, name: String, position: Vec2, color: u8) -> Self {
        Self {
            id,
            kind: EntityKind::Player,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            radius: entity::PLAYER_RADIUS,
            base_radius: entity::PLAYER_RADIUS,
            color,
            mass: entity::PLAYER_MASS,
            control: Control::default(),
            age_ms: 0.0,
            name,
        }
    }

    pub fn hazard(id: u8, name: String, position: Vec2, color: u8) -> Self {
        Self {
            id,
            kind: EntityKind::Hazard,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            radius: entity::HAZARD_BASE_RADIUS,
            base_radius: entity::HAZARD_BASE_RADIUS,
            color,
            mass: entity::HAZARD_MASS,
            control: Control::default(),
            age_ms: 0.0,
            name,
        }
    }

    pub fn photon(position: Vec2, velocity: Vec2, mass: f32, color: u8) -> Self {
        Self {
            id: 0,
            kind: EntityKind::Photon,
            position,
            velocity,
            acceleration: Vec2::ZERO,
            radius: photon::RADIUS,
            base_radius: photon::RADIUS,
            color,
            mass,
            control: Control::default(),
            age_ms: 0.0,
            name: String::new(),
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn is_hazard(&self) -> bool {
        self.kind == EntityKind::Hazard
    }

    pub fn is_photon(&self) -> bool {
        self.kind == EntityKind::Photon
    }

    /// Center distance to another entity
    pub fn distance_to(&self, other: &Entity) -> f32 {
        self.position.distance_to(other.position)
    }

    /// True when the two bodies' circles overlap
    pub fn overlaps(&self, other: &Entity) -> bool {
        self.distance_to(other) - (self.radius + other.radius) < 0.0
    }
}
