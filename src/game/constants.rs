#![allow(dead_code)] // constants documented here even where config carries the live value

/// Physics constants
pub mod physics {
    /// Server tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Tick duration in milliseconds (fractional - 60 Hz does not divide evenly)
    pub const TICK_MS: f32 = 1000.0 / TICK_RATE as f32;
    /// Velocity retained per tick
    pub const FRICTION: f32 = 0.99;
    /// Gravitational constant, pixels per second^2
    pub const G: f32 = 9.8;
}

/// Map and camera defaults
pub mod map {
    /// World width in pixels. Must stay below 65536 (wire coordinates are u16).
    pub const WIDTH: f32 = 3000.0;
    pub const HEIGHT: f32 = 2200.0;
    /// Client viewport used for snapshot culling
    pub const VIEW_WIDTH: f32 = 1920.0;
    pub const VIEW_HEIGHT: f32 = 1080.0;
}

/// Entity tuning
pub mod entity {
    /// Free feeder particle radius and mass
    pub const FEEDER_RADIUS: f32 = 15.0;
    pub const FEEDER_MASS: f32 = 1.0;
    /// Feeder particles spawn with velocity uniform in (-SPREAD/2, SPREAD/2) per axis
    pub const FEEDER_VELOCITY_SPREAD: f32 = 5.0;
    /// Players are heavier than feeders so collisions transfer momentum
    pub const PLAYER_RADIUS: f32 = 20.0;
    pub const PLAYER_MASS: f32 = 2.0;
    /// Velocity impulse per active control flag per tick
    pub const CONTROL_IMPULSE: f32 = 0.2;
    /// Hazard visual radius is HAZARD_BASE_RADIUS + mass, recomputed every tick
    pub const HAZARD_BASE_RADIUS: f32 = 20.0;
    pub const HAZARD_MASS: f32 = 1.0;
}

/// Photon emission and decay
pub mod photon {
    pub const RADIUS: f32 = 5.0;
    /// Radial speed at emission
    pub const SPEED: f32 = 5.0;
    /// Removed once age exceeds this
    pub const TTL_MS: f32 = 2000.0;
    /// Decay time constant in ms. One tick of age (~16.7 ms) collapses the
    /// mass to ~0 - an inherited tuning kept for its brief-flash effect.
    pub const DECAY_TAU_MS: f32 = 1.0;
    /// Fraction of hazard mass carried away (and lost) per radiate call
    pub const EMISSION_RATIO: f32 = 0.01;
}

/// Gravity interaction cutoffs. Empirical tuning, not physics: an entity
/// feels no pull from bodies whose center it overlaps, nor from bodies more
/// than four of their radii away.
pub mod gravity {
    pub const FAR_RADIUS_FACTOR: f32 = 4.0;
}

/// Population maintenance
pub mod population {
    /// Free particles seeded at world start
    pub const STARTING_PARTICLES: usize = 35;
    /// Entity budget granted per connected player
    pub const PARTICLES_PER_PLAYER: usize = 30;
    /// Ticks between feeder spawn checks
    pub const FEEDER_INTERVAL_TICKS: u64 = 60;
    /// Ticks between hazard photon emissions
    pub const RADIATE_INTERVAL_TICKS: u64 = 120;
    /// Rejection-sampling cap for non-overlapping spawn locations
    pub const MAX_SPAWN_ATTEMPTS: u32 = 128;
}

/// The fixed color palette. The wire protocol carries only the index; the
/// hex values document what clients render.
pub mod palette {
    pub const COLORS: [&str; 5] = ["#2F2933", "#01A2A6", "#29D9C2", "#BDF271", "#FFFFA6"];
    pub const COUNT: u8 = COLORS.len() as u8;
}

/// Networking constants
pub mod net {
    /// Maximum framed message size
    pub const MAX_MESSAGE_SIZE: usize = 65536;
    /// Packed wire size of one particle record
    pub const PARTICLE_RECORD_SIZE: usize = 9;
    /// Player names longer than this many bytes are truncated
    pub const NAME_MAX_BYTES: usize = 16;
}
