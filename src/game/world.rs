//! Authoritative world state and the fixed-tick update pass.
//!
//! The update pass iterates over the tick-start population by index and
//! marks absorbed or expired entities in a side mask instead of splicing the
//! collection mid-loop; marked entities are invisible to every later
//! interaction in the same tick and compacted out after the pass.

use rand::Rng;
use std::f32::consts::TAU;

use crate::config::WorldConfig;
use crate::game::constants::{entity as tuning, palette, photon, population};
use crate::game::entity::{Control, Entity, EntityKind};
use crate::game::systems::{collision, gravity};
use crate::util::vec2::Vec2;

pub struct World {
    config: WorldConfig,
    pub entities: Vec<Entity>,
    tick: u64,
}

impl World {
    /// Build a world seeded with the configured number of free particles
    pub fn new(config: WorldConfig) -> Self {
        let mut world = Self {
            config,
            entities: Vec::new(),
            tick: 0,
        };
        for _ in 0..world.config.starting_particles {
            world.spawn_feeder();
        }
        world
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn player_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_player()).count()
    }

    pub fn find_player(&self, id: u8) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_player() && e.id == id)
    }

    /// Update a player's control vector. Returns false when the session has
    /// no live player (control before start is a no-op).
    pub fn set_control(&mut self, id: u8, control: Control) -> bool {
        match self
            .entities
            .iter_mut()
            .find(|e| e.is_player() && e.id == id)
        {
            Some(player) => {
                player.control = control;
                true
            }
            None => false,
        }
    }

    /// Remove every entity owned by `id` (the player and its hazard)
    pub fn remove_owned(&mut self, id: u8) {
        debug_assert_ne!(id, 0);
        self.entities.retain(|e| e.id != id);
    }

    /// Spawn a player and its hazard at non-overlapping random locations,
    /// sharing one random palette color. Returns the color index.
    pub fn spawn_player_pair(&mut self, id: u8, name: &str) -> u8 {
        let mut rng = rand::thread_rng();
        let color = rng.gen_range(0..palette::COUNT);

        let player_pos = self.random_spawn_location(tuning::PLAYER_RADIUS, &mut rng);
        self.entities
            .push(Entity::player(id, name.to_string(), player_pos, color));

        let hazard_pos = self.random_spawn_location(tuning::HAZARD_BASE_RADIUS, &mut rng);
        self.entities
            .push(Entity::hazard(id, name.to_string(), hazard_pos, color));

        color
    }

    /// Advance the simulation by one fixed tick
    pub fn step(&mut self) {
        self.tick += 1;

        let count = self.entities.len();
        let mut removed = vec![false; count];

        for i in 0..count {
            if removed[i] {
                continue;
            }
            match self.entities[i].kind {
                EntityKind::Particle => self.update_particle(i, &mut removed),
                EntityKind::Player => self.update_player(i, &mut removed),
                EntityKind::Hazard => self.update_hazard(i, &mut removed),
                EntityKind::Photon => self.update_photon(i, &mut removed),
            }
        }

        if removed.contains(&true) {
            let mut keep = removed.iter().map(|r| !r);
            self.entities.retain(|_| keep.next().unwrap_or(true));
        }

        if self.tick % population::FEEDER_INTERVAL_TICKS == 0 {
            self.maintain_population();
        }
        if self.tick % population::RADIATE_INTERVAL_TICKS == 0 {
            self.radiate_hazards();
        }
    }

    fn update_particle(&mut self, i: usize, removed: &mut [bool]) {
        for j in 0..removed.len() {
            if j == i || removed[j] {
                continue;
            }
            // hazards handle their own contacts (absorption or bounce)
            if self.entities[j].is_hazard() {
                continue;
            }
            let (a, b) = collision::pair_mut(&mut self.entities, i, j);
            if a.overlaps(b) {
                collision::resolve_collision(a, b);
            }
        }
        self.integrate(i, removed);
    }

    fn update_player(&mut self, i: usize, removed: &mut [bool]) {
        {
            let player = &mut self.entities[i];
            let dv = tuning::CONTROL_IMPULSE;
            if player.control.up {
                player.velocity.y -= dv;
            }
            if player.control.down {
                player.velocity.y += dv;
            }
            if player.control.left {
                player.velocity.x -= dv;
            }
            if player.control.right {
                player.velocity.x += dv;
            }
        }

        for j in 0..removed.len() {
            if j == i || removed[j] {
                continue;
            }
            // the pair with the own hazard is resolved from the hazard side
            if self.entities[j].is_hazard() && self.entities[j].id == self.entities[i].id {
                continue;
            }
            let (a, b) = collision::pair_mut(&mut self.entities, i, j);
            if a.overlaps(b) {
                collision::resolve_collision(a, b);
            }
        }
        self.integrate(i, removed);
    }

    /// Gravity, border reflection and velocity/position integration shared
    /// by particles and players
    fn integrate(&mut self, i: usize, removed: &[bool]) {
        let force = gravity::accumulate(&self.entities, removed, i, self.config.gravity);
        let (width, height) = (self.config.map_width, self.config.map_height);
        let tick_ms = self.config.tick_ms;
        let friction = self.config.friction;

        let e = &mut self.entities[i];
        e.acceleration = force * (1.0 / e.mass);
        collision::reflect_borders(e, width, height);
        e.velocity += e.acceleration * (1.0 / tick_ms);
        e.velocity *= friction;
        e.position += e.velocity;
    }

    fn update_hazard(&mut self, i: usize, removed: &mut [bool]) {
        for j in 0..removed.len() {
            if j == i || removed[j] {
                continue;
            }
            let within = {
                let hazard = &self.entities[i];
                hazard.distance_to(&self.entities[j]) - hazard.radius < 0.0
            };
            if !within {
                continue;
            }

            let same_owner = self.entities[j].id == self.entities[i].id;
            if same_owner || self.entities[j].is_hazard() {
                let (a, b) = collision::pair_mut(&mut self.entities, i, j);
                collision::resolve_collision(a, b);
            } else {
                // absorb: take the victim's color and mass, drop the victim
                let color = self.entities[j].color;
                let mass = self.entities[j].mass;
                removed[j] = true;
                let hazard = &mut self.entities[i];
                hazard.color = color;
                hazard.mass += mass;
            }
        }

        let (width, height) = (self.config.map_width, self.config.map_height);
        let friction = self.config.friction;
        let hazard = &mut self.entities[i];
        collision::reflect_borders(hazard, width, height);
        hazard.radius = hazard.base_radius + hazard.mass;
        hazard.position += hazard.velocity;
        hazard.velocity *= friction;
    }

    fn update_photon(&mut self, i: usize, removed: &mut [bool]) {
        let tick_ms = self.config.tick_ms;
        let ttl = self.config.photon_ttl_ms;
        let (width, height) = (self.config.map_width, self.config.map_height);
        let friction = self.config.friction;

        let e = &mut self.entities[i];
        // per-tick factor keeps mass == emission_mass * exp(-age / tau)
        e.mass *= (-tick_ms / photon::DECAY_TAU_MS).exp();
        e.age_ms += tick_ms;
        if e.age_ms > ttl {
            removed[i] = true;
            return;
        }

        collision::reflect_borders(e, width, height);
        e.position += e.velocity;
        e.velocity *= friction;
    }

    /// Feeder spawn timer body: while at least one player is in the game and
    /// the population is under budget, add one free particle
    fn maintain_population(&mut self) {
        let players = self.player_count();
        let cap =
            players * self.config.particles_per_player + self.config.starting_particles;
        if players > 0 && self.entities.len() < cap {
            self.spawn_feeder();
        }
    }

    fn spawn_feeder(&mut self) {
        let mut rng = rand::thread_rng();
        let color = rng.gen_range(0..palette::COUNT);
        let position = self.random_spawn_location(tuning::FEEDER_RADIUS, &mut rng);
        let velocity = Vec2::new(
            (rng.gen::<f32>() - 0.5) * tuning::FEEDER_VELOCITY_SPREAD,
            (rng.gen::<f32>() - 0.5) * tuning::FEEDER_VELOCITY_SPREAD,
        );
        self.entities.push(Entity::particle(position, velocity, color));
    }

    /// Every hazard emits a photon on its perimeter and sheds the same mass
    pub fn radiate_hazards(&mut self) {
        let mut rng = rand::thread_rng();
        let mut emitted = Vec::new();

        for hazard in self.entities.iter_mut().filter(|e| e.is_hazard()) {
            let theta = rng.gen::<f32>() * TAU;
            let direction = Vec2::from_angle(theta);
            let position = hazard.position + direction * (hazard.radius + photon::RADIUS);
            let velocity = direction * photon::SPEED;
            let mass = hazard.mass * photon::EMISSION_RATIO;
            emitted.push(Entity::photon(position, velocity, mass, hazard.color));
            hazard.mass -= mass;
        }

        self.entities.extend(emitted);
    }

    /// Uniform random point keeping `radius` clear of the borders, rejecting
    /// candidates near an existing entity. Attempts are capped so the loop
    /// terminates even on a crowded map; the last candidate wins the tie.
    fn random_spawn_location<R: Rng>(&self, radius: f32, rng: &mut R) -> Vec2 {
        let mut candidate = Vec2::ZERO;
        for _ in 0..population::MAX_SPAWN_ATTEMPTS {
            candidate = Vec2::new(
                rng.gen::<f32>() * (self.config.map_width - radius * 2.0) + radius,
                rng.gen::<f32>() * (self.config.map_height - radius * 2.0) + radius,
            );
            if !self.touches_existing(candidate) {
                return candidate;
            }
        }
        candidate
    }

    fn touches_existing(&self, point: Vec2) -> bool {
        self.entities
            .iter()
            .any(|e| point.distance_to(e.position) - e.radius * 2.0 < 0.0)
    }
}
