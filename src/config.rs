use std::net::{IpAddr, Ipv4Addr};

use crate::game::constants::{map, net, photon, physics, population};

/// Simulation parameters handed to the world
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Map dimensions in pixels; must stay below 65536 (wire coordinates are u16)
    pub map_width: f32,
    pub map_height: f32,
    /// Client viewport used for per-player snapshot culling
    pub view_width: f32,
    pub view_height: f32,
    /// Fixed tick duration in milliseconds
    pub tick_ms: f32,
    /// Velocity retained per tick
    pub friction: f32,
    /// Gravitational constant
    pub gravity: f32,
    /// Free particles seeded at startup
    pub starting_particles: usize,
    /// Entity budget granted per connected player
    pub particles_per_player: usize,
    /// Photon lifetime in milliseconds
    pub photon_ttl_ms: f32,
    /// Player names are truncated to this many bytes
    pub name_max_bytes: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map_width: map::WIDTH,
            map_height: map::HEIGHT,
            view_width: map::VIEW_WIDTH,
            view_height: map::VIEW_HEIGHT,
            tick_ms: physics::TICK_MS,
            friction: physics::FRICTION,
            gravity: physics::G,
            starting_particles: population::STARTING_PARTICLES,
            particles_per_player: population::PARTICLES_PER_PLAYER,
            photon_ttl_ms: photon::TTL_MS,
            name_max_bytes: net::NAME_MAX_BYTES,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Path to TLS certificate file (self-signed dev cert when absent)
    pub tls_cert_path: Option<String>,
    /// Path to TLS key file
    pub tls_key_path: Option<String>,
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 4433,
            tls_cert_path: None,
            tls_key_path: None,
            world: WorldConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            if let Ok(parsed) = addr.parse() {
                config.bind_address = parsed;
            } else {
                tracing::warn!("Invalid BIND_ADDRESS '{}', using default", addr);
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(parsed) if parsed > 0 => config.port = parsed,
                _ => tracing::warn!("Invalid PORT '{}', using default", port),
            }
        }

        if let Ok(cert_path) = std::env::var("TLS_CERT_PATH") {
            config.tls_cert_path = Some(cert_path);
        }
        if let Ok(key_path) = std::env::var("TLS_KEY_PATH") {
            config.tls_key_path = Some(key_path);
        }

        read_dimension("MAP_WIDTH", &mut config.world.map_width);
        read_dimension("MAP_HEIGHT", &mut config.world.map_height);
        read_dimension("VIEW_WIDTH", &mut config.world.view_width);
        read_dimension("VIEW_HEIGHT", &mut config.world.view_height);

        if let Ok(friction) = std::env::var("FRICTION") {
            match friction.parse::<f32>() {
                Ok(parsed) if parsed > 0.0 && parsed <= 1.0 => config.world.friction = parsed,
                _ => tracing::warn!("FRICTION must be in (0, 1], using default"),
            }
        }

        if let Ok(gravity) = std::env::var("GRAVITY") {
            match gravity.parse::<f32>() {
                Ok(parsed) if parsed >= 0.0 => config.world.gravity = parsed,
                _ => tracing::warn!("Invalid GRAVITY '{}', using default", gravity),
            }
        }

        if let Ok(count) = std::env::var("STARTING_PARTICLES") {
            match count.parse::<usize>() {
                Ok(parsed) => config.world.starting_particles = parsed,
                _ => tracing::warn!("Invalid STARTING_PARTICLES '{}', using default", count),
            }
        }

        if let Ok(count) = std::env::var("PARTICLES_PER_PLAYER") {
            match count.parse::<usize>() {
                Ok(parsed) => config.world.particles_per_player = parsed,
                _ => tracing::warn!("Invalid PARTICLES_PER_PLAYER '{}', using default", count),
            }
        }

        if let Ok(ttl) = std::env::var("PHOTON_TTL_MS") {
            match ttl.parse::<f32>() {
                Ok(parsed) if parsed > 0.0 => config.world.photon_ttl_ms = parsed,
                _ => tracing::warn!("Invalid PHOTON_TTL_MS '{}', using default", ttl),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        let w = &self.world;
        if !(w.map_width > 0.0 && w.map_width < 65536.0)
            || !(w.map_height > 0.0 && w.map_height < 65536.0)
        {
            return Err("Map dimensions must be in (0, 65536)".to_string());
        }
        if w.view_width > w.map_width || w.view_height > w.map_height {
            return Err("View cannot exceed the map".to_string());
        }
        if !(w.friction > 0.0 && w.friction <= 1.0) {
            return Err("Friction must be in (0, 1]".to_string());
        }
        if w.tick_ms <= 0.0 {
            return Err("Tick duration must be positive".to_string());
        }
        if w.name_max_bytes == 0 {
            return Err("Name length cap must be at least 1".to_string());
        }
        Ok(())
    }
}

fn read_dimension(var: &str, target: &mut f32) {
    if let Ok(value) = std::env::var(var) {
        match value.parse::<f32>() {
            Ok(parsed) if parsed > 0.0 && parsed < 65536.0 => *target = parsed,
            _ => tracing::warn!("{} must be in (0, 65536), using default", var),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4433);
        assert_eq!(config.world.map_width, 3000.0);
        assert_eq!(config.world.map_height, 2200.0);
        assert_eq!(config.world.starting_particles, 35);
        assert_eq!(config.world.particles_per_player, 30);
        assert_eq!(config.world.name_max_bytes, 16);
    }

    #[test]
    fn test_default_validates() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_map() {
        let mut config = ServerConfig::default();
        config.world.map_width = 70000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_view_larger_than_map() {
        let mut config = ServerConfig::default();
        config.world.view_width = config.world.map_width + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_friction() {
        let mut config = ServerConfig::default();
        config.world.friction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default() {
        let config = ServerConfig::load_or_default();
        assert!(config.port > 0);
    }
}
