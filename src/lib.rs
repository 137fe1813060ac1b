//! Photon Arena Server Library
//!
//! An authoritative real-time arena server over WebTransport: a fixed-tick
//! physics simulation (gravity, elastic collisions, mass absorption, photon
//! decay) broadcast to connected clients as packed binary snapshots.

pub mod config;
pub mod game;
pub mod net;
pub mod util;
