//! Shared arena state and the fixed-tick game loop.
//!
//! Everything that touches the world - the tick, start/control/chat
//! handling, connect/disconnect - goes through one `ArenaSession` behind an
//! `Arc<RwLock>`, so no two mutations interleave mid-update. Outbound
//! buffers are built under the lock but written by spawned per-client
//! tasks: a slow client never stalls the tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::game::entity::{Control, Entity};
use crate::game::world::World;
use crate::net::framing;
use crate::net::pid::{PidError, PidPool};
use crate::net::protocol;
use crate::net::session::{Session, SessionRegistry, SharedWriter};

pub struct ArenaSession {
    pub world: World,
    pub registry: SessionRegistry,
    pids: PidPool,
}

impl ArenaSession {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            world: World::new(config.world.clone()),
            registry: SessionRegistry::new(),
            pids: PidPool::new(),
        }
    }

    /// Register a new connection. Allocates a PID and returns it along with
    /// the messages the client must receive before anything else: the init
    /// snapshot and one new-player record per already-named session.
    pub fn connect(&mut self, writer: SharedWriter) -> Result<(u8, Vec<Vec<u8>>), PidError> {
        let pid = self.pids.acquire()?;
        self.registry.insert(Session::new(pid, writer));

        let mut greetings = vec![protocol::encode_init(
            pid,
            self.world.config(),
            &self.world.entities,
        )];
        for (other, name) in self.registry.named() {
            greetings.push(protocol::encode_new_player(other, &name));
        }

        info!(
            "Client connected (pid {}), {} sessions live",
            pid,
            self.registry.len()
        );
        Ok((pid, greetings))
    }

    /// Start request: drop any stale pair from a previous start, spawn a
    /// fresh player/hazard pair, register the name, announce it to everyone
    /// and ack the requester. Returns the announcement for inspection.
    pub fn handle_start(&mut self, pid: u8, name: String) -> Option<Vec<u8>> {
        if !self.registry.set_name(pid, name.clone()) {
            warn!("Start request from unknown pid {}", pid);
            return None;
        }

        self.world.remove_owned(pid);
        self.world.spawn_player_pair(pid, &name);
        info!("\"{}\" joined the arena (pid {})", name, pid);

        let announce = protocol::encode_new_player(pid, &name);
        self.broadcast(announce.clone());
        self.send_to(pid, protocol::encode_start_ack());
        Some(announce)
    }

    /// Control input: forwarded to the session's player, silently ignored
    /// when no player exists yet
    pub fn handle_control(&mut self, pid: u8, control: Control) {
        if !self.world.set_control(pid, control) {
            debug!("Control input before start from pid {}", pid);
        }
    }

    /// Chat: prefix with the sender pid and fan out to every session.
    /// Returns the broadcast buffer for inspection.
    pub fn handle_chat(&mut self, pid: u8, text: &str) -> Vec<u8> {
        let sender = self.registry.name_of(pid).unwrap_or("anonymous");
        info!("[chat] {} (pid {}): \"{}\"", sender, pid, text);

        let broadcast = protocol::encode_chat(pid, text);
        self.broadcast(broadcast.clone());
        broadcast
    }

    /// Disconnect cleanup: remove the session, its player and hazard, and
    /// return the PID to the pool. Safe to call more than once.
    pub fn disconnect(&mut self, pid: u8) {
        if self.registry.remove(pid).is_none() {
            return;
        }
        self.world.remove_owned(pid);
        self.pids.release(pid);
        info!(
            "Client disconnected (pid {}), {} sessions live",
            pid,
            self.registry.len()
        );
    }

    /// One scheduler tick: advance the simulation and fan out per-client
    /// snapshots. Skipped entirely while no client is connected.
    pub fn tick(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        self.world.step();
        self.broadcast_snapshots();
    }

    /// Started clients get a visibility-culled snapshot around their player;
    /// everyone else gets the full world
    fn broadcast_snapshots(&self) {
        for session in self.registry.iter() {
            let buffer = match self.world.find_player(session.pid) {
                Some(player) => {
                    let visible = protocol::visible_entities(
                        &self.world.entities,
                        player,
                        self.world.config(),
                    );
                    protocol::encode_update(&visible)
                }
                None => {
                    let all: Vec<&Entity> = self.world.entities.iter().collect();
                    protocol::encode_update(&all)
                }
            };
            send_frame_task(session.writer.clone(), session.pid, buffer);
        }
    }

    /// Fan a buffer out to every session without blocking the caller
    pub fn broadcast(&self, data: Vec<u8>) {
        for session in self.registry.iter() {
            send_frame_task(session.writer.clone(), session.pid, data.clone());
        }
    }

    /// Send a buffer to a single session without blocking the caller
    pub fn send_to(&self, pid: u8, data: Vec<u8>) {
        if let Some(session) = self.registry.get(pid) {
            send_frame_task(session.writer.clone(), pid, data);
        }
    }
}

/// Write one frame on a spawned task; failures are that client's problem
/// and surface as its disconnect, never as tick latency
fn send_frame_task(writer: SharedWriter, pid: u8, data: Vec<u8>) {
    tokio::spawn(async move {
        let mut guard = writer.write().await;
        if let Some(stream) = guard.as_mut() {
            if let Err(e) = framing::write_frame(stream, &data).await {
                debug!("Send to pid {} failed: {}", pid, e);
            }
        }
    });
}

/// Spawn the fixed-tick driver task
pub fn start_game_loop(session: Arc<RwLock<ArenaSession>>) {
    tokio::spawn(async move {
        let tick_ms = session.read().await.world.config().tick_ms;
        let mut ticker = interval(Duration::from_secs_f32(tick_ms / 1000.0));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Game loop started ({:.2} ms per tick)", tick_ms);

        // one stats line every ~30 seconds
        let stats_interval = (30_000.0 / tick_ms) as u64;
        let mut ticks: u64 = 0;

        loop {
            ticker.tick().await;
            ticks += 1;

            session.write().await.tick();

            if ticks % stats_interval == 0 {
                let guard = session.read().await;
                info!(
                    "Arena: world tick {}, {} sessions, {} players, {} entities",
                    guard.world.tick(),
                    guard.registry.len(),
                    guard.world.player_count(),
                    guard.world.entities.len()
                );
            }
        }
    });
}
