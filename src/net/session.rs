//! Per-connection session state and the session registry.
//!
//! A session exists from the moment a connection gets a PID until the
//! disconnect cleanup releases it. Entities are owned by the world; the
//! session only remembers which PID it holds, the registered display name
//! (set by the first start request) and the shared handle used to write to
//! the client.

#![allow(dead_code)] // registry accessors that are part of the public API

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Send half of a client's stream, shared between the connection task and
/// the broadcast fan-out tasks
pub type SharedWriter = Arc<RwLock<Option<wtransport::SendStream>>>;

pub struct Session {
    pub pid: u8,
    /// Registered display name; set on the first start request
    pub name: Option<String>,
    pub writer: SharedWriter,
}

impl Session {
    pub fn new(pid: u8, writer: SharedWriter) -> Self {
        Self {
            pid,
            name: None,
            writer,
        }
    }

    /// A session is "started" once it has registered a name (and thereby
    /// owns a player/hazard pair)
    pub fn started(&self) -> bool {
        self.name.is_some()
    }
}

/// All live sessions, keyed by PID
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<u8, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.pid, session);
    }

    pub fn remove(&mut self, pid: u8) -> Option<Session> {
        self.sessions.remove(&pid)
    }

    pub fn get(&self, pid: u8) -> Option<&Session> {
        self.sessions.get(&pid)
    }

    pub fn set_name(&mut self, pid: u8, name: String) -> bool {
        match self.sessions.get_mut(&pid) {
            Some(session) => {
                session.name = Some(name);
                true
            }
            None => false,
        }
    }

    /// Name of a session, for chat logging
    pub fn name_of(&self, pid: u8) -> Option<&str> {
        self.sessions.get(&pid).and_then(|s| s.name.as_deref())
    }

    /// (pid, name) of every started session - replayed to late joiners so
    /// their chat can resolve names
    pub fn named(&self) -> Vec<(u8, String)> {
        let mut named: Vec<_> = self
            .sessions
            .values()
            .filter_map(|s| s.name.clone().map(|n| (s.pid, n)))
            .collect();
        named.sort_by_key(|(pid, _)| *pid);
        named
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
