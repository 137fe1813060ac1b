//! Player id (PID) allocation.
//!
//! PIDs are the wire-visible `u8` identity of a connected client and its
//! player/hazard pair. The pool covers 1..=255; 0 is reserved for anonymous
//! entities (free particles, photons) and is never handed out.

#![allow(dead_code)] // pool introspection is part of the public API

use std::collections::VecDeque;

#[derive(Debug, thiserror::Error)]
pub enum PidError {
    #[error("player id pool exhausted (255 connections)")]
    Exhausted,
}

/// FIFO pool of reusable player ids
pub struct PidPool {
    free: VecDeque<u8>,
    in_use: [bool; 256],
}

impl PidPool {
    pub fn new() -> Self {
        Self {
            free: (1..=255).collect(),
            in_use: [false; 256],
        }
    }

    /// Take the next free id. Ids released earlier are reissued in FIFO
    /// order; an id is never handed out twice while held.
    pub fn acquire(&mut self) -> Result<u8, PidError> {
        let id = self.free.pop_front().ok_or(PidError::Exhausted)?;
        self.in_use[id as usize] = true;
        Ok(id)
    }

    /// Return an id to the pool. Releasing id 0 or an id that is not
    /// currently held is a caller error and is logged and ignored.
    pub fn release(&mut self, id: u8) {
        if id == 0 || !self.in_use[id as usize] {
            tracing::warn!("Ignoring release of unheld pid {}", id);
            return;
        }
        self.in_use[id as usize] = false;
        self.free.push_back(id);
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

impl Default for PidPool {
    fn default() -> Self {
        Self::new()
    }
}
