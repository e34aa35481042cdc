//! Client identity rotation
//!
//! Each fetch attempt gets a fresh identity: a randomly chosen browser user
//! agent and the next proxy slot in round-robin order.

use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The identity a single attempt presents to the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,

    /// Index of the proxy client to send through; 0 when there are no proxies
    pub proxy_slot: usize,
}

pub struct IdentityPool {
    user_agents: Vec<String>,
    proxy_slots: usize,
    next_slot: AtomicUsize,
}

impl IdentityPool {
    /// Creates a pool over the given user agents and number of proxy slots
    ///
    /// An empty user-agent list falls back to the built-in browser strings.
    pub fn new(user_agents: Vec<String>, proxy_slots: usize) -> Self {
        let user_agents = if user_agents.is_empty() {
            crate::config::default_user_agents()
        } else {
            user_agents
        };

        Self {
            user_agents,
            proxy_slots: proxy_slots.max(1),
            next_slot: AtomicUsize::new(0),
        }
    }

    /// Picks the identity for the next attempt
    pub fn next(&self) -> Identity {
        let user_agent = self
            .user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();
        let proxy_slot = self.next_slot.fetch_add(1, Ordering::Relaxed) % self.proxy_slots;

        Identity {
            user_agent,
            proxy_slot,
        }
    }
}
