//! Round-robin destination selection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cluster::destination::Destination;
use crate::cluster::LoadBalancer;

/// Round-robin selector.
/// Stores an internal counter to rotate through destinations.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_destination(&self, destinations: &[Arc<Destination>]) -> Option<Arc<Destination>> {
        if destinations.is_empty() {
            return None;
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % destinations.len();
        Some(destinations[index].clone())
    }
}
