//! Backend clusters.
//!
//! # Data Flow
//! ```text
//! ClusterConfig (config)
//!     → ClusterInfo::from_config (parse destination URLs)
//!     → shared via Arc with every route that targets the cluster
//!
//! Matched request:
//!     → ClusterInfo::select (round robin over destinations)
//!     → DestinationGuard (tracks in-flight requests until dropped)
//! ```
//!
//! # Design Decisions
//! - A route may exist without a cluster; it is passed as `Option<Arc<ClusterInfo>>`
//! - Clusters are immutable; reload builds a new `ClusterInfo` only when
//!   its configuration changed

pub mod destination;
pub mod round_robin;

use std::sync::Arc;
use thiserror::Error;

use crate::config::ClusterConfig;
use crate::cluster::destination::{Destination, DestinationGuard};
use crate::cluster::round_robin::RoundRobin;

/// Strategy for picking a destination within a cluster.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    fn next_destination(&self, destinations: &[Arc<Destination>]) -> Option<Arc<Destination>>;
}

/// Errors building a cluster from configuration.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("destination '{name}' has invalid address '{address}': {source}")]
    InvalidAddress {
        name: String,
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("destination '{name}' address '{address}' must be an http URL with a host")]
    UnsupportedAddress { name: String, address: String },
}

/// A resolved backend cluster.
#[derive(Debug)]
pub struct ClusterInfo {
    config: ClusterConfig,
    destinations: Vec<Arc<Destination>>,
    balancer: Box<dyn LoadBalancer>,
}

impl ClusterInfo {
    /// Build a cluster, parsing every destination address.
    pub fn from_config(config: ClusterConfig) -> Result<Self, ClusterError> {
        let destinations = config
            .destinations
            .iter()
            .map(|d| Destination::parse(&d.name, &d.address).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            destinations,
            balancer: Box::new(RoundRobin::new()),
        })
    }

    pub fn cluster_id(&self) -> &str {
        &self.config.cluster_id
    }

    /// The configuration this cluster was built from.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn destinations(&self) -> &[Arc<Destination>] {
        &self.destinations
    }

    /// Pick a destination and track the request against it.
    pub fn select(&self) -> Option<DestinationGuard> {
        let destination = self.balancer.next_destination(&self.destinations);
        if destination.is_none() {
            tracing::debug!(cluster = %self.cluster_id(), "No destinations available");
        }
        destination.map(DestinationGuard::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DestinationConfig;

    fn config(addresses: &[&str]) -> ClusterConfig {
        ClusterConfig {
            cluster_id: "web".into(),
            destinations: addresses
                .iter()
                .enumerate()
                .map(|(i, a)| DestinationConfig {
                    name: format!("d{}", i + 1),
                    address: a.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_cluster_from_config() {
        let cluster =
            ClusterInfo::from_config(config(&["http://127.0.0.1:3000", "http://127.0.0.1:3001"]))
                .unwrap();
        assert_eq!(cluster.cluster_id(), "web");
        assert_eq!(cluster.destinations().len(), 2);

        let first = cluster.select().unwrap();
        assert_eq!(first.name(), "d1");
        assert_eq!(first.active_requests(), 1);
        drop(first);
        assert_eq!(cluster.destinations()[0].active_requests(), 0);
    }

    #[test]
    fn test_cluster_rejects_bad_address() {
        assert!(matches!(
            ClusterInfo::from_config(config(&["not a url"])),
            Err(ClusterError::InvalidAddress { .. })
        ));
        assert!(matches!(
            ClusterInfo::from_config(config(&["ftp://127.0.0.1"])),
            Err(ClusterError::UnsupportedAddress { .. })
        ));
    }

    #[test]
    fn test_empty_cluster_selects_nothing() {
        let cluster = ClusterInfo::from_config(config(&[])).unwrap();
        assert!(cluster.select().is_none());
    }
}
