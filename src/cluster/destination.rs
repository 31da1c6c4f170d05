//! Destination abstraction.
//!
//! # Responsibilities
//! - Represent a single backend address within a cluster
//! - Track in-flight requests

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::cluster::ClusterError;

/// A single backend destination.
#[derive(Debug)]
pub struct Destination {
    name: String,
    url: Url,
    /// `host:port` used as the URI authority when forwarding.
    authority: String,
    active_requests: AtomicUsize,
}

impl Destination {
    /// Parse an `http://host[:port][/base]` address.
    pub fn parse(name: &str, address: &str) -> Result<Self, ClusterError> {
        let url = Url::parse(address).map_err(|source| ClusterError::InvalidAddress {
            name: name.to_string(),
            address: address.to_string(),
            source,
        })?;

        let host = match url.host_str() {
            Some(host) if url.scheme() == "http" => host,
            _ => {
                return Err(ClusterError::UnsupportedAddress {
                    name: name.to_string(),
                    address: address.to_string(),
                })
            }
        };
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            name: name.to_string(),
            url,
            authority,
            active_requests: AtomicUsize::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Base path of the destination, without a trailing slash (empty for `/`).
    pub fn base_path(&self) -> &str {
        self.url.path().trim_end_matches('/')
    }

    /// Number of requests currently in flight to this destination.
    pub fn active_requests(&self) -> usize {
        self.active_requests.load(Ordering::Relaxed)
    }
}

/// A RAII guard that tracks one in-flight request.
#[derive(Debug)]
pub struct DestinationGuard {
    destination: Arc<Destination>,
}

impl DestinationGuard {
    pub fn new(destination: Arc<Destination>) -> Self {
        destination.active_requests.fetch_add(1, Ordering::Relaxed);
        Self { destination }
    }
}

impl Deref for DestinationGuard {
    type Target = Destination;
    fn deref(&self) -> &Self::Target {
        &self.destination
    }
}

impl Drop for DestinationGuard {
    fn drop(&mut self) {
        self.destination.active_requests.fetch_sub(1, Ordering::Relaxed);
    }
}
