//! Route lookup.
//!
//! # Responsibilities
//! - Store dispatch entries of the published routes
//! - Look up the matching entry for a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Ranking: entry order ascending, then route priority descending,
//!   then route id for determinism
//! - O(n) scan over entries (acceptable for typical route counts)
//! - First match wins

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;

use crate::routing::dispatch::{DispatchEntry, RouteRuntimeConfig};
use crate::routing::pattern::RouteValues;

/// A successful lookup: the owning route, which of its entries matched,
/// and the captured path values. Stored in request extensions for the pipeline.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    route: Arc<RouteRuntimeConfig>,
    entry_index: usize,
    values: RouteValues,
}

impl MatchedRoute {
    pub fn route(&self) -> &Arc<RouteRuntimeConfig> {
        &self.route
    }

    pub fn entry(&self) -> &DispatchEntry {
        &self.route.dispatch_entries()[self.entry_index]
    }

    pub fn values(&self) -> &RouteValues {
        &self.values
    }
}

/// Immutable table of dispatch entries.
#[derive(Debug, Default)]
pub struct RouteTable {
    // (route, index into its dispatch entries)
    entries: Vec<(Arc<RouteRuntimeConfig>, usize)>,
}

impl RouteTable {
    /// Index every dispatch entry of the given routes.
    pub fn new(routes: impl IntoIterator<Item = Arc<RouteRuntimeConfig>>) -> Self {
        let mut entries: Vec<(Arc<RouteRuntimeConfig>, usize)> = routes
            .into_iter()
            .flat_map(|route| {
                (0..route.dispatch_entries().len()).map(move |i| (route.clone(), i))
            })
            .collect();

        entries.sort_by(|(a, ai), (b, bi)| {
            let ea = &a.dispatch_entries()[*ai];
            let eb = &b.dispatch_entries()[*bi];
            ea.order()
                .cmp(&eb.order())
                .then_with(|| b.priority().cmp(&a.priority()))
                .then_with(|| a.route_id().cmp(b.route_id()))
        });

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Route ids in match order.
    pub fn route_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(route, _)| route.route_id())
    }

    /// Find the first entry matching the request.
    pub fn match_request(&self, req: &Request<Body>) -> Option<MatchedRoute> {
        self.entries.iter().find_map(|(route, index)| {
            route.dispatch_entries()[*index]
                .match_request(req)
                .map(|values| MatchedRoute {
                    route: route.clone(),
                    entry_index: *index,
                    values,
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::builder::RouteRuntimeBuilder;
    use crate::routing::parsed::{ParsedRoute, RouteInfo};
    use crate::transforms::StandardTransformBuilder;

    fn build(id: &str, path: &str, priority: i32, hosts: &[&str]) -> Arc<RouteRuntimeConfig> {
        let builder = RouteRuntimeBuilder::new(Arc::new(StandardTransformBuilder::new()));
        let mut source = ParsedRoute::new(id);
        source.path = path.into();
        source.priority = priority;
        source.hosts = hosts.iter().map(|h| h.to_string()).collect();
        builder.build(&source, None, Arc::new(RouteInfo::new(id))).unwrap()
    }

    fn req(host: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("Host", host)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_priority_ranking() {
        let table = RouteTable::new(vec![
            build("fallback", "", 0, &[]),
            build("api", "/api/{**rest}", 10, &[]),
        ]);
        assert_eq!(table.route_ids().collect::<Vec<_>>(), vec!["api", "fallback"]);

        let matched = table.match_request(&req("x.test", "/api/users")).unwrap();
        assert_eq!(matched.route().route_id(), "api");
        assert_eq!(matched.values().get("rest").map(String::as_str), Some("users"));

        let matched = table.match_request(&req("x.test", "/index.html")).unwrap();
        assert_eq!(matched.route().route_id(), "fallback");
    }

    #[test]
    fn test_host_scoping_and_no_match() {
        let table = RouteTable::new(vec![build("tenant", "/app", 0, &["tenant.example.com"])]);

        assert!(table.match_request(&req("tenant.example.com", "/app")).is_some());
        assert!(table.match_request(&req("other.example.com", "/app")).is_none());
        assert!(table.match_request(&req("tenant.example.com", "/nope")).is_none());
    }

    #[test]
    fn test_matched_entry_points_back_to_route() {
        let route = build("r1", "/a", 0, &[]);
        let table = RouteTable::new(vec![route.clone()]);
        let matched = table.match_request(&req("x", "/a")).unwrap();
        let owner = matched.entry().owning_route().unwrap();
        assert!(Arc::ptr_eq(&owner, &route));
        assert!(Arc::ptr_eq(matched.route(), &route));
    }

    #[test]
    fn test_empty_table() {
        let table = RouteTable::default();
        assert!(table.is_empty());
        assert!(table.match_request(&req("x", "/")).is_none());
    }
}
