//! Runtime route records and the dispatch entries that point back at them.
//!
//! A [`RouteRuntimeConfig`] owns its [`DispatchEntry`] list, and each entry
//! holds a weak back-reference to the route that owns it. Both are immutable
//! once the builder publishes the route.

use std::sync::{Arc, Weak};

use axum::body::Body;
use axum::http::Request;

use crate::cluster::ClusterInfo;
use crate::routing::matcher::{HostConstraint, Matcher, MethodConstraint};
use crate::routing::parsed::{ConfigHash, RouteInfo};
use crate::routing::pattern::{RoutePattern, RouteValues};
use crate::routing::pipeline::RouteHandler;
use crate::routing::policy::{AuthorizationPolicy, CorsPolicy};
use crate::transforms::TransformChain;

/// The matchable unit registered with the route table.
#[derive(Debug)]
pub struct DispatchEntry {
    pub(crate) pattern: RoutePattern,
    pub(crate) order: i32,
    pub(crate) host_constraint: Option<HostConstraint>,
    pub(crate) method_constraint: Option<MethodConstraint>,
    pub(crate) cors: CorsPolicy,
    pub(crate) authorization: AuthorizationPolicy,
    pub(crate) display_name: String,
    pub(crate) owner: Weak<RouteRuntimeConfig>,
    pub(crate) handler: RouteHandler,
}

impl DispatchEntry {
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Ordering value used by the route table (lower = checked first).
    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn host_constraint(&self) -> Option<&HostConstraint> {
        self.host_constraint.as_ref()
    }

    pub fn method_constraint(&self) -> Option<&MethodConstraint> {
        self.method_constraint.as_ref()
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    pub fn authorization(&self) -> &AuthorizationPolicy {
        &self.authorization
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    /// The route this entry belongs to. `None` only once the route is dropped.
    pub fn owning_route(&self) -> Option<Arc<RouteRuntimeConfig>> {
        self.owner.upgrade()
    }

    /// Evaluate host, method and path constraints. Returns the captured
    /// route values on a match.
    pub fn match_request(&self, req: &Request<Body>) -> Option<RouteValues> {
        if let Some(hosts) = &self.host_constraint {
            if !hosts.matches(req) {
                return None;
            }
        }
        if let Some(methods) = &self.method_constraint {
            if !methods.matches(req) {
                return None;
            }
        }
        self.pattern.match_path(req.uri().path())
    }
}

/// Immutable runtime record for one configured route.
#[derive(Debug)]
pub struct RouteRuntimeConfig {
    pub(crate) route_info: Arc<RouteInfo>,
    pub(crate) config_hash: ConfigHash,
    pub(crate) priority: i32,
    pub(crate) cluster: Option<Arc<ClusterInfo>>,
    pub(crate) dispatch_entries: Vec<DispatchEntry>,
    pub(crate) transforms: TransformChain,
}

impl RouteRuntimeConfig {
    pub fn route_id(&self) -> &str {
        self.route_info.route_id()
    }

    pub fn route_info(&self) -> &Arc<RouteInfo> {
        &self.route_info
    }

    pub fn config_hash(&self) -> ConfigHash {
        self.config_hash
    }

    /// Route priority (higher = checked first among equal entry orders).
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Backend cluster, or `None` if the route has no resolved cluster.
    pub fn cluster(&self) -> Option<&Arc<ClusterInfo>> {
        self.cluster.as_ref()
    }

    pub fn dispatch_entries(&self) -> &[DispatchEntry] {
        &self.dispatch_entries
    }

    pub fn transforms(&self) -> &TransformChain {
        &self.transforms
    }

    /// True unless this route was built from `hash` against this very cluster.
    pub fn has_config_changed(&self, hash: ConfigHash, cluster: Option<&Arc<ClusterInfo>>) -> bool {
        let same_cluster = match (&self.cluster, cluster) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.config_hash != hash || !same_cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterConfig, DestinationConfig};
    use crate::routing::builder::RouteRuntimeBuilder;
    use crate::routing::parsed::ParsedRoute;
    use crate::transforms::StandardTransformBuilder;

    fn cluster(id: &str) -> Arc<ClusterInfo> {
        Arc::new(
            ClusterInfo::from_config(ClusterConfig {
                cluster_id: id.into(),
                destinations: vec![DestinationConfig {
                    name: format!("{}-0", id),
                    address: "http://127.0.0.1:3000".into(),
                }],
            })
            .unwrap(),
        )
    }

    fn build(hash: u64, cluster: Option<Arc<ClusterInfo>>) -> Arc<RouteRuntimeConfig> {
        let mut source = ParsedRoute::new("items");
        source.path = "/items/{id}".into();
        source.methods = vec!["GET".into()];
        source.config_hash = ConfigHash(hash);
        RouteRuntimeBuilder::new(Arc::new(StandardTransformBuilder::new()))
            .build(&source, cluster, Arc::new(RouteInfo::new("items")))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_same_hash_and_cluster_is_unchanged() {
        let web = cluster("web");
        let route = build(7, Some(web.clone()));
        assert!(!route.has_config_changed(ConfigHash(7), Some(&web)));

        let bare = build(7, None);
        assert!(!bare.has_config_changed(ConfigHash(7), None));
    }

    #[test]
    fn test_different_hash_is_changed() {
        let web = cluster("web");
        let route = build(7, Some(web.clone()));
        assert!(route.has_config_changed(ConfigHash(8), Some(&web)));
    }

    #[test]
    fn test_cluster_presence_change_is_changed() {
        let web = cluster("web");
        let with_cluster = build(7, Some(web.clone()));
        assert!(with_cluster.has_config_changed(ConfigHash(7), None));

        let without = build(7, None);
        assert!(without.has_config_changed(ConfigHash(7), Some(&web)));
    }

    #[test]
    fn test_rebuilt_cluster_is_changed() {
        let route = build(7, Some(cluster("web")));
        // Same id and destinations, different instance.
        assert!(route.has_config_changed(ConfigHash(7), Some(&cluster("web"))));
    }

    #[test]
    fn test_entry_matches_and_points_at_owner() {
        let route = build(1, None);
        let entry = &route.dispatch_entries()[0];

        let values = entry.match_request(&request("GET", "/items/42")).unwrap();
        assert_eq!(values.get("id").map(String::as_str), Some("42"));
        assert!(entry.match_request(&request("POST", "/items/42")).is_none());
        assert!(entry.match_request(&request("GET", "/other")).is_none());

        assert!(Arc::ptr_eq(&entry.owning_route().unwrap(), &route));
        let owner = entry.owner.clone();
        drop(route);
        assert!(owner.upgrade().is_none());
    }
}
