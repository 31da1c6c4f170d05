//! Route catalog: turns a whole configuration into a route table.
//!
//! # Responsibilities
//! - Keep one `RouteInfo` per route id across reloads
//! - Rebuild only routes whose config or cluster changed
//! - Reuse clusters whose config did not change
//!
//! # Design Decisions
//! - A reload is all-or-nothing: if any cluster or route fails to build,
//!   nothing is published and the previous table stays active
//! - The catalog holds the current models; route identities only point
//!   at them weakly, so dropping the catalog and its tables frees every route

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::cluster::{ClusterError, ClusterInfo};
use crate::config::ProxyConfig;
use crate::observability::metrics;
use crate::routing::builder::RouteRuntimeBuilder;
use crate::routing::dispatch::RouteRuntimeConfig;
use crate::routing::error::RouteBuildError;
use crate::routing::parsed::{ParsedRoute, RouteInfo};
use crate::routing::router::RouteTable;

/// Errors applying a configuration to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cluster '{cluster}': {source}")]
    Cluster {
        cluster: String,
        #[source]
        source: ClusterError,
    },

    #[error("route '{route}': {source}")]
    Route {
        route: String,
        #[source]
        source: RouteBuildError,
    },
}

/// Summary of one applied configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub built: usize,
    pub reused: usize,
    pub removed: usize,
}

/// Live set of routes and clusters.
#[derive(Debug, Default)]
pub struct RouteCatalog {
    routes: HashMap<String, Arc<RouteInfo>>,
    models: HashMap<String, Arc<RouteRuntimeConfig>>,
    clusters: HashMap<String, Arc<ClusterInfo>>,
}

impl RouteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of a known route.
    pub fn route_info(&self, route_id: &str) -> Option<&Arc<RouteInfo>> {
        self.routes.get(route_id)
    }

    pub fn cluster(&self, cluster_id: &str) -> Option<&Arc<ClusterInfo>> {
        self.clusters.get(cluster_id)
    }

    /// Build runtime routes for `config` and return the new table.
    pub fn apply(
        &mut self,
        config: &ProxyConfig,
        builder: &RouteRuntimeBuilder,
    ) -> Result<(RouteTable, ApplyReport), CatalogError> {
        let mut clusters = HashMap::with_capacity(config.clusters.len());
        for cluster_config in &config.clusters {
            let cluster = match self.clusters.get(&cluster_config.cluster_id) {
                Some(existing) if existing.config() == cluster_config => existing.clone(),
                _ => Arc::new(ClusterInfo::from_config(cluster_config.clone()).map_err(
                    |source| CatalogError::Cluster {
                        cluster: cluster_config.cluster_id.clone(),
                        source,
                    },
                )?),
            };
            clusters.insert(cluster_config.cluster_id.clone(), cluster);
        }

        let mut report = ApplyReport::default();
        let mut staged: Vec<(Arc<RouteInfo>, Arc<RouteRuntimeConfig>, bool)> =
            Vec::with_capacity(config.routes.len());

        for route_config in &config.routes {
            let source = ParsedRoute::from(route_config);
            let cluster = source
                .cluster_id
                .as_ref()
                .and_then(|id| clusters.get(id))
                .cloned();
            if let (Some(id), None) = (&source.cluster_id, &cluster) {
                tracing::warn!(route_id = %source.route_id, cluster = %id, "Route references unknown cluster");
            }

            let info = self
                .routes
                .get(&source.route_id)
                .cloned()
                .unwrap_or_else(|| Arc::new(RouteInfo::new(source.route_id.clone())));

            match self.models.get(&source.route_id).cloned() {
                Some(current) if !current.has_config_changed(source.config_hash, cluster.as_ref()) => {
                    report.reused += 1;
                    staged.push((info, current, false));
                }
                _ => {
                    let model = builder.build(&source, cluster, info.clone()).map_err(|source_err| {
                        CatalogError::Route {
                            route: source.route_id.clone(),
                            source: source_err,
                        }
                    })?;
                    report.built += 1;
                    staged.push((info, model, true));
                }
            }
        }

        // Everything built: publish.
        let mut routes = HashMap::with_capacity(staged.len());
        let mut models = HashMap::with_capacity(staged.len());
        for (info, model, rebuilt) in staged {
            if rebuilt {
                info.publish(&model);
            }
            routes.insert(info.route_id().to_string(), info);
            models.insert(model.route_id().to_string(), model);
        }
        for (route_id, info) in &self.routes {
            if !routes.contains_key(route_id) {
                info.clear();
                report.removed += 1;
            }
        }

        let table = RouteTable::new(models.values().cloned());
        self.routes = routes;
        self.models = models;
        self.clusters = clusters;

        metrics::record_route_table_size(table.len());
        tracing::info!(
            built = report.built,
            reused = report.reused,
            removed = report.removed,
            "Route table rebuilt"
        );
        Ok((table, report))
    }
}
