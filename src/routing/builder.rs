//! Route runtime builder.
//!
//! # Responsibilities
//! - Turn a [`ParsedRoute`] into a linked `RouteRuntimeConfig` / `DispatchEntry` pair
//! - Resolve CORS, authorization, method and host settings into typed bindings
//! - Hand every entry a handler onto the late-bound pipeline
//!
//! # Design Decisions
//! - All fallible work runs before the pair is assembled, so a route
//!   builds fully or not at all
//! - The pair is assembled inside `Arc::new_cyclic`; the route is published
//!   only after its entry is in place and never has zero entries
//! - Entry order is fixed at 0; route priority stays on the runtime config

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::Method;

use crate::cluster::ClusterInfo;
use crate::observability::metrics;
use crate::routing::dispatch::{DispatchEntry, RouteRuntimeConfig};
use crate::routing::error::{RouteBuildError, RouteBuildResult};
use crate::routing::matcher::{HostConstraint, MethodConstraint};
use crate::routing::parsed::{ParsedRoute, RouteInfo};
use crate::routing::pattern::RoutePattern;
use crate::routing::pipeline::{Pipeline, PipelineSlot, RouteHandler};
use crate::routing::policy::{AuthorizationPolicy, CorsPolicy};
use crate::transforms::TransformBuilder;

/// Ordering value given to every dispatch entry.
// TODO: propagate ParsedRoute::priority here once the route table stops ranking by it.
const DEFAULT_ENTRY_ORDER: i32 = 0;

/// Builds runtime routes and owns the shared pipeline slot.
pub struct RouteRuntimeBuilder {
    transforms: Arc<dyn TransformBuilder>,
    pipeline: Arc<PipelineSlot>,
}

impl RouteRuntimeBuilder {
    pub fn new(transforms: Arc<dyn TransformBuilder>) -> Self {
        Self {
            transforms,
            pipeline: Arc::new(PipelineSlot::new()),
        }
    }

    /// Install the request pipeline used by every deferred entry.
    pub fn set_pipeline(&self, pipeline: Arc<dyn Pipeline>) {
        if self.pipeline.is_set() {
            tracing::debug!("Replacing previously installed request pipeline");
        }
        self.pipeline.set(pipeline);
        tracing::info!("Request pipeline installed");
    }

    /// Shared slot backing deferred entries.
    pub fn pipeline_slot(&self) -> &Arc<PipelineSlot> {
        &self.pipeline
    }

    /// Build the runtime model for one route. The entry defers to the shared pipeline.
    pub fn build(
        &self,
        source: &ParsedRoute,
        cluster: Option<Arc<ClusterInfo>>,
        route_info: Arc<RouteInfo>,
    ) -> RouteBuildResult<Arc<RouteRuntimeConfig>> {
        self.build_with_handler(source, cluster, route_info, None)
    }

    /// Build the runtime model with a pipeline attached directly to the entry.
    pub fn build_with_pipeline(
        &self,
        source: &ParsedRoute,
        cluster: Option<Arc<ClusterInfo>>,
        route_info: Arc<RouteInfo>,
        pipeline: Arc<dyn Pipeline>,
    ) -> RouteBuildResult<Arc<RouteRuntimeConfig>> {
        self.build_with_handler(source, cluster, route_info, Some(pipeline))
    }

    fn build_with_handler(
        &self,
        source: &ParsedRoute,
        cluster: Option<Arc<ClusterInfo>>,
        route_info: Arc<RouteInfo>,
        pipeline: Option<Arc<dyn Pipeline>>,
    ) -> RouteBuildResult<Arc<RouteRuntimeConfig>> {
        let result = self.assemble(source, cluster, route_info, pipeline);
        match &result {
            Ok(route) => {
                metrics::record_route_built("ok");
                tracing::debug!(
                    route_id = %route.route_id(),
                    pattern = %route.dispatch_entries()[0].pattern(),
                    priority = route.priority(),
                    cluster = ?route.cluster().map(|c| c.cluster_id()),
                    "Route built"
                );
            }
            Err(e) => {
                metrics::record_route_built("error");
                tracing::warn!(route_id = %source.route_id, error = %e, "Route build failed");
            }
        }
        result
    }

    fn assemble(
        &self,
        source: &ParsedRoute,
        cluster: Option<Arc<ClusterInfo>>,
        route_info: Arc<RouteInfo>,
        pipeline: Option<Arc<dyn Pipeline>>,
    ) -> RouteBuildResult<Arc<RouteRuntimeConfig>> {
        if source.route_id.is_empty() {
            return Err(RouteBuildError::InvalidArgument(
                "source route has no route id".into(),
            ));
        }
        if route_info.route_id().is_empty() {
            return Err(RouteBuildError::InvalidArgument(
                "route info has no route id".into(),
            ));
        }
        if route_info.route_id() != source.route_id {
            return Err(RouteBuildError::InvalidArgument(format!(
                "route info '{}' does not belong to route '{}'",
                route_info.route_id(),
                source.route_id
            )));
        }

        let transforms = self.transforms.build(&source.transforms)?;
        let pattern = RoutePattern::parse(&source.path)?;
        let cors = CorsPolicy::parse(&source.cors_policy);
        let authorization = AuthorizationPolicy::parse(&source.authorization_policy);
        let method_constraint = parse_methods(&source.methods)?
            .map(|methods| MethodConstraint::new(methods, cors.accepts_preflight()));
        let host_constraint =
            (!source.hosts.is_empty()).then(|| HostConstraint::new(&source.hosts));
        let handler = match pipeline {
            Some(pipeline) => RouteHandler::Direct(pipeline),
            None => RouteHandler::Deferred(self.pipeline.clone()),
        };

        let route = Arc::new_cyclic(|owner| {
            // The route is not reachable by anyone until this closure returns,
            // so the staging list is complete before the first reader sees it.
            let mut dispatch_entries = Vec::with_capacity(1);
            let entry = DispatchEntry {
                pattern,
                order: DEFAULT_ENTRY_ORDER,
                host_constraint,
                method_constraint,
                cors,
                authorization,
                display_name: source.route_id.clone(),
                owner: owner.clone(),
                handler,
            };
            dispatch_entries.push(entry);

            RouteRuntimeConfig {
                route_info,
                config_hash: source.config_hash,
                priority: source.priority,
                cluster,
                dispatch_entries,
                transforms,
            }
        });

        Ok(route)
    }
}

impl std::fmt::Debug for RouteRuntimeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRuntimeBuilder")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Parse the configured method list. `None` when the list is empty.
fn parse_methods(methods: &[String]) -> RouteBuildResult<Option<HashSet<Method>>> {
    if methods.is_empty() {
        return Ok(None);
    }
    methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| RouteBuildError::InvalidArgument(format!("invalid HTTP method '{}'", m)))
        })
        .collect::<Result<HashSet<_>, _>>()
        .map(Some)
}
