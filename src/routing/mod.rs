//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (startup and every reload):
//!     RouteConfig[]
//!     → ParsedRoute (config hash computed)
//!     → RouteRuntimeBuilder::build (one call per route)
//!         → TransformBuilder::build
//!         → RouteRuntimeConfig ⇄ DispatchEntry (linked pair)
//!     → RouteTable (ranked, immutable)
//!
//! Incoming Request (host, path, method)
//!     → router.rs (first matching entry)
//!     → entry handler → pipeline (direct, or deferred through the shared slot)
//! ```
//!
//! # Design Decisions
//! - Routes are immutable at runtime; reloads swap in a new table
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - Policy settings are typed enums, never compared as strings downstream

pub mod builder;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod matcher;
pub mod parsed;
pub mod pattern;
pub mod pipeline;
pub mod policy;
pub mod router;

pub use builder::RouteRuntimeBuilder;
pub use catalog::{ApplyReport, CatalogError, RouteCatalog};
pub use dispatch::{DispatchEntry, RouteRuntimeConfig};
pub use error::{RouteBuildError, RouteBuildResult};
pub use parsed::{ConfigHash, ParsedRoute, RouteInfo};
pub use pattern::{RoutePattern, RouteValues};
pub use pipeline::{Pipeline, PipelineError, PipelineSlot, ResponseFuture, RouteHandler};
pub use policy::{AuthorizationPolicy, CorsPolicy};
pub use router::{MatchedRoute, RouteTable};
