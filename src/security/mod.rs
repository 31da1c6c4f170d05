//! Security subsystem: request-time policies bound to routes.
//!
//! # Data Flow
//! ```text
//! Matched request (route bindings in MatchedRoute):
//!     → cors.rs (tower-http CorsLayer per policy, bare 204 for disabled preflight)
//!     → authorization.rs (check credentials against the binding)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → forwarded upstream
//! ```
//!
//! # Design Decisions
//! - Preflight requests are answered before authorization runs
//! - Fail closed: an unregistered named policy rejects the request

pub mod authorization;
pub mod cors;
pub mod headers;

pub use authorization::{AuthorizationOutcome, AuthorizationPolicies};
pub use cors::{CorsOutcome, CorsPolicies};
