//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Build routes → Install pipeline → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Clear routes
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Traffic is accepted only after the pipeline is installed
//! - Config reloads come from the file watcher, not from signals

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
