//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger()
//!
//! Shutdown (shutdown.rs):
//!     broadcast → watcher observes it at its next wait point
//!     → in-flight poll aborted → run() returns final index → exit 0
//! ```
//!
//! # Design Decisions
//! - Shutdown is always a clean exit, never an error
//! - A build/apply already in progress finishes before the loop stops

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
