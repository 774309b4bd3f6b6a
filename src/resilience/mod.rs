//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Cycle failed (network, decode, assemble, apply):
//!     → error sent to the sink
//!     → backoff.rs picks the delay (fixed by default, 2s)
//!     → watcher sleeps, racing the shutdown signal
//!     → poll again with the unchanged index
//! ```
//!
//! # Design Decisions
//! - Failures never stop the loop; only shutdown does
//! - Exponential mode adds jitter so a fleet of builders does not stampede the registry

pub mod backoff;

pub use backoff::RetryPolicy;
