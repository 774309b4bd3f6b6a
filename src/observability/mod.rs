//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! watcher, assembler, apply produce:
//!     → logging.rs (structured log events, one span per rebuild cycle)
//!     → metrics.rs (cycle/error/reload counters, index gauge)
//!
//! Consumers:
//!     → stdout (human or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - The error sink is drained into logs; operators diagnose from there
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
