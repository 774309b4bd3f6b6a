//! Service-discovery registry subsystem.
//!
//! # Data Flow
//! ```text
//! watcher → client.rs::wait_for_change(index)     (blocking catalog query)
//! assembler → client.rs::value / raw_value          (KV specs)
//!           → client.rs::child_keys                 (VIP enumeration)
//!           → client.rs::service_endpoints          (dynamic backends)
//!
//! http.rs implements the capability over reqwest.
//! ```
//!
//! # Design Decisions
//! - Read-only: nothing here writes to the registry
//! - Every call has a deadline, the blocking one included
//! - A 404 on a KV read is "absent", not a failure

pub mod client;
pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod memory;

pub use client::Registry;
pub use http::HttpRegistry;
pub use types::{RegistryError, RegistryIndex, RegistryResult, ServiceEndpoint};
