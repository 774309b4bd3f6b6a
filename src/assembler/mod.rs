//! Configuration assembly subsystem.
//!
//! # Data Flow
//! ```text
//! builder.rs::build()
//!     → registry: <prefix>/global, <prefix>/defaults   (base64, mandatory)
//!     → registry: <prefix>/backend/ listing            (VIP candidates)
//!     → ∩ allowlist, sorted by name
//!     → per VIP: frontend fields, backend fields        (spec.rs)
//!     → dynamic backends: catalog endpoints
//!     → document.rs renders blocks in fixed order
//! ```
//!
//! # Design Decisions
//! - The document buffer is owned by one build and returned by value
//! - VIP order is sorted so the same snapshot renders byte-identically
//! - Any lookup failure aborts the whole build

pub mod builder;
pub mod document;
pub mod spec;

pub use builder::{AssembleError, ConfigAssembler};
pub use document::ConfigDocument;
pub use spec::{Backend, ConfigType, Frontend, VipSpec};
