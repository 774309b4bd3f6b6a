//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BuilderConfig (validated, immutable)
//!     → handed to registry, assembler, apply and watcher at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BuilderConfig;
pub use schema::ObservabilityConfig;
pub use schema::RetryConfig;
pub use schema::RetryStrategy;
pub use schema::WatchConfig;
