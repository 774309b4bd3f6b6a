//! Registry-driven HAProxy configuration builder.

pub mod apply;
pub mod assembler;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod watcher;

pub use assembler::{ConfigAssembler, ConfigDocument};
pub use config::BuilderConfig;
pub use error::WatchError;
pub use lifecycle::Shutdown;
pub use watcher::ChangeWatcher;
