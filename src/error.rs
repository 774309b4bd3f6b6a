//! Errors surfaced to the watcher's error sink.

use thiserror::Error;

use crate::apply::ApplyError;
use crate::assembler::AssembleError;
use crate::registry::RegistryError;

/// Any failure of one poll/build/apply cycle. None of them are fatal.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("poll failed: {0}")]
    Poll(#[from] RegistryError),

    #[error("build failed: {0}")]
    Assemble(#[from] AssembleError),

    #[error("apply failed: {0}")]
    Apply(#[from] ApplyError),

    /// The polling task panicked or was cancelled.
    #[error("poll task failed: {0}")]
    PollTask(#[from] tokio::task::JoinError),
}

impl WatchError {
    /// Coarse category used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            WatchError::Poll(e) if e.is_network() => "network",
            WatchError::Poll(_) => "decode",
            WatchError::Assemble(AssembleError::Registry(e)) if e.is_network() => "network",
            WatchError::Assemble(e) if e.is_decode() => "decode",
            WatchError::Assemble(_) => "assemble",
            WatchError::Apply(_) => "apply",
            WatchError::PollTask(_) => "network",
        }
    }
}
