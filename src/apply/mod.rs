//! Safe-apply subsystem.
//!
//! # Data Flow
//! ```text
//! ConfigDocument
//!     → safe_apply.rs writes staging file
//!     → runner.rs: diff <active> <staging>
//!     → identical: done
//!     → differs: rename staging → active, runner.rs: reload command
//! ```
//!
//! # Design Decisions
//! - Active and staging files are written by nothing else
//! - The active file is only ever replaced by rename, never rewritten in place
//! - Reload failure leaves the new file active unless rollback is enabled

pub mod runner;
pub mod safe_apply;

#[cfg(test)]
pub(crate) mod testing;

pub use runner::{CommandLine, CommandOutput, CommandRunner, SystemRunner};
pub use safe_apply::{ApplyError, ApplyOutcome, SafeApply};
