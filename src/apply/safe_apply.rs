//! Stage, compare, swap, reload.
//!
//! # Sequence
//! ```text
//! write staging → diff active staging
//!     exit 0 → Unchanged (active untouched, no reload)
//!     exit 1 → rename staging over active → reload command
//!     other  → ApplyError::Diff
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::apply::runner::{CommandLine, CommandOutput, CommandRunner};
use crate::assembler::ConfigDocument;
use crate::config::BuilderConfig;

/// Errors raised while activating a document.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("failed to write staging file {path}: {source}")]
    Stage { path: PathBuf, source: io::Error },

    #[error("failed to read active file {path}: {source}")]
    Active { path: PathBuf, source: io::Error },

    #[error("diff exited with {status:?}: {output}")]
    Diff { status: Option<i32>, output: String },

    #[error("failed to run diff: {0}")]
    DiffSpawn(io::Error),

    #[error("failed to move {from} over {to}: {source}")]
    Swap { from: PathBuf, to: PathBuf, source: io::Error },

    #[error("reload command is empty")]
    EmptyReloadCommand,

    #[error("executable '{0}' not found on PATH")]
    ExecutableNotFound(String),

    #[error("failed to run reload command: {0}")]
    ReloadSpawn(io::Error),

    #[error("reload exited with {status:?} (rolled back: {rolled_back}): {output}")]
    Reload { status: Option<i32>, output: String, rolled_back: bool },

    #[error("reload failed and restoring {path} also failed: {source}")]
    Rollback { path: PathBuf, source: io::Error },
}

/// What `apply` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Candidate matched the active file; nothing was touched.
    Unchanged,
    /// Active file replaced and reload succeeded.
    Reloaded { output: String },
}

/// Owns the active and staging files.
pub struct SafeApply<C> {
    runner: Arc<C>,
    active: PathBuf,
    staging: PathBuf,
    diff_cmd: String,
    reload_cmd: String,
    rollback_on_reload_failure: bool,
}

impl<C: CommandRunner> SafeApply<C> {
    pub fn new(
        runner: Arc<C>,
        active: impl Into<PathBuf>,
        staging: impl Into<PathBuf>,
        reload_cmd: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            active: active.into(),
            staging: staging.into(),
            diff_cmd: "diff".to_string(),
            reload_cmd: reload_cmd.into(),
            rollback_on_reload_failure: false,
        }
    }

    pub fn from_config(runner: Arc<C>, config: &BuilderConfig) -> Self {
        Self::new(runner, &config.config_file, &config.staging_file, &config.reload_cmd)
            .with_diff_cmd(&config.diff_cmd)
            .with_rollback(config.rollback_on_reload_failure)
    }

    pub fn with_diff_cmd(mut self, diff_cmd: &str) -> Self {
        self.diff_cmd = diff_cmd.to_string();
        self
    }

    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.rollback_on_reload_failure = enabled;
        self
    }

    /// Activate `doc` if it differs from the active configuration.
    pub async fn apply(&self, doc: &ConfigDocument) -> Result<ApplyOutcome, ApplyError> {
        tokio::fs::write(&self.staging, doc.as_bytes())
            .await
            .map_err(|source| ApplyError::Stage { path: self.staging.clone(), source })?;

        if !self.differs().await? {
            tracing::debug!(path = %self.active.display(), "Configuration unchanged, skipping reload");
            return Ok(ApplyOutcome::Unchanged);
        }

        let previous = if self.rollback_on_reload_failure {
            match tokio::fs::read(&self.active).await {
                Ok(content) => Some(content),
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(source) => return Err(ApplyError::Active { path: self.active.clone(), source }),
            }
        } else {
            None
        };

        self.swap().await?;
        tracing::info!(path = %self.active.display(), bytes = doc.len(), "Activated new configuration");

        match self.reload().await {
            Ok(out) => {
                tracing::info!(output = %out.output.trim_end(), "Reload succeeded");
                Ok(ApplyOutcome::Reloaded { output: out.output })
            }
            Err(e) => {
                let rolled_back = match previous {
                    Some(content) => {
                        self.restore(content).await?;
                        tracing::warn!(path = %self.active.display(), error = %e, "Reload failed, previous configuration restored");
                        true
                    }
                    None => false,
                };
                match e {
                    ApplyError::Reload { status, output, .. } => {
                        Err(ApplyError::Reload { status, output, rolled_back })
                    }
                    other => Err(other),
                }
            }
        }
    }

    /// Compare staging against active. A missing active file always differs.
    async fn differs(&self) -> Result<bool, ApplyError> {
        let exists = tokio::fs::try_exists(&self.active)
            .await
            .map_err(|source| ApplyError::Active { path: self.active.clone(), source })?;
        if !exists {
            tracing::info!(path = %self.active.display(), "No active configuration yet");
            return Ok(true);
        }

        let args = [path_arg(&self.active), path_arg(&self.staging)];
        let out = self
            .runner
            .run(&self.diff_cmd, &args)
            .await
            .map_err(ApplyError::DiffSpawn)?;

        match out.status {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            status => Err(ApplyError::Diff { status, output: out.output }),
        }
    }

    /// Move staging over active. Falls back to copy + atomic persist when a
    /// plain rename is refused (e.g., staging on another filesystem).
    async fn swap(&self) -> Result<(), ApplyError> {
        let swap_err = |source| ApplyError::Swap {
            from: self.staging.clone(),
            to: self.active.clone(),
            source,
        };

        match tokio::fs::rename(&self.staging, &self.active).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(error = %e, "Rename failed, copying staging file into place");
                let content = tokio::fs::read(&self.staging).await.map_err(swap_err)?;
                write_atomic(&self.active, content).await.map_err(swap_err)?;
                let _ = tokio::fs::remove_file(&self.staging).await;
                Ok(())
            }
        }
    }

    async fn reload(&self) -> Result<CommandOutput, ApplyError> {
        let cmd = CommandLine::parse(&self.reload_cmd).ok_or(ApplyError::EmptyReloadCommand)?;
        tracing::info!(program = %cmd.program, args = ?cmd.args, "Running reload command");

        let out = self.runner.run(&cmd.program, &cmd.args).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ApplyError::ExecutableNotFound(cmd.program.clone())
            } else {
                ApplyError::ReloadSpawn(e)
            }
        })?;

        if out.success() {
            Ok(out)
        } else {
            Err(ApplyError::Reload { status: out.status, output: out.output, rolled_back: false })
        }
    }

    async fn restore(&self, content: Vec<u8>) -> Result<(), ApplyError> {
        write_atomic(&self.active, content)
            .await
            .map_err(|source| ApplyError::Rollback { path: self.active.clone(), source })
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Write through a temp file in the target's directory, then rename it in.
async fn write_atomic(path: &Path, content: Vec<u8>) -> io::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok::<(), io::Error>(())
    })
    .await
    .map_err(io::Error::other)?
}
