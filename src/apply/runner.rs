//! External command execution.
//!
//! The diff and reload steps only ever see a `CommandRunner`, so safe-apply
//! logic can be driven without spawning real processes.

use std::io;
use std::path::PathBuf;
use async_trait::async_trait;
use tokio::process::Command;

/// Exit status plus everything the command wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    /// stdout followed by stderr.
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs an executable with literal arguments and waits for it.
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// `program` is a bare name looked up on `PATH`, or a path.
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Spawns real child processes via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let path = resolve_executable(program).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found on PATH", program))
        })?;
        let out = Command::new(path)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));

        Ok(CommandOutput {
            status: out.status.code(),
            output,
        })
    }
}

/// A command line split into an executable and literal argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Split on whitespace. `None` for a blank command.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().map(str::to_string);
        let program = tokens.next()?;
        Some(Self {
            program,
            args: tokens.collect(),
        })
    }
}

/// Resolve `program` against `PATH`. Names containing a `/` are used as given.
pub fn resolve_executable(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
