//! Command runner double for unit tests.

use std::io;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::apply::runner::{CommandOutput, CommandRunner};

/// Answers `diff` by comparing the two files, everything else with
/// `reload_status`. Records every invocation.
pub struct RecordingRunner {
    reload_status: Option<i32>,
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingRunner {
    pub fn new(reload_status: Option<i32>) -> Arc<Self> {
        Arc::new(Self { reload_status, calls: Mutex::new(Vec::new()) })
    }

    pub fn reloads(&self) -> usize {
        self.calls.lock().unwrap().iter().filter(|(p, _)| p != "diff").count()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push((program.to_string(), args.to_vec()));
        if program == "diff" {
            let a = std::fs::read(&args[0])?;
            let b = std::fs::read(&args[1])?;
            let status = if a == b { 0 } else { 1 };
            return Ok(CommandOutput { status: Some(status), output: String::new() });
        }
        Ok(CommandOutput { status: self.reload_status, output: "reloaded\n".into() })
    }
}
