// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External process execution with a hard time limit.
//
// Helper programs (viewers, rasterizers, script hosts) run as hidden child
// processes. The caller blocks until the child exits or the limit expires;
// on expiry the child is killed.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, warn};

use scandesk_core::error::{Result, ScanDeskError};

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// File name of the program, for logs and errors.
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// What a finished program reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// `Ok(stdout)` on exit code 0, otherwise an `ExternalTool` error
    /// carrying the exit code and the tail of stderr.
    pub fn into_result(self, tool: &str) -> Result<String> {
        if self.success() {
            return Ok(self.stdout);
        }
        let code = self
            .status
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        let detail = self.stderr.trim();
        let tail: String = detail
            .chars()
            .rev()
            .take(300)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        Err(ScanDeskError::ExternalTool(format!(
            "{tool} exited with {code}{}{tail}",
            if tail.is_empty() { "" } else { ": " }
        )))
    }
}

/// Runs external programs.
pub trait ProcessRunner: Send + Sync {
    /// Run to completion or until `command.timeout` expires. A timeout or a
    /// failure to start is an error; a non-zero exit is reported in the
    /// output.
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// `CREATE_NO_WINDOW` process creation flag.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs programs as hidden child processes on a private tokio runtime.
pub struct SystemProcessRunner {
    runtime: Runtime,
}

impl SystemProcessRunner {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    async fn run_async(command: &ToolCommand) -> Result<ToolOutput> {
        let name = command.display_name();
        let mut process = tokio::process::Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        process.creation_flags(CREATE_NO_WINDOW);

        let child = process
            .spawn()
            .map_err(|err| ScanDeskError::ExternalTool(format!("failed to start {name}: {err}")))?;

        // Dropping the wait future on timeout kills the child.
        let output = tokio::time::timeout(command.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(tool = %name, "Tool timed out; killing it");
                ScanDeskError::ExternalTool(format!(
                    "{name} timed out after {}s",
                    command.timeout.as_secs()
                ))
            })?
            .map_err(|err| ScanDeskError::ExternalTool(format!("{name} failed: {err}")))?;

        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        debug!(
            program = %command.program.display(),
            args = ?command.args,
            timeout_secs = command.timeout.as_secs(),
            "Running tool"
        );
        let output = self.runtime.block_on(Self::run_async(command))?;
        debug!(tool = %command.display_name(), status = ?output.status, "Tool finished");
        Ok(output)
    }
}
