//! External tool invocation.
//!
//! Archive extraction, quarantine removal, code signing and binary smoke tests
//! all shell out. They go through [`ToolRunner`] so tests can swap in a fake.

use std::ffi::OsStr;
use std::io;
use std::process::{Command, Stdio};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

pub trait ToolRunner {
    /// Runs `program` to completion with captured output. An `Err` means the
    /// program could not be started at all (`ErrorKind::NotFound` when it is
    /// not installed); a non-zero exit is reported through [`ToolOutput`].
    fn run(&self, program: &OsStr, args: &[&OsStr]) -> io::Result<ToolOutput>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for Arc<T> {
    fn run(&self, program: &OsStr, args: &[&OsStr]) -> io::Result<ToolOutput> {
        (**self).run(program, args)
    }
}

impl<T: ToolRunner + ?Sized> ToolRunner for Box<T> {
    fn run(&self, program: &OsStr, args: &[&OsStr]) -> io::Result<ToolOutput> {
        (**self).run(program, args)
    }
}

/// Runs tools as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &OsStr, args: &[&OsStr]) -> io::Result<ToolOutput> {
        tracing::debug!("Executing: {:?} {:?}", program, args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Invokes a binary with `--help` and reports whether it ran successfully.
pub fn smoke_test(runner: &dyn ToolRunner, binary: &std::path::Path) -> bool {
    match runner.run(binary.as_os_str(), &[OsStr::new("--help")]) {
        Ok(output) if output.success => true,
        Ok(output) => {
            tracing::debug!(
                "{} --help exited with {:?}: {}",
                binary.display(),
                output.code,
                output.stderr.trim()
            );
            false
        }
        Err(e) => {
            tracing::debug!("Could not execute {}: {}", binary.display(), e);
            false
        }
    }
}
