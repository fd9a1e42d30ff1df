//! Shell command execution utilities.
//!
//! Every external program the tool drives (the rule-table command, the
//! daemon supervisor) is invoked through a [`CommandRunner`]. Arguments
//! taken from configuration are passed through [`shellquote`].
//!
//! # Example
//!
//! ```ignore
//! use flowacct_common::shell::{self, IPTABLES_CMD, shellquote};
//!
//! let chain = "VYATTA_CT_PREROUTING_HOOK";
//! let cmd = format!("{} -t raw -L {} -vn --line-numbers", IPTABLES_CMD, shellquote(chain));
//! let result = shell::exec(&cmd).await?;
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{FlowAcctError, FlowAcctResult};

/// Path to the `iptables` command for the NFLOG hook rules.
pub const IPTABLES_CMD: &str = "/sbin/iptables";

/// Path to `start-stop-daemon` used for accounting daemon control.
pub const START_STOP_DAEMON_CMD: &str = "/sbin/start-stop-daemon";

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// The string is wrapped in double quotes and `$`, `` ` ``, `"`, `\` and
/// newline are escaped.
///
/// # Example
///
/// ```
/// use flowacct_common::shell::shellquote;
///
/// assert_eq!(shellquote("eth0"), "\"eth0\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// The stdout output, trimmed.
    pub stdout: String,
    /// The stderr output, trimmed.
    pub stderr: String,
}

impl ExecResult {
    /// Builds a successful result carrying `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Builds a failed result.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Converts a non-zero exit into [`FlowAcctError::ShellCommandFailed`].
    pub fn into_stdout(self, cmd: &str) -> FlowAcctResult<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(FlowAcctError::ShellCommandFailed {
                command: cmd.to_string(),
                exit_code: self.exit_code,
                output: self.combined_output(),
            })
        }
    }
}

/// Executes a shell command asynchronously.
///
/// The command runs through `/bin/sh -c` so pipes and redirects work.
/// Only a spawn failure is an error; a non-zero exit is reported in the
/// returned [`ExecResult`].
pub async fn exec(cmd: &str) -> FlowAcctResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let output = Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| FlowAcctError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?;

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if result.success() {
        tracing::trace!(command = %cmd, exit_code = exit_code, "Command succeeded");
    } else {
        tracing::warn!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command failed"
        );
    }

    Ok(result)
}

/// Something that can run a shell command line.
///
/// Production code uses [`ShellRunner`]; tests substitute an in-memory
/// model of the rule tables.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `cmd` and reports its exit code and output.
    async fn exec(&self, cmd: &str) -> FlowAcctResult<ExecResult>;

    /// Runs `cmd` and fails on non-zero exit.
    async fn exec_or_throw(&self, cmd: &str) -> FlowAcctResult<String> {
        self.exec(cmd).await?.into_stdout(cmd)
    }
}

/// [`CommandRunner`] backed by `/bin/sh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn exec(&self, cmd: &str) -> FlowAcctResult<ExecResult> {
        exec(cmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shellquote_simple() {
        assert_eq!(shellquote("simple"), "\"simple\"");
        assert_eq!(shellquote("eth0.100"), "\"eth0.100\"");
        assert_eq!(shellquote("2"), "\"2\"");
    }

    #[test]
    fn test_shellquote_special_chars() {
        assert_eq!(shellquote("$HOME"), "\"\\$HOME\"");
        assert_eq!(shellquote("`whoami`"), "\"\\`whoami\\`\"");
        assert_eq!(shellquote("say \"hello\""), "\"say \\\"hello\\\"\"");
        assert_eq!(shellquote("path\\to"), "\"path\\\\to\"");
        assert_eq!(shellquote("line1\nline2"), "\"line1\\\nline2\"");
    }

    #[test]
    fn test_shellquote_empty() {
        assert_eq!(shellquote(""), "\"\"");
    }

    #[test]
    fn test_exec_result_failure() {
        let result = ExecResult::failed(1, "error message");
        assert!(!result.success());
        assert_eq!(result.combined_output(), "error message");
    }

    #[test]
    fn test_exec_result_combined() {
        let result = ExecResult {
            exit_code: 0,
            stdout: "stdout".to_string(),
            stderr: "stderr".to_string(),
        };
        assert_eq!(result.combined_output(), "stdout\nstderr");
    }

    #[test]
    fn test_into_stdout() {
        assert_eq!(ExecResult::ok("out").into_stdout("true").unwrap(), "out");
        match ExecResult::failed(3, "bad").into_stdout("false") {
            Err(FlowAcctError::ShellCommandFailed {
                command, exit_code, ..
            }) => {
                assert_eq!(command, "false");
                assert_eq!(exit_code, 3);
            }
            other => panic!("Expected ShellCommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exec_echo() {
        let result = exec("echo hello").await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "hello");
    }

    #[tokio::test]
    async fn test_exec_failure() {
        let result = exec("exit 42").await.unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, 42);
    }

    #[tokio::test]
    async fn test_shell_runner_exec_or_throw() {
        let runner = ShellRunner;
        assert_eq!(runner.exec_or_throw("echo success").await.unwrap(), "success");
        assert!(runner.exec_or_throw("exit 1").await.is_err());
    }
}
