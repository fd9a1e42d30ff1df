//! Error types for flow-accounting operations.
//!
//! Every failure here is fatal to the invocation: the CLI prints the error
//! to stderr and exits non-zero. Nothing is retried.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for flow-accounting operations.
pub type FlowAcctResult<T> = Result<T, FlowAcctError>;

/// Errors that can occur while rendering configuration, managing NFLOG
/// rules or controlling the accounting daemon.
#[derive(Debug, Error)]
pub enum FlowAcctError {
    /// Failed to execute a shell command (spawn error).
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The setting that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Neither IMT, netflow nor sflow is enabled.
    #[error("No plugin enabled: enable imt or configure a netflow or sflow server")]
    NoPluginEnabled,

    /// The sflow agent address is not configured on any local interface.
    #[error("sflow agent-address {ip} does not exist on the system")]
    AgentIpNotLocal {
        /// The resolved or literal agent address.
        ip: String,
    },

    /// A hook chain listed no rules at all.
    #[error("No rules in {table}/{chain}")]
    EmptyChain {
        /// Rule table name.
        table: String,
        /// Chain name.
        chain: String,
    },

    /// No rule in the hook chain matched the interface.
    #[error("No NFLOG rule for interface {interface} in {table}/{chain}")]
    RuleNotFound {
        /// Rule table name.
        table: String,
        /// Chain name.
        chain: String,
        /// Incoming interface that was searched for.
        interface: String,
    },

    /// File read/write failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File the operation was applied to.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl FlowAcctError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an I/O error bound to a path.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
