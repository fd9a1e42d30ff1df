//! Common infrastructure for the flow-accounting configuration tool.
//!
//! This crate provides the pieces that are independent of the accounting
//! daemon's configuration format:
//!
//! - [`shell`]: Shell command execution with proper quoting, and the
//!   [`CommandRunner`] seam used by everything that touches the kernel
//!   rule tables or the daemon
//! - [`config_tree`]: Path-keyed, typed access to the router settings tree
//! - [`error`]: Error types shared by all operations
//!
//! # Example
//!
//! ```ignore
//! use flowacct_common::{
//!     shell::{shellquote, IPTABLES_CMD},
//!     CommandRunner, FlowAcctResult,
//! };
//!
//! async fn flush(runner: &dyn CommandRunner, chain: &str) -> FlowAcctResult<()> {
//!     let cmd = format!("{} -t raw -F {}", IPTABLES_CMD, shellquote(chain));
//!     runner.exec_or_throw(&cmd).await?;
//!     Ok(())
//! }
//! ```

pub mod config_tree;
pub mod error;
pub mod shell;

// Re-export commonly used items at crate root
pub use config_tree::ConfigTree;
pub use error::{FlowAcctError, FlowAcctResult};
pub use shell::{CommandRunner, ExecResult, ShellRunner};
