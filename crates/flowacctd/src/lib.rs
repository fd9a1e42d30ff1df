//! # flowacctd - Flow Accounting Configuration Tool
//!
//! Translates the router's flow-accounting settings into a uacctd (pmacct)
//! configuration file and manages the NFLOG hooks that feed it.
//!
//! ## Responsibilities
//! - Rendering the daemon configuration (IMT, netflow and sflow plugins)
//! - Resolving collectors and the sflow agent address
//! - Maintaining the interface index map
//! - Installing and removing per-interface NFLOG rules
//! - Restarting, starting or signalling the daemon only when needed
//!
//! ## Configuration Sources
//! - Router configuration tree (JSON): `system flow-accounting`, plus
//!   `protocols bgp|ospf|ospfv3` router-ids
//! - Tool settings (TOML): file paths, hook policy, NFLOG parameters
//!
//! ## Persistent State
//! The rendered configuration and the interface map on disk are the only
//! state carried between invocations; each run diffs against them.

pub mod actions;
pub mod collector;
mod config;
pub mod daemon;
pub mod lifecycle;
pub mod nflog;
pub mod renderer;
pub mod settings;
pub mod system;
mod tables;
mod types;

pub use collector::{CollectorResolver, Protocol};
pub use daemon::{DaemonControl, Uacctd};
pub use lifecycle::{LifecycleController, LifecycleOutcome};
pub use nflog::NflogRuleManager;
pub use renderer::ConfigRenderer;
pub use settings::FlowAcctdSettings;
pub use system::{LinuxSystem, StaticSystem, SystemInfo};
pub use tables::*;
pub use types::*;
