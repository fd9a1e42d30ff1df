//! flowacctd tool settings
//!
//! Loaded from a TOML file. Default location: /etc/flowacctd/flowacctd.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use flowacct_common::{FlowAcctError, FlowAcctResult};

use crate::types::{HookPolicy, NflogHookSpec};

/// Default settings file location
pub const DEFAULT_SETTINGS_FILE: &str = "/etc/flowacctd/flowacctd.toml";

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Exported router configuration tree (JSON)
    #[serde(default = "default_config_tree")]
    pub config_tree: PathBuf,

    /// Rendered daemon configuration
    #[serde(default = "default_conf_file")]
    pub conf_file: PathBuf,

    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    /// Interface index map consumed through `pre_tag_map`
    #[serde(default = "default_int_map_file")]
    pub int_map_file: PathBuf,

    /// Only checked for presence
    #[serde(default = "default_networks_file")]
    pub networks_file: PathBuf,

    /// In-memory table pipe
    #[serde(default = "default_imt_path")]
    pub imt_path: PathBuf,
}

/// NFLOG rule parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NflogSettings {
    #[serde(default)]
    pub hook: HookPolicy,

    /// Netlink group shared by the rule and the daemon
    #[serde(default = "default_nflog_group")]
    pub group: u16,

    /// Packets batched in the kernel before delivery
    #[serde(default = "default_nflog_threshold")]
    pub threshold: u32,
}

/// Accounting daemon control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    #[serde(default = "default_daemon_binary")]
    pub binary: PathBuf,

    /// Seconds `start-stop-daemon --stop` waits for exit
    #[serde(default = "default_stop_retry_secs")]
    pub stop_retry_secs: u64,
}

/// Complete flowacctd settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowAcctdSettings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub nflog: NflogSettings,

    #[serde(default)]
    pub daemon: DaemonSettings,
}

// Default functions
fn default_config_tree() -> PathBuf {
    PathBuf::from("/etc/flowacctd/config.json")
}

fn default_conf_file() -> PathBuf {
    PathBuf::from("/etc/pmacct/uacctd.conf")
}

fn default_pid_file() -> PathBuf {
    PathBuf::from("/var/run/uacctd.pid")
}

fn default_int_map_file() -> PathBuf {
    PathBuf::from("/etc/pmacct/int_map")
}

fn default_networks_file() -> PathBuf {
    PathBuf::from("/etc/pmacct/networks.lst")
}

fn default_imt_path() -> PathBuf {
    PathBuf::from("/tmp/uacctd.pipe")
}

fn default_nflog_group() -> u16 {
    2
}

fn default_nflog_threshold() -> u32 {
    10
}

fn default_daemon_binary() -> PathBuf {
    PathBuf::from("/usr/sbin/uacctd")
}

fn default_stop_retry_secs() -> u64 {
    5
}

// Default implementations
impl Default for PathSettings {
    fn default() -> Self {
        Self {
            config_tree: default_config_tree(),
            conf_file: default_conf_file(),
            pid_file: default_pid_file(),
            int_map_file: default_int_map_file(),
            networks_file: default_networks_file(),
            imt_path: default_imt_path(),
        }
    }
}

impl Default for NflogSettings {
    fn default() -> Self {
        Self {
            hook: HookPolicy::default(),
            group: default_nflog_group(),
            threshold: default_nflog_threshold(),
        }
    }
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            binary: default_daemon_binary(),
            stop_retry_secs: default_stop_retry_secs(),
        }
    }
}

impl FlowAcctdSettings {
    /// Load settings from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> FlowAcctResult<Self> {
        let path = path.as_ref();

        let settings: Self = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                FlowAcctError::invalid_config(path.display().to_string(), e.to_string())
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Settings file {} not found, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(FlowAcctError::io(path, e)),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> FlowAcctResult<()> {
        if self.nflog.group == 0 {
            return Err(FlowAcctError::invalid_config(
                "nflog.group",
                "must be > 0",
            ));
        }

        if self.nflog.threshold == 0 {
            return Err(FlowAcctError::invalid_config(
                "nflog.threshold",
                "must be > 0",
            ));
        }

        Ok(())
    }

    /// Hook spec for rules capturing `packet_length` bytes
    pub fn hook_spec(&self, packet_length: u32) -> NflogHookSpec {
        NflogHookSpec::new(
            self.nflog.hook,
            self.nflog.group,
            packet_length,
            self.nflog.threshold,
        )
    }
}
