//! Type definitions for flowacctd

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use tracing::warn;

use flowacct_common::{FlowAcctError, FlowAcctResult};

use crate::constants::*;
use crate::hooks;
use crate::system::SystemInfo;

/// Named netflow timeout kinds and their daemon keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeoutKind {
    TcpGeneric,
    TcpRst,
    TcpFin,
    Udp,
    Icmp,
    FlowGeneric,
    MaxActiveLife,
    ExpiryInterval,
}

impl TimeoutKind {
    /// All kinds, in the order they are emitted
    pub const ALL: [TimeoutKind; 8] = [
        TimeoutKind::TcpGeneric,
        TimeoutKind::TcpRst,
        TimeoutKind::TcpFin,
        TimeoutKind::Udp,
        TimeoutKind::Icmp,
        TimeoutKind::FlowGeneric,
        TimeoutKind::MaxActiveLife,
        TimeoutKind::ExpiryInterval,
    ];

    /// Node name under `netflow timeout`
    pub fn config_name(&self) -> &'static str {
        match self {
            TimeoutKind::TcpGeneric => "tcp-generic",
            TimeoutKind::TcpRst => "tcp-rst",
            TimeoutKind::TcpFin => "tcp-fin",
            TimeoutKind::Udp => "udp",
            TimeoutKind::Icmp => "icmp",
            TimeoutKind::FlowGeneric => "flow-generic",
            TimeoutKind::MaxActiveLife => "max-active-life",
            TimeoutKind::ExpiryInterval => "expiry-interval",
        }
    }

    /// Keyword used in `nfprobe_timeouts`
    pub fn daemon_keyword(&self) -> Option<&'static str> {
        match self {
            TimeoutKind::TcpGeneric => Some("tcp"),
            TimeoutKind::TcpRst => Some("tcp.rst"),
            TimeoutKind::TcpFin => Some("tcp.fin"),
            TimeoutKind::Udp => Some("udp"),
            TimeoutKind::Icmp => Some("icmp"),
            TimeoutKind::FlowGeneric => Some("general"),
            TimeoutKind::MaxActiveLife => Some("maxlife"),
            TimeoutKind::ExpiryInterval => Some("expint"),
        }
    }
}

/// One configured collector server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectorTarget {
    pub server: String,
    pub port: u16,
}

impl CollectorTarget {
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
        }
    }

    /// Plugin instance name, `server-port`
    pub fn name(&self) -> String {
        format!("{}-{}", self.server, self.port)
    }

    /// `host:port` as the daemon expects it; IPv6 hosts are bracketed
    pub fn receiver(&self) -> String {
        match self.server.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => format!("[{}]:{}", self.server, self.port),
            _ => format!("{}:{}", self.server, self.port),
        }
    }
}

/// Netflow export settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetflowSettings {
    pub version: String,
    pub engine_id: u32,
    pub sampling_rate: Option<u32>,
    pub source_ip: Option<String>,
    pub max_flows: Option<u32>,
    /// Configured timeouts in [`TimeoutKind::ALL`] order
    pub timeouts: Vec<(TimeoutKind, u32)>,
    pub servers: Vec<CollectorTarget>,
}

impl Default for NetflowSettings {
    fn default() -> Self {
        Self {
            version: DEFAULT_NETFLOW_VERSION.to_string(),
            engine_id: DEFAULT_ENGINE_ID,
            sampling_rate: None,
            source_ip: None,
            max_flows: None,
            timeouts: Vec::new(),
            servers: Vec::new(),
        }
    }
}

impl NetflowSettings {
    /// `nfprobe_timeouts` value, e.g. `tcp=5:udp=3`.
    ///
    /// Kinds without a daemon keyword are skipped. `None` when nothing is left.
    pub fn timeouts_string(&self) -> Option<String> {
        let parts: Vec<String> = self
            .timeouts
            .iter()
            .filter_map(|(kind, value)| {
                kind.daemon_keyword()
                    .map(|keyword| format!("{}={}", keyword, value))
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(":"))
        }
    }

    /// `nfprobe_engine` value; version 5 carries an engine type of 0
    pub fn engine_string(&self) -> String {
        if self.version == "5" {
            format!("{}:0", self.engine_id)
        } else {
            self.engine_id.to_string()
        }
    }
}

/// Configured sflow agent address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAddress {
    Auto,
    Literal(Ipv4Addr),
}

impl FromStr for AgentAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == AGENT_ADDRESS_AUTO {
            return Ok(AgentAddress::Auto);
        }
        s.parse::<Ipv4Addr>()
            .map(AgentAddress::Literal)
            .map_err(|_| format!("expected IPv4 address or '{}'", AGENT_ADDRESS_AUTO))
    }
}

/// Sflow export settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SflowSettings {
    pub agent_id: Option<u32>,
    /// Agent address after `auto` resolution and local-address check
    pub agent_ip: Option<Ipv4Addr>,
    pub sampling_rate: Option<u32>,
    pub servers: Vec<CollectorTarget>,
}

/// Snapshot of all flow-accounting settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowAccountingConfig {
    pub buffer_size_mib: u64,
    pub syslog_facility: Option<String>,
    pub imt_enabled: bool,
    pub packet_length: u32,
    pub interfaces: Vec<String>,
    pub netflow: NetflowSettings,
    pub sflow: SflowSettings,
}

impl Default for FlowAccountingConfig {
    fn default() -> Self {
        Self {
            buffer_size_mib: DEFAULT_BUFFER_SIZE_MIB,
            syslog_facility: None,
            imt_enabled: true,
            packet_length: DEFAULT_PACKET_LENGTH,
            interfaces: Vec::new(),
            netflow: NetflowSettings::default(),
            sflow: SflowSettings::default(),
        }
    }
}

impl FlowAccountingConfig {
    /// `plugin_pipe_size` in bytes
    pub fn pipe_size_bytes(&self) -> FlowAcctResult<u64> {
        self.scaled_buffer_size(1024 * 1024)
    }

    /// `plugin_buffer_size` in KB
    pub fn buffer_size_kb(&self) -> FlowAcctResult<u64> {
        self.scaled_buffer_size(1024)
    }

    fn scaled_buffer_size(&self, factor: u64) -> FlowAcctResult<u64> {
        self.buffer_size_mib.checked_mul(factor).ok_or_else(|| {
            FlowAcctError::invalid_config(
                crate::paths::BUFFER_SIZE,
                format!("{} MiB is too large", self.buffer_size_mib),
            )
        })
    }
}

/// Which netfilter hooks carry the NFLOG rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookPolicy {
    /// Before connection tracking, in the raw table
    #[default]
    Early,
    /// After the firewall, on the input and forward paths
    Late,
}

/// Chains, owning tables and NFLOG parameters for the rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NflogHookSpec {
    /// (chain, table) pairs
    pub hooks: Vec<(&'static str, &'static str)>,
    pub group: u16,
    /// Captured bytes per packet
    pub range: u32,
    /// Packets queued in the kernel before sending to userspace
    pub threshold: u32,
}

impl NflogHookSpec {
    pub fn new(policy: HookPolicy, group: u16, range: u32, threshold: u32) -> Self {
        let hooks = match policy {
            HookPolicy::Early => vec![(hooks::CT_PREROUTING_HOOK, hooks::RAW_TABLE)],
            HookPolicy::Late => vec![
                (hooks::POST_FW_IN_HOOK, hooks::FILTER_TABLE),
                (hooks::POST_FW_FWD_HOOK, hooks::FILTER_TABLE),
            ],
        };
        Self {
            hooks,
            group,
            range,
            threshold,
        }
    }
}

/// Interface name to kernel ifindex, one line per monitored interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceIndexMap {
    pub entries: Vec<(String, u32)>,
}

impl InterfaceIndexMap {
    /// Looks up each interface; unknown interfaces are skipped with a warning
    pub fn build(interfaces: &[String], system: &dyn SystemInfo) -> Self {
        let entries = interfaces
            .iter()
            .filter_map(|intf| match system.ifindex(intf) {
                Some(index) => Some((intf.clone(), index)),
                None => {
                    warn!("Interface {} does not exist on the system", intf);
                    None
                }
            })
            .collect();
        Self { entries }
    }
}

impl fmt::Display for InterfaceIndexMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, index) in &self.entries {
            writeln!(f, "id={}\tin={}", index, index)?;
        }
        Ok(())
    }
}
