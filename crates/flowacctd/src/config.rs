//! Reads the flow-accounting settings snapshot from the configuration tree

use tracing::instrument;

use flowacct_common::{ConfigTree, FlowAcctResult};

use crate::collector::{CollectorResolver, Protocol};
use crate::constants::*;
use crate::system::SystemInfo;
use crate::types::{FlowAccountingConfig, NetflowSettings, SflowSettings, TimeoutKind};
use crate::{paths, CFG_FLOW_ACCOUNTING};

fn path(relative: &str) -> String {
    format!("{} {}", CFG_FLOW_ACCOUNTING, relative)
}

fn nested(node: &str, leaf: &str) -> String {
    format!("{} {} {}", CFG_FLOW_ACCOUNTING, node, leaf)
}

impl FlowAccountingConfig {
    /// Builds the snapshot, resolving collectors and the sflow agent address
    #[instrument(skip_all)]
    pub fn from_tree(tree: &ConfigTree, system: &dyn SystemInfo) -> FlowAcctResult<Self> {
        let resolver = CollectorResolver::new(tree, system);

        let config = Self {
            buffer_size_mib: tree
                .parse(&path(paths::BUFFER_SIZE))?
                .unwrap_or(DEFAULT_BUFFER_SIZE_MIB),
            syslog_facility: tree.value(&path(paths::SYSLOG_FACILITY)),
            imt_enabled: !tree.exists(&path(paths::DISABLE_IMT)),
            packet_length: tree
                .parse(&path(paths::PACKET_LENGTH))?
                .unwrap_or(DEFAULT_PACKET_LENGTH),
            interfaces: tree.values(&path(paths::INTERFACE)),
            netflow: read_netflow(tree, &resolver)?,
            sflow: read_sflow(tree, &resolver)?,
        };
        config.pipe_size_bytes()?;
        Ok(config)
    }
}

fn read_netflow(tree: &ConfigTree, resolver: &CollectorResolver<'_>) -> FlowAcctResult<NetflowSettings> {
    let node = paths::NETFLOW;

    let mut timeouts = Vec::new();
    for kind in TimeoutKind::ALL {
        let leaf = format!("{} {}", paths::NETFLOW_TIMEOUT, kind.config_name());
        if let Some(value) = tree.parse::<u32>(&nested(node, &leaf))? {
            timeouts.push((kind, value));
        }
    }

    Ok(NetflowSettings {
        version: tree
            .value(&nested(node, paths::NETFLOW_VERSION))
            .unwrap_or_else(|| DEFAULT_NETFLOW_VERSION.to_string()),
        engine_id: tree
            .parse(&nested(node, paths::NETFLOW_ENGINE_ID))?
            .unwrap_or(DEFAULT_ENGINE_ID),
        sampling_rate: tree.parse(&nested(node, paths::SAMPLING_RATE))?,
        source_ip: tree.value(&nested(node, paths::NETFLOW_SOURCE_IP)),
        max_flows: tree.parse(&nested(node, paths::NETFLOW_MAX_FLOWS))?,
        timeouts,
        servers: resolver.collectors(Protocol::Netflow)?,
    })
}

fn read_sflow(tree: &ConfigTree, resolver: &CollectorResolver<'_>) -> FlowAcctResult<SflowSettings> {
    let node = paths::SFLOW;

    Ok(SflowSettings {
        agent_id: tree.parse(&nested(node, paths::SFLOW_AGENT_ID))?,
        agent_ip: resolver.resolve_agent_ip()?,
        sampling_rate: tree.parse(&nested(node, paths::SAMPLING_RATE))?,
        servers: resolver.collectors(Protocol::Sflow)?,
    })
}
