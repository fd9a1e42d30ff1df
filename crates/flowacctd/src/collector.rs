//! Collector and agent address resolution

use std::net::Ipv4Addr;
use tracing::{debug, instrument};

use flowacct_common::{ConfigTree, FlowAcctError, FlowAcctResult};

use crate::constants::*;
use crate::system::SystemInfo;
use crate::types::{AgentAddress, CollectorTarget};
use crate::{paths, plugins, router_id, CFG_FLOW_ACCOUNTING};

/// Export protocol with its own collector list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Netflow,
    Sflow,
}

impl Protocol {
    /// Settings node under `system flow-accounting`
    pub fn node(&self) -> &'static str {
        match self {
            Protocol::Netflow => paths::NETFLOW,
            Protocol::Sflow => paths::SFLOW,
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Netflow => DEFAULT_NETFLOW_PORT,
            Protocol::Sflow => DEFAULT_SFLOW_PORT,
        }
    }

    /// Daemon plugin exporting this protocol
    pub fn plugin(&self) -> &'static str {
        match self {
            Protocol::Netflow => plugins::NFPROBE,
            Protocol::Sflow => plugins::SFPROBE,
        }
    }
}

/// Resolves collector servers and the sflow agent address from the tree
pub struct CollectorResolver<'a> {
    tree: &'a ConfigTree,
    system: &'a dyn SystemInfo,
}

impl<'a> CollectorResolver<'a> {
    pub fn new(tree: &'a ConfigTree, system: &'a dyn SystemInfo) -> Self {
        Self { tree, system }
    }

    /// One target per configured server, in configuration order, with the
    /// protocol's default port filled in
    #[instrument(skip(self))]
    pub fn collectors(&self, protocol: Protocol) -> FlowAcctResult<Vec<CollectorTarget>> {
        let base = format!("{} {} {}", CFG_FLOW_ACCOUNTING, protocol.node(), paths::SERVER);

        self.tree
            .nodes(&base)
            .into_iter()
            .map(|server| {
                let port = self
                    .tree
                    .parse::<u16>(&format!("{} {} {}", base, server, paths::PORT))?
                    .unwrap_or_else(|| protocol.default_port());
                Ok(CollectorTarget::new(server, port))
            })
            .collect()
    }

    /// `server-port` names, one per server, not deduplicated
    pub fn collector_names(&self, protocol: Protocol) -> FlowAcctResult<Vec<String>> {
        Ok(self
            .collectors(protocol)?
            .iter()
            .map(CollectorTarget::name)
            .collect())
    }

    /// Resolves `sflow agent-address`.
    ///
    /// `auto` tries, in order: the first BGP router-id, the OSPFv2 router-id,
    /// the OSPFv3 router-id, then the first non-loopback IPv4 address. The
    /// result, or a literal address, must be configured on the system.
    #[instrument(skip(self))]
    pub fn resolve_agent_ip(&self) -> FlowAcctResult<Option<Ipv4Addr>> {
        let path = format!(
            "{} {} {}",
            CFG_FLOW_ACCOUNTING,
            paths::SFLOW,
            paths::SFLOW_AGENT_ADDRESS
        );
        let agent = match self.tree.parse::<AgentAddress>(&path)? {
            Some(agent) => agent,
            None => return Ok(None),
        };

        let ip = match agent {
            AgentAddress::Literal(ip) => ip,
            AgentAddress::Auto => match self.router_id()? {
                Some(ip) => ip,
                None => self.first_interface_ipv4()?.ok_or_else(|| {
                    FlowAcctError::invalid_config(
                        path.as_str(),
                        "cannot determine an agent address automatically",
                    )
                })?,
            },
        };

        if !self.system.local_ipv4()?.contains(&ip) {
            return Err(FlowAcctError::AgentIpNotLocal { ip: ip.to_string() });
        }

        debug!("sflow agent address resolved to {}", ip);
        Ok(Some(ip))
    }

    fn router_id(&self) -> FlowAcctResult<Option<Ipv4Addr>> {
        for asn in self.tree.nodes(router_id::BGP) {
            let path = format!("{} {} {}", router_id::BGP, asn, router_id::BGP_ROUTER_ID);
            if let Some(id) = self.tree.parse::<Ipv4Addr>(&path)? {
                return Ok(Some(id));
            }
        }

        for path in [router_id::OSPF, router_id::OSPFV3] {
            if let Some(id) = self.tree.parse::<Ipv4Addr>(path)? {
                return Ok(Some(id));
            }
        }

        Ok(None)
    }

    fn first_interface_ipv4(&self) -> FlowAcctResult<Option<Ipv4Addr>> {
        Ok(self
            .system
            .interfaces()?
            .into_iter()
            .filter(|intf| intf.name != LOOPBACK)
            .flat_map(|intf| intf.ipv4)
            .find(|ip| !ip.is_loopback()))
    }
}
