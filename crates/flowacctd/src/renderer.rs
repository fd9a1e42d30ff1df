//! Renders the accounting daemon's configuration file

use std::fmt::Display;
use tracing::{debug, instrument};

use flowacct_common::{FlowAcctError, FlowAcctResult};

use crate::constants::*;
use crate::keys;
use crate::plugins;
use crate::settings::FlowAcctdSettings;
use crate::types::FlowAccountingConfig;

/// Produces the daemon configuration text.
///
/// Output order is fixed: header, global options, optional `syslog`,
/// `plugins`, then one block per netflow collector and one per sflow
/// collector. The only input besides the snapshot is whether the networks
/// file exists when `render` runs.
pub struct ConfigRenderer<'a> {
    settings: &'a FlowAcctdSettings,
}

impl<'a> ConfigRenderer<'a> {
    pub fn new(settings: &'a FlowAcctdSettings) -> Self {
        Self { settings }
    }

    /// Plugins to load.
    ///
    /// Each export plugin appears once however many collectors it has.
    pub fn plugins(config: &FlowAccountingConfig) -> FlowAcctResult<Vec<&'static str>> {
        let mut list = Vec::new();
        if config.imt_enabled {
            list.push(plugins::MEMORY);
        }
        if !config.netflow.servers.is_empty() {
            list.push(plugins::NFPROBE);
        }
        if !config.sflow.servers.is_empty() {
            list.push(plugins::SFPROBE);
        }

        if list.is_empty() {
            return Err(FlowAcctError::NoPluginEnabled);
        }
        Ok(list)
    }

    #[instrument(skip_all)]
    pub fn render(&self, config: &FlowAccountingConfig) -> FlowAcctResult<String> {
        let plugin_list = Self::plugins(config)?;
        let paths = &self.settings.paths;

        let mut out = String::new();
        out.push_str(CONFIG_HEADER);
        out.push_str("\n\n");

        line(&mut out, keys::DAEMONIZE, "true");
        line(&mut out, keys::PROMISC, "false");
        line(&mut out, keys::PIDFILE, paths.pid_file.display());
        line(&mut out, keys::IMT_PATH, paths.imt_path.display());
        line(&mut out, keys::IMT_MEM_POOLS_NUMBER, IMT_MEM_POOLS_NUMBER);
        line(&mut out, keys::UACCTD_GROUP, self.settings.nflog.group);
        line(&mut out, keys::UACCTD_NL_SIZE, UACCTD_NL_SIZE);
        line(&mut out, keys::SNAPLEN, config.packet_length);
        line(&mut out, keys::REFRESH_MAPS, "true");
        line(&mut out, keys::PRE_TAG_MAP, paths.int_map_file.display());

        if paths.networks_file.exists() {
            debug!("Networks file {} present", paths.networks_file.display());
            line(
                &mut out,
                keys::AGGREGATE,
                format!("{},{}", AGGREGATE_BASE, AGGREGATE_AS),
            );
            line(&mut out, keys::NETWORKS_FILE, paths.networks_file.display());
        } else {
            line(&mut out, keys::AGGREGATE, AGGREGATE_BASE);
        }

        line(&mut out, keys::PLUGIN_PIPE_SIZE, config.pipe_size_bytes()?);
        line(&mut out, keys::PLUGIN_BUFFER_SIZE, config.buffer_size_kb()?);

        if let Some(facility) = &config.syslog_facility {
            line(&mut out, keys::SYSLOG, facility);
        }

        line(&mut out, keys::PLUGINS, plugin_list.join(","));

        let netflow = &config.netflow;
        for target in &netflow.servers {
            let name = target.name();
            out.push('\n');
            named(&mut out, keys::NFPROBE_RECEIVER, &name, target.receiver());
            named(&mut out, keys::NFPROBE_VERSION, &name, &netflow.version);
            named(&mut out, keys::NFPROBE_ENGINE, &name, netflow.engine_string());
            if let Some(timeouts) = netflow.timeouts_string() {
                named(&mut out, keys::NFPROBE_TIMEOUTS, &name, timeouts);
            }
            if let Some(max_flows) = netflow.max_flows {
                named(&mut out, keys::NFPROBE_MAXFLOWS, &name, max_flows);
            }
            if let Some(rate) = netflow.sampling_rate {
                named(&mut out, keys::SAMPLING_RATE, &name, rate);
            }
            if let Some(source_ip) = &netflow.source_ip {
                named(&mut out, keys::NFPROBE_SOURCE_IP, &name, source_ip);
            }
        }

        let sflow = &config.sflow;
        for target in &sflow.servers {
            let name = target.name();
            out.push('\n');
            named(&mut out, keys::SFPROBE_RECEIVER, &name, target.receiver());
            if let Some(agent_ip) = sflow.agent_ip {
                named(&mut out, keys::SFPROBE_AGENTIP, &name, agent_ip);
            }
            if let Some(agent_id) = sflow.agent_id {
                named(&mut out, keys::SFPROBE_AGENTSUBID, &name, agent_id);
            }
            if let Some(rate) = sflow.sampling_rate {
                named(&mut out, keys::SAMPLING_RATE, &name, rate);
            }
        }

        Ok(out)
    }
}

fn line(out: &mut String, key: &str, value: impl Display) {
    out.push_str(&format!("{}: {}\n", key, value));
}

fn named(out: &mut String, key: &str, name: &str, value: impl Display) {
    out.push_str(&format!("{}[{}]: {}\n", key, name, value));
}
