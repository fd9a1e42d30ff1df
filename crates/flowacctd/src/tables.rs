//! Path and keyword constants for flowacctd

/// Root of the flow-accounting settings in the configuration tree
pub const CFG_FLOW_ACCOUNTING: &str = "system flow-accounting";

/// Configuration tree paths, relative to [`CFG_FLOW_ACCOUNTING`]
pub mod paths {
    pub const BUFFER_SIZE: &str = "buffer-size";
    pub const SYSLOG_FACILITY: &str = "syslog-facility";
    pub const DISABLE_IMT: &str = "disable-imt";
    pub const PACKET_LENGTH: &str = "packet-length";
    pub const INTERFACE: &str = "interface";

    pub const NETFLOW: &str = "netflow";
    pub const SFLOW: &str = "sflow";

    pub const SERVER: &str = "server";
    pub const PORT: &str = "port";
    pub const SAMPLING_RATE: &str = "sampling-rate";

    pub const NETFLOW_VERSION: &str = "version";
    pub const NETFLOW_ENGINE_ID: &str = "engine-id";
    pub const NETFLOW_SOURCE_IP: &str = "source-ip";
    pub const NETFLOW_MAX_FLOWS: &str = "max-flows";
    pub const NETFLOW_TIMEOUT: &str = "timeout";

    pub const SFLOW_AGENT_ADDRESS: &str = "agent-address";
    pub const SFLOW_AGENT_ID: &str = "agentid";
}

/// Router-id locations consulted when the sflow agent address is `auto`
pub mod router_id {
    /// Tag node holding one child per configured AS
    pub const BGP: &str = "protocols bgp";

    /// Relative to `protocols bgp <asn>`
    pub const BGP_ROUTER_ID: &str = "parameters router-id";

    pub const OSPF: &str = "protocols ospf parameters router-id";

    pub const OSPFV3: &str = "protocols ospfv3 parameters router-id";
}

/// Keys of the accounting daemon's configuration file
pub mod keys {
    pub const DAEMONIZE: &str = "daemonize";
    pub const PROMISC: &str = "promisc";
    pub const PIDFILE: &str = "pidfile";
    pub const IMT_PATH: &str = "imt_path";
    pub const IMT_MEM_POOLS_NUMBER: &str = "imt_mem_pools_number";
    pub const UACCTD_GROUP: &str = "uacctd_group";
    pub const UACCTD_NL_SIZE: &str = "uacctd_nl_size";
    pub const SNAPLEN: &str = "snaplen";
    pub const REFRESH_MAPS: &str = "refresh_maps";
    pub const PRE_TAG_MAP: &str = "pre_tag_map";
    pub const AGGREGATE: &str = "aggregate";
    pub const NETWORKS_FILE: &str = "networks_file";
    pub const PLUGIN_PIPE_SIZE: &str = "plugin_pipe_size";
    pub const PLUGIN_BUFFER_SIZE: &str = "plugin_buffer_size";
    pub const SYSLOG: &str = "syslog";
    pub const PLUGINS: &str = "plugins";

    pub const NFPROBE_RECEIVER: &str = "nfprobe_receiver";
    pub const NFPROBE_VERSION: &str = "nfprobe_version";
    pub const NFPROBE_SOURCE_IP: &str = "nfprobe_source_ip";
    pub const NFPROBE_ENGINE: &str = "nfprobe_engine";
    pub const NFPROBE_TIMEOUTS: &str = "nfprobe_timeouts";
    pub const NFPROBE_MAXFLOWS: &str = "nfprobe_maxflows";
    pub const SAMPLING_RATE: &str = "sampling_rate";

    pub const SFPROBE_RECEIVER: &str = "sfprobe_receiver";
    pub const SFPROBE_AGENTIP: &str = "sfprobe_agentip";
    pub const SFPROBE_AGENTSUBID: &str = "sfprobe_agentsubid";
}

/// Plugin names in the `plugins:` line
pub mod plugins {
    pub const MEMORY: &str = "memory";
    pub const NFPROBE: &str = "nfprobe";
    pub const SFPROBE: &str = "sfprobe";
}

/// Hook chains and the tables that own them
pub mod hooks {
    pub const RAW_TABLE: &str = "raw";
    pub const FILTER_TABLE: &str = "filter";

    pub const CT_PREROUTING_HOOK: &str = "VYATTA_CT_PREROUTING_HOOK";
    pub const POST_FW_IN_HOOK: &str = "VYATTA_POST_FW_IN_HOOK";
    pub const POST_FW_FWD_HOOK: &str = "VYATTA_POST_FW_FWD_HOOK";
}

/// Special constants
pub mod constants {
    /// Header written at the top of the rendered file
    pub const CONFIG_HEADER: &str = "# generated by flow-accounting";

    /// Default plugin pipe size in MiB
    pub const DEFAULT_BUFFER_SIZE_MIB: u64 = 10;

    /// Default captured bytes per packet
    pub const DEFAULT_PACKET_LENGTH: u32 = 128;

    pub const DEFAULT_NETFLOW_PORT: u16 = 2055;
    pub const DEFAULT_SFLOW_PORT: u16 = 6343;
    pub const DEFAULT_NETFLOW_VERSION: &str = "9";
    pub const DEFAULT_ENGINE_ID: u32 = 0;

    /// Agent address directive resolved from router-id or interface IPs
    pub const AGENT_ADDRESS_AUTO: &str = "auto";

    pub const IMT_MEM_POOLS_NUMBER: u32 = 169;
    pub const UACCTD_NL_SIZE: u32 = 2_097_152;

    /// Aggregation primitives always collected
    pub const AGGREGATE_BASE: &str =
        "tag,src_mac,dst_mac,vlan,src_host,dst_host,src_port,dst_port,proto,tos,flows";

    /// Extra primitives when a networks file is present
    pub const AGGREGATE_AS: &str = "src_as,dst_as";

    /// Loopback interface name skipped by agent address discovery
    pub const LOOPBACK: &str = "lo";
}
