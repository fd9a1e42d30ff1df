//! Interface and address introspection

use std::net::Ipv4Addr;

use flowacct_common::{FlowAcctError, FlowAcctResult};

/// An interface and the IPv4 addresses configured on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddrs {
    pub name: String,
    pub ipv4: Vec<Ipv4Addr>,
}

/// Read-only view of the system's interfaces
pub trait SystemInfo: Send + Sync {
    /// All interfaces with their IPv4 addresses, in kernel enumeration order
    fn interfaces(&self) -> FlowAcctResult<Vec<InterfaceAddrs>>;

    /// Kernel ifindex of `name`, if the interface exists
    fn ifindex(&self, name: &str) -> Option<u32>;

    /// Every IPv4 address configured on the system
    fn local_ipv4(&self) -> FlowAcctResult<Vec<Ipv4Addr>> {
        Ok(self
            .interfaces()?
            .into_iter()
            .flat_map(|intf| intf.ipv4)
            .collect())
    }
}

/// [`SystemInfo`] backed by `getifaddrs(3)` and `if_nametoindex(3)`
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxSystem;

impl SystemInfo for LinuxSystem {
    fn interfaces(&self) -> FlowAcctResult<Vec<InterfaceAddrs>> {
        let addrs = nix::ifaddrs::getifaddrs()
            .map_err(|e| FlowAcctError::internal(format!("getifaddrs failed: {}", e)))?;

        let mut interfaces: Vec<InterfaceAddrs> = Vec::new();
        for ifaddr in addrs {
            let ipv4 = ifaddr
                .address
                .as_ref()
                .and_then(|addr| addr.as_sockaddr_in())
                .map(|sin| Ipv4Addr::from(sin.ip()));

            let pos = match interfaces
                .iter()
                .position(|intf| intf.name == ifaddr.interface_name)
            {
                Some(pos) => pos,
                None => {
                    interfaces.push(InterfaceAddrs {
                        name: ifaddr.interface_name.clone(),
                        ipv4: Vec::new(),
                    });
                    interfaces.len() - 1
                }
            };

            if let Some(ip) = ipv4 {
                interfaces[pos].ipv4.push(ip);
            }
        }

        Ok(interfaces)
    }

    fn ifindex(&self, name: &str) -> Option<u32> {
        nix::net::if_::if_nametoindex(name).ok()
    }
}

/// [`SystemInfo`] with a fixed interface list
#[derive(Debug, Clone, Default)]
pub struct StaticSystem {
    interfaces: Vec<(InterfaceAddrs, u32)>,
}

impl StaticSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interface(mut self, name: &str, ifindex: u32, ipv4: &[Ipv4Addr]) -> Self {
        self.interfaces.push((
            InterfaceAddrs {
                name: name.to_string(),
                ipv4: ipv4.to_vec(),
            },
            ifindex,
        ));
        self
    }
}

impl SystemInfo for StaticSystem {
    fn interfaces(&self) -> FlowAcctResult<Vec<InterfaceAddrs>> {
        Ok(self
            .interfaces
            .iter()
            .map(|(intf, _)| intf.clone())
            .collect())
    }

    fn ifindex(&self, name: &str) -> Option<u32> {
        self.interfaces
            .iter()
            .find(|(intf, _)| intf.name == name)
            .map(|(_, index)| *index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_system_lookup() {
        let system = StaticSystem::new()
            .with_interface("lo", 1, &[Ipv4Addr::LOCALHOST])
            .with_interface("eth0", 2, &[Ipv4Addr::new(10, 0, 0, 1)]);

        assert_eq!(system.ifindex("eth0"), Some(2));
        assert_eq!(system.ifindex("eth7"), None);
        assert_eq!(
            system.local_ipv4().unwrap(),
            vec![Ipv4Addr::LOCALHOST, Ipv4Addr::new(10, 0, 0, 1)]
        );
    }

    #[test]
    fn test_linux_system_has_loopback() {
        let system = LinuxSystem;
        let interfaces = system.interfaces().unwrap();
        assert!(interfaces.iter().any(|intf| intf.name == "lo"));
        assert!(system.ifindex("lo").is_some());
    }
}
