//! 静态网络配置

use smoltcp::wire::{EthernetAddress, Ipv4Address};

/// 静态网络配置
///
/// IP、网关和子网掩码总是作为一个整体写入芯片。芯片没有 DNS 寄存器，
/// DNS 服务器地址由 [`NetworkStack`](crate::NetworkStack) 保存。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// MAC 地址
    pub mac: EthernetAddress,
    /// 本机地址
    pub ip: Ipv4Address,
    /// 子网掩码
    pub subnet: Ipv4Address,
    /// 网关
    pub gateway: Ipv4Address,
    /// DNS 服务器
    pub dns: Ipv4Address,
}

impl NetworkConfig {
    /// 以 `ip` 为本机地址的配置
    ///
    /// DNS 服务器和网关默认为同网段的 `.1`，子网掩码默认为 `255.255.255.0`。
    pub fn with_ip(mac: EthernetAddress, ip: Ipv4Address) -> Self {
        let [a, b, c, _] = ip.octets();
        let router = Ipv4Address::new(a, b, c, 1);
        Self {
            mac,
            ip,
            subnet: Ipv4Address::new(255, 255, 255, 0),
            gateway: router,
            dns: router,
        }
    }

    /// 指定 DNS 服务器
    pub fn with_dns(mut self, dns: Ipv4Address) -> Self {
        self.dns = dns;
        self
    }

    /// 指定网关
    pub fn with_gateway(mut self, gateway: Ipv4Address) -> Self {
        self.gateway = gateway;
        self
    }

    /// 指定子网掩码
    pub fn with_subnet(mut self, subnet: Ipv4Address) -> Self {
        self.subnet = subnet;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: EthernetAddress = EthernetAddress([0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED]);

    #[test]
    fn test_defaults_derive_from_ip() {
        let config = NetworkConfig::with_ip(MAC, Ipv4Address::new(192, 168, 7, 20));
        assert_eq!(config.gateway, Ipv4Address::new(192, 168, 7, 1));
        assert_eq!(config.dns, Ipv4Address::new(192, 168, 7, 1));
        assert_eq!(config.subnet, Ipv4Address::new(255, 255, 255, 0));
    }

    #[test]
    fn test_overrides_replace_single_field() {
        let config = NetworkConfig::with_ip(MAC, Ipv4Address::new(10, 1, 2, 3))
            .with_dns(Ipv4Address::new(1, 1, 1, 1))
            .with_subnet(Ipv4Address::new(255, 0, 0, 0));
        assert_eq!(config.dns, Ipv4Address::new(1, 1, 1, 1));
        assert_eq!(config.gateway, Ipv4Address::new(10, 1, 2, 1));
        assert_eq!(config.subnet, Ipv4Address::new(255, 0, 0, 0));
    }
}
