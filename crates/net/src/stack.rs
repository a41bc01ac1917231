//! 网络栈
//!
//! [`NetworkStack`] 持有 socket 驱动、可选的 DHCP 协作方和 DNS 服务器地址，
//! 负责芯片初始化以及把静态配置或 DHCP 租约写入芯片。

use log::{info, warn};
use smoltcp::wire::{EthernetAddress, Ipv4Address};
use wizchip::{BusTransport, ChipConfig, ChipRegisterAccess};

use crate::config::NetworkConfig;
use crate::dhcp::{DhcpClient, LeaseState, NoDhcp};
use crate::error::StackError;
use crate::ops::{BusyPoll, NetOps};
use crate::socket::SocketDriver;

/// 网络栈
pub struct NetworkStack<B, C, O = BusyPoll, D = NoDhcp>
where
    B: BusTransport,
    C: ChipRegisterAccess,
    O: NetOps,
    D: DhcpClient,
{
    sockets: SocketDriver<B, C, O>,
    dhcp: Option<D>,
    dns: Ipv4Address,
    chip_config: ChipConfig,
}

impl<B, C, O, D> NetworkStack<B, C, O, D>
where
    B: BusTransport,
    C: ChipRegisterAccess,
    O: NetOps,
    D: DhcpClient,
{
    /// 在 socket 驱动之上创建网络栈
    pub fn new(sockets: SocketDriver<B, C, O>) -> Self {
        Self {
            sockets,
            dhcp: None,
            dns: Ipv4Address::UNSPECIFIED,
            chip_config: ChipConfig::default(),
        }
    }

    /// 指定芯片初始化配置
    pub fn with_chip_config(mut self, config: ChipConfig) -> Self {
        self.chip_config = config;
        self
    }

    /// 使用静态配置启动
    pub fn begin_static(&mut self, config: &NetworkConfig) -> Result<(), StackError> {
        self.sockets.init(&self.chip_config)?;
        {
            let mut regs = self.sockets.registers_mut().session();
            regs.set_mac(config.mac.0);
            regs.set_network(
                config.ip.octets(),
                config.gateway.octets(),
                config.subnet.octets(),
            );
        }
        self.dns = config.dns;
        info!(
            "net: static config applied, ip {} gateway {} subnet {}",
            config.ip, config.gateway, config.subnet
        );
        Ok(())
    }

    /// 通过 DHCP 启动
    ///
    /// 未取得租约时返回 [`StackError::DhcpFailed`]；协作方仍被保留，
    /// 之后的 [`maintain`](Self::maintain) 会继续尝试。
    pub fn begin_dhcp(&mut self, mac: EthernetAddress, dhcp: D) -> Result<(), StackError> {
        self.sockets.init(&self.chip_config)?;
        {
            let mut regs = self.sockets.registers_mut().session();
            regs.set_mac(mac.0);
            regs.set_ip(Ipv4Address::UNSPECIFIED.octets());
        }
        self.start_lease(mac, dhcp)
    }

    /// 使用芯片中已有的 MAC 地址（例如模块出厂烧录的地址）通过 DHCP 启动
    ///
    /// 初始化后不写 SHAR，从中读出 MAC 并交给 DHCP 协作方；返回所用的 MAC。
    /// 失败语义与 [`begin_dhcp`](Self::begin_dhcp) 相同。
    pub fn begin_dhcp_with_chip_mac(&mut self, dhcp: D) -> Result<EthernetAddress, StackError> {
        self.sockets.init(&self.chip_config)?;
        let mac = {
            let mut regs = self.sockets.registers_mut().session();
            regs.set_ip(Ipv4Address::UNSPECIFIED.octets());
            EthernetAddress(regs.mac())
        };
        info!("net: using MAC {} from chip", mac);
        self.start_lease(mac, dhcp)?;
        Ok(mac)
    }

    fn start_lease(&mut self, mac: EthernetAddress, dhcp: D) -> Result<(), StackError> {
        let dhcp = self.dhcp.insert(dhcp);
        if !dhcp.acquire_lease(&mut self.sockets, mac) {
            warn!("net: DHCP lease acquisition failed");
            return Err(StackError::DhcpFailed);
        }
        self.apply_lease();
        Ok(())
    }

    /// 维护 DHCP 租约
    ///
    /// 续约或重绑定后把 IP、网关、子网掩码和 DNS 一起更新；MAC 不变。
    /// 没有 DHCP 协作方时总是返回 [`LeaseState::NoChange`]。
    pub fn maintain(&mut self) -> LeaseState {
        let Some(dhcp) = self.dhcp.as_mut() else {
            return LeaseState::NoChange;
        };
        let state = dhcp.check_lease(&mut self.sockets);
        match state {
            LeaseState::Renewed | LeaseState::Rebound => self.apply_lease(),
            LeaseState::Failed => warn!("net: DHCP lease check failed"),
            LeaseState::NoChange => {}
        }
        state
    }

    /// 手动更新地址配置
    pub fn reconfigure(
        &mut self,
        ip: Ipv4Address,
        gateway: Ipv4Address,
        subnet: Ipv4Address,
        dns: Ipv4Address,
    ) {
        self.sockets
            .registers_mut()
            .session()
            .set_network(ip.octets(), gateway.octets(), subnet.octets());
        self.dns = dns;
        info!("net: reconfigured, ip {} gateway {} subnet {}", ip, gateway, subnet);
    }

    fn apply_lease(&mut self) {
        let Some(dhcp) = self.dhcp.as_ref() else {
            return;
        };
        let ip = dhcp.local_ip();
        let gateway = dhcp.gateway_ip();
        let subnet = dhcp.subnet_mask();
        let dns = dhcp.dns_server_ip();
        self.sockets
            .registers_mut()
            .session()
            .set_network(ip.octets(), gateway.octets(), subnet.octets());
        self.dns = dns;
        info!("net: DHCP lease applied, ip {} gateway {} dns {}", ip, gateway, dns);
    }

    /// 芯片中的本机地址
    pub fn local_ip(&mut self) -> Ipv4Address {
        Ipv4Address::from(self.sockets.registers_mut().session().ip())
    }

    /// 芯片中的子网掩码
    pub fn subnet_mask(&mut self) -> Ipv4Address {
        Ipv4Address::from(self.sockets.registers_mut().session().subnet())
    }

    /// 芯片中的网关
    pub fn gateway_ip(&mut self) -> Ipv4Address {
        Ipv4Address::from(self.sockets.registers_mut().session().gateway())
    }

    /// 芯片中的 MAC 地址
    pub fn mac_address(&mut self) -> EthernetAddress {
        EthernetAddress(self.sockets.registers_mut().session().mac())
    }

    /// DNS 服务器
    pub fn dns_server_ip(&self) -> Ipv4Address {
        self.dns
    }

    /// socket 驱动
    pub fn sockets(&mut self) -> &mut SocketDriver<B, C, O> {
        &mut self.sockets
    }

    /// DHCP 协作方
    pub fn dhcp(&self) -> Option<&D> {
        self.dhcp.as_ref()
    }
}
