//! DHCP 协作方接口
//!
//! DHCP 协议本身（报文编解码、重传、租期计时）不在本 crate 内。
//! [`NetworkStack`](crate::NetworkStack) 只通过 [`DhcpClient`] 获取和检查租约，
//! 并在租约变化时把地址写入芯片。

use smoltcp::wire::{EthernetAddress, Ipv4Address};
use wizchip::{BusTransport, ChipRegisterAccess};

use crate::ops::NetOps;
use crate::socket::SocketDriver;

/// 租约检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseState {
    /// 无变化
    NoChange,
    /// 续约成功
    Renewed,
    /// 重绑定成功（地址可能变化）
    Rebound,
    /// 续约或重绑定失败，下次检查时重试
    Failed,
}

impl LeaseState {
    /// 是否需要把租约重新写入芯片
    pub fn is_update(self) -> bool {
        matches!(self, LeaseState::Renewed | LeaseState::Rebound)
    }
}

/// DHCP 客户端
///
/// socket 驱动被传入，因为客户端需要自己打开一个 UDP socket 收发报文。
pub trait DhcpClient {
    /// 为 `mac` 获取租约，成功返回 `true`
    fn acquire_lease<B, C, O>(
        &mut self,
        sockets: &mut SocketDriver<B, C, O>,
        mac: EthernetAddress,
    ) -> bool
    where
        B: BusTransport,
        C: ChipRegisterAccess,
        O: NetOps;

    /// 检查租约，必要时续约或重绑定
    fn check_lease<B, C, O>(&mut self, sockets: &mut SocketDriver<B, C, O>) -> LeaseState
    where
        B: BusTransport,
        C: ChipRegisterAccess,
        O: NetOps;

    /// 租约中的本机地址
    fn local_ip(&self) -> Ipv4Address;

    /// 租约中的网关
    fn gateway_ip(&self) -> Ipv4Address;

    /// 租约中的子网掩码
    fn subnet_mask(&self) -> Ipv4Address;

    /// 租约中的 DNS 服务器
    fn dns_server_ip(&self) -> Ipv4Address;
}

/// 不使用 DHCP
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDhcp;

impl DhcpClient for NoDhcp {
    fn acquire_lease<B, C, O>(&mut self, _: &mut SocketDriver<B, C, O>, _: EthernetAddress) -> bool
    where
        B: BusTransport,
        C: ChipRegisterAccess,
        O: NetOps,
    {
        false
    }

    fn check_lease<B, C, O>(&mut self, _: &mut SocketDriver<B, C, O>) -> LeaseState
    where
        B: BusTransport,
        C: ChipRegisterAccess,
        O: NetOps,
    {
        LeaseState::NoChange
    }

    fn local_ip(&self) -> Ipv4Address {
        Ipv4Address::UNSPECIFIED
    }

    fn gateway_ip(&self) -> Ipv4Address {
        Ipv4Address::UNSPECIFIED
    }

    fn subnet_mask(&self) -> Ipv4Address {
        Ipv4Address::UNSPECIFIED
    }

    fn dns_server_ip(&self) -> Ipv4Address {
        Ipv4Address::UNSPECIFIED
    }
}
