//! 硬件协议栈芯片的 socket 驱动与网络配置
//!
//! 此 crate 在 [`wizchip`] 的寄存器层之上提供：
//!
//! - [`SocketDriver`] - 按 socket 编号操作的 TCP/UDP/IP-raw/MAC-raw 接口
//! - [`NetOps`] trait - 轮询等待时的时钟与协作式让出钩子
//! - [`NetworkStack`] - 芯片初始化、静态配置与 DHCP 租约维护
//! - [`DhcpClient`] trait - DHCP 协议的黑盒协作方
//!
//! 驱动是单线程、协作式的：唯一的挂起点是轮询循环中的 [`NetOps::yield_now`]，
//! 每次让出之前都会释放总线。

#![no_std]

pub mod config;
pub mod dhcp;
pub mod error;
pub mod ops;
pub mod socket;
pub mod stack;

#[cfg(test)]
mod tests;

// Re-export ops
pub use ops::{BusyPoll, NetOps};

// Re-export 主要接口
pub use config::NetworkConfig;
pub use dhcp::{DhcpClient, LeaseState, NoDhcp};
pub use error::{SocketError, StackError};
pub use socket::{Datagram, DatagramHeader, EphemeralPorts, SocketDriver};
pub use stack::NetworkStack;

// Re-export 寄存器层和 smoltcp 地址类型
pub use smoltcp::wire::{EthernetAddress, Ipv4Address};
pub use wizchip::{ChipConfig, ModeFlags, Protocol, SocketStatus};
