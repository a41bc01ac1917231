//! WIZnet 硬件协议栈芯片的寄存器与缓冲区层
//!
//! 此 crate 把一颗通过 SPI 访问的硬件 TCP/IP 芯片抽象为类型化的寄存器接口，包括：
//!
//! - [`BusTransport`] trait - 按地址读写芯片的总线，及其 RAII 占用保护器 [`BusGuard`]
//! - [`bus::spi`] - 各代芯片的 SPI 帧格式（[`W5100Spi`]、[`W5200Spi`]）
//! - [`ChipRegisterAccess`] trait - 芯片代际能力接口（[`W5100`]、[`W5200`]、[`AnyChip`]）
//! - [`WindowLayout`] - 芯片缓冲区内存在各 socket 之间的等分
//! - [`BufferRing`] - socket 收发窗口上的环形读写
//! - [`RegisterMap`] - 芯片初始化和按访问组占用总线的寄存器会话
//!
//! # 总线占用
//!
//! 所有寄存器访问都在 [`RegisterSession`] 内进行。会话创建时占用总线，
//! 销毁时释放，因此任何提前返回都不会让总线处于占用状态。
//! 一个上层操作（例如等待发送完成）可以多次创建会话，
//! 其他总线用户得以在两次轮询之间插入访问。

#![no_std]

pub mod bus;
pub mod chip;
pub mod config;
pub mod error;
pub mod regmap;
pub mod regs;
pub mod ring;
pub mod window;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export bus
pub use bus::shared::SharedSpi;
pub use bus::spi::{SpiBus, W5100Spi, W5200Spi};
pub use bus::{BusGuard, BusTransport};

// Re-export chip
pub use chip::{AnyChip, ChipKind, ChipRegisterAccess, W5100, W5200};

// Re-export 主要接口
pub use config::ChipConfig;
pub use error::ChipError;
pub use regmap::{RegisterMap, RegisterSession};
pub use regs::{ModeFlags, Protocol, SocketCommand, SocketInterrupt, SocketStatus};
pub use ring::BufferRing;
pub use window::{Direction, MAX_SOCKETS, MemoryLayout, Window, WindowLayout};
