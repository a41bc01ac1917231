//! Mock 实现模块
//!
//! 提供芯片总线、SPI、调度器和 DHCP 协作方的 Mock 实现，用于测试

pub mod bus;
pub mod dhcp;
pub mod net;
pub mod spi;
