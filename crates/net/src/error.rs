//! 错误类型

use wizchip::{ChipError, SocketStatus};

/// socket 操作错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketError {
    /// socket 编号超出活动 socket 范围
    InvalidSocket,
    /// 不支持的协议
    UnsupportedProtocol,
    /// 非法的目的地址
    InvalidAddress,
    /// 非法的端口
    InvalidPort,
    /// socket 不在该操作要求的状态
    InvalidState(SocketStatus),
    /// 连接未建立
    NotConnected,
    /// 连接在操作过程中被关闭（socket 已被隐式关闭）
    ConnectionClosed,
    /// 暂时没有数据
    WouldBlock,
    /// 芯片报告 ARP 或重传超时
    Timeout,
    /// 轮询超过了驱动设置的期限
    Deadline,
    /// socket 不是数据报协议
    NotDatagram,
}

impl SocketError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            SocketError::WouldBlock => -11,
            SocketError::InvalidSocket => -9,
            SocketError::InvalidAddress | SocketError::InvalidPort => -22,
            SocketError::InvalidState(_) => -22,
            SocketError::UnsupportedProtocol => -93,
            SocketError::NotDatagram => -95,
            SocketError::NotConnected => -107,
            SocketError::ConnectionClosed => -104,
            SocketError::Timeout | SocketError::Deadline => -110,
        }
    }
}

/// 网络栈错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// 芯片初始化失败
    Chip(ChipError),
    /// 未能取得 DHCP 租约
    DhcpFailed,
}

impl From<ChipError> for StackError {
    fn from(err: ChipError) -> Self {
        StackError::Chip(err)
    }
}

impl StackError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            StackError::Chip(err) => err.to_errno(),
            StackError::DhcpFailed => -101,
        }
    }
}
