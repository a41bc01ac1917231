//! 寄存器协议常量
//!
//! 通用寄存器地址、socket 寄存器块内偏移、命令码、状态码、中断标志和协议号。
//! 多字节寄存器在芯片上一律按大端存放。

use bitflags::bitflags;

/// 通用寄存器地址（各代芯片相同的部分）
pub mod common {
    /// 模式寄存器
    pub const MR: u16 = 0x0000;
    /// 网关地址（4 字节）
    pub const GAR: u16 = 0x0001;
    /// 子网掩码（4 字节）
    pub const SUBR: u16 = 0x0005;
    /// 源 MAC 地址（6 字节）
    pub const SHAR: u16 = 0x0009;
    /// 源 IP 地址（4 字节）
    pub const SIPR: u16 = 0x000F;
    /// 重传超时，单位 100 µs（2 字节）
    pub const RTR: u16 = 0x0017;
    /// 重传次数
    pub const RCR: u16 = 0x0019;
}

/// socket 寄存器块内的偏移
pub mod socket {
    /// 模式
    pub const MR: u16 = 0x00;
    /// 命令
    pub const CR: u16 = 0x01;
    /// 中断标志
    pub const IR: u16 = 0x02;
    /// 状态
    pub const SR: u16 = 0x03;
    /// 源端口（2 字节）
    pub const PORT: u16 = 0x04;
    /// 目的 MAC（6 字节）
    pub const DHAR: u16 = 0x06;
    /// 目的 IP（4 字节）
    pub const DIPR: u16 = 0x0C;
    /// 目的端口（2 字节）
    pub const DPORT: u16 = 0x10;
    /// 最大分段长度（2 字节）
    pub const MSSR: u16 = 0x12;
    /// IP-raw 模式下的协议号
    pub const PROTO: u16 = 0x14;
    /// IP 首部 TOS
    pub const TOS: u16 = 0x15;
    /// IP 首部 TTL
    pub const TTL: u16 = 0x16;
    /// 发送缓冲区空闲字节数（2 字节）
    pub const TX_FSR: u16 = 0x20;
    /// 发送读指针（2 字节）
    pub const TX_RD: u16 = 0x22;
    /// 发送写指针（2 字节）
    pub const TX_WR: u16 = 0x24;
    /// 接收缓冲区已接收字节数（2 字节）
    pub const RX_RSR: u16 = 0x26;
    /// 接收读指针（2 字节）
    pub const RX_RD: u16 = 0x28;
}

/// 模式寄存器：软件复位位
pub const MR_RST: u8 = 0x80;

/// socket 命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SocketCommand {
    /// 按 Sn_MR 打开
    Open = 0x01,
    /// 进入监听
    Listen = 0x02,
    /// 主动连接
    Connect = 0x04,
    /// 发送 FIN
    Disconnect = 0x08,
    /// 立即关闭
    Close = 0x10,
    /// 发送 TX 缓冲区中 [TX_RD, TX_WR) 的数据
    Send = 0x20,
    /// 不做 ARP，直接使用 Sn_DHAR 发送
    SendMac = 0x21,
    /// 发送 keep-alive
    SendKeep = 0x22,
    /// 确认已读取 [.., RX_RD) 的数据
    Recv = 0x40,
}

impl SocketCommand {
    /// 命令码
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// socket 状态（硬件状态寄存器的值）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketStatus {
    /// 已关闭
    Closed,
    /// TCP 已打开，尚未监听或连接
    Init,
    /// 等待连接
    Listen,
    /// 已发出 SYN
    SynSent,
    /// 已收到 SYN
    SynRecv,
    /// 连接已建立
    Established,
    /// 已发出 FIN
    FinWait,
    /// 双方同时关闭
    Closing,
    /// 等待 2MSL 超时
    TimeWait,
    /// 对端已发出 FIN
    CloseWait,
    /// 等待最后的 ACK
    LastAck,
    /// UDP 模式
    Udp,
    /// IP-raw 模式
    IpRaw,
    /// MAC-raw 模式
    MacRaw,
    /// PPPoE 模式
    Pppoe,
    /// 未列出的中间状态
    Unknown(u8),
}

impl SocketStatus {
    /// 状态码
    pub const fn raw(self) -> u8 {
        match self {
            SocketStatus::Closed => 0x00,
            SocketStatus::Init => 0x13,
            SocketStatus::Listen => 0x14,
            SocketStatus::SynSent => 0x15,
            SocketStatus::SynRecv => 0x16,
            SocketStatus::Established => 0x17,
            SocketStatus::FinWait => 0x18,
            SocketStatus::Closing => 0x1A,
            SocketStatus::TimeWait => 0x1B,
            SocketStatus::CloseWait => 0x1C,
            SocketStatus::LastAck => 0x1D,
            SocketStatus::Udp => 0x22,
            SocketStatus::IpRaw => 0x32,
            SocketStatus::MacRaw => 0x42,
            SocketStatus::Pppoe => 0x5F,
            SocketStatus::Unknown(raw) => raw,
        }
    }
}

impl From<u8> for SocketStatus {
    fn from(raw: u8) -> Self {
        match raw {
            0x00 => SocketStatus::Closed,
            0x13 => SocketStatus::Init,
            0x14 => SocketStatus::Listen,
            0x15 => SocketStatus::SynSent,
            0x16 => SocketStatus::SynRecv,
            0x17 => SocketStatus::Established,
            0x18 => SocketStatus::FinWait,
            0x1A => SocketStatus::Closing,
            0x1B => SocketStatus::TimeWait,
            0x1C => SocketStatus::CloseWait,
            0x1D => SocketStatus::LastAck,
            0x22 => SocketStatus::Udp,
            0x32 => SocketStatus::IpRaw,
            0x42 => SocketStatus::MacRaw,
            0x5F => SocketStatus::Pppoe,
            other => SocketStatus::Unknown(other),
        }
    }
}

/// socket 协议（Sn_MR 低 4 位）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Protocol {
    /// 未使用
    Closed = 0x00,
    /// TCP
    Tcp = 0x01,
    /// UDP
    Udp = 0x02,
    /// IP-raw
    IpRaw = 0x03,
    /// MAC-raw（仅 socket 0）
    MacRaw = 0x04,
    /// PPPoE
    Pppoe = 0x05,
}

impl Protocol {
    /// Sn_MR 中协议字段的掩码
    pub const MASK: u8 = 0x0F;

    /// 协议号
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// 从 Sn_MR 的值中取出协议
    pub fn from_mode(mode: u8) -> Option<Self> {
        Self::try_from(mode & Self::MASK).ok()
    }

    /// 接收流中的数据是否带有报文头
    pub const fn is_datagram(self) -> bool {
        matches!(self, Protocol::Udp | Protocol::IpRaw | Protocol::MacRaw)
    }
}

impl TryFrom<u8> for Protocol {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0x00 => Ok(Protocol::Closed),
            0x01 => Ok(Protocol::Tcp),
            0x02 => Ok(Protocol::Udp),
            0x03 => Ok(Protocol::IpRaw),
            0x04 => Ok(Protocol::MacRaw),
            0x05 => Ok(Protocol::Pppoe),
            other => Err(other),
        }
    }
}

bitflags! {
    /// Sn_MR 中协议以外的选项位
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeFlags: u8 {
        /// TCP：收到数据立即回 ACK
        const NO_DELAYED_ACK = 1 << 5;
        /// UDP：组播
        const MULTICAST = 1 << 7;
    }
}

bitflags! {
    /// Sn_IR 中断标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SocketInterrupt: u8 {
        /// 连接建立
        const CON = 0x01;
        /// 收到 FIN 或断开完成
        const DISCON = 0x02;
        /// 收到数据
        const RECV = 0x04;
        /// ARP 或 TCP 重传超时
        const TIMEOUT = 0x08;
        /// SEND 命令完成
        const SEND_OK = 0x10;
    }
}
