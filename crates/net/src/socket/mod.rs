//! socket 驱动
//!
//! [`SocketDriver`] 把芯片的寄存器协议翻译成按 socket 编号操作的接口。
//! socket 的硬件状态从不缓存：每次查询都重新读取状态寄存器。
//! 驱动只在软件侧记录协议、本地端口、监听端口和暂存的发送数据长度。
//!
//! # 轮询
//!
//! 需要等待芯片的操作（`send`、`sendto`、`igmp_send`、`send_udp`）在每轮轮询之间
//! 释放总线并调用 [`NetOps::yield_now`]。默认无限等待；
//! 通过 [`SocketDriver::set_poll_timeout`] 设置期限后，超时返回 [`SocketError::Deadline`]。

mod header;
mod port;

pub use header::DatagramHeader;
pub use port::{EPHEMERAL_PORT_START, EphemeralPorts};

use log::{debug, warn};
use smoltcp::wire::Ipv4Address;
use wizchip::{
    BusTransport, ChipConfig, ChipError, ChipRegisterAccess, Direction, MAX_SOCKETS, ModeFlags,
    Protocol, RegisterMap, SocketCommand, SocketInterrupt, SocketStatus,
};

use crate::error::SocketError;
use crate::ops::{BusyPoll, NetOps};

/// `recvfrom` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datagram {
    /// 复制到缓冲区的字节数
    pub len: usize,
    /// 数据报负载的完整长度（大于 `len` 时多出的部分已被丢弃）
    pub payload_len: usize,
    /// 源地址（UDP、IP-raw）
    pub addr: Option<Ipv4Address>,
    /// 源端口（UDP）
    pub port: Option<u16>,
}

/// 每个 socket 的软件状态
#[derive(Debug, Clone, Copy, Default)]
struct SocketState {
    protocol: Option<Protocol>,
    local_port: u16,
    server_port: u16,
    /// `buffer_data` 暂存、尚未提交的字节数（相对 Sn_TX_WR）
    staged: u16,
}

/// 等待 SEND_OK 时遇到 TIMEOUT 的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnTimeout {
    /// 清除标志，socket 保持打开
    Clear,
    /// 关闭 socket
    Close,
}

/// socket 驱动
pub struct SocketDriver<B: BusTransport, C: ChipRegisterAccess, O: NetOps = BusyPoll> {
    regs: RegisterMap<B, C>,
    ops: O,
    sockets: [SocketState; MAX_SOCKETS],
    ports: EphemeralPorts,
    poll_timeout: Option<u64>,
}

impl<B: BusTransport, C: ChipRegisterAccess> SocketDriver<B, C, BusyPoll> {
    /// 使用忙等创建驱动
    pub fn with_busy_poll(bus: B, chip: C) -> Self {
        Self::new(RegisterMap::new(bus, chip), BusyPoll)
    }
}

impl<B: BusTransport, C: ChipRegisterAccess, O: NetOps> SocketDriver<B, C, O> {
    /// 创建驱动
    ///
    /// 芯片尚未初始化时没有活动 socket，所有 socket 操作都返回
    /// [`SocketError::InvalidSocket`]。
    pub fn new(regs: RegisterMap<B, C>, ops: O) -> Self {
        Self {
            regs,
            ops,
            sockets: [SocketState::default(); MAX_SOCKETS],
            ports: EphemeralPorts::new(),
            poll_timeout: None,
        }
    }

    /// 初始化芯片并清空所有 socket 的软件状态
    pub fn init(&mut self, config: &ChipConfig) -> Result<(), ChipError> {
        self.regs.init(config)?;
        self.sockets = [SocketState::default(); MAX_SOCKETS];
        Ok(())
    }

    /// 设置轮询期限（毫秒）；`None` 表示无限等待
    pub fn set_poll_timeout(&mut self, timeout_ms: Option<u64>) {
        self.poll_timeout = timeout_ms;
    }

    /// 当前轮询期限
    pub fn poll_timeout(&self) -> Option<u64> {
        self.poll_timeout
    }

    /// 寄存器映射
    pub fn registers(&self) -> &RegisterMap<B, C> {
        &self.regs
    }

    /// 寄存器映射（可变）
    pub fn registers_mut(&mut self) -> &mut RegisterMap<B, C> {
        &mut self.regs
    }

    /// 调度钩子
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// 活动 socket 数
    pub fn socket_count(&self) -> usize {
        self.regs.socket_count()
    }

    fn check(&self, s: usize) -> Result<(), SocketError> {
        if s < self.regs.socket_count() {
            Ok(())
        } else {
            Err(SocketError::InvalidSocket)
        }
    }

    fn deadline(&self) -> Option<u64> {
        self.poll_timeout
            .map(|timeout| self.ops.get_time_ms().saturating_add(timeout))
    }

    /// 一轮轮询未完成：检查期限后让出
    fn pause(&mut self, deadline: Option<u64>) -> Result<(), SocketError> {
        if deadline.is_some_and(|deadline| self.ops.get_time_ms() >= deadline) {
            return Err(SocketError::Deadline);
        }
        self.ops.yield_now();
        Ok(())
    }

    fn tx_window(&self) -> usize {
        self.regs.layout().window_size(Direction::Tx)
    }

    // ========== 生命周期 ==========

    /// 打开 socket
    ///
    /// 先关闭 socket 上已有的会话。`port` 为 0 时分配一个临时端口。
    /// 返回实际使用的本地端口。
    pub fn open(
        &mut self,
        s: usize,
        protocol: Protocol,
        port: u16,
        flags: ModeFlags,
    ) -> Result<u16, SocketError> {
        self.check(s)?;
        if protocol == Protocol::Closed {
            return Err(SocketError::UnsupportedProtocol);
        }
        self.close(s)?;

        let port = match port {
            0 => self.ports.allocate(),
            port => port,
        };
        {
            let mut regs = self.regs.session();
            regs.set_socket_mode(s, protocol.raw() | flags.bits());
            regs.set_source_port(s, port);
            regs.exec_command(s, SocketCommand::Open);
        }
        self.sockets[s] = SocketState {
            protocol: Some(protocol),
            local_port: port,
            ..SocketState::default()
        };
        debug!("net: socket {} opened as {:?} on port {}", s, protocol, port);
        Ok(port)
    }

    /// 进入监听
    ///
    /// socket 必须处于 INIT 状态，否则返回 [`SocketError::InvalidState`] 且不做任何修改。
    pub fn listen(&mut self, s: usize) -> Result<(), SocketError> {
        self.check(s)?;
        {
            let mut regs = self.regs.session();
            let status = regs.status(s);
            if status != SocketStatus::Init {
                return Err(SocketError::InvalidState(status));
            }
            regs.exec_command(s, SocketCommand::Listen);
        }
        let state = &mut self.sockets[s];
        state.server_port = state.local_port;
        debug!("net: socket {} listening on port {}", s, state.local_port);
        Ok(())
    }

    /// 发起连接
    ///
    /// 不等待连接建立；调用方通过 [`status`](Self::status) 观察结果。
    pub fn connect(&mut self, s: usize, addr: Ipv4Address, port: u16) -> Result<(), SocketError> {
        self.check(s)?;
        if addr.is_unspecified() || addr.is_broadcast() {
            return Err(SocketError::InvalidAddress);
        }
        if port == 0 {
            return Err(SocketError::InvalidPort);
        }
        let mut regs = self.regs.session();
        regs.set_destination(s, addr.octets(), port);
        regs.exec_command(s, SocketCommand::Connect);
        debug!("net: socket {} connecting to {}:{}", s, addr, port);
        Ok(())
    }

    /// 发送 FIN
    pub fn disconnect(&mut self, s: usize) -> Result<(), SocketError> {
        self.check(s)?;
        let mut regs = self.regs.session();
        regs.exec_command(s, SocketCommand::Disconnect);
        regs.clear_all_interrupts(s);
        Ok(())
    }

    /// 立即关闭 socket，并清空其软件状态
    pub fn close(&mut self, s: usize) -> Result<(), SocketError> {
        self.check(s)?;
        {
            let mut regs = self.regs.session();
            regs.exec_command(s, SocketCommand::Close);
            regs.clear_all_interrupts(s);
        }
        if self.sockets[s].protocol.is_some() {
            debug!("net: socket {} closed", s);
        }
        self.sockets[s] = SocketState::default();
        Ok(())
    }

    // ========== 流式收发 ==========

    /// 在已建立的连接上发送
    ///
    /// 一次最多发送一个 TX 窗口大小的数据，返回实际发送的字节数；
    /// 调用方负责继续发送剩余部分。
    pub fn send(&mut self, s: usize, buf: &[u8]) -> Result<usize, SocketError> {
        self.check(s)?;
        if buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len().min(self.tx_window());
        let deadline = self.deadline();

        loop {
            let (free, status) = {
                let mut regs = self.regs.session();
                (regs.tx_free_size(s) as usize, regs.status(s))
            };
            if !matches!(status, SocketStatus::Established | SocketStatus::CloseWait) {
                return Err(SocketError::NotConnected);
            }
            if free >= len {
                break;
            }
            self.pause(deadline)?;
        }

        {
            let mut regs = self.regs.session();
            regs.send_data(s, &buf[..len]);
            regs.clear_interrupts(s, SocketInterrupt::SEND_OK | SocketInterrupt::TIMEOUT);
            regs.exec_command(s, SocketCommand::Send);
        }

        loop {
            let (flags, status) = {
                let mut regs = self.regs.session();
                (regs.interrupts(s), regs.status(s))
            };
            if flags.contains(SocketInterrupt::SEND_OK) {
                break;
            }
            if status == SocketStatus::Closed {
                warn!("net: socket {} closed while sending", s);
                self.close(s)?;
                return Err(SocketError::ConnectionClosed);
            }
            self.pause(deadline)?;
        }

        self.regs
            .session()
            .clear_interrupts(s, SocketInterrupt::SEND_OK);
        Ok(len)
    }

    /// 接收
    ///
    /// 没有数据时：socket 处于 LISTEN、CLOSED 或 CLOSE_WAIT 则返回 `Ok(0)`（对端已结束），
    /// 否则返回 [`SocketError::WouldBlock`]。
    pub fn recv(&mut self, s: usize, buf: &mut [u8]) -> Result<usize, SocketError> {
        self.check(s)?;
        if buf.is_empty() {
            return Ok(0);
        }
        let mut regs = self.regs.session();
        let size = regs.rx_received_size(s) as usize;
        if size == 0 {
            return match regs.status(s) {
                SocketStatus::Listen | SocketStatus::Closed | SocketStatus::CloseWait => Ok(0),
                _ => Err(SocketError::WouldBlock),
            };
        }
        let len = size.min(buf.len());
        regs.recv_data(s, &mut buf[..len], false);
        regs.exec_command(s, SocketCommand::Recv);
        Ok(len)
    }

    /// 查看下一个待接收的字节，不移动读指针
    pub fn peek(&mut self, s: usize) -> Result<u8, SocketError> {
        self.check(s)?;
        let mut regs = self.regs.session();
        if regs.rx_received_size(s) == 0 {
            return Err(SocketError::WouldBlock);
        }
        let mut byte = [0u8; 1];
        regs.recv_data(s, &mut byte, true);
        Ok(byte[0])
    }

    /// 已接收、尚未读取的字节数
    pub fn available(&mut self, s: usize) -> Result<usize, SocketError> {
        self.check(s)?;
        Ok(self.regs.session().rx_received_size(s) as usize)
    }

    // ========== 数据报收发 ==========

    /// 向指定目的地发送一个数据报
    ///
    /// 允许广播地址。芯片报告超时时返回 [`SocketError::Timeout`]，socket 保持打开。
    pub fn sendto(
        &mut self,
        s: usize,
        buf: &[u8],
        addr: Ipv4Address,
        port: u16,
    ) -> Result<usize, SocketError> {
        self.check(s)?;
        validate_destination(addr, port)?;
        if buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len().min(self.tx_window());
        {
            let mut regs = self.regs.session();
            regs.set_destination(s, addr.octets(), port);
            regs.send_data(s, &buf[..len]);
            regs.clear_interrupts(s, SocketInterrupt::SEND_OK | SocketInterrupt::TIMEOUT);
            regs.exec_command(s, SocketCommand::Send);
        }
        self.wait_send_ok(s, OnTimeout::Clear)?;
        Ok(len)
    }

    /// 接收一个数据报
    ///
    /// 负载超出 `buf` 的部分被丢弃，读指针总是越过整个数据报。
    /// 没有待接收数据时返回 [`SocketError::WouldBlock`]。
    pub fn recvfrom(&mut self, s: usize, buf: &mut [u8]) -> Result<Datagram, SocketError> {
        self.check(s)?;
        let protocol = match self.sockets[s].protocol {
            Some(protocol) if protocol.is_datagram() => protocol,
            _ => return Err(SocketError::NotDatagram),
        };
        let header_len = DatagramHeader::len_for(protocol).ok_or(SocketError::NotDatagram)?;

        let mut regs = self.regs.session();
        if regs.rx_received_size(s) == 0 {
            return Err(SocketError::WouldBlock);
        }

        let ptr = regs.rx_read_ptr(s);
        let mut raw = [0u8; DatagramHeader::MAX_LEN];
        regs.read_data(s, ptr, &mut raw[..header_len]);
        let header = DatagramHeader::parse(protocol, &raw).ok_or(SocketError::NotDatagram)?;

        let payload_ptr = ptr.wrapping_add(header_len as u16);
        let payload_len = header.payload_len();
        let len = payload_len.min(buf.len());
        regs.read_data(s, payload_ptr, &mut buf[..len]);
        regs.set_rx_read_ptr(s, payload_ptr.wrapping_add(payload_len as u16));
        regs.exec_command(s, SocketCommand::Recv);

        Ok(Datagram {
            len,
            payload_len,
            addr: header.source_addr(),
            port: header.source_port(),
        })
    }

    /// 在组播 socket 上发送（目的地址已在打开前写入）
    ///
    /// 芯片报告超时时关闭 socket 并返回 [`SocketError::Timeout`]。
    pub fn igmp_send(&mut self, s: usize, buf: &[u8]) -> Result<usize, SocketError> {
        self.check(s)?;
        let len = buf.len().min(self.tx_window());
        if len == 0 {
            return Ok(0);
        }
        {
            let mut regs = self.regs.session();
            regs.send_data(s, &buf[..len]);
            regs.clear_interrupts(s, SocketInterrupt::SEND_OK | SocketInterrupt::TIMEOUT);
            regs.exec_command(s, SocketCommand::Send);
        }
        self.wait_send_ok(s, OnTimeout::Close)?;
        Ok(len)
    }

    // ========== 分段组装的 UDP 发送 ==========

    /// 设置下一个数据报的目的地，并丢弃此前暂存的数据
    pub fn start_udp(
        &mut self,
        s: usize,
        addr: Ipv4Address,
        port: u16,
    ) -> Result<(), SocketError> {
        self.check(s)?;
        validate_destination(addr, port)?;
        self.regs.session().set_destination(s, addr.octets(), port);
        self.sockets[s].staged = 0;
        Ok(())
    }

    /// 在 `Sn_TX_WR + offset` 处暂存数据，不推进写指针
    ///
    /// `offset + len` 不超过发送缓冲区的空闲空间；`offset` 已在空闲空间之外时返回 0。
    /// 返回实际暂存的字节数。
    pub fn buffer_data(
        &mut self,
        s: usize,
        offset: u16,
        data: &[u8],
    ) -> Result<usize, SocketError> {
        self.check(s)?;
        let written = {
            let mut regs = self.regs.session();
            let room = (regs.tx_free_size(s) as usize).saturating_sub(offset as usize);
            let len = data.len().min(room);
            if len == 0 {
                return Ok(0);
            }
            regs.send_data_at(s, offset, &data[..len], false)
        };
        let state = &mut self.sockets[s];
        state.staged = state.staged.max(offset + written as u16);
        Ok(written)
    }

    /// 提交暂存的数据并发送
    pub fn send_udp(&mut self, s: usize) -> Result<usize, SocketError> {
        self.check(s)?;
        let staged = core::mem::take(&mut self.sockets[s].staged);
        {
            let mut regs = self.regs.session();
            let ptr = regs.tx_write_ptr(s);
            regs.set_tx_write_ptr(s, ptr.wrapping_add(staged));
            regs.clear_interrupts(s, SocketInterrupt::SEND_OK | SocketInterrupt::TIMEOUT);
            regs.exec_command(s, SocketCommand::Send);
        }
        self.wait_send_ok(s, OnTimeout::Clear)?;
        Ok(staged as usize)
    }

    /// 等待 SEND_OK；期间遇到 TIMEOUT 则按 `on_timeout` 处理
    ///
    /// 调用方须在发出 SEND 前清除 SEND_OK 和 TIMEOUT。
    fn wait_send_ok(&mut self, s: usize, on_timeout: OnTimeout) -> Result<(), SocketError> {
        let deadline = self.deadline();
        loop {
            let flags = self.regs.session().interrupts(s);
            if flags.contains(SocketInterrupt::SEND_OK) {
                break;
            }
            if flags.contains(SocketInterrupt::TIMEOUT) {
                warn!("net: socket {} send timed out", s);
                match on_timeout {
                    OnTimeout::Clear => self
                        .regs
                        .session()
                        .clear_interrupts(s, SocketInterrupt::SEND_OK | SocketInterrupt::TIMEOUT),
                    OnTimeout::Close => self.close(s)?,
                }
                return Err(SocketError::Timeout);
            }
            self.pause(deadline)?;
        }
        self.regs
            .session()
            .clear_interrupts(s, SocketInterrupt::SEND_OK);
        Ok(())
    }

    // ========== 查询 ==========

    /// 硬件状态
    pub fn status(&mut self, s: usize) -> Result<SocketStatus, SocketError> {
        self.check(s)?;
        Ok(self.regs.session().status(s))
    }

    /// 进入监听时记录的服务端口；未监听过为 0
    pub fn server_port(&self, s: usize) -> Result<u16, SocketError> {
        self.check(s)?;
        Ok(self.sockets[s].server_port)
    }

    /// 打开时分配的本地端口；未打开为 0
    pub fn local_port(&self, s: usize) -> Result<u16, SocketError> {
        self.check(s)?;
        Ok(self.sockets[s].local_port)
    }

    /// 打开时指定的协议；未打开为 `None`
    pub fn protocol(&self, s: usize) -> Result<Option<Protocol>, SocketError> {
        self.check(s)?;
        Ok(self.sockets[s].protocol)
    }

    /// 第一个硬件状态为 CLOSED 的 socket
    pub fn first_closed(&mut self) -> Option<usize> {
        let count = self.regs.socket_count();
        let mut regs = self.regs.session();
        (0..count).find(|&s| regs.status(s) == SocketStatus::Closed)
    }
}

/// 数据报目的地检查：拒绝 0.0.0.0 和端口 0
fn validate_destination(addr: Ipv4Address, port: u16) -> Result<(), SocketError> {
    if addr.is_unspecified() {
        return Err(SocketError::InvalidAddress);
    }
    if port == 0 {
        return Err(SocketError::InvalidPort);
    }
    Ok(())
}
