//! 寄存器映射
//!
//! [`RegisterMap`] 持有总线、芯片代际和初始化时算出的窗口划分。
//! 所有寄存器访问都经由 [`RegisterSession`]：会话在创建时占用总线，
//! 在销毁时释放，一个会话就是一个访问组。

use log::{debug, trace, warn};

use crate::bus::{BusGuard, BusTransport};
use crate::chip::ChipRegisterAccess;
use crate::config::ChipConfig;
use crate::error::ChipError;
use crate::regs::{MR_RST, SocketCommand, SocketInterrupt, SocketStatus, common, socket};
use crate::ring::BufferRing;
use crate::window::{Direction, Window, WindowLayout};

/// 软件复位后轮询模式寄存器的最大次数
pub const RESET_POLL_LIMIT: usize = 20;

/// 芯片寄存器映射
pub struct RegisterMap<B: BusTransport, C: ChipRegisterAccess> {
    bus: B,
    chip: C,
    layout: WindowLayout,
}

impl<B: BusTransport, C: ChipRegisterAccess> RegisterMap<B, C> {
    /// 创建寄存器映射
    ///
    /// 在 [`init`](Self::init) 之前没有任何活动 socket。
    pub fn new(bus: B, chip: C) -> Self {
        let layout = WindowLayout::empty(chip.memory_layout());
        Self { bus, chip, layout }
    }

    /// 初始化芯片
    ///
    /// 软件复位、检查芯片身份、划分收发窗口、写入每 socket 内存大小以及重传参数。
    pub fn init(&mut self, config: &ChipConfig) -> Result<(), ChipError> {
        let max = self.chip.max_sockets();
        let count = config.sockets.unwrap_or(max);
        if count == 0 {
            return Err(ChipError::NoSockets);
        }
        if count > max {
            return Err(ChipError::TooManySockets {
                requested: count,
                max,
            });
        }

        let mut bus = BusGuard::new(&mut self.bus);

        bus.write_byte(common::MR, MR_RST);
        let reset = (0..RESET_POLL_LIMIT).any(|_| bus.read_byte(common::MR) == 0);
        if !reset {
            warn!("wizchip: mode register did not clear after reset");
            return Err(ChipError::ResetTimeout);
        }

        self.chip.check_identity(&mut *bus)?;

        let layout = WindowLayout::partition(self.chip.memory_layout(), count);
        self.chip.program_memory(&mut *bus, &layout);

        bus.write_burst(common::RTR, &config.retransmission_time.to_be_bytes());
        bus.write_byte(common::RCR, config.retransmission_count);
        drop(bus);

        self.layout = layout;
        debug!(
            "wizchip: {:?} initialised, {} sockets, {} byte windows",
            self.chip.kind(),
            count,
            layout.window_size(Direction::Tx)
        );
        Ok(())
    }

    /// 开始一个访问组
    pub fn session(&mut self) -> RegisterSession<'_, B, C> {
        RegisterSession {
            bus: BusGuard::new(&mut self.bus),
            chip: &self.chip,
            layout: &self.layout,
        }
    }

    /// 芯片代际
    pub fn chip(&self) -> &C {
        &self.chip
    }

    /// 窗口划分
    pub fn layout(&self) -> &WindowLayout {
        &self.layout
    }

    /// 活动 socket 数（初始化前为 0）
    pub fn socket_count(&self) -> usize {
        self.layout.count()
    }

    /// socket `s` 在指定方向上的窗口
    pub fn window(&self, s: usize, direction: Direction) -> Option<Window> {
        self.layout.window(s, direction)
    }

    /// 底层总线
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// 底层总线（可变）
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

/// 一个访问组内的寄存器会话
///
/// 持有总线直到被销毁。不要跨越等待（yield）持有会话。
pub struct RegisterSession<'a, B: BusTransport, C: ChipRegisterAccess> {
    bus: BusGuard<'a, B>,
    chip: &'a C,
    layout: &'a WindowLayout,
}

impl<B: BusTransport, C: ChipRegisterAccess> RegisterSession<'_, B, C> {
    fn read_array<const N: usize>(&mut self, addr: u16) -> [u8; N] {
        let mut buf = [0u8; N];
        self.bus.read_burst(addr, &mut buf);
        buf
    }

    fn read_u16(&mut self, addr: u16) -> u16 {
        u16::from_be_bytes(self.read_array(addr))
    }

    fn write_u16(&mut self, addr: u16, value: u16) {
        self.bus.write_burst(addr, &value.to_be_bytes());
    }

    /// 反复读取 16 位计数器，直到连续两次读数一致
    ///
    /// 芯片在后台更新计数器，单次读取可能读到高低字节不一致的值。
    fn read_u16_confirmed(&mut self, addr: u16) -> u16 {
        let mut previous = self.read_u16(addr);
        loop {
            let current = self.read_u16(addr);
            if current == previous {
                return current;
            }
            previous = current;
        }
    }

    fn sreg(&self, s: usize, offset: u16) -> u16 {
        self.chip.socket_reg(s, offset)
    }

    fn ring(&self, s: usize, direction: Direction) -> Option<BufferRing> {
        self.layout.window(s, direction).map(BufferRing::new)
    }

    // ========== 通用寄存器 ==========

    /// 模式寄存器
    pub fn mode(&mut self) -> u8 {
        self.bus.read_byte(common::MR)
    }

    /// 写模式寄存器
    pub fn set_mode(&mut self, value: u8) {
        self.bus.write_byte(common::MR, value);
    }

    /// 源 MAC 地址
    pub fn mac(&mut self) -> [u8; 6] {
        self.read_array(common::SHAR)
    }

    /// 写源 MAC 地址
    pub fn set_mac(&mut self, mac: [u8; 6]) {
        self.bus.write_burst(common::SHAR, &mac);
    }

    /// 源 IP 地址
    pub fn ip(&mut self) -> [u8; 4] {
        self.read_array(common::SIPR)
    }

    /// 写源 IP 地址
    pub fn set_ip(&mut self, ip: [u8; 4]) {
        self.bus.write_burst(common::SIPR, &ip);
    }

    /// 网关地址
    pub fn gateway(&mut self) -> [u8; 4] {
        self.read_array(common::GAR)
    }

    /// 写网关地址
    pub fn set_gateway(&mut self, gateway: [u8; 4]) {
        self.bus.write_burst(common::GAR, &gateway);
    }

    /// 子网掩码
    pub fn subnet(&mut self) -> [u8; 4] {
        self.read_array(common::SUBR)
    }

    /// 写子网掩码
    pub fn set_subnet(&mut self, subnet: [u8; 4]) {
        self.bus.write_burst(common::SUBR, &subnet);
    }

    /// 在同一访问组内写入 IP、网关和子网掩码
    pub fn set_network(&mut self, ip: [u8; 4], gateway: [u8; 4], subnet: [u8; 4]) {
        self.set_ip(ip);
        self.set_gateway(gateway);
        self.set_subnet(subnet);
    }

    /// 重传超时（100 µs 单位）
    pub fn retransmission_time(&mut self) -> u16 {
        self.read_u16(common::RTR)
    }

    /// 写重传超时
    pub fn set_retransmission_time(&mut self, value: u16) {
        self.write_u16(common::RTR, value);
    }

    /// 重传次数
    pub fn retransmission_count(&mut self) -> u8 {
        self.bus.read_byte(common::RCR)
    }

    /// 写重传次数
    pub fn set_retransmission_count(&mut self, value: u8) {
        self.bus.write_byte(common::RCR, value);
    }

    // ========== socket 寄存器 ==========

    /// Sn_MR
    pub fn socket_mode(&mut self, s: usize) -> u8 {
        let addr = self.sreg(s, socket::MR);
        self.bus.read_byte(addr)
    }

    /// 写 Sn_MR
    pub fn set_socket_mode(&mut self, s: usize, mode: u8) {
        let addr = self.sreg(s, socket::MR);
        self.bus.write_byte(addr, mode);
    }

    /// 执行 socket 命令，等待命令寄存器归零
    pub fn exec_command(&mut self, s: usize, command: SocketCommand) {
        let addr = self.sreg(s, socket::CR);
        trace!("wizchip: socket {} command {:?}", s, command);
        self.bus.write_byte(addr, command.raw());
        while self.bus.read_byte(addr) != 0 {
            core::hint::spin_loop();
        }
    }

    /// 硬件状态
    pub fn status(&mut self, s: usize) -> SocketStatus {
        let addr = self.sreg(s, socket::SR);
        SocketStatus::from(self.bus.read_byte(addr))
    }

    /// 中断标志
    pub fn interrupts(&mut self, s: usize) -> SocketInterrupt {
        let addr = self.sreg(s, socket::IR);
        SocketInterrupt::from_bits_retain(self.bus.read_byte(addr))
    }

    /// 清除指定的中断标志（写 1 清零）
    pub fn clear_interrupts(&mut self, s: usize, flags: SocketInterrupt) {
        let addr = self.sreg(s, socket::IR);
        self.bus.write_byte(addr, flags.bits());
    }

    /// 清除全部中断标志
    pub fn clear_all_interrupts(&mut self, s: usize) {
        let addr = self.sreg(s, socket::IR);
        self.bus.write_byte(addr, 0xFF);
    }

    /// 源端口
    pub fn source_port(&mut self, s: usize) -> u16 {
        let addr = self.sreg(s, socket::PORT);
        self.read_u16(addr)
    }

    /// 写源端口
    pub fn set_source_port(&mut self, s: usize, port: u16) {
        let addr = self.sreg(s, socket::PORT);
        self.write_u16(addr, port);
    }

    /// 目的 IP
    pub fn destination_ip(&mut self, s: usize) -> [u8; 4] {
        let addr = self.sreg(s, socket::DIPR);
        self.read_array(addr)
    }

    /// 目的端口
    pub fn destination_port(&mut self, s: usize) -> u16 {
        let addr = self.sreg(s, socket::DPORT);
        self.read_u16(addr)
    }

    /// 写目的 IP 和端口
    pub fn set_destination(&mut self, s: usize, ip: [u8; 4], port: u16) {
        let addr = self.sreg(s, socket::DIPR);
        self.bus.write_burst(addr, &ip);
        let addr = self.sreg(s, socket::DPORT);
        self.write_u16(addr, port);
    }

    /// 发送缓冲区空闲字节数（双读确认）
    pub fn tx_free_size(&mut self, s: usize) -> u16 {
        let addr = self.sreg(s, socket::TX_FSR);
        self.read_u16_confirmed(addr)
    }

    /// 发送写指针
    pub fn tx_write_ptr(&mut self, s: usize) -> u16 {
        let addr = self.sreg(s, socket::TX_WR);
        self.read_u16(addr)
    }

    /// 写发送写指针
    pub fn set_tx_write_ptr(&mut self, s: usize, ptr: u16) {
        let addr = self.sreg(s, socket::TX_WR);
        self.write_u16(addr, ptr);
    }

    /// 接收缓冲区已接收字节数（双读确认）
    pub fn rx_received_size(&mut self, s: usize) -> u16 {
        let addr = self.sreg(s, socket::RX_RSR);
        self.read_u16_confirmed(addr)
    }

    /// 接收读指针
    pub fn rx_read_ptr(&mut self, s: usize) -> u16 {
        let addr = self.sreg(s, socket::RX_RD);
        self.read_u16(addr)
    }

    /// 写接收读指针
    pub fn set_rx_read_ptr(&mut self, s: usize, ptr: u16) {
        let addr = self.sreg(s, socket::RX_RD);
        self.write_u16(addr, ptr);
    }

    // ========== 缓冲区 ==========

    /// 把 `data` 写到发送写指针处并推进写指针
    pub fn send_data(&mut self, s: usize, data: &[u8]) -> usize {
        self.send_data_at(s, 0, data, true)
    }

    /// 把 `data` 写到 `Sn_TX_WR + offset` 处
    ///
    /// `advance` 为真时把写指针推进到写入末尾。
    pub fn send_data_at(&mut self, s: usize, offset: u16, data: &[u8], advance: bool) -> usize {
        let Some(ring) = self.ring(s, Direction::Tx) else {
            return 0;
        };
        let ptr = self.tx_write_ptr(s).wrapping_add(offset);
        let written = ring.write(&mut *self.bus, ptr, data);
        if advance {
            self.set_tx_write_ptr(s, ptr.wrapping_add(written as u16));
        }
        written
    }

    /// 从接收读指针处读取到 `buf`
    ///
    /// `peek` 为假时推进读指针。调用方负责随后执行 RECV 命令。
    pub fn recv_data(&mut self, s: usize, buf: &mut [u8], peek: bool) -> usize {
        let Some(ring) = self.ring(s, Direction::Rx) else {
            return 0;
        };
        let ptr = self.rx_read_ptr(s);
        let read = ring.read(&mut *self.bus, ptr, buf);
        if !peek {
            self.set_rx_read_ptr(s, ptr.wrapping_add(read as u16));
        }
        read
    }

    /// 从指定的逻辑接收指针处读取，不改变任何指针
    pub fn read_data(&mut self, s: usize, ptr: u16, buf: &mut [u8]) -> usize {
        match self.ring(s, Direction::Rx) {
            Some(ring) => ring.read(&mut *self.bus, ptr, buf),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{W5100, W5200};
    use crate::mock::wired_bus;
    use crate::regs::Protocol;
    use test_support::mock::bus::MockBus;

    fn ready_w5100() -> RegisterMap<MockBus, W5100> {
        let mut map = RegisterMap::new(wired_bus(&W5100), W5100);
        map.init(&ChipConfig::default()).unwrap();
        map.bus_mut().clear_log();
        map
    }

    #[test]
    fn test_init_programs_layout_and_retransmission() {
        let mut map = RegisterMap::new(wired_bus(&W5100), W5100);
        assert_eq!(map.socket_count(), 0);

        map.init(&ChipConfig::default().with_retransmission(4000, 3))
            .unwrap();

        assert_eq!(map.socket_count(), 4);
        assert_eq!(map.bus().writes_to(common::MR), [MR_RST]);
        assert_eq!(map.bus().peek_u16(common::RTR), 4000);
        assert_eq!(map.bus().peek(common::RCR), 3);
        assert!(!map.bus().is_held());
    }

    #[test]
    fn test_init_rejects_bad_socket_counts() {
        let mut map = RegisterMap::new(wired_bus(&W5100), W5100);
        assert_eq!(
            map.init(&ChipConfig::default().with_sockets(0)),
            Err(ChipError::NoSockets)
        );
        assert_eq!(
            map.init(&ChipConfig::default().with_sockets(5)),
            Err(ChipError::TooManySockets {
                requested: 5,
                max: 4
            })
        );
        assert_eq!(map.bus().acquisitions(), 0);
    }

    #[test]
    fn test_init_reports_stuck_reset() {
        let mut bus = wired_bus(&W5100);
        bus.script(common::MR, &[MR_RST; RESET_POLL_LIMIT]);
        let mut map = RegisterMap::new(bus, W5100);

        assert_eq!(
            map.init(&ChipConfig::default()),
            Err(ChipError::ResetTimeout)
        );
        assert_eq!(map.socket_count(), 0);
        assert!(!map.bus().is_held());
    }

    #[test]
    fn test_init_checks_w5200_version() {
        let mut bus = wired_bus(&W5200);
        bus.poke(0x001F, 0x00);
        let mut map = RegisterMap::new(bus, W5200);
        assert!(matches!(
            map.init(&ChipConfig::default()),
            Err(ChipError::UnexpectedVersion { found: 0x00, .. })
        ));

        let mut map = RegisterMap::new(wired_bus(&W5200), W5200);
        map.init(&ChipConfig::default().with_sockets(2)).unwrap();
        assert_eq!(map.window(1, Direction::Rx).map(|w| w.size), Some(8192));
    }

    #[test]
    fn test_counter_double_read_waits_for_stable_value() {
        let mut map = ready_w5100();
        let fsr = W5100.socket_reg(0, socket::TX_FSR);
        map.bus_mut().script_u16(fsr, &[0x0010, 0x0700, 0x0800]);
        map.bus_mut().poke_u16(fsr, 0x0800);

        assert_eq!(map.session().tx_free_size(0), 0x0800);
        // 0x0010, 0x0700, 0x0800, 0x0800：4 次 16 位读取
        assert_eq!(map.bus().reads(), 8);
    }

    #[test]
    fn test_counter_double_read_confirms_zero() {
        let mut map = ready_w5100();
        assert_eq!(map.session().rx_received_size(2), 0);
        assert_eq!(map.bus().reads(), 4);
    }

    #[test]
    fn test_exec_command_waits_for_clear() {
        let mut map = ready_w5100();
        let cr = W5100.socket_reg(1, socket::CR);
        map.bus_mut().script(cr, &[0x01, 0x01]);

        map.session().exec_command(1, SocketCommand::Open);

        assert_eq!(map.bus().writes_to(cr), [0x01]);
        assert_eq!(map.bus().reads(), 3);
    }

    #[test]
    fn test_send_data_advances_write_pointer_across_wrap() {
        let mut map = ready_w5100();
        let wr = W5100.socket_reg(0, socket::TX_WR);
        map.bus_mut().poke_u16(wr, 0x17FE);

        let written = map.session().send_data(0, &[1, 2, 3, 4]);

        assert_eq!(written, 4);
        assert_eq!(map.bus().peek_u16(wr), 0x1802);
        assert_eq!(map.bus().peek_slice(0x47FE, 2), [1, 2]);
        assert_eq!(map.bus().peek_slice(0x4000, 2), [3, 4]);
    }

    #[test]
    fn test_recv_peek_keeps_read_pointer() {
        let mut map = ready_w5100();
        let rd = W5100.socket_reg(3, socket::RX_RD);
        map.bus_mut().poke_u16(rd, 0x0002);
        map.bus_mut().poke_slice(0x7802, b"xyz");

        let mut buf = [0u8; 2];
        assert_eq!(map.session().recv_data(3, &mut buf, true), 2);
        assert_eq!(&buf, b"xy");
        assert_eq!(map.bus().peek_u16(rd), 0x0002);

        assert_eq!(map.session().recv_data(3, &mut buf, false), 2);
        assert_eq!(map.bus().peek_u16(rd), 0x0004);
    }

    #[test]
    fn test_socket_registers_use_chip_offsets() {
        let mut map = ready_w5100();
        {
            let mut session = map.session();
            session.set_socket_mode(2, Protocol::Udp.raw());
            session.set_source_port(2, 5000);
            session.set_destination(2, [10, 0, 0, 5], 0x1388);
            session.set_network([192, 168, 1, 10], [192, 168, 1, 1], [255, 255, 255, 0]);
        }
        let bus = map.bus();
        assert_eq!(bus.peek(0x0600), 0x02);
        assert_eq!(bus.peek_u16(0x0604), 5000);
        assert_eq!(bus.peek_slice(0x060C, 4), [10, 0, 0, 5]);
        assert_eq!(bus.peek_u16(0x0610), 0x1388);
        assert_eq!(bus.peek_slice(common::SIPR, 4), [192, 168, 1, 10]);
        assert_eq!(bus.peek_slice(common::GAR, 4), [192, 168, 1, 1]);
        assert_eq!(bus.peek_slice(common::SUBR, 4), [255, 255, 255, 0]);
    }
}
