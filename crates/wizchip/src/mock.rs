//! 为 `test-support` 中的 Mock 类型实现本 crate 的 trait
//!
//! 在 `cfg(test)` 或 `mock` feature 下编译，下游 crate 的测试通过 `mock` feature 复用。

use test_support::mock::bus::MockBus;
use test_support::mock::spi::MockSpi;

use crate::bus::BusTransport;
use crate::bus::spi::SpiBus;
use crate::chip::{ChipKind, ChipRegisterAccess};
use crate::regs::{SocketCommand, SocketStatus, common, socket};

impl BusTransport for MockBus {
    fn acquire(&mut self) {
        MockBus::acquire(self);
    }

    fn release(&mut self) {
        MockBus::release(self);
    }

    fn read_burst(&mut self, addr: u16, buf: &mut [u8]) {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.read(addr.wrapping_add(i as u16));
        }
    }

    fn write_burst(&mut self, addr: u16, data: &[u8]) {
        for (i, &value) in data.iter().enumerate() {
            self.write(addr.wrapping_add(i as u16), value);
        }
    }
}

impl SpiBus for MockSpi {
    fn begin_transaction(&mut self) {
        self.begin();
    }

    fn end_transaction(&mut self) {
        self.end();
    }

    fn select(&mut self) {
        MockSpi::select(self);
    }

    fn deselect(&mut self) {
        MockSpi::deselect(self);
    }

    fn transfer(&mut self, byte: u8) -> u8 {
        MockSpi::transfer(self, byte)
    }
}

/// 按芯片寄存器语义接好线的 [`MockBus`]
///
/// 模式寄存器和各 socket 的命令寄存器写入后自清零，中断寄存器写 1 清零；
/// W5200 的版本寄存器预置为 0x03。
pub fn wired_bus<C: ChipRegisterAccess>(chip: &C) -> MockBus {
    let mut bus = MockBus::new();
    bus.mark_self_clearing(common::MR);
    for s in 0..chip.max_sockets() {
        bus.mark_self_clearing(chip.socket_reg(s, socket::CR));
        bus.mark_write_one_to_clear(chip.socket_reg(s, socket::IR));
    }
    if chip.kind() == ChipKind::W5200 {
        bus.poke(0x001F, 0x03);
    }
    bus
}

/// 让 socket `s` 在执行 `command` 后进入 `status`
pub fn on_command<C: ChipRegisterAccess>(
    bus: &mut MockBus,
    chip: &C,
    s: usize,
    command: SocketCommand,
    status: SocketStatus,
) {
    bus.on_write(
        chip.socket_reg(s, socket::CR),
        command.raw(),
        chip.socket_reg(s, socket::SR),
        status.raw(),
    );
}
