//! W5100

use super::{ChipKind, ChipRegisterAccess};
use crate::bus::BusTransport;
use crate::window::{Direction, MemoryLayout, WindowLayout};

/// RX 内存大小寄存器，每 socket 2 位
const RMSR: u16 = 0x001A;
/// TX 内存大小寄存器，每 socket 2 位
const TMSR: u16 = 0x001B;

const SOCKET_REGS: u16 = 0x0400;
const SOCKET_STRIDE: u16 = 0x0100;

/// W5100 芯片
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct W5100;

impl W5100 {
    fn size_bits(layout: &WindowLayout, direction: Direction) -> u8 {
        let mut bits = 0u8;
        for s in 0..layout.count() {
            // 1K/2K/4K/8K 编码为 0..=3
            let kib = (layout.window_size(direction) / 1024).max(1);
            let code = (kib.trailing_zeros() as u8) & 0x03;
            bits |= code << (2 * s);
        }
        bits
    }
}

impl ChipRegisterAccess for W5100 {
    fn kind(&self) -> ChipKind {
        ChipKind::W5100
    }

    fn max_sockets(&self) -> usize {
        4
    }

    fn memory_layout(&self) -> MemoryLayout {
        MemoryLayout {
            tx_base: 0x4000,
            rx_base: 0x6000,
            total: 0x2000,
            max_window: 0x2000,
        }
    }

    fn socket_base(&self, s: usize) -> u16 {
        SOCKET_REGS + s as u16 * SOCKET_STRIDE
    }

    fn program_memory(&self, bus: &mut dyn BusTransport, layout: &WindowLayout) {
        bus.write_byte(TMSR, Self::size_bits(layout, Direction::Tx));
        bus.write_byte(RMSR, Self::size_bits(layout, Direction::Rx));
    }
}
