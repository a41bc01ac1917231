//! W5200

use super::{ChipKind, ChipRegisterAccess};
use crate::bus::BusTransport;
use crate::error::ChipError;
use crate::window::{Direction, MemoryLayout, WindowLayout};

/// 版本寄存器
const VERSIONR: u16 = 0x001F;
/// 版本寄存器的期望值
const VERSION: u8 = 0x03;

/// socket 寄存器块内：RX 内存大小（KiB）
const SN_RXMEM_SIZE: u16 = 0x1E;
/// socket 寄存器块内：TX 内存大小（KiB）
const SN_TXMEM_SIZE: u16 = 0x1F;

const SOCKET_REGS: u16 = 0x4000;
const SOCKET_STRIDE: u16 = 0x0100;
const SOCKETS: usize = 8;

/// W5200 芯片
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct W5200;

impl ChipRegisterAccess for W5200 {
    fn kind(&self) -> ChipKind {
        ChipKind::W5200
    }

    fn max_sockets(&self) -> usize {
        SOCKETS
    }

    fn memory_layout(&self) -> MemoryLayout {
        MemoryLayout {
            tx_base: 0x8000,
            rx_base: 0xC000,
            total: 0x4000,
            max_window: 0x4000,
        }
    }

    fn socket_base(&self, s: usize) -> u16 {
        SOCKET_REGS + s as u16 * SOCKET_STRIDE
    }

    fn program_memory(&self, bus: &mut dyn BusTransport, layout: &WindowLayout) {
        let tx_kib = (layout.window_size(Direction::Tx) / 1024) as u8;
        let rx_kib = (layout.window_size(Direction::Rx) / 1024) as u8;
        for s in 0..SOCKETS {
            let active = s < layout.count();
            bus.write_byte(
                self.socket_reg(s, SN_TXMEM_SIZE),
                if active { tx_kib } else { 0 },
            );
            bus.write_byte(
                self.socket_reg(s, SN_RXMEM_SIZE),
                if active { rx_kib } else { 0 },
            );
        }
    }

    fn check_identity(&self, bus: &mut dyn BusTransport) -> Result<(), ChipError> {
        let found = bus.read_byte(VERSIONR);
        if found != VERSION {
            return Err(ChipError::UnexpectedVersion {
                expected: VERSION,
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusGuard;
    use test_support::mock::bus::MockBus;

    #[test]
    fn test_inactive_sockets_get_no_memory() {
        let chip = W5200;
        let mut bus = MockBus::new();
        let layout = WindowLayout::partition(chip.memory_layout(), 3);
        {
            let mut guard = BusGuard::new(&mut bus);
            chip.program_memory(&mut *guard, &layout);
        }
        // 16 KiB / 3 -> 4 KiB
        for s in 0..3 {
            assert_eq!(bus.peek(chip.socket_reg(s, SN_TXMEM_SIZE)), 4);
            assert_eq!(bus.peek(chip.socket_reg(s, SN_RXMEM_SIZE)), 4);
        }
        for s in 3..SOCKETS {
            assert_eq!(bus.peek(chip.socket_reg(s, SN_TXMEM_SIZE)), 0);
        }
    }

    #[test]
    fn test_identity_check_reads_version() {
        let chip = W5200;
        let mut bus = MockBus::new();
        bus.poke(VERSIONR, 0x04);
        let result = {
            let mut guard = BusGuard::new(&mut bus);
            chip.check_identity(&mut *guard)
        };
        assert_eq!(
            result,
            Err(ChipError::UnexpectedVersion {
                expected: 0x03,
                found: 0x04
            })
        );

        bus.poke(VERSIONR, VERSION);
        let mut guard = BusGuard::new(&mut bus);
        assert_eq!(chip.check_identity(&mut *guard), Ok(()));
    }
}
