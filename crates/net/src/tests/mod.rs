// socket 驱动与网络栈的单元测试。
//
// 驱动跑在 `MockBus` 模拟的 W5100 上（4 个 socket，每个窗口 2 KiB）。
// 命令寄存器写入后自清零、中断寄存器写 1 清零，状态迁移由各测试按需接线。

use test_support::mock::bus::MockBus;
use test_support::mock::net::MockNetOps;
use wizchip::mock::wired_bus;
use wizchip::regs::socket;
use wizchip::{ChipConfig, ChipRegisterAccess, RegisterMap, W5100};

use crate::SocketDriver;

mod datagram;

type Driver = SocketDriver<MockBus, W5100, MockNetOps>;

/// socket 0 的 TX 窗口起点
const TX0: u16 = 0x4000;
/// socket 0 的 RX 窗口起点
const RX0: u16 = 0x6000;

fn driver_with(ops: MockNetOps) -> Driver {
    let mut driver = SocketDriver::new(RegisterMap::new(wired_bus(&W5100), W5100), ops);
    driver.init(&ChipConfig::default()).unwrap();
    bus(&mut driver).clear_log();
    driver
}

fn driver() -> Driver {
    driver_with(MockNetOps::new())
}

fn bus(driver: &mut Driver) -> &mut MockBus {
    driver.registers_mut().bus_mut()
}

fn sreg(s: usize, offset: u16) -> u16 {
    W5100.socket_reg(s, offset)
}

/// 让 socket `s` 的 SEND 命令立即置起 `flags`
fn on_send(driver: &mut Driver, s: usize, flags: u8) {
    bus(driver).on_write(
        sreg(s, socket::CR),
        wizchip::SocketCommand::Send.raw(),
        sreg(s, socket::IR),
        flags,
    );
}
