//! 收发窗口划分的集成测试

use wizchip::{ChipRegisterAccess, Direction, W5100, W5200, WindowLayout};

fn assert_disjoint<C: ChipRegisterAccess>(chip: &C) {
    let memory = chip.memory_layout();
    for count in 1..=chip.max_sockets() {
        let layout = WindowLayout::partition(memory, count);
        let windows: Vec<_> = (0..count)
            .flat_map(|s| {
                [
                    layout.window(s, Direction::Tx).unwrap(),
                    layout.window(s, Direction::Rx).unwrap(),
                ]
            })
            .collect();

        for (i, a) in windows.iter().enumerate() {
            assert!(a.size.is_power_of_two());
            assert!(a.size <= memory.max_window);
            for b in windows.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "{count} sockets: {a:?} overlaps {b:?}");
            }
        }

        let tx_end = memory.tx_base as u32 + memory.total as u32;
        let rx_end = memory.rx_base as u32 + memory.total as u32;
        for s in 0..count {
            assert!(layout.window(s, Direction::Tx).unwrap().end() <= tx_end);
            assert!(layout.window(s, Direction::Rx).unwrap().end() <= rx_end);
        }
    }
}

#[test]
fn test_w5100_windows_are_disjoint() {
    assert_disjoint(&W5100);
}

#[test]
fn test_w5200_windows_are_disjoint() {
    assert_disjoint(&W5200);
}

#[test]
fn test_w5200_single_socket_reaches_top_of_memory() {
    let layout = WindowLayout::partition(W5200.memory_layout(), 1);
    let rx = layout.window(0, Direction::Rx).unwrap();
    assert_eq!(rx.base, 0xC000);
    assert_eq!(rx.end(), 0x1_0000);
    assert_eq!(rx.physical(0xFFFF), 0xFFFF);
}
