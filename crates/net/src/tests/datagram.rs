use smoltcp::wire::Ipv4Address;
use wizchip::{ModeFlags, Protocol, SocketInterrupt};

use super::*;
use crate::{Datagram, SocketError};

const CLOSE: u8 = 0x10;
const SEND: u8 = 0x20;
const RECV: u8 = 0x40;

fn udp_driver() -> Driver {
    let mut driver = driver();
    driver.open(0, Protocol::Udp, 5000, ModeFlags::empty()).unwrap();
    bus(&mut driver).clear_log();
    driver
}

#[test]
fn test_recvfrom_udp_reports_source() {
    let mut driver = udp_driver();
    bus(&mut driver).poke_u16(sreg(0, socket::RX_RSR), 12);
    bus(&mut driver).poke_slice(RX0, &[10, 0, 0, 5, 0x13, 0x88, 0x00, 0x04]);
    bus(&mut driver).poke_slice(RX0 + 8, b"ping");

    let mut buf = [0u8; 16];
    let datagram = driver.recvfrom(0, &mut buf).unwrap();

    assert_eq!(
        datagram,
        Datagram {
            len: 4,
            payload_len: 4,
            addr: Some(Ipv4Address::new(10, 0, 0, 5)),
            port: Some(5000),
        }
    );
    assert_eq!(&buf[..4], b"ping");
    let bus = bus(&mut driver);
    assert_eq!(bus.peek_u16(sreg(0, socket::RX_RD)), 12);
    assert_eq!(bus.writes_to(sreg(0, socket::CR)), [RECV]);
}

#[test]
fn test_recvfrom_truncates_but_skips_whole_datagram() {
    let mut driver = udp_driver();
    bus(&mut driver).poke_u16(sreg(0, socket::RX_RSR), 14);
    bus(&mut driver).poke_slice(RX0, &[192, 168, 1, 2, 0x00, 0x35, 0x00, 0x06]);
    bus(&mut driver).poke_slice(RX0 + 8, b"abcdef");

    let mut buf = [0u8; 2];
    let datagram = driver.recvfrom(0, &mut buf).unwrap();

    assert_eq!(datagram.len, 2);
    assert_eq!(datagram.payload_len, 6);
    assert_eq!(&buf, b"ab");
    assert_eq!(bus(&mut driver).peek_u16(sreg(0, socket::RX_RD)), 14);
}

#[test]
fn test_recvfrom_header_across_wraparound() {
    let mut driver = udp_driver();
    bus(&mut driver).poke_u16(sreg(0, socket::RX_RSR), 10);
    bus(&mut driver).poke_u16(sreg(0, socket::RX_RD), 0x27FC);
    // 报头前 4 字节在窗口末尾，其余从窗口起点继续
    bus(&mut driver).poke_slice(RX0 + 0x07FC, &[172, 16, 0, 1]);
    bus(&mut driver).poke_slice(RX0, &[0x04, 0x00, 0x00, 0x02, b'h', b'i']);

    let mut buf = [0u8; 8];
    let datagram = driver.recvfrom(0, &mut buf).unwrap();

    assert_eq!(datagram.addr, Some(Ipv4Address::new(172, 16, 0, 1)));
    assert_eq!(datagram.port, Some(1024));
    assert_eq!(&buf[..datagram.len], b"hi");
    assert_eq!(bus(&mut driver).peek_u16(sreg(0, socket::RX_RD)), 0x2806);
}

#[test]
fn test_recvfrom_macraw_frame_length_includes_header() {
    let mut driver = driver();
    driver.open(0, Protocol::MacRaw, 0, ModeFlags::empty()).unwrap();
    bus(&mut driver).poke_u16(sreg(0, socket::RX_RSR), 6);
    bus(&mut driver).poke_slice(RX0, &[0x00, 0x06, 1, 2, 3, 4]);

    let mut buf = [0u8; 64];
    let datagram = driver.recvfrom(0, &mut buf).unwrap();

    assert_eq!(datagram.len, 4);
    assert_eq!(datagram.addr, None);
    assert_eq!(datagram.port, None);
    assert_eq!(&buf[..4], [1, 2, 3, 4]);
    assert_eq!(bus(&mut driver).peek_u16(sreg(0, socket::RX_RD)), 6);
}

#[test]
fn test_recvfrom_requires_pending_datagram_socket() {
    let mut driver = udp_driver();
    let mut buf = [0u8; 8];
    assert_eq!(driver.recvfrom(0, &mut buf), Err(SocketError::WouldBlock));

    driver.open(1, Protocol::Tcp, 80, ModeFlags::empty()).unwrap();
    assert_eq!(driver.recvfrom(1, &mut buf), Err(SocketError::NotDatagram));
    assert_eq!(driver.recvfrom(2, &mut buf), Err(SocketError::NotDatagram));
}

#[test]
fn test_sendto_validates_before_bus_access() {
    let mut driver = udp_driver();

    assert_eq!(
        driver.sendto(0, b"x", Ipv4Address::UNSPECIFIED, 53),
        Err(SocketError::InvalidAddress)
    );
    assert_eq!(
        driver.sendto(0, b"x", Ipv4Address::new(8, 8, 8, 8), 0),
        Err(SocketError::InvalidPort)
    );
    assert_eq!(
        driver.start_udp(0, Ipv4Address::UNSPECIFIED, 53),
        Err(SocketError::InvalidAddress)
    );
    assert!(bus(&mut driver).writes().is_empty());
}

#[test]
fn test_sendto_allows_broadcast() {
    let mut driver = udp_driver();
    on_send(&mut driver, 0, SocketInterrupt::SEND_OK.bits());

    assert_eq!(
        driver.sendto(0, b"discover", Ipv4Address::BROADCAST, 67),
        Ok(8)
    );

    let bus = bus(&mut driver);
    assert_eq!(bus.peek_slice(sreg(0, socket::DIPR), 4), [255; 4]);
    assert_eq!(bus.peek_u16(sreg(0, socket::DPORT)), 67);
    assert_eq!(bus.peek_slice(TX0, 8), b"discover");
    assert_eq!(bus.peek_u16(sreg(0, socket::TX_WR)), 8);
    assert_eq!(bus.peek(sreg(0, socket::IR)), 0);
}

#[test]
fn test_sendto_timeout_clears_flags_and_keeps_socket() {
    let mut driver = udp_driver();
    on_send(&mut driver, 0, SocketInterrupt::TIMEOUT.bits());

    assert_eq!(
        driver.sendto(0, b"lost", Ipv4Address::new(10, 0, 0, 2), 9),
        Err(SocketError::Timeout)
    );

    let bus = bus(&mut driver);
    assert_eq!(bus.writes_to(sreg(0, socket::IR)), [0x18, 0x18]);
    assert_eq!(bus.peek(sreg(0, socket::IR)), 0);
    assert_eq!(bus.writes_to(sreg(0, socket::CR)), [SEND]);
    assert_eq!(driver.protocol(0), Ok(Some(Protocol::Udp)));
}

#[test]
fn test_igmp_send_timeout_closes_socket() {
    let mut driver = driver();
    driver
        .open(0, Protocol::Udp, 5353, ModeFlags::MULTICAST)
        .unwrap();
    bus(&mut driver).clear_log();
    on_send(&mut driver, 0, SocketInterrupt::TIMEOUT.bits());

    assert_eq!(driver.igmp_send(0, b"join"), Err(SocketError::Timeout));
    assert_eq!(bus(&mut driver).writes_to(sreg(0, socket::CR)), [SEND, CLOSE]);
    assert_eq!(driver.protocol(0), Ok(None));
}

#[test]
fn test_staged_udp_datagram_commits_on_send() {
    let mut driver = udp_driver();
    bus(&mut driver).poke_u16(sreg(0, socket::TX_FSR), 0x0800);
    bus(&mut driver).poke_u16(sreg(0, socket::TX_WR), 0x0100);
    on_send(&mut driver, 0, SocketInterrupt::SEND_OK.bits());

    driver
        .start_udp(0, Ipv4Address::new(10, 0, 0, 9), 7000)
        .unwrap();
    assert_eq!(driver.buffer_data(0, 0, b"hel"), Ok(3));
    assert_eq!(driver.buffer_data(0, 3, b"lo"), Ok(2));

    assert_eq!(bus(&mut driver).peek_u16(sreg(0, socket::TX_WR)), 0x0100);
    assert_eq!(bus(&mut driver).peek_slice(TX0 + 0x0100, 5), b"hello");
    assert!(bus(&mut driver).writes_to(sreg(0, socket::CR)).is_empty());

    assert_eq!(driver.send_udp(0), Ok(5));
    let bus = bus(&mut driver);
    assert_eq!(bus.peek_u16(sreg(0, socket::TX_WR)), 0x0105);
    assert_eq!(bus.writes_to(sreg(0, socket::CR)), [SEND]);
    assert_eq!(bus.peek_slice(sreg(0, socket::DIPR), 4), [10, 0, 0, 9]);
}

#[test]
fn test_buffer_data_limited_by_free_space() {
    let mut driver = udp_driver();
    bus(&mut driver).poke_u16(sreg(0, socket::TX_FSR), 2);

    assert_eq!(driver.buffer_data(0, 0, b"abcd"), Ok(2));
    assert_eq!(bus(&mut driver).peek_slice(TX0, 3), [b'a', b'b', 0]);
}

#[test]
fn test_late_send_ok_does_not_mask_next_timeout() {
    let mut driver = driver_with(MockNetOps::with_step(10));
    driver.open(0, Protocol::Udp, 5000, ModeFlags::empty()).unwrap();
    driver.set_poll_timeout(Some(30));
    let dest = Ipv4Address::new(10, 0, 0, 2);

    assert_eq!(driver.sendto(0, b"first", dest, 9), Err(SocketError::Deadline));

    // 被放弃的发送随后才完成，下一次发送遇到超时
    bus(&mut driver).poke(sreg(0, socket::IR), SocketInterrupt::SEND_OK.bits());
    bus(&mut driver).on_write_set_bits(
        sreg(0, socket::CR),
        SEND,
        sreg(0, socket::IR),
        SocketInterrupt::TIMEOUT.bits(),
    );

    assert_eq!(driver.sendto(0, b"second", dest, 9), Err(SocketError::Timeout));
    assert_eq!(bus(&mut driver).peek(sreg(0, socket::IR)), 0);
    assert_eq!(driver.protocol(0), Ok(Some(Protocol::Udp)));
}

#[test]
fn test_buffer_data_counts_offset_against_free_space() {
    let mut driver = udp_driver();
    bus(&mut driver).poke_u16(sreg(0, socket::TX_FSR), 4);
    on_send(&mut driver, 0, SocketInterrupt::SEND_OK.bits());
    driver
        .start_udp(0, Ipv4Address::new(10, 0, 0, 9), 7000)
        .unwrap();

    assert_eq!(driver.buffer_data(0, 100, b"ab"), Ok(0));
    assert_eq!(driver.buffer_data(0, 2, b"cdef"), Ok(2));
    assert_eq!(bus(&mut driver).peek_slice(TX0 + 2, 2), b"cd");

    assert_eq!(driver.send_udp(0), Ok(4));
    assert_eq!(bus(&mut driver).peek_u16(sreg(0, socket::TX_WR)), 4);
}
