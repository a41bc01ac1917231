//! 接收流中的数据报头
//!
//! UDP、IP-raw 和 MAC-raw socket 的接收缓冲区里，每个数据报前面都有芯片写入的报头：
//!
//! | 协议 | 报头 |
//! |---|---|
//! | UDP | 源地址(4) + 源端口(2) + 长度(2) |
//! | IP-raw | 源地址(4) + 长度(2) |
//! | MAC-raw | 长度(2)，长度包含这 2 个字节本身 |

use smoltcp::wire::Ipv4Address;
use wizchip::Protocol;

/// 解析后的数据报头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatagramHeader {
    /// UDP 报头
    Udp {
        /// 源地址
        addr: Ipv4Address,
        /// 源端口
        port: u16,
        /// 负载长度
        len: u16,
    },
    /// IP-raw 报头
    IpRaw {
        /// 源地址
        addr: Ipv4Address,
        /// 负载长度
        len: u16,
    },
    /// MAC-raw 报头
    MacRaw {
        /// 帧长度（含报头 2 字节）
        len: u16,
    },
}

impl DatagramHeader {
    /// 最长报头的长度
    pub const MAX_LEN: usize = 8;

    /// 协议对应的报头长度；非数据报协议返回 `None`
    pub const fn len_for(protocol: Protocol) -> Option<usize> {
        match protocol {
            Protocol::Udp => Some(8),
            Protocol::IpRaw => Some(6),
            Protocol::MacRaw => Some(2),
            _ => None,
        }
    }

    /// 按协议解析报头；`raw` 短于报头长度或协议不是数据报时返回 `None`
    pub fn parse(protocol: Protocol, raw: &[u8]) -> Option<Self> {
        let need = Self::len_for(protocol)?;
        let raw = raw.get(..need)?;
        let addr = |raw: &[u8]| Ipv4Address::new(raw[0], raw[1], raw[2], raw[3]);
        let u16_at = |i: usize| u16::from_be_bytes([raw[i], raw[i + 1]]);
        Some(match protocol {
            Protocol::Udp => DatagramHeader::Udp {
                addr: addr(raw),
                port: u16_at(4),
                len: u16_at(6),
            },
            Protocol::IpRaw => DatagramHeader::IpRaw {
                addr: addr(raw),
                len: u16_at(4),
            },
            _ => DatagramHeader::MacRaw { len: u16_at(0) },
        })
    }

    /// 报头长度
    pub fn header_len(&self) -> usize {
        match self {
            DatagramHeader::Udp { .. } => 8,
            DatagramHeader::IpRaw { .. } => 6,
            DatagramHeader::MacRaw { .. } => 2,
        }
    }

    /// 报头之后的负载长度
    pub fn payload_len(&self) -> usize {
        match *self {
            DatagramHeader::Udp { len, .. } | DatagramHeader::IpRaw { len, .. } => len as usize,
            DatagramHeader::MacRaw { len } => (len as usize).saturating_sub(2),
        }
    }

    /// 源地址（MAC-raw 没有）
    pub fn source_addr(&self) -> Option<Ipv4Address> {
        match *self {
            DatagramHeader::Udp { addr, .. } | DatagramHeader::IpRaw { addr, .. } => Some(addr),
            DatagramHeader::MacRaw { .. } => None,
        }
    }

    /// 源端口（仅 UDP）
    pub fn source_port(&self) -> Option<u16> {
        match *self {
            DatagramHeader::Udp { port, .. } => Some(port),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_udp_header() {
        let header =
            DatagramHeader::parse(Protocol::Udp, &[10, 0, 0, 5, 0x13, 0x88, 0x00, 0x04]).unwrap();
        assert_eq!(header.source_addr(), Some(Ipv4Address::new(10, 0, 0, 5)));
        assert_eq!(header.source_port(), Some(5000));
        assert_eq!(header.payload_len(), 4);
        assert_eq!(header.header_len(), 8);
    }

    #[test]
    fn test_macraw_length_includes_header() {
        let header = DatagramHeader::parse(Protocol::MacRaw, &[0x00, 0x3E]).unwrap();
        assert_eq!(header.payload_len(), 60);
        assert_eq!(header.source_addr(), None);

        let runt = DatagramHeader::parse(Protocol::MacRaw, &[0x00, 0x01]).unwrap();
        assert_eq!(runt.payload_len(), 0);
    }

    #[test]
    fn test_ipraw_has_no_port() {
        let header = DatagramHeader::parse(Protocol::IpRaw, &[192, 168, 0, 9, 0x01, 0x00]).unwrap();
        assert_eq!(header.source_port(), None);
        assert_eq!(header.payload_len(), 256);
    }

    #[test]
    fn test_rejects_short_input_and_stream_protocols() {
        assert_eq!(DatagramHeader::parse(Protocol::Udp, &[1, 2, 3]), None);
        assert_eq!(DatagramHeader::parse(Protocol::Tcp, &[0; 8]), None);
    }
}
