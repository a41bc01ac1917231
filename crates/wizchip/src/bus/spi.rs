//! SPI 帧格式
//!
//! 不同代际的芯片在 SPI 上使用不同的帧格式，本模块为每种格式提供一个
//! [`BusTransport`] 实现。底层外设只需实现最小的 [`SpiBus`] 接口。
//!
//! 电气参数（时钟、相位、片选引脚）由 [`SpiBus`] 的实现方在
//! `begin_transaction` 中负责，本模块不关心。

use super::BusTransport;

/// 原始 SPI 外设
pub trait SpiBus {
    /// 开始一个事务（配置时钟/模式，必要时屏蔽共享该总线的中断）
    fn begin_transaction(&mut self);

    /// 结束事务
    fn end_transaction(&mut self);

    /// 拉低片选
    fn select(&mut self);

    /// 拉高片选
    fn deselect(&mut self);

    /// 全双工交换一个字节
    fn transfer(&mut self, byte: u8) -> u8;
}

/// W5100 写操作码
const W5100_OP_WRITE: u8 = 0xF0;
/// W5100 读操作码
const W5100_OP_READ: u8 = 0x0F;

/// W5100 帧格式
///
/// 每个字节单独成帧：`op, addr_hi, addr_lo, data`，帧间翻转片选。
/// 连续访问被拆成地址递增的单字节帧。
pub struct W5100Spi<S> {
    spi: S,
}

impl<S: SpiBus> W5100Spi<S> {
    /// 包装底层 SPI 外设
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    /// 取回底层外设
    pub fn into_inner(self) -> S {
        self.spi
    }

    /// 访问底层外设
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.spi
    }

    fn frame(&mut self, op: u8, addr: u16, data: u8) -> u8 {
        let [hi, lo] = addr.to_be_bytes();
        self.spi.select();
        self.spi.transfer(op);
        self.spi.transfer(hi);
        self.spi.transfer(lo);
        let value = self.spi.transfer(data);
        self.spi.deselect();
        value
    }
}

impl<S: SpiBus> BusTransport for W5100Spi<S> {
    fn acquire(&mut self) {
        self.spi.begin_transaction();
    }

    fn release(&mut self) {
        self.spi.end_transaction();
    }

    fn read_burst(&mut self, addr: u16, buf: &mut [u8]) {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.frame(W5100_OP_READ, addr.wrapping_add(i as u16), 0);
        }
    }

    fn write_burst(&mut self, addr: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.frame(W5100_OP_WRITE, addr.wrapping_add(i as u16), byte);
        }
    }
}

/// W5200 写标志（位于长度高字节的最高位）
const W5200_OP_WRITE: u8 = 0x80;
/// W5200 单帧最大数据长度（15 位长度字段）
const W5200_MAX_FRAME: usize = 0x7FFF;

/// W5200 帧格式
///
/// 连续访问成帧：`addr_hi, addr_lo, op | len_hi, len_lo, data...`，
/// 超过 15 位长度的访问被拆成多帧。
pub struct W5200Spi<S> {
    spi: S,
}

impl<S: SpiBus> W5200Spi<S> {
    /// 包装底层 SPI 外设
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    /// 取回底层外设
    pub fn into_inner(self) -> S {
        self.spi
    }

    /// 访问底层外设
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.spi
    }

    fn header(&mut self, addr: u16, op: u8, len: usize) {
        let [addr_hi, addr_lo] = addr.to_be_bytes();
        let [len_hi, len_lo] = (len as u16).to_be_bytes();
        self.spi.select();
        self.spi.transfer(addr_hi);
        self.spi.transfer(addr_lo);
        self.spi.transfer(op | (len_hi & 0x7F));
        self.spi.transfer(len_lo);
    }
}

impl<S: SpiBus> BusTransport for W5200Spi<S> {
    fn acquire(&mut self) {
        self.spi.begin_transaction();
    }

    fn release(&mut self) {
        self.spi.end_transaction();
    }

    fn read_burst(&mut self, addr: u16, buf: &mut [u8]) {
        for (i, chunk) in buf.chunks_mut(W5200_MAX_FRAME).enumerate() {
            let start = addr.wrapping_add((i * W5200_MAX_FRAME) as u16);
            self.header(start, 0, chunk.len());
            for slot in chunk.iter_mut() {
                *slot = self.spi.transfer(0);
            }
            self.spi.deselect();
        }
    }

    fn write_burst(&mut self, addr: u16, data: &[u8]) {
        for (i, chunk) in data.chunks(W5200_MAX_FRAME).enumerate() {
            let start = addr.wrapping_add((i * W5200_MAX_FRAME) as u16);
            self.header(start, W5200_OP_WRITE, chunk.len());
            for &byte in chunk {
                self.spi.transfer(byte);
            }
            self.spi.deselect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusGuard;
    use test_support::mock::spi::MockSpi;

    #[test]
    fn test_w5100_write_frames_one_byte_each() {
        let mut bus = W5100Spi::new(MockSpi::new());
        {
            let mut guard = BusGuard::new(&mut bus);
            guard.write_burst(0x0409, &[0xDE, 0xAD]);
        }
        let spi = bus.into_inner();
        assert_eq!(spi.transactions, 1);
        assert!(!spi.in_transaction);
        assert_eq!(spi.frames.len(), 2);
        assert_eq!(spi.frames[0], [0xF0, 0x04, 0x09, 0xDE]);
        assert_eq!(spi.frames[1], [0xF0, 0x04, 0x0A, 0xAD]);
    }

    #[test]
    fn test_w5100_read_takes_last_byte_of_frame() {
        let mut spi = MockSpi::new();
        spi.respond(&[0x00, 0x01, 0x02, 0x17]);
        let mut bus = W5100Spi::new(spi);
        let status = {
            let mut guard = BusGuard::new(&mut bus);
            guard.read_byte(0x0403)
        };
        assert_eq!(status, 0x17);
        assert_eq!(bus.inner_mut().frames[0], [0x0F, 0x04, 0x03, 0x00]);
    }

    #[test]
    fn test_w5200_burst_header_encodes_length_and_op() {
        let mut bus = W5200Spi::new(MockSpi::new());
        {
            let mut guard = BusGuard::new(&mut bus);
            guard.write_burst(0x8010, &[1, 2, 3]);
            let mut buf = [0u8; 2];
            guard.read_burst(0x4026, &mut buf);
        }
        let spi = bus.into_inner();
        assert_eq!(spi.frames.len(), 2);
        assert_eq!(spi.frames[0], [0x80, 0x10, 0x80, 0x03, 1, 2, 3]);
        assert_eq!(spi.frames[1], [0x40, 0x26, 0x00, 0x02, 0, 0]);
    }

    #[test]
    fn test_w5200_burst_splits_above_max_frame() {
        let data = [0x5Au8; W5200_MAX_FRAME + 2];
        let mut bus = W5200Spi::new(MockSpi::new());
        {
            let mut guard = BusGuard::new(&mut bus);
            guard.write_burst(0x8000, &data);
        }
        let spi = bus.into_inner();
        assert_eq!(spi.transactions, 1);
        assert_eq!(spi.frames.len(), 2);
        assert_eq!(spi.frames[0][..4], [0x80, 0x00, 0xFF, 0xFF]);
        assert_eq!(spi.frames[0].len(), 4 + W5200_MAX_FRAME);
        assert_eq!(spi.frames[1], [0xFF, 0xFF, 0x80, 0x02, 0x5A, 0x5A]);
    }
}
