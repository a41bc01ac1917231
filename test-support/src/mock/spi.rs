//! 原始 SPI 外设的 Mock 实现
//!
//! 记录片选区间内传输的每个字节，并按脚本返回 MISO 数据。
//! `wizchip` crate 在 `cfg(test)` / `mock` feature 下为 [`MockSpi`] 实现 `SpiBus`。

use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// Mock 的 SPI 外设
#[derive(Debug, Default)]
pub struct MockSpi {
    /// 已结束的帧（一次片选区间内 MOSI 上的字节）
    pub frames: Vec<Vec<u8>>,
    current: Option<Vec<u8>>,
    miso: VecDeque<u8>,
    /// 是否处于事务中
    pub in_transaction: bool,
    /// 累计开始的事务数
    pub transactions: usize,
}

impl MockSpi {
    /// 创建空的 Mock SPI
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加 MISO 上依次返回的字节，耗尽后返回 0
    pub fn respond(&mut self, bytes: &[u8]) {
        self.miso.extend(bytes.iter().copied());
    }

    /// 开始事务
    pub fn begin(&mut self) {
        assert!(!self.in_transaction, "MockSpi: nested transaction");
        self.in_transaction = true;
        self.transactions += 1;
    }

    /// 结束事务
    pub fn end(&mut self) {
        assert!(self.in_transaction, "MockSpi: end without begin");
        self.in_transaction = false;
    }

    /// 拉低片选，开始一帧
    pub fn select(&mut self) {
        assert!(self.current.is_none(), "MockSpi: select while selected");
        self.current = Some(Vec::new());
    }

    /// 拉高片选，结束当前帧
    pub fn deselect(&mut self) {
        if let Some(frame) = self.current.take() {
            self.frames.push(frame);
        }
    }

    /// 交换一个字节
    ///
    /// # Panics
    /// 片选未拉低时 panic
    pub fn transfer(&mut self, byte: u8) -> u8 {
        match self.current.as_mut() {
            Some(frame) => frame.push(byte),
            None => panic!("MockSpi: transfer without select"),
        }
        self.miso.pop_front().unwrap_or(0)
    }
}
