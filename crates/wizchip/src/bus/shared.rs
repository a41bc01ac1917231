//! 共享 SPI 总线
//!
//! 同一个 SPI 外设上常常挂着多个设备（例如 SD 卡）。[`SharedSpi`] 把外设放进
//! [`SpinLock`]，在 `begin_transaction` 时上锁并一直持有到 `end_transaction`，
//! 使每个访问组独占总线，访问组之间其他用户可以插入。

use sync::{SpinLock, SpinLockGuard};

use super::spi::SpiBus;

/// 通过自旋锁共享的 SPI 外设句柄
///
/// 每个总线用户持有一个句柄，它们引用同一个 `SpinLock<S>`。
pub struct SharedSpi<'a, S: SpiBus> {
    lock: &'a SpinLock<S>,
    guard: Option<SpinLockGuard<'a, S>>,
}

impl<'a, S: SpiBus> SharedSpi<'a, S> {
    /// 创建一个共享句柄
    pub fn new(lock: &'a SpinLock<S>) -> Self {
        Self { lock, guard: None }
    }

    /// 当前句柄是否处于事务中（持有锁）
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }
}

impl<S: SpiBus> SpiBus for SharedSpi<'_, S> {
    fn begin_transaction(&mut self) {
        let mut guard = self.lock.lock();
        guard.begin_transaction();
        self.guard = Some(guard);
    }

    fn end_transaction(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            guard.end_transaction();
        }
    }

    fn select(&mut self) {
        match self.guard.as_mut() {
            Some(spi) => spi.select(),
            None => self.lock.lock().select(),
        }
    }

    fn deselect(&mut self) {
        match self.guard.as_mut() {
            Some(spi) => spi.deselect(),
            None => self.lock.lock().deselect(),
        }
    }

    fn transfer(&mut self, byte: u8) -> u8 {
        match self.guard.as_mut() {
            Some(spi) => spi.transfer(byte),
            None => self.lock.lock().transfer(byte),
        }
    }
}
