//! 芯片总线抽象
//!
//! [`BusTransport`] 是寄存器层唯一依赖的硬件接口：按 16 位芯片地址
//! 读写单字节或连续字节。总线被认为总是可响应的，因此所有方法都没有失败返回；
//! 通信是否正确只能通过随后读取的状态/标志寄存器间接验证。

pub mod shared;
pub mod spi;

use core::ops::{Deref, DerefMut};

/// 芯片总线
///
/// `acquire`/`release` 界定一个访问组，组内的访问独占总线。
/// 访问组不可重入：持有总线时再次 `acquire` 属于调用方错误。
pub trait BusTransport {
    /// 占用总线
    fn acquire(&mut self);

    /// 释放总线
    fn release(&mut self);

    /// 从 `addr` 连续读取 `buf.len()` 个字节
    fn read_burst(&mut self, addr: u16, buf: &mut [u8]);

    /// 向 `addr` 连续写入 `data`
    fn write_burst(&mut self, addr: u16, data: &[u8]);

    /// 读取单个字节
    fn read_byte(&mut self, addr: u16) -> u8 {
        let mut byte = [0u8; 1];
        self.read_burst(addr, &mut byte);
        byte[0]
    }

    /// 写入单个字节
    fn write_byte(&mut self, addr: u16, value: u8) {
        self.write_burst(addr, &[value]);
    }
}

impl<B: BusTransport + ?Sized> BusTransport for &mut B {
    fn acquire(&mut self) {
        (**self).acquire()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn read_burst(&mut self, addr: u16, buf: &mut [u8]) {
        (**self).read_burst(addr, buf)
    }

    fn write_burst(&mut self, addr: u16, data: &[u8]) {
        (**self).write_burst(addr, data)
    }

    fn read_byte(&mut self, addr: u16) -> u8 {
        (**self).read_byte(addr)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        (**self).write_byte(addr, value)
    }
}

/// 总线占用保护器，基于 RAII 实现。
///
/// 在创建时占用总线；在销毁时自动释放。
///
/// # 示例
/// ```ignore
/// {
///     let mut bus = BusGuard::new(&mut transport); // 占用总线
///     bus.write_byte(0x0000, 0x80);
/// } // 离开作用域，自动释放总线
/// ```
pub struct BusGuard<'a, B: BusTransport + ?Sized> {
    bus: &'a mut B,
}

impl<'a, B: BusTransport + ?Sized> BusGuard<'a, B> {
    /// 占用总线并返回保护器
    pub fn new(bus: &'a mut B) -> Self {
        bus.acquire();
        BusGuard { bus }
    }
}

impl<B: BusTransport + ?Sized> Deref for BusGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &Self::Target {
        self.bus
    }
}

impl<B: BusTransport + ?Sized> DerefMut for BusGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.bus
    }
}

impl<B: BusTransport + ?Sized> Drop for BusGuard<'_, B> {
    fn drop(&mut self) {
        self.bus.release();
    }
}
