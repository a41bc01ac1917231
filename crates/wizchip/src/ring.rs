//! 窗口上的环形读写
//!
//! 硬件指针是 16 位逻辑值，只增不减（模 65536）。读写时先按掩码换算成窗口内偏移，
//! 跨过窗口末尾的访问拆成两段：末尾部分和从窗口起点开始的剩余部分。

use crate::bus::BusTransport;
use crate::window::Window;

/// 一个窗口上的环形缓冲区
#[derive(Debug, Clone, Copy)]
pub struct BufferRing {
    window: Window,
}

impl BufferRing {
    /// 在窗口上创建环形缓冲区
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    /// 底层窗口
    pub fn window(&self) -> Window {
        self.window
    }

    /// 从逻辑指针 `ptr` 处写入 `data`
    ///
    /// 超过窗口大小的部分被截掉。返回实际写入的字节数，
    /// 调用方据此推进硬件写指针。
    pub fn write<B: BusTransport + ?Sized>(&self, bus: &mut B, ptr: u16, data: &[u8]) -> usize {
        let len = data.len().min(self.window.size);
        let (addr, first, rest) = self.window.segments(ptr, len);
        bus.write_burst(addr, &data[..first]);
        if rest > 0 {
            bus.write_burst(self.window.base, &data[first..len]);
        }
        len
    }

    /// 从逻辑指针 `ptr` 处读取到 `buf`
    ///
    /// 超过窗口大小的部分不读。返回实际读取的字节数。
    pub fn read<B: BusTransport + ?Sized>(&self, bus: &mut B, ptr: u16, buf: &mut [u8]) -> usize {
        let len = buf.len().min(self.window.size);
        let (addr, first, rest) = self.window.segments(ptr, len);
        bus.read_burst(addr, &mut buf[..first]);
        if rest > 0 {
            bus.read_burst(self.window.base, &mut buf[first..len]);
        }
        len
    }
}
