//! 芯片代际能力接口
//!
//! 各代芯片的寄存器布局大体相同，差别集中在 socket 寄存器块的位置、
//! 缓冲区内存的位置与大小、以及每 socket 内存大小的编程方式。
//! [`ChipRegisterAccess`] 把这些差别收拢到一个 trait 中，
//! 寄存器层只通过它取得与代际相关的信息。

mod w5100;
mod w5200;

pub use w5100::W5100;
pub use w5200::W5200;

use crate::bus::BusTransport;
use crate::error::ChipError;
use crate::window::{MemoryLayout, WindowLayout};

/// 芯片代际
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipKind {
    /// W5100：4 个 socket，8 KiB 收发内存
    W5100,
    /// W5200：8 个 socket，16 KiB 收发内存
    W5200,
}

/// 芯片代际能力接口
pub trait ChipRegisterAccess {
    /// 芯片代际
    fn kind(&self) -> ChipKind;

    /// 芯片支持的最大 socket 数
    fn max_sockets(&self) -> usize;

    /// 缓冲区内存布局
    fn memory_layout(&self) -> MemoryLayout;

    /// socket `s` 寄存器块的基地址
    fn socket_base(&self, s: usize) -> u16;

    /// 把窗口划分结果写入芯片的内存大小寄存器
    fn program_memory(&self, bus: &mut dyn BusTransport, layout: &WindowLayout);

    /// 检查芯片身份
    ///
    /// 没有版本寄存器的芯片总是返回 `Ok(())`。
    fn check_identity(&self, bus: &mut dyn BusTransport) -> Result<(), ChipError> {
        let _ = bus;
        Ok(())
    }

    /// socket `s` 中偏移为 `offset` 的寄存器地址
    fn socket_reg(&self, s: usize, offset: u16) -> u16 {
        self.socket_base(s) + offset
    }
}

impl<C: ChipRegisterAccess + ?Sized> ChipRegisterAccess for &C {
    fn kind(&self) -> ChipKind {
        (**self).kind()
    }

    fn max_sockets(&self) -> usize {
        (**self).max_sockets()
    }

    fn memory_layout(&self) -> MemoryLayout {
        (**self).memory_layout()
    }

    fn socket_base(&self, s: usize) -> u16 {
        (**self).socket_base(s)
    }

    fn program_memory(&self, bus: &mut dyn BusTransport, layout: &WindowLayout) {
        (**self).program_memory(bus, layout)
    }

    fn check_identity(&self, bus: &mut dyn BusTransport) -> Result<(), ChipError> {
        (**self).check_identity(bus)
    }
}

/// 运行时选择的芯片代际
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyChip {
    /// W5100
    W5100(W5100),
    /// W5200
    W5200(W5200),
}

impl AnyChip {
    /// 按代际构造
    pub fn new(kind: ChipKind) -> Self {
        match kind {
            ChipKind::W5100 => AnyChip::W5100(W5100),
            ChipKind::W5200 => AnyChip::W5200(W5200),
        }
    }

    fn inner(&self) -> &dyn ChipRegisterAccess {
        match self {
            AnyChip::W5100(chip) => chip,
            AnyChip::W5200(chip) => chip,
        }
    }
}

impl From<ChipKind> for AnyChip {
    fn from(kind: ChipKind) -> Self {
        Self::new(kind)
    }
}

impl ChipRegisterAccess for AnyChip {
    fn kind(&self) -> ChipKind {
        self.inner().kind()
    }

    fn max_sockets(&self) -> usize {
        self.inner().max_sockets()
    }

    fn memory_layout(&self) -> MemoryLayout {
        self.inner().memory_layout()
    }

    fn socket_base(&self, s: usize) -> u16 {
        self.inner().socket_base(s)
    }

    fn program_memory(&self, bus: &mut dyn BusTransport, layout: &WindowLayout) {
        self.inner().program_memory(bus, layout)
    }

    fn check_identity(&self, bus: &mut dyn BusTransport) -> Result<(), ChipError> {
        self.inner().check_identity(bus)
    }
}
