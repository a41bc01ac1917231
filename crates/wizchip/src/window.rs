//! socket 收发窗口
//!
//! 芯片的 TX 内存和 RX 内存各是一块连续区域，在初始化时被等分给活动的 socket。
//! 每个 socket 在每个方向上拥有一个大小为 2 的幂的 [`Window`]，
//! 16 位逻辑指针通过 `base + (ptr & mask)` 映射到物理地址。

/// 芯片支持的最大 socket 数（所有代际中的最大值）
pub const MAX_SOCKETS: usize = 8;

/// 传输方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 发送
    Tx,
    /// 接收
    Rx,
}

/// 芯片的缓冲区内存布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    /// TX 内存起始地址
    pub tx_base: u16,
    /// RX 内存起始地址
    pub rx_base: u16,
    /// 每个方向的内存总量（字节）
    pub total: usize,
    /// 单个窗口的最大尺寸（字节）
    pub max_window: usize,
}

impl MemoryLayout {
    /// 指定方向的起始地址
    pub fn base(&self, direction: Direction) -> u16 {
        match direction {
            Direction::Tx => self.tx_base,
            Direction::Rx => self.rx_base,
        }
    }
}

/// 一个 socket 在一个方向上的窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// 物理起始地址
    pub base: u16,
    /// 窗口大小，2 的幂
    pub size: usize,
}

impl Window {
    /// 逻辑指针掩码
    pub fn mask(&self) -> u16 {
        (self.size - 1) as u16
    }

    /// 逻辑指针在窗口内的偏移
    pub fn offset(&self, ptr: u16) -> usize {
        (ptr & self.mask()) as usize
    }

    /// 逻辑指针对应的物理地址
    pub fn physical(&self, ptr: u16) -> u16 {
        self.base + (ptr & self.mask())
    }

    /// 窗口末尾（不含），W5200 的 RX 区域末尾为 0x10000，因此用 u32
    pub fn end(&self) -> u32 {
        self.base as u32 + self.size as u32
    }

    /// 两个窗口是否有重叠
    pub fn overlaps(&self, other: &Window) -> bool {
        (self.base as u32) < other.end() && (other.base as u32) < self.end()
    }

    /// 把从 `ptr` 开始、长度为 `len` 的访问拆成至多两段物理区间
    ///
    /// 返回 `(第一段地址, 第一段长度, 第二段长度)`，第二段总是从 `base` 开始。
    /// `len` 不得超过窗口大小。
    pub fn segments(&self, ptr: u16, len: usize) -> (u16, usize, usize) {
        let offset = self.offset(ptr);
        let first = len.min(self.size - offset);
        (self.base + offset as u16, first, len - first)
    }
}

/// 初始化时计算出的窗口划分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    memory: MemoryLayout,
    count: usize,
    tx_size: usize,
    rx_size: usize,
}

impl WindowLayout {
    /// 尚未初始化的空划分：没有任何活动 socket
    pub const fn empty(memory: MemoryLayout) -> Self {
        Self {
            memory,
            count: 0,
            tx_size: 0,
            rx_size: 0,
        }
    }

    /// 把内存等分给 `count` 个 socket
    ///
    /// 每个方向的窗口大小为不超过 `total / count` 的最大 2 的幂，并且不超过
    /// `max_window`；socket `i` 的窗口起始于 `base + i * size`。
    /// `count == 0` 时返回空划分。
    pub fn partition(memory: MemoryLayout, count: usize) -> Self {
        if count == 0 {
            return Self::empty(memory);
        }
        let size = floor_pow2(memory.total / count).min(memory.max_window);
        Self {
            memory,
            count,
            tx_size: size,
            rx_size: size,
        }
    }

    /// 活动 socket 数
    pub fn count(&self) -> usize {
        self.count
    }

    /// 指定方向的窗口大小
    pub fn window_size(&self, direction: Direction) -> usize {
        match direction {
            Direction::Tx => self.tx_size,
            Direction::Rx => self.rx_size,
        }
    }

    /// socket `s` 在指定方向上的窗口；`s` 不是活动 socket 时返回 `None`
    pub fn window(&self, s: usize, direction: Direction) -> Option<Window> {
        if s >= self.count {
            return None;
        }
        let size = self.window_size(direction);
        Some(Window {
            base: self.memory.base(direction) + (s * size) as u16,
            size,
        })
    }
}

/// 不超过 `n` 的最大 2 的幂；`n == 0` 时为 0
pub fn floor_pow2(n: usize) -> usize {
    match n {
        0 => 0,
        n => 1 << (usize::BITS - 1 - n.leading_zeros()),
    }
}
