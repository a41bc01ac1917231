//! 芯片总线的 Mock 实现
//!
//! 注意：这里不直接依赖 `wizchip` crate（避免循环依赖）。
//! `wizchip` crate 在 `cfg(test)` / `mock` feature 下为 [`MockBus`] 实现 `BusTransport`。
//!
//! [`MockBus`] 模拟芯片的 64 KiB 线性地址空间，并提供以下测试钩子：
//!
//! - 写入日志：记录每一次经过总线的字节写入
//! - 脚本化读取：为某个地址预置一串读取值，依次返回后再回落到内存内容
//! - 自清零地址：写入后立即读回 0（模拟命令寄存器执行完成）
//! - 写 1 清零地址：写入值中为 1 的位被清除（模拟中断标志寄存器）
//! - 写入触发：向某地址写入特定值时，修改另一个地址（模拟状态迁移）
//! - 占用检查：重入 acquire 或未 acquire 就访问会直接 panic

use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::vec;
use alloc::vec::Vec;

/// 芯片地址空间大小
pub const MOCK_MEMORY_SIZE: usize = 0x1_0000;

/// 一次经过总线的字节写入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    /// 目标地址
    pub addr: u16,
    /// 写入的值
    pub value: u8,
}

#[derive(Debug, Clone, Copy)]
struct WriteEffect {
    trigger: u16,
    value: u8,
    target: u16,
    set: u8,
    merge: bool,
}

/// 模拟芯片内存的总线
pub struct MockBus {
    memory: Vec<u8>,
    log: Vec<BusWrite>,
    reads: usize,
    scripted: BTreeMap<u16, VecDeque<u8>>,
    self_clearing: BTreeSet<u16>,
    write_one_to_clear: BTreeSet<u16>,
    effects: Vec<WriteEffect>,
    held: bool,
    acquisitions: usize,
}

impl MockBus {
    /// 创建一块全零的模拟芯片内存
    pub fn new() -> Self {
        Self {
            memory: vec![0u8; MOCK_MEMORY_SIZE],
            log: Vec::new(),
            reads: 0,
            scripted: BTreeMap::new(),
            self_clearing: BTreeSet::new(),
            write_one_to_clear: BTreeSet::new(),
            effects: Vec::new(),
            held: false,
            acquisitions: 0,
        }
    }

    // ========== 总线访问（由 BusTransport 实现调用） ==========

    /// 占用总线
    ///
    /// # Panics
    /// 总线已被占用时 panic（总线访问不可重入）
    pub fn acquire(&mut self) {
        assert!(!self.held, "MockBus: re-entrant acquire");
        self.held = true;
        self.acquisitions += 1;
    }

    /// 释放总线
    ///
    /// # Panics
    /// 总线未被占用时 panic
    pub fn release(&mut self) {
        assert!(self.held, "MockBus: release without acquire");
        self.held = false;
    }

    /// 经总线读取一个字节
    ///
    /// # Panics
    /// 未占用总线时 panic
    pub fn read(&mut self, addr: u16) -> u8 {
        assert!(self.held, "MockBus: read of {:#06x} outside acquire", addr);
        self.reads += 1;
        if let Some(queue) = self.scripted.get_mut(&addr) {
            if let Some(value) = queue.pop_front() {
                return value;
            }
        }
        self.memory[addr as usize]
    }

    /// 经总线写入一个字节
    ///
    /// # Panics
    /// 未占用总线时 panic
    pub fn write(&mut self, addr: u16, value: u8) {
        assert!(self.held, "MockBus: write to {:#06x} outside acquire", addr);
        self.log.push(BusWrite { addr, value });

        let cell = &mut self.memory[addr as usize];
        if self.write_one_to_clear.contains(&addr) {
            *cell &= !value;
        } else if self.self_clearing.contains(&addr) {
            *cell = 0;
        } else {
            *cell = value;
        }

        for effect in self.effects.iter() {
            if effect.trigger == addr && effect.value == value {
                let target = &mut self.memory[effect.target as usize];
                *target = if effect.merge {
                    *target | effect.set
                } else {
                    effect.set
                };
            }
        }
    }

    // ========== 测试侧直接访问（不经过总线，不计入日志） ==========

    /// 直接读取内存
    pub fn peek(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    /// 直接写入内存
    pub fn poke(&mut self, addr: u16, value: u8) {
        self.memory[addr as usize] = value;
    }

    /// 直接读取大端 16 位值
    pub fn peek_u16(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.peek(addr), self.peek(addr.wrapping_add(1))])
    }

    /// 直接写入大端 16 位值
    pub fn poke_u16(&mut self, addr: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.poke(addr, hi);
        self.poke(addr.wrapping_add(1), lo);
    }

    /// 直接读取一段内存
    pub fn peek_slice(&self, addr: u16, len: usize) -> &[u8] {
        let start = addr as usize;
        &self.memory[start..start + len]
    }

    /// 直接写入一段内存
    pub fn poke_slice(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    // ========== 行为配置 ==========

    /// 为 `addr` 追加脚本化读取值
    pub fn script(&mut self, addr: u16, values: &[u8]) {
        self.scripted
            .entry(addr)
            .or_default()
            .extend(values.iter().copied());
    }

    /// 为 16 位寄存器追加脚本化读取值（大端，高字节在 `addr`）
    pub fn script_u16(&mut self, addr: u16, values: &[u16]) {
        for value in values {
            let [hi, lo] = value.to_be_bytes();
            self.script(addr, &[hi]);
            self.script(addr.wrapping_add(1), &[lo]);
        }
    }

    /// 把 `addr` 标记为自清零（写入后读回 0）
    pub fn mark_self_clearing(&mut self, addr: u16) {
        self.self_clearing.insert(addr);
    }

    /// 把 `addr` 标记为写 1 清零
    pub fn mark_write_one_to_clear(&mut self, addr: u16) {
        self.write_one_to_clear.insert(addr);
    }

    /// 向 `trigger` 写入 `value` 时，把 `target` 设置为 `set`
    pub fn on_write(&mut self, trigger: u16, value: u8, target: u16, set: u8) {
        self.effects.push(WriteEffect {
            trigger,
            value,
            target,
            set,
            merge: false,
        });
    }

    /// 向 `trigger` 写入 `value` 时，在 `target` 上置起 `bits`，保留其余位
    pub fn on_write_set_bits(&mut self, trigger: u16, value: u8, target: u16, bits: u8) {
        self.effects.push(WriteEffect {
            trigger,
            value,
            target,
            set: bits,
            merge: true,
        });
    }

    // ========== 观测 ==========

    /// 全部写入日志
    pub fn writes(&self) -> &[BusWrite] {
        &self.log
    }

    /// 写入到 `addr` 的所有值（按时间顺序）
    pub fn writes_to(&self, addr: u16) -> Vec<u8> {
        self.log
            .iter()
            .filter(|w| w.addr == addr)
            .map(|w| w.value)
            .collect()
    }

    /// 清空写入日志和读取计数
    pub fn clear_log(&mut self) {
        self.log.clear();
        self.reads = 0;
    }

    /// 经总线读取的字节数
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// 总线当前是否被占用
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// 累计 acquire 次数
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}
