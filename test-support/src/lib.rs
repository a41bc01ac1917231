//! 测试支持 crate
//!
//! 提供 Mock 实现和测试工具。
//!
//! 本 crate 不依赖任何被测 crate（避免循环依赖）；
//! 被测 crate 在 `cfg(test)` 或 `mock` feature 下为这里的类型实现各自的 trait。

#![no_std]

extern crate alloc;

pub mod mock;
