//! 同步原语
//!
//! 为总线层提供自旋锁，用于在多个总线用户之间串行化访问。
//!
//! 单线程协作式调度下，锁不会被真正争用；它的作用是把
//! "一组寄存器访问" 标记为独占区间，并在重入时暴露错误用法
//! （自旋锁不可重入，重入会立即死锁而不是悄悄破坏总线帧）。

#![no_std]

mod raw_spin_lock;
mod spin_lock;

pub use raw_spin_lock::RawSpinLock;
pub use spin_lock::{SpinLock, SpinLockGuard};
