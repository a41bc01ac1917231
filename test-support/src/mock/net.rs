//! 网络运行时操作的 Mock 实现
//!
//! 注意：这里不直接依赖 `net` crate（避免循环依赖）。
//! `net` crate 在 `cfg(test)` 下为这些类型实现其 trait（例如 `NetOps`）。

/// Mock 的协作式调度钩子
///
/// 记录让出次数，并在每次让出时把时钟推进 `step_ms` 毫秒。
#[derive(Debug, Default)]
pub struct MockNetOps {
    /// 累计让出次数
    pub yields: usize,
    /// 当前时间（毫秒）
    pub now_ms: u64,
    /// 每次让出推进的时间（毫秒）
    pub step_ms: u64,
}

impl MockNetOps {
    /// 创建时钟静止的实例
    pub const fn new() -> Self {
        Self {
            yields: 0,
            now_ms: 0,
            step_ms: 0,
        }
    }

    /// 创建每次让出推进 `step_ms` 毫秒的实例
    pub const fn with_step(step_ms: u64) -> Self {
        Self {
            yields: 0,
            now_ms: 0,
            step_ms,
        }
    }

    /// 记录一次让出
    pub fn on_yield(&mut self) {
        self.yields += 1;
        self.now_ms += self.step_ms;
    }
}
