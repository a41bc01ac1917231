//! 芯片层错误

/// 芯片初始化错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipError {
    /// 请求的 socket 数为 0
    NoSockets,
    /// 请求的 socket 数超过芯片支持的最大值
    TooManySockets {
        /// 请求的数量
        requested: usize,
        /// 芯片支持的最大值
        max: usize,
    },
    /// 软件复位后模式寄存器迟迟不归零
    ResetTimeout,
    /// 版本寄存器的值与芯片代际不符
    UnexpectedVersion {
        /// 期望值
        expected: u8,
        /// 读到的值
        found: u8,
    },
}

impl ChipError {
    /// 转换为错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            ChipError::ResetTimeout => -5,
            ChipError::UnexpectedVersion { .. } => -19,
            ChipError::NoSockets | ChipError::TooManySockets { .. } => -22,
        }
    }
}
