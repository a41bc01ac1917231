//! 芯片初始化配置

/// 芯片初始化配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipConfig {
    /// 活动 socket 数；`None` 表示使用芯片支持的全部 socket
    pub sockets: Option<usize>,
    /// 重传超时，单位 100 µs
    pub retransmission_time: u16,
    /// 重传次数
    pub retransmission_count: u8,
}

impl ChipConfig {
    /// 默认重传超时：200 ms
    pub const DEFAULT_RETRANSMISSION_TIME: u16 = 2000;
    /// 默认重传次数
    pub const DEFAULT_RETRANSMISSION_COUNT: u8 = 8;

    /// 指定活动 socket 数
    pub fn with_sockets(mut self, sockets: usize) -> Self {
        self.sockets = Some(sockets);
        self
    }

    /// 指定重传超时（100 µs 单位）和重传次数
    pub fn with_retransmission(mut self, time: u16, count: u8) -> Self {
        self.retransmission_time = time;
        self.retransmission_count = count;
        self
    }
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            sockets: None,
            retransmission_time: Self::DEFAULT_RETRANSMISSION_TIME,
            retransmission_count: Self::DEFAULT_RETRANSMISSION_COUNT,
        }
    }
}
