//! 协作式调度钩子
//!
//! 驱动在等待芯片（发送完成、缓冲区空间）时反复轮询寄存器。
//! 每一轮未完成的轮询都会在释放总线后调用 [`NetOps::yield_now`]，
//! 由宿主决定让出给谁。实现由调用方注入并归驱动所有。

/// 网络运行时操作
pub trait NetOps {
    /// 获取当前时间戳（毫秒）
    ///
    /// 仅用于轮询超时；不设置超时时可以总是返回 0。
    fn get_time_ms(&self) -> u64;

    /// 让出执行权
    fn yield_now(&mut self);
}

impl<O: NetOps + ?Sized> NetOps for &mut O {
    fn get_time_ms(&self) -> u64 {
        (**self).get_time_ms()
    }

    fn yield_now(&mut self) {
        (**self).yield_now()
    }
}

/// 忙等：不计时，让出时只提示处理器处于自旋
#[derive(Debug, Clone, Copy, Default)]
pub struct BusyPoll;

impl NetOps for BusyPoll {
    fn get_time_ms(&self) -> u64 {
        0
    }

    fn yield_now(&mut self) {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod test_mock {
    extern crate test_support;

    use super::NetOps;
    use test_support::mock::net::MockNetOps;

    impl NetOps for MockNetOps {
        fn get_time_ms(&self) -> u64 {
            self.now_ms
        }

        fn yield_now(&mut self) {
            self.on_yield();
        }
    }

    #[test]
    fn test_mock_clock_advances_per_yield() {
        let mut ops = MockNetOps::with_step(10);
        ops.yield_now();
        ops.yield_now();
        assert_eq!(ops.yields, 2);
        assert_eq!(ops.get_time_ms(), 20);
    }
}
