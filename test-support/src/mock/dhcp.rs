//! DHCP 协作方的 Mock 实现
//!
//! 注意：这里不直接依赖 `net` crate（避免循环依赖）。
//! `net` crate 在 `cfg(test)` 下为 [`MockDhcp`] 实现 `DhcpClient`。

use alloc::collections::VecDeque;

/// 一份租约
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MockLease {
    /// 本机地址
    pub local_ip: [u8; 4],
    /// 网关
    pub gateway: [u8; 4],
    /// 子网掩码
    pub subnet: [u8; 4],
    /// DNS 服务器
    pub dns: [u8; 4],
}

/// 一次租约检查的脚本化结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockLeaseCheck {
    /// 无变化
    NoChange,
    /// 续约成功，并换成给定租约
    Renewed(MockLease),
    /// 重绑定成功，并换成给定租约
    Rebound(MockLease),
    /// 续约/重绑定失败
    Failed,
}

/// Mock 的 DHCP 客户端
#[derive(Debug, Default)]
pub struct MockDhcp {
    /// 当前租约
    pub lease: MockLease,
    /// `acquire` 是否成功
    pub grant: bool,
    /// 依次返回的检查结果，耗尽后返回 [`MockLeaseCheck::NoChange`]
    pub checks: VecDeque<MockLeaseCheck>,
    /// 累计 acquire 次数
    pub acquire_calls: usize,
    /// 最近一次 acquire 使用的 MAC
    pub last_mac: Option<[u8; 6]>,
}

impl MockDhcp {
    /// 创建会批准 `lease` 的实例
    pub fn granting(lease: MockLease) -> Self {
        Self {
            lease,
            grant: true,
            ..Self::default()
        }
    }

    /// 创建总是拒绝的实例
    pub fn refusing() -> Self {
        Self::default()
    }

    /// 追加一个检查结果
    pub fn push_check(&mut self, check: MockLeaseCheck) {
        self.checks.push_back(check);
    }

    /// 记录一次 acquire 并返回是否批准
    pub fn acquire(&mut self, mac: [u8; 6]) -> bool {
        self.acquire_calls += 1;
        self.last_mac = Some(mac);
        self.grant
    }

    /// 取出下一个检查结果，续约/重绑定时同时替换当前租约
    pub fn next_check(&mut self) -> MockLeaseCheck {
        let check = self.checks.pop_front().unwrap_or(MockLeaseCheck::NoChange);
        if let MockLeaseCheck::Renewed(lease) | MockLeaseCheck::Rebound(lease) = check {
            self.lease = lease;
        }
        check
    }
}
