//! 临时端口分配

/// 临时端口区间的起点
pub const EPHEMERAL_PORT_START: u16 = 49152;

/// 临时端口计数器
///
/// 在 `49152..=65535` 内依次分配，到顶后回绕到起点。不检查端口是否仍被占用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EphemeralPorts {
    next: u16,
}

impl EphemeralPorts {
    /// 从区间起点开始
    pub const fn new() -> Self {
        Self {
            next: EPHEMERAL_PORT_START,
        }
    }

    /// 分配一个端口
    pub fn allocate(&mut self) -> u16 {
        let port = self.next;
        self.next = match port {
            u16::MAX => EPHEMERAL_PORT_START,
            _ => port + 1,
        };
        port
    }
}

impl Default for EphemeralPorts {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_within_ephemeral_range() {
        let mut ports = EphemeralPorts { next: 65534 };
        assert_eq!(ports.allocate(), 65534);
        assert_eq!(ports.allocate(), 65535);
        assert_eq!(ports.allocate(), EPHEMERAL_PORT_START);
        assert_eq!(ports.allocate(), EPHEMERAL_PORT_START + 1);
    }
}
