//! 协议层错误类型定义

use thiserror::Error;

/// 协议层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// 命令载荷为空
    #[error("Empty payload for command `{command}`")]
    EmptyPayload { command: &'static str },

    /// 命令载荷类型不匹配
    #[error("Type mismatch for command `{command}`: got {actual}")]
    TypeMismatch {
        command: &'static str,
        actual: &'static str,
    },

    /// 数据长度不符
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// 数值越界或非有限值
    #[error("Value out of range for `{command}`: {detail}")]
    OutOfRange {
        command: &'static str,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidLength {
            expected: 3,
            actual: 2,
        };
        assert_eq!(format!("{}", err), "Invalid length: expected 3, got 2");

        let err = ProtocolError::EmptyPayload {
            command: "gait_type",
        };
        assert!(format!("{}", err).contains("gait_type"));
    }
}
