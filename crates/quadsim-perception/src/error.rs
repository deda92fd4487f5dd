//! 感知层错误类型定义

use thiserror::Error;

/// 感知层错误
#[derive(Error, Debug)]
pub enum PerceptionError {
    /// 配置无效（分辨率、裁剪面、视场角等）
    #[error("Invalid perception config: {0}")]
    InvalidConfig(String),

    /// 渲染器返回的缓冲区大小与分辨率不符
    #[error("{buffer} buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 渲染器错误
    #[error("Renderer error: {0}")]
    Render(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perception_error_display() {
        let err = PerceptionError::BufferSize {
            buffer: "depth",
            expected: 4800,
            actual: 10,
        };
        assert_eq!(
            format!("{}", err),
            "depth buffer size mismatch: expected 4800, got 10"
        );
    }
}
