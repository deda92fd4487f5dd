//! 驱动层错误类型定义

use quadsim_perception::PerceptionError;
use quadsim_protocol::ProtocolError;
use thiserror::Error;

/// 物理引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// 引擎内部错误
    #[error("Physics backend error: {0}")]
    Backend(String),

    /// 关节索引不存在
    #[error("Unknown joint index {0}")]
    UnknownJoint(usize),

    /// 引擎返回非有限状态
    #[error("Invalid physics state: {0}")]
    InvalidState(String),
}

/// 外部步态控制器错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// 动态库加载失败
    #[error("Failed to load controller library {path}: {reason}")]
    Load { path: String, reason: String },

    /// 缺少导出符号
    #[error("Controller library is missing symbol `{symbol}`: {reason}")]
    MissingSymbol {
        symbol: &'static str,
        reason: String,
    },

    /// 未调用 `init` 就使用控制器
    #[error("Controller used before init")]
    NotInitialized,

    /// 控制器返回空指针
    #[error("Controller returned null from `{0}`")]
    NullOutput(&'static str),

    /// 控制器返回非有限值
    #[error("Controller returned non-finite values from `{0}`")]
    NonFinite(&'static str),

    /// 其他控制器错误
    #[error("Controller error: {0}")]
    Backend(String),
}

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 物理引擎错误
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// 控制器错误
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    /// 感知错误
    #[error("Perception error: {0}")]
    Perception(#[from] PerceptionError),

    /// 命令校验错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 命令通道已关闭
    #[error("Command channel closed")]
    ChannelClosed,

    /// 命令通道已满
    #[error("Command channel full")]
    ChannelFull,

    /// 配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 构建器缺少必需组件
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),

    /// 线程启动失败
    #[error("Failed to spawn {name} thread: {reason}")]
    ThreadSpawn { name: &'static str, reason: String },

    /// 启动握手失败（控制线程在首次复位前退出）
    #[error("Control thread exited during startup")]
    StartupAborted,

    /// 控制线程已停止
    #[error("Simulation is not running")]
    NotRunning,

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,
}
