//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use quadsim_sdk::prelude::*;
//! ```

pub use crate::RuntimeConfig;

// 驱动层
pub use quadsim_driver::{
    ControlPanel, GaitController, PanelButton, PhysicsBackend, Simulation, SimulationBuilder,
    TelemetryMessage, TelemetrySink,
};

// 感知层
pub use quadsim_perception::{PerceptionConfig, Renderer};

// 协议层
pub use quadsim_protocol::{
    ActuationMode, BasePose, CommandKind, CommandPayload, JointArray, JointId, LifecycleState,
    PowerMode, RawCommand,
};

// 配置
pub use quadsim_tools::SimulationConfig;

// 错误类型
pub use quadsim_driver::DriverError;
pub use quadsim_tools::ConfigError;
