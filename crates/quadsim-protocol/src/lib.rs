//! # quadsim Protocol
//!
//! 四足仿真桥的数据模型（无物理引擎、无控制器依赖）
//!
//! ## 模块
//!
//! - `joint`: 12 个驱动关节的规范顺序与 `JointArray`
//! - `state`: 物理原始状态、合成 IMU、关节反馈及控制器数据包布局
//! - `command`: 控制器输出（`ControllerCommand` / `TorqueFrame`）与外部命令校验
//! - `mode`: 生命周期 / 驱动方式 / 功率模式
//! - `sensor`: 相机内参、点云、灰度图
//!
//! ## 数据包布局
//!
//! 与外部控制器交换的数组长度固定，视为不可变协议：
//! IMU 10 个值，关节 24 个值，逐关节输出 12 个值。

pub mod command;
pub mod error;
pub mod joint;
pub mod mode;
pub mod sensor;
pub mod state;

pub use command::*;
pub use error::ProtocolError;
pub use joint::*;
pub use mode::*;
pub use sensor::*;
pub use state::*;
