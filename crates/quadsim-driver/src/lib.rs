//! # quadsim Driver
//!
//! 仿真桥的运行时：把物理引擎、外部步态控制器与可选的深度相机连成闭环。
//!
//! - 状态合成（IMU / 关节反馈）
//! - 降频控制器调用（零阶保持）
//! - 驱动力合成（位置混合 / 直接力矩）
//! - 复位与模式状态机（边沿触发面板）
//! - 控制、分发、感知三线程（ArcSwap 无锁读取，邮箱传递命令）
//! - 遥测钩子与原子计数指标
//!
//! 大多数用户应通过 [`SimulationBuilder`] 构造 [`Simulation`]。

pub mod blender;
mod builder;
pub mod control;
pub mod controller;
#[cfg(feature = "dylib")]
pub mod dylib;
pub mod edge;
mod error;
pub mod invoker;
pub mod mailbox;
pub mod metrics;
pub mod mode;
pub mod physics;
pub mod pipeline;
mod simulation;
pub mod state;
pub mod synthesizer;
pub mod telemetry;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use blender::{ActuationBlender, GainCalibration};
pub use builder::{DEFAULT_COMMAND_CAPACITY, SimulationBuilder};
pub use control::{ControlCore, CoreConfig, TickReport};
pub use controller::GaitController;
#[cfg(feature = "dylib")]
pub use dylib::SharedLibraryController;
pub use edge::{AtomicControlPanel, ControlPanel, EdgeTrigger, PanelButton, PanelEdges, PanelEvents};
pub use error::{ControllerError, DriverError, PhysicsError};
pub use invoker::{ControllerInvoker, Invocation};
pub use mailbox::{ChannelCommandSource, CommandMailboxes, CommandSource, PendingCommands, Received};
pub use metrics::{MetricsSnapshot, SimulationMetrics};
pub use mode::ModeState;
pub use physics::{DEFAULT_JOINT_MAP, DEFAULT_TOTAL_JOINTS, JointMap, PhysicsBackend, default_joint_map};
pub use pipeline::{LoopConfig, control_loop, dispatch_loop, perception_loop};
pub use simulation::Simulation;
pub use state::{SimContext, TickSnapshot};
pub use synthesizer::{DEFAULT_GRAVITY, StateSynthesizer, SynthesizedState};
pub use telemetry::{ChannelSink, PublishDecimation, TelemetryHub, TelemetryMessage, TelemetrySink};
