//! # quadsim SDK
//!
//! 四足机器人仿真桥：物理引擎 + 外部步态控制器 + 可选深度相机。
//!
//! # 架构设计
//!
//! - **协议层** (`protocol`): 规范关节顺序、控制器报文布局、命令解码
//! - **感知层** (`perception`): 相机几何、深度反投影、灰度图
//! - **驱动层** (`driver`): 状态合成、降频调用、驱动力合成、复位状态机、线程
//! - **配置** (`tools`): TOML 配置文件
//!
//! # 快速开始
//!
//! ```no_run
//! use quadsim_sdk::prelude::*;
//!
//! # fn example(physics: impl PhysicsBackend + 'static) -> Result<(), Box<dyn std::error::Error>> {
//! quadsim_sdk::init_logging();
//! let config = SimulationConfig::load_from_file("quadsim.toml")?;
//! let runtime = RuntimeConfig::from_config(&config)?;
//! let sim = runtime.builder().physics(physics).build()?;
//! sim.send_command(RawCommand::new(
//!     CommandKind::BodyVelocity,
//!     CommandPayload::FloatList(vec![0.3, 0.0, 0.0]),
//! ))?;
//! # Ok(())
//! # }
//! ```

mod logging;
pub mod prelude;
mod runtime;

pub use quadsim_driver as driver;
pub use quadsim_perception as perception;
pub use quadsim_protocol as protocol;
pub use quadsim_tools as tools;

pub use logging::{LoggingError, init_logging, try_init_logging};
pub use runtime::RuntimeConfig;

pub use quadsim_driver::{
    ControlPanel, ControllerError, DriverError, GaitController, MetricsSnapshot, PanelButton,
    PhysicsBackend, PhysicsError, Simulation, SimulationBuilder, TelemetrySink,
};
pub use quadsim_perception::{PerceptionError, Renderer};
pub use quadsim_protocol::ProtocolError;
pub use quadsim_tools::{ConfigError, SimulationConfig};
