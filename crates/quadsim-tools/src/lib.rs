//! # quadsim Tools - 配置文件
//!
//! **依赖原则**: 只依赖 `quadsim-protocol`，不依赖运行时（`quadsim-driver`）
//!
//! ## 包含模块
//!
//! - `config` - TOML 配置结构与校验
//! - `error` - 配置错误
//!
//! 运行时配置（`CoreConfig` 等）由 `quadsim-sdk` 从 [`SimulationConfig`] 转换。

pub mod config;
pub mod error;

pub use config::{
    CommunicationSection, PerceptionSection, ResetSection, SimulationConfig, SimulationSection,
    TelemetrySection, Terrain, TimingSection,
};
pub use error::ConfigError;
