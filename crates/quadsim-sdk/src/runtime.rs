//! 配置文件 → 运行时配置
//!
//! 把 [`SimulationConfig`] 拆成驱动层使用的纯数据配置，
//! 并据此预置一个 [`SimulationBuilder`]。

use quadsim_driver::{CoreConfig, JointMap, LoopConfig, PublishDecimation, SimulationBuilder};
use quadsim_perception::PerceptionConfig;
use quadsim_protocol::JointArray;
use quadsim_tools::{ConfigError, PerceptionSection, SimulationConfig};
use std::path::PathBuf;
use std::time::Duration;

/// 运行时配置
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// 控制核心
    pub core: CoreConfig,
    /// 线程循环
    pub loop_config: LoopConfig,
    /// 遥测降频
    pub decimation: PublishDecimation,
    /// 感知管线（`camera = false` 时为 `None`）
    pub perception: Option<PerceptionConfig>,
    /// 控制器共享库路径
    pub controller_library: Option<PathBuf>,
}

impl RuntimeConfig {
    /// 从配置文件内容转换（先校验）
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let sim = &config.simulation;
        let joint_map: JointMap = JointArray::new(config.joint_map()?);

        let core = CoreConfig {
            frequency_hz: sim.freq,
            divisor: config.communication.divide,
            gains: sim.gains(),
            gravity: sim.gravity,
            spawn_height: config.spawn_height(),
            warmup_ticks: config.reset.warmup_ticks,
            settle_ticks: config.reset.settle_ticks,
            total_joints: config.reset.total_joints,
            joint_map,
            actuation: config.communication.actuation(),
            controller_budget: Duration::from_micros(config.timing.controller_budget_us),
            ..Default::default()
        };

        let loop_config = LoopConfig {
            startup_timeout: Duration::from_millis(config.timing.startup_timeout_ms),
            ..Default::default()
        };

        let decimation = PublishDecimation {
            odometry: config.telemetry.odometry_every,
            inertial: config.telemetry.inertial_every,
            camera: config.telemetry.camera_every,
        };

        let perception = sim.camera.then(|| perception_config(&config.perception));

        Ok(Self {
            core,
            loop_config,
            decimation,
            perception,
            controller_library: sim.controller_library.as_ref().map(PathBuf::from),
        })
    }

    /// 按配置预置的 Builder
    ///
    /// 物理引擎、渲染器（若启用相机）仍需调用方提供；
    /// 配置了共享库路径时控制器从该库加载。
    pub fn builder(&self) -> SimulationBuilder {
        let builder = SimulationBuilder::new()
            .core_config(self.core.clone())
            .loop_config(self.loop_config)
            .decimation(self.decimation);

        #[cfg(feature = "dylib")]
        if let Some(path) = &self.controller_library {
            return builder.controller_library(path.clone());
        }

        builder
    }
}

fn perception_config(cam: &PerceptionSection) -> PerceptionConfig {
    PerceptionConfig {
        rate_hz: cam.rate_hz,
        base_width: cam.width,
        base_height: cam.height,
        downsample: cam.downsample,
        fov_deg: cam.fov_deg,
        near: cam.near,
        far: cam.far,
        min_depth: cam.min_depth,
        max_depth: cam.max_depth,
        cloud_frame: cam.frame_id.clone(),
    }
}
