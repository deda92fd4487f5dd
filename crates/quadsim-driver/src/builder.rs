//! Builder 模式实现
//!
//! 提供链式构造 [`Simulation`] 的便捷方式。

use crate::control::{ControlCore, CoreConfig};
use crate::controller::GaitController;
use crate::edge::{AtomicControlPanel, ControlPanel};
use crate::error::DriverError;
use crate::mailbox::{ChannelCommandSource, CommandSource};
use crate::physics::PhysicsBackend;
use crate::pipeline::{LoopConfig, control_loop, dispatch_loop, perception_loop};
use crate::simulation::Simulation;
use crate::state::SimContext;
use crate::telemetry::{PublishDecimation, TelemetryHub, TelemetrySink};
use crossbeam_channel::RecvTimeoutError;
use quadsim_perception::{PerceptionConfig, PerceptionPipeline, Renderer};
#[cfg(feature = "dylib")]
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use tracing::{info, warn};

/// 默认内置命令通道容量
pub const DEFAULT_COMMAND_CAPACITY: usize = 16;

/// Simulation Builder（链式构造）
///
/// 物理引擎与控制器为必需组件；渲染器可选（未设置时不启动感知线程）；
/// 未设置命令源时使用内置通道，可通过 [`Simulation::send_command`] 投递命令。
///
/// `build()` 会在控制线程上完成首次复位后才返回，控制器不可用时直接失败。
///
/// # Example
///
/// ```no_run
/// # use quadsim_driver::{CoreConfig, SimulationBuilder};
/// # fn example(
/// #     physics: impl quadsim_driver::PhysicsBackend + 'static,
/// #     controller: impl quadsim_driver::GaitController + 'static,
/// # ) -> Result<(), quadsim_driver::DriverError> {
/// let sim = SimulationBuilder::new()
///     .core_config(CoreConfig {
///         divisor: 2,
///         ..Default::default()
///     })
///     .physics(physics)
///     .controller(controller)
///     .build()?;
/// println!("{:?}", sim.mode());
/// # Ok(())
/// # }
/// ```
pub struct SimulationBuilder {
    core: CoreConfig,
    loop_config: LoopConfig,
    physics: Option<Box<dyn PhysicsBackend>>,
    controller: Option<Box<dyn GaitController>>,
    #[cfg(feature = "dylib")]
    controller_library: Option<PathBuf>,
    perception: Option<(PerceptionConfig, Box<dyn Renderer>)>,
    command_source: Option<Box<dyn CommandSource>>,
    command_capacity: usize,
    decimation: PublishDecimation,
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl SimulationBuilder {
    /// 创建新的 Builder
    pub fn new() -> Self {
        Self {
            core: CoreConfig::default(),
            loop_config: LoopConfig::default(),
            physics: None,
            controller: None,
            #[cfg(feature = "dylib")]
            controller_library: None,
            perception: None,
            command_source: None,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            decimation: PublishDecimation::default(),
            sinks: Vec::new(),
        }
    }

    /// 设置控制核心配置
    pub fn core_config(mut self, config: CoreConfig) -> Self {
        self.core = config;
        self
    }

    /// 设置线程循环配置
    pub fn loop_config(mut self, config: LoopConfig) -> Self {
        self.loop_config = config;
        self
    }

    /// 设置物理引擎
    pub fn physics(mut self, physics: impl PhysicsBackend + 'static) -> Self {
        self.physics = Some(Box::new(physics));
        self
    }

    /// 设置步态控制器
    pub fn controller(mut self, controller: impl GaitController + 'static) -> Self {
        self.controller = Some(Box::new(controller));
        self
    }

    /// 从共享库加载控制器（`build()` 时加载，优先级低于 [`controller`](Self::controller)）
    #[cfg(feature = "dylib")]
    pub fn controller_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.controller_library = Some(path.into());
        self
    }

    /// 启用感知线程
    pub fn perception(mut self, config: PerceptionConfig, renderer: impl Renderer + 'static) -> Self {
        self.perception = Some((config, Box::new(renderer)));
        self
    }

    /// 使用外部命令源
    pub fn command_source(mut self, source: impl CommandSource + 'static) -> Self {
        self.command_source = Some(Box::new(source));
        self
    }

    /// 内置命令通道容量
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }

    /// 遥测降频
    pub fn decimation(mut self, decimation: PublishDecimation) -> Self {
        self.decimation = decimation;
        self
    }

    /// 添加遥测 sink
    pub fn telemetry_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    fn take_controller(&mut self) -> Result<Box<dyn GaitController>, DriverError> {
        if let Some(controller) = self.controller.take() {
            return Ok(controller);
        }
        #[cfg(feature = "dylib")]
        if let Some(path) = self.controller_library.take() {
            let controller = crate::dylib::SharedLibraryController::load(&path)?;
            return Ok(Box::new(controller));
        }
        Err(DriverError::MissingComponent("gait controller"))
    }

    /// 构建并启动仿真
    ///
    /// # 错误
    /// - `InvalidConfig`: 配置无效
    /// - `MissingComponent`: 缺少物理引擎或控制器
    /// - `Controller`: 控制器加载或首次复位失败
    /// - `Timeout`: 首次复位未在 `startup_timeout` 内完成
    pub fn build(mut self) -> Result<Simulation, DriverError> {
        self.core.validate()?;
        let physics = self
            .physics
            .take()
            .ok_or(DriverError::MissingComponent("physics backend"))?;
        let controller = self.take_controller()?;
        let pipeline = match self.perception.take() {
            Some((config, renderer)) => Some(PerceptionPipeline::new(config, renderer)?),
            None => None,
        };

        let ctx = Arc::new(SimContext::new(self.core.actuation));
        let mut hub = TelemetryHub::new(self.decimation);
        for sink in self.sinks.drain(..) {
            hub.add_sink(sink);
        }
        let telemetry = Arc::new(hub);
        let core = ControlCore::new(
            self.core.clone(),
            physics,
            controller,
            ctx.clone(),
            telemetry.clone(),
        )?;

        let is_running = Arc::new(AtomicBool::new(true));
        let panel = Arc::new(AtomicControlPanel::new());
        let (startup_tx, startup_rx) = crossbeam_channel::bounded(1);

        let control_thread = {
            let panel = panel.clone() as Arc<dyn ControlPanel>;
            let is_running = is_running.clone();
            thread::Builder::new()
                .name("quadsim-control".to_string())
                .spawn(move || control_loop(core, panel, is_running, startup_tx))
                .map_err(|e| DriverError::ThreadSpawn {
                    name: "control",
                    reason: e.to_string(),
                })?
        };
        let mut sim = Simulation::new(ctx.clone(), panel, is_running.clone(), control_thread);

        match startup_rx.recv_timeout(self.loop_config.startup_timeout) {
            Ok(Ok(())) => {},
            Ok(Err(e)) => return Err(e),
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Initial reset did not finish within {:?}",
                    self.loop_config.startup_timeout
                );
                return Err(DriverError::Timeout);
            },
            Err(RecvTimeoutError::Disconnected) => return Err(DriverError::StartupAborted),
        }

        let (source, command_tx): (Box<dyn CommandSource>, _) = match self.command_source.take() {
            Some(source) => (source, None),
            None => {
                let (tx, source) = ChannelCommandSource::new(self.command_capacity);
                (Box::new(source), Some(tx))
            },
        };
        let dispatch_thread = {
            let ctx = ctx.clone();
            let is_running = is_running.clone();
            let timeout = self.loop_config.dispatch_timeout;
            thread::Builder::new()
                .name("quadsim-dispatch".to_string())
                .spawn(move || dispatch_loop(source, ctx, is_running, timeout))
                .map_err(|e| DriverError::ThreadSpawn {
                    name: "dispatch",
                    reason: e.to_string(),
                })?
        };
        sim.attach_dispatch(dispatch_thread, command_tx);

        if let Some(pipeline) = pipeline {
            let ctx = ctx.clone();
            let is_running = is_running.clone();
            let handle = thread::Builder::new()
                .name("quadsim-perception".to_string())
                .spawn(move || perception_loop(pipeline, ctx, telemetry, is_running))
                .map_err(|e| DriverError::ThreadSpawn {
                    name: "perception",
                    reason: e.to_string(),
                })?;
            sim.attach_perception(handle);
        }

        info!(
            "Simulation started: {} Hz, divide {}, {:?}",
            self.core.frequency_hz,
            self.core.divisor,
            self.core.actuation
        );
        Ok(sim)
    }
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
