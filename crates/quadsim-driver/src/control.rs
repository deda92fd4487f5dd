//! 控制核心
//!
//! [`ControlCore`] 独占物理引擎与控制器，由控制线程驱动。每个 tick：
//!
//! 1. 读取原始状态（只读一次）
//! 2. 合成 IMU 与关节反馈，发布快照与遥测
//! 3. 按降频因子调用控制器（其余 tick 零阶保持）
//! 4. 合成驱动力并施加
//! 5. 物理步进
//!
//! 复位流程见 [`ControlCore::reset`]。

use crate::blender::{ActuationBlender, GainCalibration};
use crate::controller::GaitController;
use crate::edge::PanelEvents;
use crate::error::{DriverError, PhysicsError};
use crate::invoker::{ControllerInvoker, Invocation};
use crate::mailbox::PendingCommands;
use crate::physics::{
    DEFAULT_TOTAL_JOINTS, JointMap, PhysicsBackend, default_joint_map, validate_joint_map,
};
use crate::state::{SimContext, TickSnapshot};
use crate::synthesizer::{DEFAULT_GRAVITY, StateSynthesizer, SynthesizedState};
use crate::telemetry::TelemetryHub;
use quadsim_protocol::{
    ActuationMode, BasePose, BaseTwist, JointArray, NUM_JOINTS, Odometry, PowerMode, StanceGains,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 默认物理步进频率（Hz）
pub const DEFAULT_FREQUENCY_HZ: f64 = 500.0;

/// 默认出生高度（米）
pub const DEFAULT_SPAWN_HEIGHT: f64 = 0.30;

/// 控制核心配置
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// 物理步进频率（Hz）
    pub frequency_hz: f64,
    /// 控制器降频因子 D（≥ 1）
    pub divisor: u32,
    /// 站立与关节增益，复位时传给控制器
    pub gains: StanceGains,
    /// 重力加速度（m/s²）
    pub gravity: f64,
    /// 复位出生高度（米）
    pub spawn_height: f64,
    /// 复位预热 tick 数（只步进物理，不施加驱动力）
    pub warmup_ticks: u32,
    /// 复位稳定 tick 数（低能耗模式下的完整控制 tick）
    pub settle_ticks: u32,
    /// 引擎关节总数（复位时逐个释放默认电机）
    pub total_joints: usize,
    /// 规范关节 → 引擎关节索引
    pub joint_map: JointMap,
    /// 驱动方式
    pub actuation: ActuationMode,
    /// 增益标定
    pub calibration: GainCalibration,
    /// 单次控制器调用预算，超出时计数并告警
    pub controller_budget: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            divisor: 1,
            gains: StanceGains::default(),
            gravity: DEFAULT_GRAVITY,
            spawn_height: DEFAULT_SPAWN_HEIGHT,
            warmup_ticks: 10,
            settle_ticks: 200,
            total_joints: DEFAULT_TOTAL_JOINTS,
            joint_map: default_joint_map(),
            actuation: ActuationMode::default(),
            calibration: GainCalibration::default(),
            controller_budget: Duration::from_millis(2),
        }
    }
}

impl CoreConfig {
    /// tick 周期
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency_hz)
    }

    /// 控制器调用频率 `f / D`
    pub fn controller_rate_hz(&self) -> f64 {
        self.frequency_hz / self.divisor.max(1) as f64
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), DriverError> {
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(DriverError::InvalidConfig(format!(
                "frequency must be positive, got {}",
                self.frequency_hz
            )));
        }
        if self.divisor == 0 {
            return Err(DriverError::InvalidConfig(
                "divide must be >= 1".to_string(),
            ));
        }
        if !self.gravity.is_finite() || !self.spawn_height.is_finite() {
            return Err(DriverError::InvalidConfig(
                "gravity and spawn height must be finite".to_string(),
            ));
        }
        if self.total_joints < NUM_JOINTS {
            return Err(DriverError::InvalidConfig(format!(
                "total_joints must be >= {}, got {}",
                NUM_JOINTS, self.total_joints
            )));
        }
        if self.calibration.kp_divisor == 0.0 || self.calibration.kd_divisor == 0.0 {
            return Err(DriverError::InvalidConfig(
                "gain calibration divisors must be non-zero".to_string(),
            ));
        }
        validate_joint_map(&self.joint_map, self.total_joints)?;
        Ok(())
    }
}

/// 一个 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// 本 tick 序号
    pub tick: u64,
    /// 控制器调用情况
    pub invocation: Invocation,
    /// 施加的驱动力
    pub forces: JointArray<f64>,
}

/// 控制核心
pub struct ControlCore<P, C> {
    config: CoreConfig,
    physics: P,
    controller: C,
    synthesizer: StateSynthesizer,
    invoker: ControllerInvoker,
    blender: ActuationBlender,
    telemetry: Arc<TelemetryHub>,
    ctx: Arc<SimContext>,
    tick: u64,
}

impl<P: PhysicsBackend, C: GaitController> ControlCore<P, C> {
    /// 创建控制核心（不执行复位）
    pub fn new(
        config: CoreConfig,
        physics: P,
        controller: C,
        ctx: Arc<SimContext>,
        telemetry: Arc<TelemetryHub>,
    ) -> Result<Self, DriverError> {
        config.validate()?;
        if ctx.mode.actuation() != config.actuation {
            return Err(DriverError::InvalidConfig(format!(
                "context actuation {:?} does not match config {:?}",
                ctx.mode.actuation(),
                config.actuation
            )));
        }
        Ok(Self {
            synthesizer: StateSynthesizer::new(config.frequency_hz, config.gravity),
            invoker: ControllerInvoker::new(config.divisor, config.controller_budget),
            blender: ActuationBlender::new(config.actuation, config.calibration),
            config,
            physics,
            controller,
            telemetry,
            ctx,
            tick: 0,
        })
    }

    /// 配置
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// 当前 tick 序号
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// 共享上下文
    pub fn context(&self) -> &Arc<SimContext> {
        &self.ctx
    }

    /// 物理引擎
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// 控制器
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// 状态合成器
    pub fn synthesizer(&self) -> &StateSynthesizer {
        &self.synthesizer
    }

    /// 降频调用器
    pub fn invoker(&self) -> &ControllerInvoker {
        &self.invoker
    }

    fn sense(&mut self) -> Result<SynthesizedState, PhysicsError> {
        let state = self.physics.read_state(&self.config.joint_map)?;
        Ok(self.synthesizer.synthesize(&state))
    }

    /// 执行一个完整控制 tick
    ///
    /// 控制器错误只记录并计数，沿用保持值；物理错误返回给调用方。
    pub fn tick(&mut self) -> Result<TickReport, DriverError> {
        let tick = self.tick;
        let sensed = self.sense()?;
        let metrics = &self.ctx.metrics;

        let pose = BasePose {
            position: sensed.position,
            orientation: sensed.inertial.orientation,
        };
        self.ctx.publish(TickSnapshot {
            tick,
            pose,
            inertial: sensed.inertial,
            joints: sensed.joints,
        });
        self.telemetry
            .publish_tick(&Odometry { tick, pose }, &sensed.inertial);

        let imu = sensed.inertial.to_packet();
        let legs = sensed.joints.to_packet();
        let invocation = match self.invoker.step(&mut self.controller, tick, &imu, &legs) {
            Ok(invocation) => invocation,
            Err(e) => {
                metrics.controller_errors.fetch_add(1, Ordering::Relaxed);
                error!("Controller call failed at tick {}: {}", tick, e);
                Invocation::Held
            },
        };
        if let Invocation::Invoked {
            elapsed,
            over_budget,
        } = invocation
        {
            metrics.controller_invocations.fetch_add(1, Ordering::Relaxed);
            if over_budget {
                metrics.controller_overruns.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Controller call took {:?} (budget {:?}) at tick {}",
                    elapsed,
                    self.invoker.budget(),
                    tick
                );
            }
        }

        let forces = self
            .blender
            .blend(self.invoker.command(), self.invoker.torque(), &sensed.joints);
        let actuated = self
            .physics
            .apply_torques(&self.config.joint_map, &forces)
            .and_then(|()| self.physics.step());

        // 控制器与合成器已消费本 tick，物理失败也推进序号，保持 tick mod D 的调用节拍
        self.tick = self.tick.saturating_add(1);
        metrics.ticks.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = actuated {
            debug!("Physics failed at tick {}, tick index advanced", tick);
            return Err(e.into());
        }
        trace!("tick {} done ({:?})", tick, invocation);

        Ok(TickReport {
            tick,
            invocation,
            forces,
        })
    }

    /// 复位到站立姿态并完成稳定过程
    ///
    /// 1. 机体回到 `[0, 0, spawn_height]`，单位姿态，零速度
    /// 2. 关节回到站立姿态，零速度
    /// 3. 清零上一 tick 速度、保持输出与 tick 序号
    /// 4. 以 `f / D` 初始化控制器
    /// 5. `warmup_ticks` 个预热 tick（步进、合成、`pre_step`，不施加驱动力）
    /// 6. 释放 `0..total_joints` 的默认电机
    /// 7. 低能耗模式下执行 `settle_ticks` 个完整 tick
    /// 8. 切换到 Active / Normal
    ///
    /// 失败时回到 Idle。
    pub fn reset(&mut self) -> Result<(), DriverError> {
        info!("Reset requested, entering settling");
        self.ctx.mode.enter_settling();
        self.synthesizer.reset();
        self.ctx.metrics.resets.fetch_add(1, Ordering::Relaxed);

        match self.run_reset() {
            Ok(()) => {
                self.ctx.mode.enter_active();
                info!(
                    "Reset complete, active at tick {} (controller at {} Hz)",
                    self.tick,
                    self.config.controller_rate_hz()
                );
                Ok(())
            },
            Err(e) => {
                self.ctx.mode.enter_idle();
                self.ctx
                    .metrics
                    .reset_failures
                    .fetch_add(1, Ordering::Relaxed);
                error!("Reset failed: {}", e);
                Err(e)
            },
        }
    }

    fn run_reset(&mut self) -> Result<(), DriverError> {
        let spawn = BasePose::at_height(self.config.spawn_height);
        self.physics.reset_base(&spawn, &BaseTwist::default())?;

        let stance = JointArray::stance();
        for (&id, &position) in self.config.joint_map.iter().zip(stance.iter()) {
            self.physics.reset_joint(id, position, 0.0)?;
        }

        self.invoker.clear();
        self.tick = 0;

        self.controller
            .init(self.config.controller_rate_hz(), &self.config.gains)?;

        for _ in 0..self.config.warmup_ticks {
            self.physics.step()?;
            let sensed = self.sense()?;
            self.controller
                .pre_step(&sensed.inertial.to_packet(), &sensed.joints.to_packet())?;
        }

        for id in 0..self.config.total_joints {
            self.physics.disable_motor(id)?;
        }

        self.controller
            .set_mode(PowerMode::LowEnergy.controller_code())?;
        for _ in 0..self.config.settle_ticks {
            self.tick()?;
        }
        self.controller.set_mode(PowerMode::Normal.controller_code())?;
        Ok(())
    }

    /// 把分发线程收到的命令转发给控制器
    ///
    /// 模式码 1 视为低能耗，其余视为高性能。
    pub fn apply_commands(&mut self, pending: PendingCommands) {
        let metrics = &self.ctx.metrics;

        if let Some(code) = pending.gait_type {
            match self.controller.set_gait_type(code) {
                Ok(()) => {
                    metrics.commands_applied.fetch_add(1, Ordering::Relaxed);
                    debug!("Gait type set to {}", code);
                },
                Err(e) => {
                    metrics.controller_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to set gait type {}: {}", code, e);
                },
            }
        }

        if let Some(code) = pending.robot_mode {
            match self.controller.set_mode(code) {
                Ok(()) => {
                    metrics.commands_applied.fetch_add(1, Ordering::Relaxed);
                    let power = if code == PowerMode::LowEnergy.controller_code() {
                        PowerMode::LowEnergy
                    } else {
                        PowerMode::HighPerformance
                    };
                    let old = self.ctx.mode.set_power(power);
                    debug!("Robot mode code {} ({} -> {})", code, old, power);
                },
                Err(e) => {
                    metrics.controller_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to set robot mode {}: {}", code, e);
                },
            }
        }

        if let Some(velocity) = pending.velocity {
            match self.controller.set_velocity_command(&velocity) {
                Ok(()) => {
                    metrics.commands_applied.fetch_add(1, Ordering::Relaxed);
                    trace!("Body velocity {:?}", velocity);
                },
                Err(e) => {
                    metrics.controller_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to set body velocity: {}", e);
                },
            }
        }
    }

    /// 处理面板边沿事件
    ///
    /// 复位优先；功率切换只转发模式码，不触碰物理状态。
    /// 每个事件独立处理，某个失败不影响其余事件，返回第一个错误。
    pub fn handle_panel(&mut self, events: PanelEvents) -> Result<(), DriverError> {
        let mut first_error = None;

        if events.reset
            && let Err(e) = self.reset()
        {
            first_error.get_or_insert(e);
        }
        for (pressed, mode) in [
            (events.low_energy, PowerMode::LowEnergy),
            (events.high_performance, PowerMode::HighPerformance),
        ] {
            if !pressed {
                continue;
            }
            if let Err(e) = self.switch_power(mode) {
                self.ctx
                    .metrics
                    .controller_errors
                    .fetch_add(1, Ordering::Relaxed);
                warn!("Failed to switch power mode to {}: {}", mode, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn switch_power(&mut self, mode: PowerMode) -> Result<(), DriverError> {
        self.controller.set_mode(mode.controller_code())?;
        let old = self.ctx.mode.set_power(mode);
        warn!("Power mode switched: {} -> {}", old, mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ControllerEvent, MockPhysics, ScriptedController};
    use quadsim_protocol::{LifecycleState, VelocityCommand};

    fn core_with(
        config: CoreConfig,
    ) -> (
        ControlCore<MockPhysics, ScriptedController>,
        MockPhysics,
        ScriptedController,
    ) {
        let physics = MockPhysics::new(config.total_joints);
        let controller = ScriptedController::counting();
        let ctx = Arc::new(SimContext::new(config.actuation));
        let core = ControlCore::new(
            config,
            physics.clone(),
            controller.clone(),
            ctx,
            Arc::new(TelemetryHub::default()),
        )
        .unwrap();
        (core, physics, controller)
    }

    fn quick_config(divisor: u32) -> CoreConfig {
        CoreConfig {
            divisor,
            warmup_ticks: 0,
            settle_ticks: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(CoreConfig::default().validate().is_ok());

        let config = CoreConfig {
            divisor: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DriverError::InvalidConfig(_))));

        let config = CoreConfig {
            total_joints: 8,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CoreConfig {
            frequency_hz: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reset_sequence() {
        let (mut core, physics, controller) = core_with(CoreConfig {
            divisor: 5,
            ..Default::default()
        });
        physics.with_world(|world| {
            world.twist.linear = [1.0, -0.5, 0.2];
            world.pose = BasePose::at_height(2.0);
        });

        core.reset().unwrap();

        let world = physics.world();
        assert_eq!(world.pose, BasePose::at_height(DEFAULT_SPAWN_HEIGHT));
        assert_eq!(world.steps, 10 + 200);
        assert!(world.motors_disabled.iter().all(|&disabled| disabled));
        let stance = JointArray::stance();
        for (i, &id) in core.config().joint_map.iter().enumerate() {
            assert_eq!(world.joints[id].position, stance[i]);
            assert_eq!(world.joints[id].velocity, 0.0);
        }
        assert_eq!(core.synthesizer().prev_velocity(), [0.0, 0.0, 0.0]);
        assert_eq!(core.tick_count(), 200);

        let events = controller.events();
        assert_eq!(
            events[0],
            ControllerEvent::Init {
                timestep_hz: 100.0,
                gains: StanceGains::default(),
            }
        );
        assert!(events[1..11].iter().all(|e| *e == ControllerEvent::PreStep));
        assert_eq!(events[11], ControllerEvent::SetMode(1));
        assert_eq!(events.last(), Some(&ControllerEvent::SetMode(0)));
        // 200 个 tick，D = 5
        assert_eq!(controller.calls().compute, 40);

        let mode = core.context().mode.snapshot();
        assert_eq!(mode.lifecycle, LifecycleState::Active);
        assert_eq!(mode.power, PowerMode::Normal);
        assert_eq!(core.context().metrics.snapshot().resets, 1);
    }

    #[test]
    fn test_first_settle_tick_invokes_controller() {
        let (mut core, _physics, controller) = core_with(CoreConfig {
            divisor: 4,
            warmup_ticks: 0,
            settle_ticks: 1,
            ..Default::default()
        });
        core.reset().unwrap();
        assert_eq!(controller.calls().compute, 1);

        // 复位清空保持值，重新从 tick 0 开始
        core.reset().unwrap();
        assert_eq!(controller.calls().compute, 2);
        assert_eq!(core.tick_count(), 1);
    }

    #[test]
    fn test_divisor_holds_forces_between_invocations() {
        let (mut core, physics, controller) = core_with(quick_config(4));
        core.reset().unwrap();

        let mut applied = Vec::new();
        for _ in 0..8 {
            let report = core.tick().unwrap();
            applied.push(physics.world().last_forces[0]);
            assert_eq!(report.invocation.invoked(), report.tick % 4 == 0);
        }
        assert_eq!(applied, vec![1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0]);
        assert_eq!(controller.calls().compute, 2);

        let snapshot = core.context().metrics.snapshot();
        assert_eq!(snapshot.ticks, 8);
        assert_eq!(snapshot.controller_invocations, 2);
        assert_eq!(snapshot.effective_divisor(), 4.0);
    }

    #[test]
    fn test_tick_publishes_snapshot() {
        let (mut core, _physics, _controller) = core_with(quick_config(1));
        core.reset().unwrap();
        core.tick().unwrap();

        let snapshot = core.context().latest();
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.pose, BasePose::at_height(DEFAULT_SPAWN_HEIGHT));
        assert_eq!(snapshot.inertial.linear_acceleration, [0.0, 0.0, 9.8]);
        assert_eq!(snapshot.joints.position, JointArray::stance());
    }

    #[test]
    fn test_controller_failure_keeps_held_output() {
        let (mut core, physics, controller) = core_with(quick_config(1));
        core.reset().unwrap();
        core.tick().unwrap();
        assert_eq!(physics.world().last_forces[0], 1.0);

        controller.set_fail_compute(true);
        let report = core.tick().unwrap();
        assert_eq!(report.invocation, Invocation::Held);
        assert_eq!(physics.world().last_forces[0], 1.0);
        assert_eq!(core.context().metrics.snapshot().controller_errors, 1);
    }

    #[test]
    fn test_physics_failure_is_returned() {
        let (mut core, physics, _controller) = core_with(quick_config(1));
        core.reset().unwrap();
        physics.with_world(|world| world.fail_next_step = true);
        assert!(matches!(core.tick(), Err(DriverError::Physics(_))));
        assert_eq!(core.tick_count(), 1);
        assert_eq!(core.tick().unwrap().tick, 1);
    }

    #[test]
    fn test_physics_failure_keeps_invocation_schedule() {
        let (mut core, physics, controller) = core_with(quick_config(4));
        core.reset().unwrap();

        physics.with_world(|world| world.fail_next_step = true);
        assert!(core.tick().is_err());
        for _ in 0..8 {
            let report = core.tick().unwrap();
            assert_eq!(report.invocation.invoked(), report.tick % 4 == 0);
        }

        // 9 个 tick（含失败的 tick 0），D = 4
        assert_eq!(core.tick_count(), 9);
        assert_eq!(controller.calls().compute, 3);
        assert_eq!(physics.world().steps, 8);
        let snapshot = core.context().metrics.snapshot();
        assert_eq!(snapshot.ticks, 9);
        assert_eq!(snapshot.controller_invocations, 3);
    }

    #[test]
    fn test_reset_failure_returns_to_idle() {
        let physics = MockPhysics::new(DEFAULT_TOTAL_JOINTS);
        let ctx = Arc::new(SimContext::new(ActuationMode::DirectTorque));
        let mut core = ControlCore::new(
            CoreConfig::default(),
            physics,
            ScriptedController::unavailable(),
            ctx.clone(),
            Arc::new(TelemetryHub::default()),
        )
        .unwrap();

        assert!(matches!(core.reset(), Err(DriverError::Controller(_))));
        assert_eq!(ctx.mode.lifecycle(), LifecycleState::Idle);
    }

    #[test]
    fn test_apply_commands() {
        let (mut core, _physics, controller) = core_with(quick_config(1));
        core.reset().unwrap();
        controller.clear_events();

        core.apply_commands(PendingCommands {
            gait_type: Some(3),
            robot_mode: Some(1),
            velocity: Some(VelocityCommand {
                vx: 0.5,
                vy: 0.0,
                wz: -0.2,
            }),
        });

        assert_eq!(
            controller.events(),
            vec![
                ControllerEvent::SetGaitType(3),
                ControllerEvent::SetMode(1),
                ControllerEvent::SetVelocity(VelocityCommand {
                    vx: 0.5,
                    vy: 0.0,
                    wz: -0.2,
                }),
            ]
        );
        assert_eq!(core.context().mode.power(), PowerMode::LowEnergy);
        assert_eq!(core.context().metrics.snapshot().commands_applied, 3);

        core.apply_commands(PendingCommands {
            robot_mode: Some(0),
            ..Default::default()
        });
        assert_eq!(core.context().mode.power(), PowerMode::HighPerformance);
    }

    #[test]
    fn test_power_toggle_does_not_reset_physics() {
        let (mut core, physics, controller) = core_with(quick_config(1));
        core.reset().unwrap();
        core.tick().unwrap();
        controller.clear_events();

        core.handle_panel(PanelEvents {
            low_energy: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(controller.events(), vec![ControllerEvent::SetMode(1)]);
        assert_eq!(core.context().mode.power(), PowerMode::LowEnergy);

        core.handle_panel(PanelEvents {
            high_performance: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(core.context().mode.power(), PowerMode::HighPerformance);
        assert_eq!(core.context().mode.lifecycle(), LifecycleState::Active);
        assert_eq!(physics.world().base_resets, 1);
        assert_eq!(core.tick_count(), 1);
    }

    #[test]
    fn test_panel_reset() {
        let (mut core, physics, _controller) = core_with(quick_config(1));
        core.reset().unwrap();
        for _ in 0..5 {
            core.tick().unwrap();
        }
        core.handle_panel(PanelEvents {
            reset: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(physics.world().base_resets, 2);
        assert_eq!(core.tick_count(), 0);
        assert_eq!(core.context().metrics.snapshot().resets, 2);
    }

    #[test]
    fn test_failed_panel_reset_still_forwards_power_switch() {
        let (mut core, physics, controller) = core_with(CoreConfig {
            warmup_ticks: 1,
            settle_ticks: 0,
            ..Default::default()
        });
        core.reset().unwrap();
        controller.clear_events();

        physics.with_world(|world| world.fail_next_step = true);
        let result = core.handle_panel(PanelEvents {
            reset: true,
            low_energy: true,
            ..Default::default()
        });

        assert!(matches!(result, Err(DriverError::Physics(_))));
        assert_eq!(
            controller.events().last(),
            Some(&ControllerEvent::SetMode(1))
        );
        let ctx = core.context();
        assert_eq!(ctx.mode.lifecycle(), LifecycleState::Idle);
        assert_eq!(ctx.mode.power(), PowerMode::LowEnergy);
        let snapshot = ctx.metrics.snapshot();
        assert_eq!(snapshot.resets, 2);
        assert_eq!(snapshot.reset_failures, 1);
    }

    #[test]
    fn test_failed_reset_clears_prev_velocity() {
        let (mut core, physics, _controller) = core_with(quick_config(1));
        core.reset().unwrap();
        physics.with_world(|world| world.twist.linear = [0.5, 0.0, 0.0]);
        core.tick().unwrap();
        assert_eq!(core.synthesizer().prev_velocity(), [0.5, 0.0, 0.0]);

        // 关节表缩短后复位在回写关节时失败
        physics.with_world(|world| world.joints.truncate(4));
        assert!(core.reset().is_err());
        assert_eq!(core.synthesizer().prev_velocity(), [0.0, 0.0, 0.0]);
        assert_eq!(core.context().mode.lifecycle(), LifecycleState::Idle);
    }

    #[test]
    fn test_context_actuation_mismatch() {
        let ctx = Arc::new(SimContext::new(ActuationMode::PositionBlend));
        let result = ControlCore::new(
            CoreConfig::default(),
            MockPhysics::new(DEFAULT_TOTAL_JOINTS),
            ScriptedController::counting(),
            ctx,
            Arc::new(TelemetryHub::default()),
        );
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));
    }
}
