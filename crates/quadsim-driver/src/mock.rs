//! 测试用物理世界与控制器
//!
//! - [`MockPhysics`]：静止世界，`step` 不改变任何状态，记录所有调用
//! - [`ScriptedController`]：按脚本输出，记录所有调用
//!
//! 两者内部状态共享（`Clone` 得到同一实例的观察句柄），
//! 移交给控制线程后仍可在测试线程中检查。

use crate::controller::GaitController;
use crate::error::{ControllerError, PhysicsError};
use crate::physics::{JointMap, PhysicsBackend};
use parking_lot::Mutex;
use quadsim_protocol::{
    BasePose, BaseTwist, ControllerCommand, ImuPacket, JointArray, JointState, LegPacket,
    StanceGains, TorqueFrame, VelocityCommand,
};
use std::sync::Arc;
use std::time::Duration;

// ==================== MockPhysics ====================

/// 静止世界的状态
#[derive(Debug, Clone, PartialEq)]
pub struct MockWorld {
    /// 机体位姿
    pub pose: BasePose,
    /// 机体速度
    pub twist: BaseTwist,
    /// 全部引擎关节状态
    pub joints: Vec<JointState>,
    /// 已释放默认电机的关节
    pub motors_disabled: Vec<bool>,
    /// 步进次数
    pub steps: u64,
    /// `reset_base` 调用次数
    pub base_resets: u64,
    /// `apply_torques` 调用次数
    pub torque_applications: u64,
    /// 最近一次施加的力矩（按引擎索引）
    pub last_forces: Vec<f64>,
    /// 下一次 `step` 返回错误
    pub fail_next_step: bool,
}

/// 静止物理世界
#[derive(Debug, Clone)]
pub struct MockPhysics {
    world: Arc<Mutex<MockWorld>>,
}

impl MockPhysics {
    /// 创建含 `total_joints` 个关节的世界
    pub fn new(total_joints: usize) -> Self {
        Self {
            world: Arc::new(Mutex::new(MockWorld {
                pose: BasePose::default(),
                twist: BaseTwist::default(),
                joints: vec![JointState::default(); total_joints],
                motors_disabled: vec![false; total_joints],
                steps: 0,
                base_resets: 0,
                torque_applications: 0,
                last_forces: vec![0.0; total_joints],
                fail_next_step: false,
            })),
        }
    }

    /// 世界状态快照
    pub fn world(&self) -> MockWorld {
        self.world.lock().clone()
    }

    /// 修改世界状态
    pub fn with_world<R>(&self, f: impl FnOnce(&mut MockWorld) -> R) -> R {
        f(&mut self.world.lock())
    }

    fn check(world: &MockWorld, id: usize) -> Result<(), PhysicsError> {
        if id < world.joints.len() {
            Ok(())
        } else {
            Err(PhysicsError::UnknownJoint(id))
        }
    }
}

impl PhysicsBackend for MockPhysics {
    fn step(&mut self) -> Result<(), PhysicsError> {
        let mut world = self.world.lock();
        if world.fail_next_step {
            world.fail_next_step = false;
            return Err(PhysicsError::Backend("scripted step failure".to_string()));
        }
        world.steps += 1;
        Ok(())
    }

    fn reset_base(&mut self, pose: &BasePose, twist: &BaseTwist) -> Result<(), PhysicsError> {
        let mut world = self.world.lock();
        world.pose = *pose;
        world.twist = *twist;
        world.base_resets += 1;
        Ok(())
    }

    fn base_state(&self) -> Result<(BasePose, BaseTwist), PhysicsError> {
        let world = self.world.lock();
        Ok((world.pose, world.twist))
    }

    fn joint_states(&self, ids: &JointMap) -> Result<JointArray<JointState>, PhysicsError> {
        let world = self.world.lock();
        for &id in ids.iter() {
            Self::check(&world, id)?;
        }
        Ok(ids.map(|id| world.joints[id]))
    }

    fn reset_joint(&mut self, id: usize, position: f64, velocity: f64) -> Result<(), PhysicsError> {
        let mut world = self.world.lock();
        Self::check(&world, id)?;
        world.joints[id] = JointState { position, velocity };
        Ok(())
    }

    fn apply_torques(
        &mut self,
        ids: &JointMap,
        forces: &JointArray<f64>,
    ) -> Result<(), PhysicsError> {
        let mut world = self.world.lock();
        for (&id, &force) in ids.iter().zip(forces.iter()) {
            Self::check(&world, id)?;
            world.last_forces[id] = force;
        }
        world.torque_applications += 1;
        Ok(())
    }

    fn disable_motor(&mut self, id: usize) -> Result<(), PhysicsError> {
        let mut world = self.world.lock();
        Self::check(&world, id)?;
        world.motors_disabled[id] = true;
        Ok(())
    }
}

// ==================== ScriptedController ====================

/// 控制器各方法调用次数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerCalls {
    /// `init`
    pub init: u64,
    /// `set_mode`
    pub set_mode: u64,
    /// `set_gait_type`
    pub set_gait_type: u64,
    /// `set_velocity_command`
    pub set_velocity: u64,
    /// `pre_step`
    pub pre_step: u64,
    /// `compute`
    pub compute: u64,
    /// `joint_command`
    pub joint_command: u64,
}

/// 控制器调用记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    /// 初始化
    Init {
        /// 控制频率
        timestep_hz: f64,
        /// 增益
        gains: StanceGains,
    },
    /// 模式码
    SetMode(i32),
    /// 步态类型
    SetGaitType(i32),
    /// 速度命令
    SetVelocity(VelocityCommand),
    /// 预热
    PreStep,
    /// 计算
    Compute,
}

#[derive(Debug, Clone, Copy)]
enum Script {
    /// 第 n 次 `compute` 输出全 n 力矩；命令为 `position = effort = n`，增益为 0
    Counting,
    /// 固定输出
    Fixed {
        torque: TorqueFrame,
        command: ControllerCommand,
    },
}

#[derive(Debug)]
struct ScriptState {
    script: Script,
    available: bool,
    calls: ControllerCalls,
    events: Vec<ControllerEvent>,
    torque_override: Option<f64>,
    delay: Duration,
    fail_compute: bool,
}

/// 脚本控制器
#[derive(Debug, Clone)]
pub struct ScriptedController {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedController {
    fn with_script(script: Script, available: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                script,
                available,
                calls: ControllerCalls::default(),
                events: Vec::new(),
                torque_override: None,
                delay: Duration::ZERO,
                fail_compute: false,
            })),
        }
    }

    /// 计数输出控制器
    pub fn counting() -> Self {
        Self::with_script(Script::Counting, true)
    }

    /// 固定输出控制器
    pub fn fixed(torque: TorqueFrame, command: ControllerCommand) -> Self {
        Self::with_script(Script::Fixed { torque, command }, true)
    }

    /// 不可用的控制器（`init` 失败）
    pub fn unavailable() -> Self {
        Self::with_script(Script::Counting, false)
    }

    /// 调用次数
    pub fn calls(&self) -> ControllerCalls {
        self.state.lock().calls
    }

    /// 调用记录
    pub fn events(&self) -> Vec<ControllerEvent> {
        self.state.lock().events.clone()
    }

    /// 清空调用记录
    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    /// 以固定值覆盖力矩输出
    pub fn set_torque_override(&self, value: Option<f64>) {
        self.state.lock().torque_override = value;
    }

    /// 每次 `compute` 额外耗时
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = delay;
    }

    /// `compute` 返回错误
    pub fn set_fail_compute(&self, fail: bool) {
        self.state.lock().fail_compute = fail;
    }
}

impl GaitController for ScriptedController {
    fn init(&mut self, timestep_hz: f64, gains: &StanceGains) -> Result<(), ControllerError> {
        let mut state = self.state.lock();
        if !state.available {
            return Err(ControllerError::Load {
                path: "scripted".to_string(),
                reason: "controller unavailable".to_string(),
            });
        }
        state.calls.init += 1;
        state.events.push(ControllerEvent::Init {
            timestep_hz,
            gains: *gains,
        });
        Ok(())
    }

    fn set_mode(&mut self, code: i32) -> Result<(), ControllerError> {
        let mut state = self.state.lock();
        state.calls.set_mode += 1;
        state.events.push(ControllerEvent::SetMode(code));
        Ok(())
    }

    fn set_gait_type(&mut self, code: i32) -> Result<(), ControllerError> {
        let mut state = self.state.lock();
        state.calls.set_gait_type += 1;
        state.events.push(ControllerEvent::SetGaitType(code));
        Ok(())
    }

    fn set_velocity_command(&mut self, command: &VelocityCommand) -> Result<(), ControllerError> {
        let mut state = self.state.lock();
        state.calls.set_velocity += 1;
        state.events.push(ControllerEvent::SetVelocity(*command));
        Ok(())
    }

    fn pre_step(&mut self, _imu: &ImuPacket, _legs: &LegPacket) -> Result<(), ControllerError> {
        let mut state = self.state.lock();
        state.calls.pre_step += 1;
        state.events.push(ControllerEvent::PreStep);
        Ok(())
    }

    fn compute(
        &mut self,
        _imu: &ImuPacket,
        _legs: &LegPacket,
    ) -> Result<TorqueFrame, ControllerError> {
        let delay = self.state.lock().delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.state.lock();
        if state.fail_compute {
            return Err(ControllerError::Backend("scripted compute failure".to_string()));
        }
        state.calls.compute += 1;
        state.events.push(ControllerEvent::Compute);

        if let Some(value) = state.torque_override {
            return Ok(TorqueFrame {
                eff: JointArray::splat(value),
            });
        }
        Ok(match state.script {
            Script::Counting => TorqueFrame {
                eff: JointArray::splat(state.calls.compute as f64),
            },
            Script::Fixed { torque, .. } => torque,
        })
    }

    fn joint_command(&mut self) -> Result<ControllerCommand, ControllerError> {
        let mut state = self.state.lock();
        state.calls.joint_command += 1;
        Ok(match state.script {
            Script::Counting => {
                let n = state.calls.compute as f64;
                ControllerCommand {
                    position: JointArray::splat(n),
                    effort: JointArray::splat(n),
                    ..Default::default()
                }
            },
            Script::Fixed { command, .. } => command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_physics_is_static() {
        let mut physics = MockPhysics::new(16);
        physics
            .reset_base(&BasePose::at_height(0.3), &BaseTwist::default())
            .unwrap();
        physics.step().unwrap();
        physics.step().unwrap();
        let (pose, _) = physics.base_state().unwrap();
        assert_eq!(pose, BasePose::at_height(0.3));
        assert_eq!(physics.world().steps, 2);
    }

    #[test]
    fn test_mock_physics_rejects_unknown_joint() {
        let mut physics = MockPhysics::new(4);
        assert_eq!(physics.disable_motor(4), Err(PhysicsError::UnknownJoint(4)));
    }

    #[test]
    fn test_scripted_controller_shares_state() {
        let probe = ScriptedController::counting();
        let mut controller = probe.clone();
        let torque = controller.compute(&[0.0; 10], &[0.0; 24]).unwrap();
        assert_eq!(torque.eff[0], 1.0);
        assert_eq!(probe.calls().compute, 1);
        assert_eq!(probe.events(), vec![ControllerEvent::Compute]);
    }

    #[test]
    fn test_unavailable_controller_fails_init() {
        let mut controller = ScriptedController::unavailable();
        assert!(controller.init(500.0, &StanceGains::default()).is_err());
    }
}
