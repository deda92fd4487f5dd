//! 外部步态控制器接口
//!
//! 调用约定固定（数组长度不可变）：
//!
//! 1. `init(timestep_hz, gains)`：每次复位都重新初始化
//! 2. `pre_step(imu, legs)`：复位预热阶段，只更新控制器内部估计
//! 3. `compute(imu, legs)`：计算力矩
//! 4. `joint_command()`：读取最近一次 `compute` 对应的逐关节命令
//!
//! `set_mode` / `set_gait_type` / `set_velocity_command` 可在任意 tick 调用，
//! 但只允许控制线程调用（控制器不保证线程安全）。

use crate::error::ControllerError;
use quadsim_protocol::{
    ControllerCommand, ImuPacket, LegPacket, StanceGains, TorqueFrame, VelocityCommand,
};

/// 外部步态控制器
pub trait GaitController: Send {
    /// 初始化（或重新初始化）控制器
    fn init(&mut self, timestep_hz: f64, gains: &StanceGains) -> Result<(), ControllerError>;

    /// 设置模式码（1 = 低能耗，0 = 高性能/正常）
    fn set_mode(&mut self, code: i32) -> Result<(), ControllerError>;

    /// 设置步态类型
    fn set_gait_type(&mut self, code: i32) -> Result<(), ControllerError>;

    /// 设置机体速度命令
    fn set_velocity_command(&mut self, command: &VelocityCommand) -> Result<(), ControllerError>;

    /// 预热（只更新估计器）
    fn pre_step(&mut self, imu: &ImuPacket, legs: &LegPacket) -> Result<(), ControllerError>;

    /// 计算力矩
    fn compute(&mut self, imu: &ImuPacket, legs: &LegPacket)
    -> Result<TorqueFrame, ControllerError>;

    /// 读取逐关节命令
    fn joint_command(&mut self) -> Result<ControllerCommand, ControllerError>;
}

impl<C: GaitController + ?Sized> GaitController for Box<C> {
    fn init(&mut self, timestep_hz: f64, gains: &StanceGains) -> Result<(), ControllerError> {
        (**self).init(timestep_hz, gains)
    }

    fn set_mode(&mut self, code: i32) -> Result<(), ControllerError> {
        (**self).set_mode(code)
    }

    fn set_gait_type(&mut self, code: i32) -> Result<(), ControllerError> {
        (**self).set_gait_type(code)
    }

    fn set_velocity_command(&mut self, command: &VelocityCommand) -> Result<(), ControllerError> {
        (**self).set_velocity_command(command)
    }

    fn pre_step(&mut self, imu: &ImuPacket, legs: &LegPacket) -> Result<(), ControllerError> {
        (**self).pre_step(imu, legs)
    }

    fn compute(
        &mut self,
        imu: &ImuPacket,
        legs: &LegPacket,
    ) -> Result<TorqueFrame, ControllerError> {
        (**self).compute(imu, legs)
    }

    fn joint_command(&mut self) -> Result<ControllerCommand, ControllerError> {
        (**self).joint_command()
    }
}
