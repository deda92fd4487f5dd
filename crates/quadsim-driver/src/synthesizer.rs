//! 状态合成
//!
//! 从物理引擎原始状态合成控制器需要的 IMU 与关节反馈：
//!
//! - 姿态直接拷贝
//! - 角速度：`ω_body = R⁻¹ · ω_world`
//! - 线加速度：`a_body = R⁻¹ · (Δv / dt + [0, 0, g])`，`Δv` 为与上一 tick 的世界系速度差
//!
//! 上一 tick 速度只在进入 Settling 时清零（[`StateSynthesizer::reset`]），
//! `synthesize` 本身不做特殊处理。

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use quadsim_protocol::{InertialFrame, JointFeedback, SimulatorState};

/// 默认重力加速度（m/s²）
pub const DEFAULT_GRAVITY: f64 = 9.8;

/// 一次合成的输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesizedState {
    /// 合成 IMU
    pub inertial: InertialFrame,
    /// 关节反馈
    pub joints: JointFeedback,
    /// 机体世界系位置
    pub position: [f64; 3],
}

/// 状态合成器
#[derive(Debug, Clone)]
pub struct StateSynthesizer {
    dt: f64,
    gravity: f64,
    prev_velocity: Vector3<f64>,
}

impl StateSynthesizer {
    /// 创建合成器
    ///
    /// `frequency_hz` 为物理步进频率，`dt = 1 / frequency_hz`。
    pub fn new(frequency_hz: f64, gravity: f64) -> Self {
        Self {
            dt: 1.0 / frequency_hz,
            gravity,
            prev_velocity: Vector3::zeros(),
        }
    }

    /// 步长（秒）
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// 上一 tick 的世界系线速度
    pub fn prev_velocity(&self) -> [f64; 3] {
        [self.prev_velocity.x, self.prev_velocity.y, self.prev_velocity.z]
    }

    /// 清零上一 tick 速度（进入 Settling 时调用）
    pub fn reset(&mut self) {
        self.prev_velocity = Vector3::zeros();
    }

    /// 合成当前 tick 的 IMU 与关节反馈，并记录当前速度
    pub fn synthesize(&mut self, state: &SimulatorState) -> SynthesizedState {
        let [qx, qy, qz, qw] = state.pose.orientation;
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz));

        let velocity = Vector3::from(state.twist.linear);
        let omega_world = Vector3::from(state.twist.angular);

        let specific_force =
            (velocity - self.prev_velocity) / self.dt + Vector3::new(0.0, 0.0, self.gravity);
        let acceleration = rotation.inverse_transform_vector(&specific_force);
        let omega_body = rotation.inverse_transform_vector(&omega_world);

        self.prev_velocity = velocity;

        SynthesizedState {
            inertial: InertialFrame {
                linear_acceleration: acceleration.into(),
                angular_velocity: omega_body.into(),
                orientation: state.pose.orientation,
            },
            joints: JointFeedback::from_states(&state.joints),
            position: state.pose.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quadsim_protocol::{BasePose, BaseTwist, JointArray, JointState};

    fn still(z: f64) -> SimulatorState {
        SimulatorState {
            pose: BasePose::at_height(z),
            twist: BaseTwist::default(),
            joints: JointArray::splat(JointState::default()),
        }
    }

    #[test]
    fn test_static_equilibrium_reads_gravity() {
        let mut synthesizer = StateSynthesizer::new(500.0, DEFAULT_GRAVITY);
        let out = synthesizer.synthesize(&still(0.3));
        assert_eq!(out.inertial.linear_acceleration, [0.0, 0.0, 9.8]);
        assert_eq!(out.inertial.angular_velocity, [0.0, 0.0, 0.0]);
        assert_eq!(out.inertial.orientation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(out.position, [0.0, 0.0, 0.3]);
    }

    #[test]
    fn test_acceleration_from_velocity_difference() {
        let mut synthesizer = StateSynthesizer::new(100.0, DEFAULT_GRAVITY);
        let mut state = still(0.3);
        state.twist.linear = [0.1, 0.0, 0.0];
        let out = synthesizer.synthesize(&state);
        assert_relative_eq!(out.inertial.linear_acceleration[0], 10.0, epsilon = 1e-9);
        assert_relative_eq!(out.inertial.linear_acceleration[2], 9.8, epsilon = 1e-12);
        assert_eq!(synthesizer.prev_velocity(), [0.1, 0.0, 0.0]);

        // 匀速：加速度回到重力
        let out = synthesizer.synthesize(&state);
        assert_relative_eq!(out.inertial.linear_acceleration[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_body_frame_rotation() {
        // 绕 X 轴翻转 180°：世界 +Z 在机体系下为 -Z
        let mut synthesizer = StateSynthesizer::new(500.0, DEFAULT_GRAVITY);
        let mut state = still(0.3);
        state.pose.orientation = [1.0, 0.0, 0.0, 0.0];
        state.twist.angular = [0.0, 0.0, 1.0];
        let out = synthesizer.synthesize(&state);
        assert_relative_eq!(out.inertial.linear_acceleration[2], -9.8, epsilon = 1e-12);
        assert_relative_eq!(out.inertial.angular_velocity[2], -1.0, epsilon = 1e-12);
        assert_eq!(out.inertial.orientation, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_yaw_rotates_acceleration() {
        // 偏航 90°：世界 +X 加速度在机体系下为 -Y
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let mut synthesizer = StateSynthesizer::new(10.0, DEFAULT_GRAVITY);
        let mut state = still(0.3);
        state.pose.orientation = [0.0, 0.0, s, s];
        state.twist.linear = [1.0, 0.0, 0.0];
        let out = synthesizer.synthesize(&state);
        assert_relative_eq!(out.inertial.linear_acceleration[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(out.inertial.linear_acceleration[1], -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_clears_previous_velocity() {
        let mut synthesizer = StateSynthesizer::new(500.0, DEFAULT_GRAVITY);
        let mut state = still(0.3);
        state.twist.linear = [0.5, 0.2, -0.1];
        synthesizer.synthesize(&state);
        assert_ne!(synthesizer.prev_velocity(), [0.0; 3]);

        synthesizer.reset();
        assert_eq!(synthesizer.prev_velocity(), [0.0; 3]);
    }

    #[test]
    fn test_joint_feedback_copied() {
        let mut synthesizer = StateSynthesizer::new(500.0, DEFAULT_GRAVITY);
        let mut state = still(0.3);
        state.joints[4] = JointState {
            position: -0.8,
            velocity: 0.25,
        };
        let out = synthesizer.synthesize(&state);
        assert_eq!(out.joints.position[4], -0.8);
        assert_eq!(out.joints.velocity[4], 0.25);
    }
}
