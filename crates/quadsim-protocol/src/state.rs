//! 仿真状态与派生状态结构定义
//!
//! - [`SimulatorState`]：物理引擎每个 tick 提供的原始状态（只读一次）
//! - [`InertialFrame`]：由原始状态合成的 IMU 数据（机体系）
//! - [`JointFeedback`]：逐关节位置/速度反馈
//!
//! 四元数统一使用 `[x, y, z, w]` 顺序。

use crate::joint::{JointArray, NUM_JOINTS};

/// IMU 数据包长度：`[ax, ay, az, qx, qy, qz, qw, wx, wy, wz]`
pub const IMU_PACKET_LEN: usize = 10;

/// 关节数据包长度：`[q0..q11, dq0..dq11]`
pub const LEG_PACKET_LEN: usize = NUM_JOINTS * 2;

/// 发给外部控制器的 IMU 数据包
pub type ImuPacket = [f64; IMU_PACKET_LEN];

/// 发给外部控制器的关节数据包
pub type LegPacket = [f64; LEG_PACKET_LEN];

/// 机体位姿（世界系）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasePose {
    /// 位置（米）
    pub position: [f64; 3],
    /// 姿态四元数 `[x, y, z, w]`
    pub orientation: [f64; 4],
}

impl BasePose {
    /// 给定高度、单位姿态
    pub const fn at_height(z: f64) -> Self {
        Self {
            position: [0.0, 0.0, z],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Default for BasePose {
    fn default() -> Self {
        Self::at_height(0.0)
    }
}

/// 机体速度（世界系）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseTwist {
    /// 线速度（m/s）
    pub linear: [f64; 3],
    /// 角速度（rad/s）
    pub angular: [f64; 3],
}

/// 单个关节状态
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointState {
    /// 位置（rad）
    pub position: f64,
    /// 速度（rad/s）
    pub velocity: f64,
}

/// 物理引擎原始状态
///
/// 归物理引擎所有，控制线程每个 tick 读取一次。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulatorState {
    /// 机体位姿
    pub pose: BasePose,
    /// 机体速度
    pub twist: BaseTwist,
    /// 规范顺序下的 12 个驱动关节
    pub joints: JointArray<JointState>,
}

/// 合成的惯性测量帧（机体系）
///
/// `linear_acceleration` 包含重力（与真实加速度计读数一致），
/// 静止水平放置时为 `[0, 0, g]`。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InertialFrame {
    /// 线加速度（m/s²，机体系，含重力）
    pub linear_acceleration: [f64; 3],
    /// 角速度（rad/s，机体系）
    pub angular_velocity: [f64; 3],
    /// 姿态四元数 `[x, y, z, w]`
    pub orientation: [f64; 4],
}

impl InertialFrame {
    /// 展开为控制器数据包
    pub fn to_packet(&self) -> ImuPacket {
        let [ax, ay, az] = self.linear_acceleration;
        let [qx, qy, qz, qw] = self.orientation;
        let [wx, wy, wz] = self.angular_velocity;
        [ax, ay, az, qx, qy, qz, qw, wx, wy, wz]
    }

    /// 从控制器数据包还原
    pub fn from_packet(packet: &ImuPacket) -> Self {
        Self {
            linear_acceleration: [packet[0], packet[1], packet[2]],
            orientation: [packet[3], packet[4], packet[5], packet[6]],
            angular_velocity: [packet[7], packet[8], packet[9]],
        }
    }
}

impl Default for InertialFrame {
    fn default() -> Self {
        Self {
            linear_acceleration: [0.0; 3],
            angular_velocity: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// 逐关节反馈
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointFeedback {
    /// 关节位置（rad）
    pub position: JointArray<f64>,
    /// 关节速度（rad/s）
    pub velocity: JointArray<f64>,
}

impl JointFeedback {
    /// 从原始关节状态提取
    pub fn from_states(states: &JointArray<JointState>) -> Self {
        Self {
            position: states.map(|s| s.position),
            velocity: states.map(|s| s.velocity),
        }
    }

    /// 展开为控制器数据包（前 12 个为位置，后 12 个为速度）
    pub fn to_packet(&self) -> LegPacket {
        let mut packet = [0.0; LEG_PACKET_LEN];
        packet[..NUM_JOINTS].copy_from_slice(self.position.as_array());
        packet[NUM_JOINTS..].copy_from_slice(self.velocity.as_array());
        packet
    }
}

/// 里程计（发往遥测）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Odometry {
    /// 控制 tick 序号
    pub tick: u64,
    /// 机体位姿（世界系）
    pub pose: BasePose,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imu_packet_layout() {
        let frame = InertialFrame {
            linear_acceleration: [1.0, 2.0, 3.0],
            angular_velocity: [8.0, 9.0, 10.0],
            orientation: [4.0, 5.0, 6.0, 7.0],
        };
        let packet = frame.to_packet();
        assert_eq!(packet, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(InertialFrame::from_packet(&packet), frame);
    }

    #[test]
    fn test_leg_packet_layout() {
        let mut states = JointArray::splat(JointState::default());
        for i in 0..NUM_JOINTS {
            states[i] = JointState {
                position: i as f64,
                velocity: 100.0 + i as f64,
            };
        }
        let packet = JointFeedback::from_states(&states).to_packet();
        assert_eq!(packet[0], 0.0);
        assert_eq!(packet[11], 11.0);
        assert_eq!(packet[12], 100.0);
        assert_eq!(packet[23], 111.0);
    }

    #[test]
    fn test_default_orientation_is_identity() {
        assert_eq!(InertialFrame::default().orientation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(BasePose::default().orientation, [0.0, 0.0, 0.0, 1.0]);
    }
}
