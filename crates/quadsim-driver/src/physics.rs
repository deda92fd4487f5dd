//! 物理引擎接口
//!
//! 引擎使用自己的关节索引；[`JointMap`] 把 12 个规范关节映射到引擎索引。
//! 引擎中可能存在不受控的附加关节（如足端固定关节），复位时的
//! 电机释放按 `0..total_joints` 遍历全部引擎关节。

use crate::error::PhysicsError;
use quadsim_protocol::{
    BasePose, BaseTwist, JointArray, JointId, JointState, NUM_JOINTS, SimulatorState,
};

/// 默认关节映射（每条腿后跟一个足端固定关节，故跳过 3/7/11/15）
pub const DEFAULT_JOINT_MAP: [usize; NUM_JOINTS] = [0, 1, 2, 4, 5, 6, 8, 9, 10, 12, 13, 14];

/// 默认引擎关节总数
pub const DEFAULT_TOTAL_JOINTS: usize = 16;

/// 规范关节 → 引擎关节索引
pub type JointMap = JointArray<usize>;

/// 默认关节映射
pub fn default_joint_map() -> JointMap {
    JointArray::new(DEFAULT_JOINT_MAP)
}

/// 物理引擎
///
/// 由控制线程独占，每个 tick 读取一次状态、施加一次力矩、步进一次。
pub trait PhysicsBackend: Send {
    /// 步进一个固定时间步
    fn step(&mut self) -> Result<(), PhysicsError>;

    /// 重置机体位姿与速度
    fn reset_base(&mut self, pose: &BasePose, twist: &BaseTwist) -> Result<(), PhysicsError>;

    /// 机体位姿与速度（世界系）
    fn base_state(&self) -> Result<(BasePose, BaseTwist), PhysicsError>;

    /// 读取指定引擎关节的状态
    fn joint_states(&self, ids: &JointMap) -> Result<JointArray<JointState>, PhysicsError>;

    /// 重置单个关节
    fn reset_joint(&mut self, id: usize, position: f64, velocity: f64) -> Result<(), PhysicsError>;

    /// 以力矩模式施加驱动力
    fn apply_torques(&mut self, ids: &JointMap, forces: &JointArray<f64>)
    -> Result<(), PhysicsError>;

    /// 释放关节默认电机（零力速度控制），使力矩控制生效
    fn disable_motor(&mut self, id: usize) -> Result<(), PhysicsError>;

    /// 读取完整原始状态
    fn read_state(&self, ids: &JointMap) -> Result<SimulatorState, PhysicsError> {
        let (pose, twist) = self.base_state()?;
        let joints = self.joint_states(ids)?;
        Ok(SimulatorState {
            pose,
            twist,
            joints,
        })
    }
}

impl<P: PhysicsBackend + ?Sized> PhysicsBackend for Box<P> {
    fn step(&mut self) -> Result<(), PhysicsError> {
        (**self).step()
    }

    fn reset_base(&mut self, pose: &BasePose, twist: &BaseTwist) -> Result<(), PhysicsError> {
        (**self).reset_base(pose, twist)
    }

    fn base_state(&self) -> Result<(BasePose, BaseTwist), PhysicsError> {
        (**self).base_state()
    }

    fn joint_states(&self, ids: &JointMap) -> Result<JointArray<JointState>, PhysicsError> {
        (**self).joint_states(ids)
    }

    fn reset_joint(&mut self, id: usize, position: f64, velocity: f64) -> Result<(), PhysicsError> {
        (**self).reset_joint(id, position, velocity)
    }

    fn apply_torques(
        &mut self,
        ids: &JointMap,
        forces: &JointArray<f64>,
    ) -> Result<(), PhysicsError> {
        (**self).apply_torques(ids, forces)
    }

    fn disable_motor(&mut self, id: usize) -> Result<(), PhysicsError> {
        (**self).disable_motor(id)
    }
}

/// 校验关节映射：索引互不相同且都小于 `total_joints`
pub fn validate_joint_map(map: &JointMap, total_joints: usize) -> Result<(), PhysicsError> {
    for (i, &id) in map.iter().enumerate() {
        if id >= total_joints {
            return Err(PhysicsError::UnknownJoint(id));
        }
        if map.iter().skip(i + 1).any(|&other| other == id) {
            let joint = JointId::from_index(i)
                .map(|j| j.to_string())
                .unwrap_or_else(|| i.to_string());
            return Err(PhysicsError::InvalidState(format!(
                "engine joint {} mapped twice (first at {})",
                id, joint
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_joint_map_valid() {
        assert!(validate_joint_map(&default_joint_map(), DEFAULT_TOTAL_JOINTS).is_ok());
    }

    #[test]
    fn test_joint_map_out_of_range() {
        assert_eq!(
            validate_joint_map(&default_joint_map(), 12),
            Err(PhysicsError::UnknownJoint(12))
        );
    }

    #[test]
    fn test_joint_map_duplicate() {
        let mut map = default_joint_map();
        map[1] = 0;
        assert!(matches!(
            validate_joint_map(&map, DEFAULT_TOTAL_JOINTS),
            Err(PhysicsError::InvalidState(_))
        ));
    }
}
