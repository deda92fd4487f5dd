//! 驱动力合成
//!
//! - `PositionBlend`：`f = kp'·(q_des − q) + kd'·(dq_des − dq) + τ_ff`
//! - `DirectTorque`：`f = τ`
//!
//! 控制器给出的增益使用其原生单位，施加前按 [`GainCalibration`] 缩放。

use quadsim_protocol::{ActuationMode, ControllerCommand, JointArray, JointFeedback, TorqueFrame};

/// 增益标定（控制器单位 → 仿真单位）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainCalibration {
    /// `kp' = kp / kp_divisor`
    pub kp_divisor: f64,
    /// `kd' = kd / kd_divisor`
    pub kd_divisor: f64,
}

impl Default for GainCalibration {
    fn default() -> Self {
        Self {
            kp_divisor: 100.0,
            kd_divisor: 5.0,
        }
    }
}

impl GainCalibration {
    /// 缩放后的 `(kp', kd')`
    pub fn apply(&self, command: &ControllerCommand) -> (JointArray<f64>, JointArray<f64>) {
        (
            command.kp.map(|kp| kp / self.kp_divisor),
            command.kd.map(|kd| kd / self.kd_divisor),
        )
    }
}

/// 驱动力合成器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationBlender {
    mode: ActuationMode,
    calibration: GainCalibration,
}

impl ActuationBlender {
    /// 创建合成器
    pub fn new(mode: ActuationMode, calibration: GainCalibration) -> Self {
        Self { mode, calibration }
    }

    /// 驱动方式
    pub fn mode(&self) -> ActuationMode {
        self.mode
    }

    /// 计算 12 个关节的驱动力
    pub fn blend(
        &self,
        command: &ControllerCommand,
        torque: &TorqueFrame,
        feedback: &JointFeedback,
    ) -> JointArray<f64> {
        match self.mode {
            ActuationMode::DirectTorque => torque.eff,
            ActuationMode::PositionBlend => {
                let (kp, kd) = self.calibration.apply(command);
                JointArray::new(std::array::from_fn(|i| {
                    kp[i] * (command.position[i] - feedback.position[i])
                        + kd[i] * (command.velocity[i] - feedback.velocity[i])
                        + command.effort[i]
                }))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn feedback(position: f64, velocity: f64) -> JointFeedback {
        JointFeedback {
            position: JointArray::splat(position),
            velocity: JointArray::splat(velocity),
        }
    }

    #[test]
    fn test_direct_torque_passthrough() {
        let blender = ActuationBlender::new(ActuationMode::DirectTorque, GainCalibration::default());
        let torque = TorqueFrame {
            eff: JointArray::new([1.0, -2.0, 3.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 7.0]),
        };
        let forces = blender.blend(&ControllerCommand::default(), &torque, &feedback(0.3, 0.1));
        assert_eq!(forces, torque.eff);
    }

    #[test]
    fn test_position_blend_scales_gains() {
        let blender =
            ActuationBlender::new(ActuationMode::PositionBlend, GainCalibration::default());
        let command = ControllerCommand {
            position: JointArray::splat(1.0),
            velocity: JointArray::splat(0.5),
            kp: JointArray::splat(200.0),
            kd: JointArray::splat(10.0),
            effort: JointArray::splat(0.25),
        };
        let forces = blender.blend(&command, &TorqueFrame::default(), &feedback(0.5, 0.0));
        // 2·(1 − 0.5) + 2·(0.5 − 0) + 0.25
        for f in forces.iter() {
            assert_relative_eq!(*f, 2.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_gain_blend_matches_direct_torque() {
        let effort =
            JointArray::new([0.1, -0.2, 0.3, 1.5, -2.5, 3.5, 0.0, 4.0, -4.0, 9.0, -9.0, 0.01]);
        let command = ControllerCommand {
            position: JointArray::splat(0.7),
            velocity: JointArray::splat(-0.3),
            kp: JointArray::splat(0.0),
            kd: JointArray::splat(0.0),
            effort,
        };
        let torque = TorqueFrame { eff: effort };
        let fb = feedback(-0.8, 2.0);

        let blended = ActuationBlender::new(ActuationMode::PositionBlend, GainCalibration::default())
            .blend(&command, &torque, &fb);
        let direct = ActuationBlender::new(ActuationMode::DirectTorque, GainCalibration::default())
            .blend(&command, &torque, &fb);
        assert_eq!(blended, direct);
    }

    #[test]
    fn test_custom_calibration() {
        let calibration = GainCalibration {
            kp_divisor: 1.0,
            kd_divisor: 1.0,
        };
        let command = ControllerCommand {
            kp: JointArray::splat(3.0),
            kd: JointArray::splat(4.0),
            ..Default::default()
        };
        let (kp, kd) = calibration.apply(&command);
        assert_eq!(kp[0], 3.0);
        assert_eq!(kd[11], 4.0);
    }
}
