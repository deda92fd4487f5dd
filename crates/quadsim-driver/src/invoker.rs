//! 降频控制器调用
//!
//! 物理以 `f` Hz 步进，控制器只在 `tick mod D == 0` 的 tick 上调用，
//! 其余 tick 复用上一次的输出（零阶保持）。

use crate::controller::GaitController;
use crate::error::ControllerError;
use quadsim_protocol::{ControllerCommand, ImuPacket, LegPacket, TorqueFrame};
use std::time::{Duration, Instant};

/// 一次 `step` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// 本 tick 不调用控制器，沿用保持值
    Held,
    /// 本 tick 调用了控制器
    Invoked {
        /// 调用耗时
        elapsed: Duration,
        /// 是否超出预算
        over_budget: bool,
    },
}

impl Invocation {
    /// 是否调用了控制器
    pub fn invoked(&self) -> bool {
        matches!(self, Invocation::Invoked { .. })
    }
}

/// 降频调用器
#[derive(Debug, Clone)]
pub struct ControllerInvoker {
    divisor: u64,
    budget: Duration,
    command: ControllerCommand,
    torque: TorqueFrame,
}

impl ControllerInvoker {
    /// 创建调用器
    ///
    /// `divisor` 必须 ≥ 1（在配置校验阶段保证），传入 0 时按 1 处理。
    pub fn new(divisor: u32, budget: Duration) -> Self {
        Self {
            divisor: divisor.max(1) as u64,
            budget,
            command: ControllerCommand::default(),
            torque: TorqueFrame::default(),
        }
    }

    /// 降频因子 D
    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// 单次调用预算
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// 本 tick 是否需要调用控制器
    pub fn is_invocation_tick(&self, tick: u64) -> bool {
        tick % self.divisor == 0
    }

    /// 当前保持的逐关节命令
    pub fn command(&self) -> &ControllerCommand {
        &self.command
    }

    /// 当前保持的力矩
    pub fn torque(&self) -> &TorqueFrame {
        &self.torque
    }

    /// 清空保持值（复位时调用）
    pub fn clear(&mut self) {
        self.command = ControllerCommand::default();
        self.torque = TorqueFrame::default();
    }

    /// 推进一个 tick
    ///
    /// 调用 tick 上依次调用 `compute` 与 `joint_command` 并保存两者；
    /// 任一调用失败或返回非有限值时保持值不变。
    pub fn step<C: GaitController + ?Sized>(
        &mut self,
        controller: &mut C,
        tick: u64,
        imu: &ImuPacket,
        legs: &LegPacket,
    ) -> Result<Invocation, ControllerError> {
        if !self.is_invocation_tick(tick) {
            return Ok(Invocation::Held);
        }

        let start = Instant::now();
        let torque = controller.compute(imu, legs)?;
        let command = controller.joint_command()?;
        let elapsed = start.elapsed();

        if !torque.eff.is_finite() {
            return Err(ControllerError::NonFinite("compute"));
        }
        if ![
            &command.position,
            &command.velocity,
            &command.kp,
            &command.kd,
            &command.effort,
        ]
        .iter()
        .all(|a| a.is_finite())
        {
            return Err(ControllerError::NonFinite("joint_command"));
        }

        self.torque = torque;
        self.command = command;
        Ok(Invocation::Invoked {
            elapsed,
            over_budget: elapsed > self.budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedController;
    use proptest::prelude::*;

    const IMU: ImuPacket = [0.0, 0.0, 9.8, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
    const LEGS: LegPacket = [0.0; 24];

    #[test]
    fn test_divisor_four_over_eight_ticks() {
        let mut controller = ScriptedController::counting();
        let mut invoker = ControllerInvoker::new(4, Duration::from_secs(1));

        let mut torques = Vec::new();
        for tick in 0..8 {
            invoker.step(&mut controller, tick, &IMU, &LEGS).unwrap();
            torques.push(invoker.torque().eff[0]);
        }

        assert_eq!(controller.calls().compute, 2);
        // 第 n 次调用输出 n：tick 1-3 沿用 tick 0，tick 5-7 沿用 tick 4
        assert_eq!(torques, vec![1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_divisor_one_invokes_every_tick() {
        let mut controller = ScriptedController::counting();
        let mut invoker = ControllerInvoker::new(1, Duration::from_secs(1));
        for tick in 0..5 {
            assert!(invoker.step(&mut controller, tick, &IMU, &LEGS).unwrap().invoked());
        }
        assert_eq!(controller.calls().compute, 5);
        assert_eq!(controller.calls().joint_command, 5);
    }

    #[test]
    fn test_zero_divisor_clamped() {
        let invoker = ControllerInvoker::new(0, Duration::from_secs(1));
        assert_eq!(invoker.divisor(), 1);
    }

    #[test]
    fn test_clear_resets_held_output() {
        let mut controller = ScriptedController::counting();
        let mut invoker = ControllerInvoker::new(2, Duration::from_secs(1));
        invoker.step(&mut controller, 0, &IMU, &LEGS).unwrap();
        assert_ne!(invoker.torque(), &TorqueFrame::default());

        invoker.clear();
        assert_eq!(invoker.torque(), &TorqueFrame::default());
        assert_eq!(invoker.command(), &ControllerCommand::default());
    }

    #[test]
    fn test_non_finite_output_keeps_previous() {
        let mut controller = ScriptedController::counting();
        let mut invoker = ControllerInvoker::new(1, Duration::from_secs(1));
        invoker.step(&mut controller, 0, &IMU, &LEGS).unwrap();
        let held = *invoker.torque();

        controller.set_torque_override(Some(f64::NAN));
        let err = invoker.step(&mut controller, 1, &IMU, &LEGS).unwrap_err();
        assert_eq!(err, ControllerError::NonFinite("compute"));
        assert_eq!(invoker.torque(), &held);
    }

    #[test]
    fn test_over_budget_reported() {
        let mut controller = ScriptedController::counting();
        controller.set_delay(Duration::from_millis(5));
        let mut invoker = ControllerInvoker::new(1, Duration::from_micros(10));
        match invoker.step(&mut controller, 0, &IMU, &LEGS).unwrap() {
            Invocation::Invoked { over_budget, .. } => assert!(over_budget),
            Invocation::Held => panic!("expected invocation"),
        }
    }

    proptest! {
        #[test]
        fn prop_zero_order_hold(divisor in 1u32..16, ticks in 1u64..64) {
            let mut controller = ScriptedController::counting();
            let mut invoker = ControllerInvoker::new(divisor, Duration::from_secs(1));
            let mut previous: Option<(TorqueFrame, ControllerCommand)> = None;

            for tick in 0..ticks {
                let outcome = invoker.step(&mut controller, tick, &IMU, &LEGS).unwrap();
                prop_assert_eq!(outcome.invoked(), tick % divisor as u64 == 0);
                if let Some((torque, command)) = previous
                    && tick % divisor as u64 != 0
                {
                    prop_assert_eq!(&torque, invoker.torque());
                    prop_assert_eq!(&command, invoker.command());
                }
                previous = Some((*invoker.torque(), *invoker.command()));
            }

            let expected = ticks.div_ceil(divisor as u64);
            prop_assert_eq!(controller.calls().compute, expected);
        }
    }
}
