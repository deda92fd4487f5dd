//! 仿真桥运行指标
//!
//! 原子计数器，任意线程可读，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 运行指标
#[derive(Debug, Default)]
pub struct SimulationMetrics {
    /// 控制 tick 总数（含复位期间）
    pub ticks: AtomicU64,

    /// 控制器调用次数（降频 tick）
    pub controller_invocations: AtomicU64,

    /// 控制器单次调用超出预算的次数
    ///
    /// 不会中断调用，只用于观测。
    pub controller_overruns: AtomicU64,

    /// 控制器调用失败次数
    pub controller_errors: AtomicU64,

    /// 控制循环超时（错过锚点）次数
    pub loop_overruns: AtomicU64,

    /// 复位次数
    pub resets: AtomicU64,

    /// 复位失败次数（失败后回到 Idle）
    pub reset_failures: AtomicU64,

    /// 已应用的外部命令数
    pub commands_applied: AtomicU64,

    /// 被拒绝的外部命令数（载荷无效）
    pub commands_rejected: AtomicU64,

    /// 邮箱中被新值覆盖的命令数
    pub commands_overwritten: AtomicU64,

    /// 物理引擎错误次数
    pub physics_errors: AtomicU64,

    /// 相机帧数
    pub camera_frames: AtomicU64,

    /// 相机采集失败次数
    pub camera_errors: AtomicU64,

    /// 累计输出点数
    pub points_emitted: AtomicU64,
}

impl SimulationMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            controller_invocations: self.controller_invocations.load(Ordering::Relaxed),
            controller_overruns: self.controller_overruns.load(Ordering::Relaxed),
            controller_errors: self.controller_errors.load(Ordering::Relaxed),
            loop_overruns: self.loop_overruns.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            reset_failures: self.reset_failures.load(Ordering::Relaxed),
            commands_applied: self.commands_applied.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            commands_overwritten: self.commands_overwritten.load(Ordering::Relaxed),
            physics_errors: self.physics_errors.load(Ordering::Relaxed),
            camera_frames: self.camera_frames.load(Ordering::Relaxed),
            camera_errors: self.camera_errors.load(Ordering::Relaxed),
            points_emitted: self.points_emitted.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// 控制 tick 总数
    pub ticks: u64,
    /// 控制器调用次数
    pub controller_invocations: u64,
    /// 控制器超预算次数
    pub controller_overruns: u64,
    /// 控制器错误次数
    pub controller_errors: u64,
    /// 控制循环超时次数
    pub loop_overruns: u64,
    /// 复位次数
    pub resets: u64,
    /// 复位失败次数
    pub reset_failures: u64,
    /// 已应用命令数
    pub commands_applied: u64,
    /// 被拒绝命令数
    pub commands_rejected: u64,
    /// 被覆盖命令数
    pub commands_overwritten: u64,
    /// 物理引擎错误次数
    pub physics_errors: u64,
    /// 相机帧数
    pub camera_frames: u64,
    /// 相机错误次数
    pub camera_errors: u64,
    /// 累计输出点数
    pub points_emitted: u64,
}

impl MetricsSnapshot {
    /// 实际降频比（tick / 调用），无调用时返回 0.0
    pub fn effective_divisor(&self) -> f64 {
        if self.controller_invocations == 0 {
            return 0.0;
        }
        self.ticks as f64 / self.controller_invocations as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metrics_default() {
        let snapshot = SimulationMetrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
        assert_eq!(snapshot.effective_divisor(), 0.0);
    }

    #[test]
    fn test_metrics_concurrent_increment() {
        let metrics = Arc::new(SimulationMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.ticks.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        metrics.controller_invocations.fetch_add(1000, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 4000);
        assert_eq!(snapshot.effective_divisor(), 4.0);
    }
}
