//! 线程间共享状态
//!
//! 控制线程每个 tick 写入位姿与 IMU 快照（`ArcSwap`，无锁读取），
//! 感知线程和外部调用方只读。命令邮箱由分发线程写入、控制线程取出。

use crate::mailbox::CommandMailboxes;
use crate::metrics::SimulationMetrics;
use crate::mode::ModeState;
use arc_swap::ArcSwap;
use quadsim_protocol::{ActuationMode, BasePose, InertialFrame, JointFeedback};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 一个 tick 的对外快照
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickSnapshot {
    /// tick 序号（复位时清零）
    pub tick: u64,
    /// 机体位姿
    pub pose: BasePose,
    /// 合成 IMU
    pub inertial: InertialFrame,
    /// 关节反馈
    pub joints: JointFeedback,
}

/// 共享上下文
pub struct SimContext {
    /// 最近一个 tick 的快照
    pub snapshot: ArcSwap<TickSnapshot>,
    /// 模式状态
    pub mode: ModeState,
    /// 运行指标
    pub metrics: SimulationMetrics,
    /// 命令邮箱
    pub mailboxes: CommandMailboxes,
    /// 已发布快照数（用于等待新数据）
    published: AtomicU64,
}

impl SimContext {
    /// 创建上下文
    pub fn new(actuation: ActuationMode) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(TickSnapshot::default()),
            mode: ModeState::new(actuation),
            metrics: SimulationMetrics::new(),
            mailboxes: CommandMailboxes::new(),
            published: AtomicU64::new(0),
        }
    }

    /// 发布新快照
    pub(crate) fn publish(&self, snapshot: TickSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
        self.published.fetch_add(1, Ordering::Release);
    }

    /// 最近的快照
    pub fn latest(&self) -> TickSnapshot {
        **self.snapshot.load()
    }

    /// 最近的机体位姿
    pub fn pose(&self) -> BasePose {
        self.snapshot.load().pose
    }

    /// 已发布快照数
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for SimContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimContext")
            .field("snapshot", &self.latest())
            .field("mode", &self.mode.snapshot())
            .field("published", &self.published())
            .finish()
    }
}
