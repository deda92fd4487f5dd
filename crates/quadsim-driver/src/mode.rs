//! 仿真模式状态（线程间共享）
//!
//! 生命周期与功率模式由控制线程写入、任意线程读取，使用原子操作存储。
//! 驱动方式在构建时确定，运行期间不可变。

use quadsim_protocol::{ActuationMode, LifecycleState, PowerMode, SimulationModeState};
use std::sync::atomic::{AtomicU8, Ordering};

/// 生命周期（原子版本）
#[derive(Debug)]
pub struct AtomicLifecycle {
    inner: AtomicU8,
}

impl AtomicLifecycle {
    /// 创建新的原子状态
    pub fn new(state: LifecycleState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    /// 获取当前状态
    pub fn get(&self, ordering: Ordering) -> LifecycleState {
        LifecycleState::from_u8(self.inner.load(ordering))
    }

    /// 设置状态
    pub fn set(&self, state: LifecycleState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }
}

impl Default for AtomicLifecycle {
    fn default() -> Self {
        Self::new(LifecycleState::Idle)
    }
}

/// 功率模式（原子版本）
#[derive(Debug)]
pub struct AtomicPowerMode {
    inner: AtomicU8,
}

impl AtomicPowerMode {
    /// 创建新的原子模式
    pub fn new(mode: PowerMode) -> Self {
        Self {
            inner: AtomicU8::new(mode.as_u8()),
        }
    }

    /// 获取当前模式
    pub fn get(&self, ordering: Ordering) -> PowerMode {
        PowerMode::from_u8(self.inner.load(ordering))
    }

    /// 设置模式，返回旧模式
    pub fn swap(&self, mode: PowerMode, ordering: Ordering) -> PowerMode {
        PowerMode::from_u8(self.inner.swap(mode.as_u8(), ordering))
    }
}

impl Default for AtomicPowerMode {
    fn default() -> Self {
        Self::new(PowerMode::Normal)
    }
}

/// 共享模式状态
#[derive(Debug)]
pub struct ModeState {
    lifecycle: AtomicLifecycle,
    power: AtomicPowerMode,
    actuation: ActuationMode,
}

impl ModeState {
    /// 创建（Idle / Normal）
    pub fn new(actuation: ActuationMode) -> Self {
        Self {
            lifecycle: AtomicLifecycle::default(),
            power: AtomicPowerMode::default(),
            actuation,
        }
    }

    /// 生命周期
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle.get(Ordering::Acquire)
    }

    /// 功率模式
    pub fn power(&self) -> PowerMode {
        self.power.get(Ordering::Acquire)
    }

    /// 驱动方式
    pub fn actuation(&self) -> ActuationMode {
        self.actuation
    }

    /// 复位失败，回到 Idle
    pub(crate) fn enter_idle(&self) {
        self.power.swap(PowerMode::Normal, Ordering::AcqRel);
        self.lifecycle.set(LifecycleState::Idle, Ordering::Release);
    }

    /// 进入 Settling（复位开始）
    ///
    /// 复位期间以低能耗模式运行。
    pub(crate) fn enter_settling(&self) {
        self.lifecycle.set(LifecycleState::Settling, Ordering::Release);
        self.power.swap(PowerMode::LowEnergy, Ordering::AcqRel);
    }

    /// 进入 Active（复位完成）
    pub(crate) fn enter_active(&self) {
        self.power.swap(PowerMode::Normal, Ordering::AcqRel);
        self.lifecycle.set(LifecycleState::Active, Ordering::Release);
    }

    /// 切换功率模式，返回旧模式
    pub(crate) fn set_power(&self, mode: PowerMode) -> PowerMode {
        self.power.swap(mode, Ordering::AcqRel)
    }

    /// 一致性快照
    pub fn snapshot(&self) -> SimulationModeState {
        SimulationModeState {
            lifecycle: self.lifecycle(),
            actuation: self.actuation,
            power: self.power(),
        }
    }
}
