//! 边沿触发输入
//!
//! 操作面板上的按钮以单调递增的计数值呈现（每按一次加一）。
//! 只有观测值严格大于上次记录值时才触发一次，长按或重复读取不会重复触发。

use std::sync::atomic::{AtomicU64, Ordering};

/// 单调计数值的上升沿检测器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeTrigger {
    last: f64,
}

impl EdgeTrigger {
    /// 以当前观测值作为基线创建
    pub fn new(initial: f64) -> Self {
        Self { last: initial }
    }

    /// 观测新值；严格增大时返回 `true` 并更新基线
    pub fn poll(&mut self, value: f64) -> bool {
        if self.last < value {
            self.last = value;
            true
        } else {
            false
        }
    }

    /// 当前基线
    pub fn last(&self) -> f64 {
        self.last
    }
}

/// 面板按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelButton {
    /// 复位
    Reset,
    /// 低能耗模式
    LowEnergy,
    /// 高性能模式
    HighPerformance,
}

/// 操作面板
///
/// 每个按钮返回一个单调不减的计数值。
pub trait ControlPanel: Send + Sync {
    /// 读取按钮当前计数
    fn read(&self, button: PanelButton) -> f64;
}

/// 原子计数实现的面板，任意线程可调用 [`press`](Self::press)
#[derive(Debug, Default)]
pub struct AtomicControlPanel {
    reset: AtomicU64,
    low_energy: AtomicU64,
    high_performance: AtomicU64,
}

impl AtomicControlPanel {
    /// 创建面板（所有计数为 0）
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, button: PanelButton) -> &AtomicU64 {
        match button {
            PanelButton::Reset => &self.reset,
            PanelButton::LowEnergy => &self.low_energy,
            PanelButton::HighPerformance => &self.high_performance,
        }
    }

    /// 按下按钮
    pub fn press(&self, button: PanelButton) {
        self.counter(button).fetch_add(1, Ordering::AcqRel);
    }
}

impl ControlPanel for AtomicControlPanel {
    fn read(&self, button: PanelButton) -> f64 {
        self.counter(button).load(Ordering::Acquire) as f64
    }
}

/// 一次轮询得到的面板事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelEvents {
    /// 请求复位
    pub reset: bool,
    /// 请求低能耗模式
    pub low_energy: bool,
    /// 请求高性能模式
    pub high_performance: bool,
}

impl PanelEvents {
    /// 是否有任何事件
    pub fn any(&self) -> bool {
        self.reset || self.low_energy || self.high_performance
    }
}

/// 面板三个按钮的边沿检测
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelEdges {
    reset: EdgeTrigger,
    low_energy: EdgeTrigger,
    high_performance: EdgeTrigger,
}

impl PanelEdges {
    /// 以面板当前读数为基线
    pub fn new<P: ControlPanel + ?Sized>(panel: &P) -> Self {
        Self {
            reset: EdgeTrigger::new(panel.read(PanelButton::Reset)),
            low_energy: EdgeTrigger::new(panel.read(PanelButton::LowEnergy)),
            high_performance: EdgeTrigger::new(panel.read(PanelButton::HighPerformance)),
        }
    }

    /// 轮询面板
    pub fn poll<P: ControlPanel + ?Sized>(&mut self, panel: &P) -> PanelEvents {
        PanelEvents {
            reset: self.reset.poll(panel.read(PanelButton::Reset)),
            low_energy: self.low_energy.poll(panel.read(PanelButton::LowEnergy)),
            high_performance: self
                .high_performance
                .poll(panel.read(PanelButton::HighPerformance)),
        }
    }
}
