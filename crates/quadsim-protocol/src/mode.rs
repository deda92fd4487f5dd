//! 仿真模式状态
//!
//! 生命周期（Idle → Settling → Active）与两个正交子模式：
//! - 驱动方式（静态配置，不在运行时切换）
//! - 功率模式（只向控制器转发模式码，从不重置物理状态）

use std::fmt;

/// 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum LifecycleState {
    /// 尚未初始化
    #[default]
    Idle = 0,
    /// 复位后稳定站姿中
    Settling = 1,
    /// 正常运行
    Active = 2,
}

impl LifecycleState {
    /// 从 u8 转换（无效值视为 Idle）
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Settling,
            2 => Self::Active,
            _ => Self::Idle,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Settling => "Settling",
            Self::Active => "Active",
        };
        f.write_str(name)
    }
}

/// 驱动方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActuationMode {
    /// 本地 PD + 前馈（模拟电机固件闭环）
    PositionBlend,
    /// 直接施加控制器力矩
    #[default]
    DirectTorque,
}

impl ActuationMode {
    /// 由 `use_position_control` 开关得到
    pub fn from_position_control(use_position_control: bool) -> Self {
        if use_position_control {
            Self::PositionBlend
        } else {
            Self::DirectTorque
        }
    }
}

/// 功率子模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PowerMode {
    /// 正常
    #[default]
    Normal = 0,
    /// 低能耗
    LowEnergy = 1,
    /// 高性能
    HighPerformance = 2,
}

impl PowerMode {
    /// 转发给控制器的模式码
    ///
    /// 控制器只区分低能耗（1）与其他（0）。
    pub const fn controller_code(self) -> i32 {
        match self {
            Self::LowEnergy => 1,
            Self::Normal | Self::HighPerformance => 0,
        }
    }

    /// 从 u8 转换（无效值视为 Normal）
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::LowEnergy,
            2 => Self::HighPerformance,
            _ => Self::Normal,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "Normal",
            Self::LowEnergy => "LowEnergy",
            Self::HighPerformance => "HighPerformance",
        };
        f.write_str(name)
    }
}

/// 完整模式状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationModeState {
    /// 生命周期
    pub lifecycle: LifecycleState,
    /// 驱动方式
    pub actuation: ActuationMode,
    /// 功率子模式
    pub power: PowerMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_codes() {
        assert_eq!(PowerMode::LowEnergy.controller_code(), 1);
        assert_eq!(PowerMode::HighPerformance.controller_code(), 0);
        assert_eq!(PowerMode::Normal.controller_code(), 0);
    }

    #[test]
    fn test_u8_conversions() {
        for state in [
            LifecycleState::Idle,
            LifecycleState::Settling,
            LifecycleState::Active,
        ] {
            assert_eq!(LifecycleState::from_u8(state.as_u8()), state);
        }
        assert_eq!(LifecycleState::from_u8(200), LifecycleState::Idle);
        assert_eq!(PowerMode::from_u8(255), PowerMode::Normal);
    }

    #[test]
    fn test_actuation_from_flag() {
        assert_eq!(
            ActuationMode::from_position_control(true),
            ActuationMode::PositionBlend
        );
        assert_eq!(
            ActuationMode::from_position_control(false),
            ActuationMode::DirectTorque
        );
    }
}
