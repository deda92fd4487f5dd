//! 感知管线配置

use crate::error::PerceptionError;
use std::time::Duration;

/// 感知管线配置
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptionConfig {
    /// 采集频率（Hz）
    pub rate_hz: f64,
    /// 全分辨率宽度
    pub base_width: u32,
    /// 全分辨率高度
    pub base_height: u32,
    /// 降采样因子（实际渲染分辨率 = 全分辨率 / 因子）
    pub downsample: u32,
    /// 垂直视场角（度）
    pub fov_deg: f64,
    /// 近裁剪面（米）
    pub near: f64,
    /// 远裁剪面（米）
    pub far: f64,
    /// 有效深度下界（不含）
    pub min_depth: f64,
    /// 有效深度上界（不含）
    pub max_depth: f64,
    /// 点云坐标系名称
    pub cloud_frame: String,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            rate_hz: 20.0,
            base_width: 320,
            base_height: 240,
            downsample: 4,
            fov_deg: 60.0,
            near: 0.1,
            far: 1000.0,
            min_depth: 0.01,
            max_depth: 4.0,
            cloud_frame: "world".to_string(),
        }
    }
}

impl PerceptionConfig {
    /// 实际渲染宽度
    pub fn width(&self) -> u32 {
        self.base_width / self.downsample.max(1)
    }

    /// 实际渲染高度
    pub fn height(&self) -> u32 {
        self.base_height / self.downsample.max(1)
    }

    /// 宽高比
    pub fn aspect(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// 采集周期
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }

    /// 校验配置
    ///
    /// # 错误
    ///
    /// 频率非正、分辨率为 0、视场角不在 (0, 180)、裁剪面或深度范围无效时返回
    /// `PerceptionError::InvalidConfig`。
    pub fn validate(&self) -> Result<(), PerceptionError> {
        if !(self.rate_hz.is_finite() && self.rate_hz > 0.0) {
            return Err(PerceptionError::InvalidConfig(format!(
                "rate_hz must be positive, got {}",
                self.rate_hz
            )));
        }
        if self.downsample == 0 {
            return Err(PerceptionError::InvalidConfig(
                "downsample must be at least 1".to_string(),
            ));
        }
        if self.width() == 0 || self.height() == 0 {
            return Err(PerceptionError::InvalidConfig(format!(
                "resolution {}x{} / {} is empty",
                self.base_width, self.base_height, self.downsample
            )));
        }
        if !(self.fov_deg > 0.0 && self.fov_deg < 180.0) {
            return Err(PerceptionError::InvalidConfig(format!(
                "fov_deg must be in (0, 180), got {}",
                self.fov_deg
            )));
        }
        if !(self.near > 0.0 && self.far > self.near && self.far.is_finite()) {
            return Err(PerceptionError::InvalidConfig(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        if !(self.min_depth >= 0.0 && self.max_depth > self.min_depth) {
            return Err(PerceptionError::InvalidConfig(format!(
                "depth bounds must satisfy 0 <= min < max, got ({}, {})",
                self.min_depth, self.max_depth
            )));
        }
        Ok(())
    }
}
