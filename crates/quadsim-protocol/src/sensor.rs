//! 相机与点云输出类型

use crate::state::BasePose;

/// 针孔相机内参
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraIntrinsics {
    /// x 方向焦距（像素）
    pub fx: f64,
    /// y 方向焦距（像素）
    pub fy: f64,
    /// 主点 x（像素）
    pub cx: f64,
    /// 主点 y（像素）
    pub cy: f64,
}

/// 世界系点云
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointCloud {
    /// 坐标系名称
    pub frame_id: String,
    /// 点（米），按像素行优先顺序
    pub points: Vec<[f32; 3]>,
}

impl PointCloud {
    /// 点数
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 打包为 `x, y, z` 连续 f32 的小端字节流（每点 12 字节）
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.points.len() * 12);
        for point in &self.points {
            for value in point {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes
    }
}

/// 单通道 8 位图像
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonoImage {
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
    /// 亮度数据，行优先，步长等于宽度
    pub data: Vec<u8>,
}

/// 相机相关坐标系位姿（世界系）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraTransforms {
    /// 机体
    pub body: BasePose,
    /// 相机光心
    pub camera: BasePose,
    /// 相机视线目标点（姿态沿用机体姿态）
    pub target: BasePose,
}

/// 一次感知输出
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraFrame {
    /// 内参
    pub intrinsics: CameraIntrinsics,
    /// 外参及相关坐标系
    pub transforms: CameraTransforms,
    /// 点云
    pub cloud: PointCloud,
    /// 灰度图
    pub image: MonoImage,
}
