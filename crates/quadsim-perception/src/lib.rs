//! # quadsim Perception
//!
//! 仿真深度相机：相机外参、投影内参、深度反投影与灰度转换。
//!
//! ## 模块
//!
//! - `geometry`: 相机安装变换与 look-at 视图
//! - `intrinsics`: 透视投影矩阵与针孔内参
//! - `depth`: 深度线性化、有效区间与反投影
//! - `mono`: RGBA → 灰度
//! - `renderer`: 渲染器接口
//! - `pipeline`: 完整采集流程

pub mod config;
pub mod depth;
pub mod error;
pub mod geometry;
pub mod intrinsics;
pub mod mono;
pub mod pipeline;
pub mod renderer;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::PerceptionConfig;
pub use depth::{DepthBounds, linearize_depth, reproject};
pub use error::PerceptionError;
pub use geometry::{CameraGeometry, eye_in_body};
pub use intrinsics::{intrinsics_from_projection, perspective_projection};
pub use mono::{luminance, rgba_to_mono};
pub use pipeline::PerceptionPipeline;
pub use renderer::{RenderRequest, RenderedFrame, Renderer};
