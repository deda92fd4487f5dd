//! 投影矩阵与针孔内参
//!
//! 投影矩阵采用 OpenGL 约定，按列优先展平后读取下标
//! （`P[0]`、`P[2]`、`P[5]`、`P[6]`）。

use nalgebra::Matrix4;
use quadsim_protocol::CameraIntrinsics;

/// 透视投影矩阵（垂直视场角，单位：度）
///
/// 调用方需保证 `aspect > 0`、`0 < near < far`（见 `PerceptionConfig::validate`）。
pub fn perspective_projection(fov_deg: f64, aspect: f64, near: f64, far: f64) -> Matrix4<f64> {
    Matrix4::new_perspective(aspect, fov_deg.to_radians(), near, far)
}

/// 从投影矩阵与分辨率推导内参
///
/// - `fx = W · P[0] / 2`
/// - `fy = H · P[5] / 2`
/// - `cx = (1 − P[2]) · W / 2`
/// - `cy = (1 + P[6]) · H / 2`
pub fn intrinsics_from_projection(
    projection: &Matrix4<f64>,
    width: u32,
    height: u32,
) -> CameraIntrinsics {
    let p = projection.as_slice();
    let w = width as f64;
    let h = height as f64;
    CameraIntrinsics {
        fx: w * p[0] / 2.0,
        fy: h * p[5] / 2.0,
        cx: (1.0 - p[2]) * w / 2.0,
        cy: (1.0 + p[6]) * h / 2.0,
    }
}
