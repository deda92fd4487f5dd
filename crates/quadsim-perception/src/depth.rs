//! 深度线性化与反投影

use nalgebra::{Matrix4, Vector4};
use quadsim_protocol::CameraIntrinsics;

/// 焦距低于该值时视为退化，丢弃全部样本
const MIN_FOCAL: f64 = 1e-9;

/// 非线性深度缓冲值 `d ∈ [0, 1]` 转为米制深度
///
/// `Z = far · near / (far − (far − near) · d)`
#[inline]
pub fn linearize_depth(d: f64, near: f64, far: f64) -> f64 {
    far * near / (far - (far - near) * d)
}

/// 有效深度区间（两端均不含）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBounds {
    /// 下界（米）
    pub min: f64,
    /// 上界（米）
    pub max: f64,
}

impl DepthBounds {
    /// 创建深度区间
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 深度是否有效（有限且严格位于区间内）
    #[inline]
    pub fn contains(&self, z: f64) -> bool {
        z.is_finite() && z > self.min && z < self.max
    }
}

impl Default for DepthBounds {
    fn default() -> Self {
        Self::new(0.01, 4.0)
    }
}

/// 深度图反投影为世界系点云
///
/// 按像素行优先遍历，`X = (u − cx)·Z/fx`，`Y = (v − cy)·Z/fy`，
/// 再经 `camera_to_world` 变换到世界系。越界、非有限深度被静默丢弃。
/// `depth` 长度不足 `width · height` 时只处理完整覆盖的像素。
#[allow(clippy::too_many_arguments)]
pub fn reproject(
    depth: &[f32],
    width: u32,
    height: u32,
    intrinsics: &CameraIntrinsics,
    camera_to_world: &Matrix4<f64>,
    near: f64,
    far: f64,
    bounds: DepthBounds,
) -> Vec<[f32; 3]> {
    let CameraIntrinsics { fx, fy, cx, cy } = *intrinsics;
    if !(fx.abs() >= MIN_FOCAL && fy.abs() >= MIN_FOCAL) {
        return Vec::new();
    }

    let width = width as usize;
    let mut points = Vec::new();
    for (index, &d) in depth.iter().enumerate().take(width * height as usize) {
        let z = linearize_depth(d as f64, near, far);
        if !bounds.contains(z) {
            continue;
        }
        let u = (index % width) as f64;
        let v = (index / width) as f64;
        let camera = Vector4::new((u - cx) * z / fx, (v - cy) * z / fy, z, 1.0);
        let world = camera_to_world * camera;
        let point = [world.x as f32, world.y as f32, world.z as f32];
        if point.iter().all(|c| c.is_finite()) {
            points.push(point);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    fn centered(width: u32, height: u32, f: f64) -> CameraIntrinsics {
        CameraIntrinsics {
            fx: f,
            fy: f,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }

    #[test]
    fn test_linearize_endpoints() {
        assert_relative_eq!(linearize_depth(0.0, 0.1, 1000.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(linearize_depth(1.0, 0.1, 1000.0), 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_center_pixel_on_optical_axis() {
        let (w, h) = (80, 60);
        let depth = vec![0.5_f32; (w * h) as usize];
        let k = centered(w, h, 51.96);
        let points = reproject(
            &depth,
            w,
            h,
            &k,
            &Matrix4::identity(),
            0.1,
            1000.0,
            DepthBounds::default(),
        );
        assert_eq!(points.len(), (w * h) as usize);

        let center = points[(30 * w + 40) as usize];
        assert_abs_diff_eq!(center[0], 0.0);
        assert_abs_diff_eq!(center[1], 0.0);
        assert_abs_diff_eq!(center[2] as f64, 0.2002, epsilon = 1e-3);
        assert_relative_eq!(
            center[2] as f64,
            1000.0 * 0.1 / (1000.0 - 999.9 * 0.5),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let bounds = DepthBounds::default();
        assert!(!bounds.contains(0.01));
        assert!(!bounds.contains(4.0));
        assert!(bounds.contains(0.011));
        assert!(bounds.contains(3.99));
        assert!(!bounds.contains(f64::NAN));
        assert!(!bounds.contains(f64::INFINITY));
    }

    #[test]
    fn test_far_background_dropped() {
        // d = 1 → far 平面，应全部丢弃
        let depth = vec![1.0_f32; 16];
        let points = reproject(
            &depth,
            4,
            4,
            &centered(4, 4, 2.0),
            &Matrix4::identity(),
            0.1,
            1000.0,
            DepthBounds::default(),
        );
        assert!(points.is_empty());
    }

    #[test]
    fn test_degenerate_focal_drops_everything() {
        let depth = vec![0.5_f32; 16];
        let points = reproject(
            &depth,
            4,
            4,
            &centered(4, 4, 0.0),
            &Matrix4::identity(),
            0.1,
            1000.0,
            DepthBounds::default(),
        );
        assert!(points.is_empty());
    }

    #[test]
    fn test_extrinsic_translation_applied() {
        let depth = vec![0.5_f32; 1];
        let mut extrinsic = Matrix4::identity();
        extrinsic[(0, 3)] = 1.0;
        extrinsic[(2, 3)] = 2.0;
        let k = CameraIntrinsics {
            fx: 1.0,
            fy: 1.0,
            cx: 0.0,
            cy: 0.0,
        };
        let points = reproject(
            &depth,
            1,
            1,
            &k,
            &extrinsic,
            0.1,
            1000.0,
            DepthBounds::default(),
        );
        assert_eq!(points.len(), 1);
        assert_abs_diff_eq!(points[0][0], 1.0);
        assert_abs_diff_eq!(points[0][1], 0.0);
        assert_abs_diff_eq!(points[0][2] as f64, 2.0 + 0.19998, epsilon = 1e-4);
    }

    proptest! {
        #[test]
        fn prop_emitted_depth_within_bounds(depth in proptest::collection::vec(0.0f32..=1.0, 64)) {
            let bounds = DepthBounds::default();
            let points = reproject(
                &depth,
                8,
                8,
                &centered(8, 8, 6.9),
                &Matrix4::identity(),
                0.1,
                1000.0,
                bounds,
            );
            prop_assert!(points.len() <= 64);
            for p in points {
                // 单位外参下世界 z 即相机深度；f32 截断留出余量
                prop_assert!(p[2] as f64 > bounds.min - 1e-6);
                prop_assert!((p[2] as f64) < bounds.max + 1e-6);
            }
        }
    }
}
