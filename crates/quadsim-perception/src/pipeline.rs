//! 感知管线
//!
//! 一次采集：机体位姿 → 相机外参 → 渲染 → 深度线性化 → 反投影 → 点云 + 灰度图。
//! 投影矩阵与内参只依赖配置，在构造时计算一次。

use crate::config::PerceptionConfig;
use crate::depth::{DepthBounds, reproject};
use crate::error::PerceptionError;
use crate::geometry::CameraGeometry;
use crate::intrinsics::{intrinsics_from_projection, perspective_projection};
use crate::mono::rgba_to_mono;
use crate::renderer::{RenderRequest, Renderer};
use nalgebra::Matrix4;
use quadsim_protocol::{BasePose, CameraFrame, CameraIntrinsics, MonoImage, PointCloud};
use tracing::trace;

/// 感知管线
pub struct PerceptionPipeline<R: Renderer> {
    config: PerceptionConfig,
    renderer: R,
    projection: Matrix4<f64>,
    intrinsics: CameraIntrinsics,
}

impl<R: Renderer> PerceptionPipeline<R> {
    /// 创建感知管线
    ///
    /// # 错误
    ///
    /// 配置无效时返回 `PerceptionError::InvalidConfig`。
    pub fn new(config: PerceptionConfig, renderer: R) -> Result<Self, PerceptionError> {
        config.validate()?;
        let projection =
            perspective_projection(config.fov_deg, config.aspect(), config.near, config.far);
        let intrinsics = intrinsics_from_projection(&projection, config.width(), config.height());
        Ok(Self {
            config,
            renderer,
            projection,
            intrinsics,
        })
    }

    /// 配置
    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// 内参
    pub fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
    }

    /// 投影矩阵
    pub fn projection(&self) -> &Matrix4<f64> {
        &self.projection
    }

    /// 渲染器
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// 以当前机体位姿采集一帧
    pub fn capture(&mut self, body: &BasePose) -> Result<CameraFrame, PerceptionError> {
        let geometry = CameraGeometry::from_body(body);
        let transforms = geometry.transforms(body);
        let (cloud, image) = self.capture_with(&geometry)?;
        Ok(CameraFrame {
            intrinsics: self.intrinsics,
            transforms,
            cloud,
            image,
        })
    }

    /// 以任意相机外参采集（点云 + 灰度图）
    pub fn capture_with(
        &mut self,
        geometry: &CameraGeometry,
    ) -> Result<(PointCloud, MonoImage), PerceptionError> {
        let request = RenderRequest {
            view: geometry.view_matrix(),
            projection: self.projection,
            width: self.config.width(),
            height: self.config.height(),
        };
        let frame = self.renderer.render(&request)?;
        if frame.width != request.width || frame.height != request.height {
            return Err(PerceptionError::Render(format!(
                "renderer returned {}x{}, requested {}x{}",
                frame.width, frame.height, request.width, request.height
            )));
        }
        frame.check()?;

        let points = reproject(
            &frame.depth,
            frame.width,
            frame.height,
            &self.intrinsics,
            &geometry.camera_to_world,
            self.config.near,
            self.config.far,
            DepthBounds::new(self.config.min_depth, self.config.max_depth),
        );
        let image = rgba_to_mono(&frame.rgba, frame.width, frame.height)?;
        trace!(
            points = points.len(),
            pixels = frame.depth.len(),
            "Camera frame processed"
        );

        Ok((
            PointCloud {
                frame_id: self.config.cloud_frame.clone(),
                points,
            },
            image,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::UniformRenderer;
    use crate::renderer::RenderedFrame;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_capture_identity_extrinsic() {
        let mut pipeline = PerceptionPipeline::new(
            PerceptionConfig::default(),
            UniformRenderer::new(0.5, [10, 20, 30, 255]),
        )
        .unwrap();
        let geometry = CameraGeometry::from_extrinsic(Matrix4::identity());
        let (cloud, image) = pipeline.capture_with(&geometry).unwrap();

        assert_eq!(cloud.frame_id, "world");
        assert_eq!(cloud.len(), 80 * 60);
        let center = cloud.points[30 * 80 + 40];
        assert_relative_eq!(center[0], 0.0);
        assert_relative_eq!(center[1], 0.0);
        assert_relative_eq!(center[2] as f64, 0.2002, epsilon = 1e-3);

        assert_eq!(image.data.len(), 80 * 60);
        assert!(image.data.iter().all(|&l| l == image.data[0]));
    }

    #[test]
    fn test_capture_uses_body_pose() {
        let mut pipeline = PerceptionPipeline::new(
            PerceptionConfig::default(),
            UniformRenderer::new(1.0, [0, 0, 0, 255]),
        )
        .unwrap();
        let body = BasePose::at_height(0.3);
        let frame = pipeline.capture(&body).unwrap();

        // 全部为远平面：无点
        assert!(frame.cloud.is_empty());
        assert_eq!(frame.image.width, 80);
        assert_relative_eq!(frame.transforms.camera.position[0], 0.25, epsilon = 1e-12);

        let request = pipeline.renderer().last_request.clone().unwrap();
        assert_eq!((request.width, request.height), (80, 60));
        let eye = Point3::new(0.25, 0.0, 0.3);
        let eye_in_view = request.view.transform_point(&eye);
        assert_relative_eq!(eye_in_view.coords.norm(), 0.0, epsilon = 1e-9);
    }

    struct WrongSize;

    impl Renderer for WrongSize {
        fn render(&mut self, request: &RenderRequest) -> Result<RenderedFrame, PerceptionError> {
            Ok(RenderedFrame {
                width: request.width,
                height: request.height,
                rgba: vec![0; 4],
                depth: vec![0.5; 1],
            })
        }
    }

    #[test]
    fn test_capture_rejects_bad_buffers() {
        let mut pipeline = PerceptionPipeline::new(PerceptionConfig::default(), WrongSize).unwrap();
        let err = pipeline.capture(&BasePose::default()).unwrap_err();
        assert!(matches!(err, PerceptionError::BufferSize { buffer: "depth", .. }));
    }
}
