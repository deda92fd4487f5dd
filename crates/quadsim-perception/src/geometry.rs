//! 相机外参几何
//!
//! 相机固定安装在机体前方 0.25 m 处，光轴向下倾斜 30°。
//! 相机坐标系约定：X 向右，Y 向下，Z 沿光轴向前。

use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point3, Quaternion, Rotation3, Translation3, UnitQuaternion,
    Vector3, Vector4,
};
use quadsim_protocol::{BasePose, CameraTransforms};

/// 相机在机体前方的安装距离（米）
pub const CAMERA_MOUNT_OFFSET: f64 = 0.25;

/// 相机坐标系到机体坐标系的固定变换
#[rustfmt::skip]
pub fn eye_in_body() -> Matrix4<f64> {
    let half_sqrt3 = 3.0_f64.sqrt() / 2.0;
    Matrix4::new(
        0.0, -0.5, half_sqrt3, CAMERA_MOUNT_OFFSET,
        -1.0, 0.0, 0.0, 0.0,
        0.0, -half_sqrt3, -0.5, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// `[x, y, z, w]` 四元数转为单位四元数（自动归一化）
pub fn unit_quaternion(xyzw: &[f64; 4]) -> UnitQuaternion<f64> {
    let [x, y, z, w] = *xyzw;
    UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z))
}

/// 单位四元数转为 `[x, y, z, w]`
pub fn quaternion_xyzw(q: &UnitQuaternion<f64>) -> [f64; 4] {
    let c = q.into_inner().coords;
    [c.x, c.y, c.z, c.w]
}

/// 机体位姿的齐次变换（机体系 → 世界系）
pub fn body_to_world(pose: &BasePose) -> Matrix4<f64> {
    let [x, y, z] = pose.position;
    Isometry3::from_parts(Translation3::new(x, y, z), unit_quaternion(&pose.orientation))
        .to_homogeneous()
}

/// 一次采集所用的相机几何
#[derive(Debug, Clone, PartialEq)]
pub struct CameraGeometry {
    /// 相机系 → 世界系
    pub camera_to_world: Matrix4<f64>,
    /// 光心（世界系）
    pub eye: Point3<f64>,
    /// 视线目标点（世界系，光轴上 1 m 处）
    pub target: Point3<f64>,
}

impl CameraGeometry {
    /// 由任意相机外参构造
    pub fn from_extrinsic(camera_to_world: Matrix4<f64>) -> Self {
        let eye = Point3::new(
            camera_to_world[(0, 3)],
            camera_to_world[(1, 3)],
            camera_to_world[(2, 3)],
        );
        let target = camera_to_world * Vector4::new(0.0, 0.0, 1.0, 1.0);
        Self {
            camera_to_world,
            eye,
            target: Point3::new(target.x, target.y, target.z),
        }
    }

    /// 由机体位姿构造：`T_cam = T_body · T_eye`
    pub fn from_body(pose: &BasePose) -> Self {
        Self::from_extrinsic(body_to_world(pose) * eye_in_body())
    }

    /// 视图矩阵（look-at，上方向 +Z）
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.eye, &self.target, &Vector3::z())
    }

    /// 相机姿态（世界系）
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        let rotation: Matrix3<f64> = self.camera_to_world.fixed_view::<3, 3>(0, 0).into_owned();
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation))
    }

    /// 广播用的坐标系位姿（机体、相机、目标点）
    ///
    /// 目标点沿用机体姿态。
    pub fn transforms(&self, body: &BasePose) -> CameraTransforms {
        CameraTransforms {
            body: *body,
            camera: BasePose {
                position: [self.eye.x, self.eye.y, self.eye.z],
                orientation: quaternion_xyzw(&self.orientation()),
            },
            target: BasePose {
                position: [self.target.x, self.target.y, self.target.z],
                orientation: body.orientation,
            },
        }
    }
}
