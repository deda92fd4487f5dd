//! 遥测输出
//!
//! 控制线程与感知线程把合成结果交给 [`TelemetrySink`]。
//! 回调在实时线程上执行，实现必须非阻塞（推荐 `try_send` 到通道）。
//!
//! [`TelemetryHub`] 管理多个 sink，并按配置对每类消息降频发布。

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use quadsim_protocol::{CameraTransforms, InertialFrame, MonoImage, Odometry, PointCloud};
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 遥测接收端
///
/// 所有方法默认空操作，按需实现。
pub trait TelemetrySink: Send + Sync {
    /// 里程计（机体位姿）
    fn on_odometry(&self, odometry: &Odometry) {
        let _ = odometry;
    }

    /// 合成 IMU
    fn on_inertial(&self, tick: u64, frame: &InertialFrame) {
        let _ = (tick, frame);
    }

    /// 点云
    fn on_point_cloud(&self, cloud: &PointCloud) {
        let _ = cloud;
    }

    /// 灰度图
    fn on_image(&self, image: &MonoImage) {
        let _ = image;
    }

    /// 相机相关坐标系
    fn on_camera_transforms(&self, transforms: &CameraTransforms) {
        let _ = transforms;
    }
}

/// 发布降频（每 N 次发布一次，0 表示关闭）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishDecimation {
    /// 里程计
    pub odometry: u32,
    /// IMU
    pub inertial: u32,
    /// 相机（点云、图像、坐标系）
    pub camera: u32,
}

impl Default for PublishDecimation {
    fn default() -> Self {
        Self {
            odometry: 1,
            inertial: 1,
            camera: 1,
        }
    }
}

#[inline]
fn due(counter: u64, every: u32) -> bool {
    every != 0 && counter % every as u64 == 0
}

/// 遥测分发器
#[derive(Default)]
pub struct TelemetryHub {
    sinks: SmallVec<[Arc<dyn TelemetrySink>; 4]>,
    decimation: PublishDecimation,
}

impl TelemetryHub {
    /// 创建分发器
    pub fn new(decimation: PublishDecimation) -> Self {
        Self {
            sinks: SmallVec::new(),
            decimation,
        }
    }

    /// 添加 sink
    pub fn add_sink(&mut self, sink: Arc<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }

    /// sink 数量
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// 是否没有 sink
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// 发布控制 tick 的里程计与 IMU（按降频）
    pub fn publish_tick(&self, odometry: &Odometry, inertial: &InertialFrame) {
        if self.sinks.is_empty() {
            return;
        }
        let publish_odometry = due(odometry.tick, self.decimation.odometry);
        let publish_inertial = due(odometry.tick, self.decimation.inertial);
        for sink in &self.sinks {
            if publish_odometry {
                sink.on_odometry(odometry);
            }
            if publish_inertial {
                sink.on_inertial(odometry.tick, inertial);
            }
        }
    }

    /// 发布相机帧（按降频，`frame_index` 为感知线程帧序号）
    pub fn publish_camera(
        &self,
        frame_index: u64,
        transforms: &CameraTransforms,
        cloud: &PointCloud,
        image: &MonoImage,
    ) {
        if !due(frame_index, self.decimation.camera) {
            return;
        }
        for sink in &self.sinks {
            sink.on_camera_transforms(transforms);
            sink.on_point_cloud(cloud);
            sink.on_image(image);
        }
    }
}

/// 通道消息
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    /// 里程计
    Odometry(Odometry),
    /// IMU
    Inertial {
        /// tick 序号
        tick: u64,
        /// 数据
        frame: InertialFrame,
    },
    /// 点云
    PointCloud(PointCloud),
    /// 灰度图
    Image(MonoImage),
    /// 相机坐标系
    CameraTransforms(CameraTransforms),
}

/// 通道 sink：消息 `try_send` 到有界通道，满时丢弃
pub struct ChannelSink {
    tx: Sender<TelemetryMessage>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// 创建 sink 与接收端
    pub fn new(capacity: usize) -> (Self, Receiver<TelemetryMessage>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// 因通道满被丢弃的消息数
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, message: TelemetryMessage) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(message) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl TelemetrySink for ChannelSink {
    fn on_odometry(&self, odometry: &Odometry) {
        self.send(TelemetryMessage::Odometry(*odometry));
    }

    fn on_inertial(&self, tick: u64, frame: &InertialFrame) {
        self.send(TelemetryMessage::Inertial { tick, frame: *frame });
    }

    fn on_point_cloud(&self, cloud: &PointCloud) {
        self.send(TelemetryMessage::PointCloud(cloud.clone()));
    }

    fn on_image(&self, image: &MonoImage) {
        self.send(TelemetryMessage::Image(image.clone()));
    }

    fn on_camera_transforms(&self, transforms: &CameraTransforms) {
        self.send(TelemetryMessage::CameraTransforms(*transforms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadsim_protocol::BasePose;

    fn odometry(tick: u64) -> Odometry {
        Odometry {
            tick,
            pose: BasePose::at_height(0.3),
        }
    }

    #[test]
    fn test_hub_decimation() {
        let (sink, rx) = ChannelSink::new(64);
        let mut hub = TelemetryHub::new(PublishDecimation {
            odometry: 2,
            inertial: 0,
            camera: 1,
        });
        hub.add_sink(Arc::new(sink));

        for tick in 0..6 {
            hub.publish_tick(&odometry(tick), &InertialFrame::default());
        }
        let ticks: Vec<u64> = rx
            .try_iter()
            .map(|m| match m {
                TelemetryMessage::Odometry(o) => o.tick,
                other => panic!("unexpected message {:?}", other),
            })
            .collect();
        assert_eq!(ticks, vec![0, 2, 4]);
    }

    #[test]
    fn test_hub_camera_publishes_all_parts() {
        let (sink, rx) = ChannelSink::new(16);
        let mut hub = TelemetryHub::new(PublishDecimation::default());
        hub.add_sink(Arc::new(sink));

        hub.publish_camera(
            0,
            &CameraTransforms::default(),
            &PointCloud::default(),
            &MonoImage::default(),
        );
        let messages: Vec<_> = rx.try_iter().collect();
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], TelemetryMessage::CameraTransforms(_)));
        assert!(matches!(messages[1], TelemetryMessage::PointCloud(_)));
        assert!(matches!(messages[2], TelemetryMessage::Image(_)));
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (sink, _rx) = ChannelSink::new(1);
        sink.on_odometry(&odometry(0));
        sink.on_odometry(&odometry(1));
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn test_default_methods_are_noops() {
        struct Silent;
        impl TelemetrySink for Silent {}

        let mut hub = TelemetryHub::new(PublishDecimation::default());
        hub.add_sink(Arc::new(Silent));
        hub.publish_tick(&odometry(0), &InertialFrame::default());
        assert_eq!(hub.len(), 1);
    }
}
