//! 线程主循环
//!
//! - [`control_loop`]：固定频率 tick，绝对时间锚点 + `spin_sleep` 节拍
//! - [`dispatch_loop`]：接收外部命令，校验后写入邮箱
//! - [`perception_loop`]：按自身频率读取位姿快照并生成点云与灰度图
//!
//! 所有循环在 `is_running` 变为 false 后退出。

use crate::control::ControlCore;
use crate::controller::GaitController;
use crate::edge::{ControlPanel, PanelEdges};
use crate::error::DriverError;
use crate::mailbox::{CommandSource, Received, dispatch_raw};
use crate::physics::PhysicsBackend;
use crate::state::SimContext;
use crate::telemetry::TelemetryHub;
use crossbeam_channel::Sender;
use quadsim_perception::{PerceptionPipeline, Renderer};
use quadsim_protocol::LifecycleState;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, trace, warn};

/// 线程循环配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// 分发线程等待命令的超时（决定退出响应时间）
    pub dispatch_timeout: Duration,
    /// 启动时等待首次复位完成的超时
    pub startup_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_millis(10),
            startup_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(feature = "realtime")]
fn raise_thread_priority(name: &str) {
    use thread_priority::*;

    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(_) => {
            info!("{} thread priority set to MAX (realtime)", name);
        },
        Err(e) => {
            warn!(
                "Failed to set {} thread priority: {}. \
                On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                name, e
            );
        },
    }
}

/// 控制线程主循环
///
/// 先执行一次复位，结果通过 `startup` 通知构建方；复位失败时直接退出。
/// 之后每个周期依次：轮询面板、取出邮箱命令、执行一个 tick、按锚点睡眠。
///
/// # 参数
/// - `core`: 控制核心（独占物理引擎与控制器）
/// - `panel`: 操作面板
/// - `is_running`: 运行标志
/// - `startup`: 启动握手通道
pub fn control_loop<P, C>(
    mut core: ControlCore<P, C>,
    panel: Arc<dyn ControlPanel>,
    is_running: Arc<AtomicBool>,
    startup: Sender<Result<(), DriverError>>,
) where
    P: PhysicsBackend,
    C: GaitController,
{
    #[cfg(feature = "realtime")]
    raise_thread_priority("Control");

    if let Err(e) = core.reset() {
        is_running.store(false, Ordering::Release);
        let _ = startup.send(Err(e));
        return;
    }
    let _ = startup.send(Ok(()));

    let ctx = core.context().clone();
    let period = core.config().period();
    let mut edges = PanelEdges::new(panel.as_ref());
    let mut next_tick = Instant::now();

    loop {
        // Acquire: If we see false, we must see all cleanup writes from other threads
        if !is_running.load(Ordering::Acquire) {
            trace!("Control thread: is_running flag is false, exiting");
            break;
        }

        next_tick += period;

        let events = edges.poll(panel.as_ref());
        if events.any() {
            if let Err(e) = core.handle_panel(events) {
                error!("Control thread: panel event failed: {}", e);
            }
            if events.reset {
                // 复位期间的 tick 不按节拍执行，重新建立锚点
                next_tick = Instant::now();
                continue;
            }
        }

        if ctx.mode.lifecycle() == LifecycleState::Active {
            let pending = ctx.mailboxes.drain();
            if !pending.is_empty() {
                core.apply_commands(pending);
            }
        }

        if ctx.mode.lifecycle() != LifecycleState::Idle
            && let Err(e) = core.tick()
        {
            ctx.metrics.physics_errors.fetch_add(1, Ordering::Relaxed);
            error!("Control thread: tick failed: {}", e);
        }

        let now = Instant::now();
        if next_tick > now {
            spin_sleep::sleep(next_tick - now);
        } else {
            ctx.metrics.loop_overruns.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Control tick overrun by {:?} at tick {}",
                now - next_tick,
                core.tick_count()
            );
            next_tick = now;
        }
    }

    info!("Control thread exited at tick {}", core.tick_count());
}

/// 命令分发线程主循环
///
/// 命令源关闭时退出（不影响其他线程）。
pub fn dispatch_loop(
    mut source: impl CommandSource,
    ctx: Arc<SimContext>,
    is_running: Arc<AtomicBool>,
    timeout: Duration,
) {
    loop {
        if !is_running.load(Ordering::Acquire) {
            trace!("Dispatch thread: is_running flag is false, exiting");
            break;
        }

        match source.recv_timeout(timeout) {
            Received::Command(raw) => {
                dispatch_raw(&raw, &ctx.mailboxes, &ctx.metrics);
            },
            Received::Timeout => continue,
            Received::Closed => {
                info!("Dispatch thread: command source closed");
                break;
            },
        }
    }
}

/// 感知线程主循环
///
/// Idle 状态下不采集。单帧失败只计数并告警。
pub fn perception_loop<R: Renderer>(
    mut pipeline: PerceptionPipeline<R>,
    ctx: Arc<SimContext>,
    telemetry: Arc<TelemetryHub>,
    is_running: Arc<AtomicBool>,
) {
    let period = pipeline.config().period();
    let mut next_frame = Instant::now();
    let mut frame_index: u64 = 0;

    loop {
        if !is_running.load(Ordering::Acquire) {
            trace!("Perception thread: is_running flag is false, exiting");
            break;
        }

        next_frame += period;

        if ctx.mode.lifecycle() != LifecycleState::Idle {
            match pipeline.capture(&ctx.pose()) {
                Ok(frame) => {
                    ctx.metrics.camera_frames.fetch_add(1, Ordering::Relaxed);
                    ctx.metrics
                        .points_emitted
                        .fetch_add(frame.cloud.len() as u64, Ordering::Relaxed);
                    telemetry.publish_camera(
                        frame_index,
                        &frame.transforms,
                        &frame.cloud,
                        &frame.image,
                    );
                    frame_index = frame_index.wrapping_add(1);
                },
                Err(e) => {
                    ctx.metrics.camera_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Perception thread: capture failed: {}", e);
                },
            }
        }

        let now = Instant::now();
        if next_frame > now {
            spin_sleep::sleep(next_frame - now);
        } else {
            trace!("Perception frame overrun by {:?}", now - next_frame);
            next_frame = now;
        }
    }
}
