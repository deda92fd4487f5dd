//! 仿真句柄
//!
//! [`Simulation`] 持有控制、分发、感知三个线程，对外提供无锁状态读取、
//! 命令投递与面板按钮。Drop 时通知所有线程退出并带超时地等待。

use crate::edge::{AtomicControlPanel, PanelButton};
use crate::error::DriverError;
use crate::metrics::MetricsSnapshot;
use crate::state::{SimContext, TickSnapshot};
use crossbeam_channel::{Sender, TrySendError};
use quadsim_protocol::{BasePose, RawCommand, SimulationModeState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::{Duration, Instant};
use tracing::error;

/// 支持超时 join 的线程扩展 trait
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();

        // Watchdog thread joins the target and reports back
        spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 运行中的仿真
pub struct Simulation {
    /// 共享状态上下文
    ctx: Arc<SimContext>,
    /// 操作面板
    panel: Arc<AtomicControlPanel>,
    /// 内置命令通道发送端（使用外部命令源时为 None）
    command_tx: Option<Sender<RawCommand>>,
    /// 控制线程
    control_thread: Option<JoinHandle<()>>,
    /// 命令分发线程
    dispatch_thread: Option<JoinHandle<()>>,
    /// 感知线程（未配置渲染器时为 None）
    perception_thread: Option<JoinHandle<()>>,
    /// 运行标志（用于线程生命周期联动）
    is_running: Arc<AtomicBool>,
}

impl Simulation {
    pub(crate) fn new(
        ctx: Arc<SimContext>,
        panel: Arc<AtomicControlPanel>,
        is_running: Arc<AtomicBool>,
        control_thread: JoinHandle<()>,
    ) -> Self {
        Self {
            ctx,
            panel,
            command_tx: None,
            control_thread: Some(control_thread),
            dispatch_thread: None,
            perception_thread: None,
            is_running,
        }
    }

    pub(crate) fn attach_dispatch(
        &mut self,
        handle: JoinHandle<()>,
        command_tx: Option<Sender<RawCommand>>,
    ) {
        self.dispatch_thread = Some(handle);
        self.command_tx = command_tx;
    }

    pub(crate) fn attach_perception(&mut self, handle: JoinHandle<()>) {
        self.perception_thread = Some(handle);
    }

    /// 共享状态上下文
    pub fn context(&self) -> &Arc<SimContext> {
        &self.ctx
    }

    /// 控制线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
            && self
                .control_thread
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// 模式状态
    pub fn mode(&self) -> SimulationModeState {
        self.ctx.mode.snapshot()
    }

    /// 运行指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// 最近一个 tick 的快照（无锁）
    pub fn latest(&self) -> TickSnapshot {
        self.ctx.latest()
    }

    /// 最近的机体位姿（无锁）
    pub fn pose(&self) -> BasePose {
        self.ctx.pose()
    }

    /// 操作面板
    pub fn panel(&self) -> &Arc<AtomicControlPanel> {
        &self.panel
    }

    /// 按下面板按钮（控制线程在下一个 tick 开始时响应）
    pub fn press(&self, button: PanelButton) {
        self.panel.press(button);
    }

    /// 请求复位
    pub fn request_reset(&self) {
        self.press(PanelButton::Reset);
    }

    /// 投递一条原始命令（非阻塞）
    ///
    /// 只有使用内置命令通道时可用。
    pub fn send_command(&self, command: RawCommand) -> Result<(), DriverError> {
        let tx = self
            .command_tx
            .as_ref()
            .ok_or(DriverError::MissingComponent("built-in command channel"))?;
        match tx.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DriverError::ChannelFull),
            Err(TrySendError::Disconnected(_)) => Err(DriverError::ChannelClosed),
        }
    }

    /// 等待至少再执行 `count` 个 tick
    pub fn wait_for_ticks(&self, count: u64, timeout: Duration) -> Result<(), DriverError> {
        let target = self.metrics().ticks.saturating_add(count);
        let start = Instant::now();
        while self.metrics().ticks < target {
            if !self.is_running() {
                return Err(DriverError::NotRunning);
            }
            if start.elapsed() >= timeout {
                return Err(DriverError::Timeout);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    /// 停止所有线程
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        // Release: All writes before this are visible to threads that see the false value
        self.is_running.store(false, Ordering::Release);

        // 提前关闭命令通道，分发线程收到 Closed 后立即退出
        self.command_tx.take();

        let join_timeout = Duration::from_secs(2);

        for (name, handle) in [
            ("Control", self.control_thread.take()),
            ("Dispatch", self.dispatch_thread.take()),
            ("Perception", self.perception_thread.take()),
        ] {
            if let Some(handle) = handle
                && let Err(_e) = handle.join_timeout(join_timeout)
            {
                error!(
                    "{} thread panicked or failed to shut down within {:?}",
                    name, join_timeout
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadsim_protocol::{ActuationMode, CommandKind, CommandPayload};

    fn idle_simulation() -> Simulation {
        let is_running = Arc::new(AtomicBool::new(true));
        let handle = {
            let is_running = is_running.clone();
            spawn(move || {
                while is_running.load(Ordering::Acquire) {
                    std::thread::sleep(Duration::from_millis(1));
                }
            })
        };
        Simulation::new(
            Arc::new(SimContext::new(ActuationMode::DirectTorque)),
            Arc::new(AtomicControlPanel::new()),
            is_running,
            handle,
        )
    }

    #[test]
    fn test_send_command_without_channel() {
        let sim = idle_simulation();
        let result = sim.send_command(RawCommand::new(
            CommandKind::GaitType,
            CommandPayload::Int(1),
        ));
        assert!(matches!(result, Err(DriverError::MissingComponent(_))));
    }

    #[test]
    fn test_send_command_full_channel() {
        let mut sim = idle_simulation();
        let (tx, _rx) = crossbeam_channel::bounded(1);
        let dispatch = spawn(|| {});
        sim.attach_dispatch(dispatch, Some(tx));

        let raw = RawCommand::new(CommandKind::GaitType, CommandPayload::Int(1));
        assert!(sim.send_command(raw.clone()).is_ok());
        assert!(matches!(sim.send_command(raw), Err(DriverError::ChannelFull)));
    }

    #[test]
    fn test_wait_for_ticks_timeout() {
        let sim = idle_simulation();
        assert!(sim.is_running());
        assert!(matches!(
            sim.wait_for_ticks(1, Duration::from_millis(20)),
            Err(DriverError::Timeout)
        ));
    }

    #[test]
    fn test_drop_stops_threads() {
        let sim = idle_simulation();
        let is_running = sim.is_running.clone();
        sim.shutdown();
        assert!(!is_running.load(Ordering::Acquire));
    }
}
