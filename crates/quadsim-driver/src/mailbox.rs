//! 命令邮箱与命令源
//!
//! 分发线程校验外部命令后写入邮箱，控制线程在每个 tick 开始时取出。
//! 每类命令一个邮箱，只保留最新值（Last Write Wins）。
//! 控制器只由控制线程调用。

use crate::metrics::SimulationMetrics;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use quadsim_protocol::{Command, RawCommand, VelocityCommand};
use std::sync::atomic::Ordering;
use std::time::Duration;

/// 单值邮箱（新值覆盖旧值）
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> Mailbox<T> {
    /// 创建空邮箱
    pub fn new() -> Self {
        Self::default()
    }

    /// 投递，返回是否覆盖了未取走的旧值
    pub fn post(&self, value: T) -> bool {
        self.slot.lock().replace(value).is_some()
    }

    /// 取走当前值
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    /// 是否有未取走的值
    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// 控制线程一次取出的命令
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PendingCommands {
    /// 步态类型
    pub gait_type: Option<i32>,
    /// 控制器模式码
    pub robot_mode: Option<i32>,
    /// 机体速度
    pub velocity: Option<VelocityCommand>,
}

impl PendingCommands {
    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.gait_type.is_none() && self.robot_mode.is_none() && self.velocity.is_none()
    }
}

/// 三类命令的邮箱集合
#[derive(Debug, Default)]
pub struct CommandMailboxes {
    gait_type: Mailbox<i32>,
    robot_mode: Mailbox<i32>,
    velocity: Mailbox<VelocityCommand>,
}

impl CommandMailboxes {
    /// 创建空邮箱集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 投递已校验命令，返回是否覆盖了旧值
    pub fn post(&self, command: Command) -> bool {
        match command {
            Command::GaitType(code) => self.gait_type.post(code),
            Command::RobotMode(code) => self.robot_mode.post(code),
            Command::BodyVelocity(velocity) => self.velocity.post(velocity),
        }
    }

    /// 取出全部待处理命令
    pub fn drain(&self) -> PendingCommands {
        PendingCommands {
            gait_type: self.gait_type.take(),
            robot_mode: self.robot_mode.take(),
            velocity: self.velocity.take(),
        }
    }
}

/// 命令源接收结果
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    /// 收到一条原始命令
    Command(RawCommand),
    /// 超时，无命令
    Timeout,
    /// 命令源已关闭
    Closed,
}

/// 外部命令源
pub trait CommandSource: Send {
    /// 阻塞等待下一条原始命令（最长 `timeout`）
    fn recv_timeout(&mut self, timeout: Duration) -> Received;
}

impl<S: CommandSource + ?Sized> CommandSource for Box<S> {
    fn recv_timeout(&mut self, timeout: Duration) -> Received {
        (**self).recv_timeout(timeout)
    }
}

/// 基于 crossbeam 通道的命令源
pub struct ChannelCommandSource {
    rx: Receiver<RawCommand>,
}

impl ChannelCommandSource {
    /// 创建命令源与对应的发送端
    pub fn new(capacity: usize) -> (crossbeam_channel::Sender<RawCommand>, Self) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (tx, Self { rx })
    }
}

impl CommandSource for ChannelCommandSource {
    fn recv_timeout(&mut self, timeout: Duration) -> Received {
        match self.rx.recv_timeout(timeout) {
            Ok(raw) => Received::Command(raw),
            Err(RecvTimeoutError::Timeout) => Received::Timeout,
            Err(RecvTimeoutError::Disconnected) => Received::Closed,
        }
    }
}

/// 校验并投递一条原始命令
///
/// 无效载荷被丢弃（计入 `commands_rejected`），邮箱保持原值。
pub fn dispatch_raw(
    raw: &RawCommand,
    mailboxes: &CommandMailboxes,
    metrics: &SimulationMetrics,
) -> bool {
    match Command::decode(raw) {
        Ok(command) => {
            if mailboxes.post(command) {
                metrics.commands_overwritten.fetch_add(1, Ordering::Relaxed);
            }
            true
        },
        Err(e) => {
            metrics.commands_rejected.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Rejected {} command: {}", raw.kind.name(), e);
            false
        },
    }
}
