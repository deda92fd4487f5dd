//! 控制器输出与外部命令定义
//!
//! - [`ControllerCommand`] / [`TorqueFrame`]：外部步态控制器的两种输出，
//!   只在降频 tick 上更新，其余 tick 保持不变（零阶保持）
//! - [`Command`]：来自命令源的步态类型、功率模式、机体速度命令，
//!   由 [`Command::decode`] 从松散的 [`CommandPayload`] 校验得到

use crate::error::ProtocolError;
use crate::joint::JointArray;

/// 控制器给出的逐关节命令（5×12）
///
/// 增益使用控制器原生单位，进入仿真前需要经过标定缩放。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerCommand {
    /// 目标位置（rad）
    pub position: JointArray<f64>,
    /// 目标速度（rad/s）
    pub velocity: JointArray<f64>,
    /// 比例增益（控制器单位）
    pub kp: JointArray<f64>,
    /// 微分增益（控制器单位）
    pub kd: JointArray<f64>,
    /// 前馈力矩（Nm）
    pub effort: JointArray<f64>,
}

/// 控制器直接给出的逐关节力矩
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TorqueFrame {
    /// 力矩（Nm）
    pub eff: JointArray<f64>,
}

/// 控制器初始化使用的四个 PD 增益
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StanceGains {
    /// 站立 Kp
    pub stand_kp: f64,
    /// 站立 Kd
    pub stand_kd: f64,
    /// 关节 Kp
    pub joint_kp: f64,
    /// 关节 Kd
    pub joint_kd: f64,
}

impl StanceGains {
    /// 按控制器约定的顺序展开
    pub fn to_array(&self) -> [f64; 4] {
        [self.stand_kp, self.stand_kd, self.joint_kp, self.joint_kd]
    }
}

impl Default for StanceGains {
    fn default() -> Self {
        Self {
            stand_kp: 100.0,
            stand_kd: 1.0,
            joint_kp: 60.0,
            joint_kd: 0.6,
        }
    }
}

/// 机体速度命令 `(vx, vy, wz)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VelocityCommand {
    /// 前向线速度（m/s）
    pub vx: f64,
    /// 侧向线速度（m/s）
    pub vy: f64,
    /// 偏航角速度（rad/s）
    pub wz: f64,
}

impl VelocityCommand {
    /// 按控制器约定的顺序展开
    pub fn to_array(&self) -> [f64; 3] {
        [self.vx, self.vy, self.wz]
    }
}

/// 命令种类（对应命令源的三个入口）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandKind {
    /// 步态类型
    GaitType,
    /// 控制器模式码
    RobotMode,
    /// 机体速度
    BodyVelocity,
}

impl CommandKind {
    /// 名称（用于日志）
    pub const fn name(self) -> &'static str {
        match self {
            CommandKind::GaitType => "gait_type",
            CommandKind::RobotMode => "robot_mode",
            CommandKind::BodyVelocity => "cmd_vel",
        }
    }
}

/// 命令源送来的原始载荷
///
/// 传输层不保证类型，校验在 [`Command::decode`] 中完成。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandPayload {
    /// 空载荷
    Empty,
    /// 整数
    Int(i64),
    /// 浮点
    Float(f64),
    /// 浮点列表
    FloatList(Vec<f64>),
    /// 文本
    Text(String),
}

impl CommandPayload {
    fn type_name(&self) -> &'static str {
        match self {
            CommandPayload::Empty => "empty",
            CommandPayload::Int(_) => "int",
            CommandPayload::Float(_) => "float",
            CommandPayload::FloatList(_) => "float list",
            CommandPayload::Text(_) => "text",
        }
    }
}

/// 原始命令（种类 + 载荷）
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawCommand {
    /// 命令种类
    pub kind: CommandKind,
    /// 载荷
    pub payload: CommandPayload,
}

impl RawCommand {
    /// 创建原始命令
    pub fn new(kind: CommandKind, payload: CommandPayload) -> Self {
        Self { kind, payload }
    }
}

/// 校验后的命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// 设置步态类型（控制器自定义编码）
    GaitType(i32),
    /// 设置控制器模式码
    RobotMode(i32),
    /// 设置机体速度
    BodyVelocity(VelocityCommand),
}

impl Command {
    /// 校验原始命令
    ///
    /// # 错误
    ///
    /// - `ProtocolError::EmptyPayload`: 载荷为空
    /// - `ProtocolError::TypeMismatch`: 载荷类型与命令种类不符
    /// - `ProtocolError::InvalidLength`: 速度列表长度不是 3
    /// - `ProtocolError::OutOfRange`: 整数超出 i32 或浮点非有限值
    pub fn decode(raw: &RawCommand) -> Result<Self, ProtocolError> {
        match (raw.kind, &raw.payload) {
            (kind, CommandPayload::Empty) => Err(ProtocolError::EmptyPayload {
                command: kind.name(),
            }),
            (CommandKind::GaitType, CommandPayload::Int(v)) => Ok(Command::GaitType(to_code(*v)?)),
            (CommandKind::RobotMode, CommandPayload::Int(v)) => {
                Ok(Command::RobotMode(to_code(*v)?))
            },
            (CommandKind::BodyVelocity, CommandPayload::FloatList(values)) => {
                if values.is_empty() {
                    return Err(ProtocolError::EmptyPayload {
                        command: raw.kind.name(),
                    });
                }
                let [vx, vy, wz] = <[f64; 3]>::try_from(values.as_slice()).map_err(|_| {
                    ProtocolError::InvalidLength {
                        expected: 3,
                        actual: values.len(),
                    }
                })?;
                if !(vx.is_finite() && vy.is_finite() && wz.is_finite()) {
                    return Err(ProtocolError::OutOfRange {
                        command: raw.kind.name(),
                        detail: format!("non-finite velocity {:?}", values),
                    });
                }
                Ok(Command::BodyVelocity(VelocityCommand { vx, vy, wz }))
            },
            (kind, payload) => Err(ProtocolError::TypeMismatch {
                command: kind.name(),
                actual: payload.type_name(),
            }),
        }
    }
}

fn to_code(value: i64) -> Result<i32, ProtocolError> {
    i32::try_from(value).map_err(|_| ProtocolError::OutOfRange {
        command: "mode code",
        detail: format!("{} does not fit in i32", value),
    })
}
