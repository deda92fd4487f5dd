//! # 仿真配置文件
//!
//! TOML 格式，所有字段都有默认值，缺省的段或字段使用默认配置：
//!
//! ```toml
//! [simulation]
//! terrain = "plane"
//! camera = false
//! freq = 500.0
//! stand_kp = 100.0
//! stand_kd = 1.0
//! joint_kp = 60.0
//! joint_kd = 0.6
//!
//! [communication]
//! divide = 1
//! use_position_control = false
//! ```

use crate::error::ConfigError;
use quadsim_protocol::{ActuationMode, NUM_JOINTS, StanceGains};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认关节映射（规范关节 → 引擎关节索引）
const DEFAULT_JOINT_MAP: [usize; NUM_JOINTS] = [0, 1, 2, 4, 5, 6, 8, 9, 10, 12, 13, 14];

/// 地形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// 平地
    #[default]
    Plane,
    /// 随机高度场 1
    Random1,
    /// 随机高度场 2
    Random2,
    /// 台阶
    Stairs,
    /// 赛道
    Racetrack,
}

impl Terrain {
    /// 复位出生高度（米）
    pub fn spawn_height(self) -> f64 {
        match self {
            Terrain::Racetrack => 0.4,
            _ => 0.30,
        }
    }
}

/// `[simulation]` 段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// 地形
    pub terrain: Terrain,
    /// 是否启用深度相机
    pub camera: bool,
    /// 物理步进频率（Hz）
    pub freq: f64,
    /// 站立增益 kp
    pub stand_kp: f64,
    /// 站立增益 kd
    pub stand_kd: f64,
    /// 关节增益 kp
    pub joint_kp: f64,
    /// 关节增益 kd
    pub joint_kd: f64,
    /// 重力加速度（m/s²）
    pub gravity: f64,
    /// 步态控制器共享库路径
    pub controller_library: Option<String>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let gains = StanceGains::default();
        Self {
            terrain: Terrain::default(),
            camera: false,
            freq: 500.0,
            stand_kp: gains.stand_kp,
            stand_kd: gains.stand_kd,
            joint_kp: gains.joint_kp,
            joint_kd: gains.joint_kd,
            gravity: 9.8,
            controller_library: None,
        }
    }
}

impl SimulationSection {
    /// 控制器初始化增益
    pub fn gains(&self) -> StanceGains {
        StanceGains {
            stand_kp: self.stand_kp,
            stand_kd: self.stand_kd,
            joint_kp: self.joint_kp,
            joint_kd: self.joint_kd,
        }
    }
}

/// `[communication]` 段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationSection {
    /// 控制器降频因子 D
    pub divide: u32,
    /// 使用位置混合驱动（否则直接力矩）
    pub use_position_control: bool,
}

impl Default for CommunicationSection {
    fn default() -> Self {
        Self {
            divide: 1,
            use_position_control: false,
        }
    }
}

impl CommunicationSection {
    /// 驱动方式
    pub fn actuation(&self) -> ActuationMode {
        ActuationMode::from_position_control(self.use_position_control)
    }
}

/// `[reset]` 段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetSection {
    /// 预热 tick 数
    pub warmup_ticks: u32,
    /// 稳定 tick 数
    pub settle_ticks: u32,
    /// 引擎关节总数
    pub total_joints: usize,
    /// 规范关节 → 引擎关节索引（12 个）
    pub joint_map: Vec<usize>,
}

impl Default for ResetSection {
    fn default() -> Self {
        Self {
            warmup_ticks: 10,
            settle_ticks: 200,
            total_joints: 16,
            joint_map: DEFAULT_JOINT_MAP.to_vec(),
        }
    }
}

/// `[perception]` 段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionSection {
    /// 采集频率（Hz）
    pub rate_hz: f64,
    /// 全分辨率宽度
    pub width: u32,
    /// 全分辨率高度
    pub height: u32,
    /// 降采样因子
    pub downsample: u32,
    /// 垂直视场角（度）
    pub fov_deg: f64,
    /// 近裁剪面（米）
    pub near: f64,
    /// 远裁剪面（米）
    pub far: f64,
    /// 有效深度下界（不含）
    pub min_depth: f64,
    /// 有效深度上界（不含）
    pub max_depth: f64,
    /// 点云坐标系
    pub frame_id: String,
}

impl Default for PerceptionSection {
    fn default() -> Self {
        Self {
            rate_hz: 20.0,
            width: 320,
            height: 240,
            downsample: 4,
            fov_deg: 60.0,
            near: 0.1,
            far: 1000.0,
            min_depth: 0.01,
            max_depth: 4.0,
            frame_id: "world".to_string(),
        }
    }
}

/// `[telemetry]` 段（每 N 次发布一次，0 表示关闭）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    /// 里程计
    pub odometry_every: u32,
    /// IMU
    pub inertial_every: u32,
    /// 相机帧
    pub camera_every: u32,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            odometry_every: 1,
            inertial_every: 1,
            camera_every: 1,
        }
    }
}

/// `[timing]` 段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    /// 单次控制器调用预算（微秒）
    pub controller_budget_us: u64,
    /// 启动时等待首次复位的超时（毫秒）
    pub startup_timeout_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            controller_budget_us: 2_000,
            startup_timeout_ms: 10_000,
        }
    }
}

/// 仿真配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub simulation: SimulationSection,
    pub communication: CommunicationSection,
    pub reset: ResetSection,
    pub perception: PerceptionSection,
    pub telemetry: TelemetrySection,
    pub timing: TimingSection,
}

impl SimulationConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 复位出生高度
    pub fn spawn_height(&self) -> f64 {
        self.simulation.terrain.spawn_height()
    }

    /// 规范关节 → 引擎关节索引
    pub fn joint_map(&self) -> Result<[usize; NUM_JOINTS], ConfigError> {
        self.reset.joint_map.as_slice().try_into().map_err(|_| {
            ConfigError::invalid(
                "reset.joint_map",
                format!(
                    "expected {} entries, got {}",
                    NUM_JOINTS,
                    self.reset.joint_map.len()
                ),
            )
        })
    }

    /// 校验字段取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if !sim.freq.is_finite() || sim.freq <= 0.0 {
            return Err(ConfigError::invalid(
                "simulation.freq",
                format!("must be positive, got {}", sim.freq),
            ));
        }
        for (field, value) in [
            ("simulation.stand_kp", sim.stand_kp),
            ("simulation.stand_kd", sim.stand_kd),
            ("simulation.joint_kp", sim.joint_kp),
            ("simulation.joint_kd", sim.joint_kd),
            ("simulation.gravity", sim.gravity),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be finite"));
            }
        }

        if self.communication.divide == 0 {
            return Err(ConfigError::invalid("communication.divide", "must be >= 1"));
        }

        let map = self.joint_map()?;
        if self.reset.total_joints < NUM_JOINTS {
            return Err(ConfigError::invalid(
                "reset.total_joints",
                format!("must be >= {}", NUM_JOINTS),
            ));
        }
        for (i, &id) in map.iter().enumerate() {
            if id >= self.reset.total_joints {
                return Err(ConfigError::invalid(
                    "reset.joint_map",
                    format!(
                        "index {} out of range (total_joints = {})",
                        id, self.reset.total_joints
                    ),
                ));
            }
            if map[..i].contains(&id) {
                return Err(ConfigError::invalid(
                    "reset.joint_map",
                    format!("index {} appears twice", id),
                ));
            }
        }

        let cam = &self.perception;
        if !cam.rate_hz.is_finite() || cam.rate_hz <= 0.0 {
            return Err(ConfigError::invalid("perception.rate_hz", "must be positive"));
        }
        if cam.downsample == 0 || cam.width < cam.downsample || cam.height < cam.downsample {
            return Err(ConfigError::invalid(
                "perception.downsample",
                "must be >= 1 and not exceed the resolution",
            ));
        }
        if cam.fov_deg <= 0.0 || cam.fov_deg >= 180.0 || cam.fov_deg.is_nan() {
            return Err(ConfigError::invalid("perception.fov_deg", "must be in (0, 180)"));
        }
        if cam.near <= 0.0 || cam.far <= cam.near || cam.near.is_nan() || !cam.far.is_finite() {
            return Err(ConfigError::invalid(
                "perception.near",
                "requires 0 < near < far with a finite far plane",
            ));
        }
        if cam.min_depth < 0.0
            || cam.min_depth >= cam.max_depth
            || cam.min_depth.is_nan()
            || cam.max_depth.is_nan()
        {
            return Err(ConfigError::invalid(
                "perception.min_depth",
                "requires 0 <= min_depth < max_depth",
            ));
        }

        Ok(())
    }
}
