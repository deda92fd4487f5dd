//! 控制器共享库探测
//!
//! 加载共享库并解析全部导出符号；`--smoke` 时再以站立姿态试运行一个周期。

use anyhow::{Context, Result, bail};
use clap::Args;
use quadsim_sdk::GaitController;
use quadsim_sdk::driver::SharedLibraryController;
use quadsim_sdk::protocol::{
    ControllerCommand, InertialFrame, JointArray, JointFeedback, PowerMode, StanceGains,
    TorqueFrame,
};
use quadsim_sdk::{RuntimeConfig, SimulationConfig};
use std::path::PathBuf;

/// 探测命令参数
#[derive(Args, Debug)]
pub struct ProbeCommand {
    /// 共享库路径（未给出时取配置文件中的 `controller_library`）
    pub library: Option<PathBuf>,

    /// 配置文件（提供库路径、频率与增益）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 试运行一个控制周期
    #[arg(long)]
    pub smoke: bool,
}

impl ProbeCommand {
    pub fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => SimulationConfig::load_from_file(path)
                .with_context(|| format!("配置文件无效: {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        let runtime = RuntimeConfig::from_config(&config)?;

        let Some(library) = self.library.or(runtime.controller_library) else {
            bail!(
                "No controller library given (pass a path or set simulation.controller_library)"
            );
        };

        let mut controller = SharedLibraryController::load(&library)
            .with_context(|| format!("加载控制器失败: {}", library.display()))?;
        println!("✅ 已解析全部符号: {}", controller.path().display());

        if self.smoke {
            let rate = runtime.core.controller_rate_hz();
            let (torque, command) = smoke_cycle(&mut controller, rate, &runtime.core.gains)?;
            println!("✅ 试运行完成 ({} Hz)", rate);
            println!("  力矩: {:?}", torque.eff.as_array());
            println!("  目标位置: {:?}", command.position.as_array());
            println!("  kp: {:?}", command.kp.as_array());
            println!("  kd: {:?}", command.kd.as_array());
        }
        Ok(())
    }
}

/// 以静止站立状态跑一个完整周期：初始化、预热、计算、读取关节命令
pub(crate) fn smoke_cycle<C: GaitController + ?Sized>(
    controller: &mut C,
    rate_hz: f64,
    gains: &StanceGains,
) -> Result<(TorqueFrame, ControllerCommand)> {
    let imu = InertialFrame {
        linear_acceleration: [0.0, 0.0, quadsim_sdk::driver::DEFAULT_GRAVITY],
        ..Default::default()
    }
    .to_packet();
    let legs = JointFeedback {
        position: JointArray::stance(),
        velocity: JointArray::splat(0.0),
    }
    .to_packet();

    controller.init(rate_hz, gains)?;
    controller.pre_step(&imu, &legs)?;
    controller.set_mode(PowerMode::Normal.controller_code())?;
    let torque = controller.compute(&imu, &legs)?;
    let command = controller.joint_command()?;
    if !torque.eff.is_finite() {
        bail!("Controller produced non-finite torque");
    }
    Ok((torque, command))
}
