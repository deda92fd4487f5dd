//! 配置管理命令
//!
//! 生成默认配置文件，或校验已有配置并打印换算后的运行时参数。

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use quadsim_sdk::{RuntimeConfig, SimulationConfig};
use std::path::{Path, PathBuf};

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写出默认配置
    Init {
        /// 输出路径
        #[arg(default_value = "quadsim.toml")]
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(short, long)]
        force: bool,
    },

    /// 校验配置文件
    Check {
        /// 配置文件路径
        path: PathBuf,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => init(&path, force),
            ConfigCommand::Check { path } => {
                let summary = check(&path)?;
                println!("{}", summary);
                Ok(())
            },
        }
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    SimulationConfig::default()
        .save_to_file(path)
        .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
    println!("✅ 已写出默认配置: {}", path.display());
    Ok(())
}

/// 加载、校验并生成摘要
fn check(path: &Path) -> Result<String> {
    let config = SimulationConfig::load_from_file(path)
        .with_context(|| format!("配置文件无效: {}", path.display()))?;
    let runtime = RuntimeConfig::from_config(&config)?;
    let core = &runtime.core;

    let mut lines = vec![
        format!("配置文件: {}", path.display()),
        format!("  地形: {:?} (出生高度 {:.2} m)", config.simulation.terrain, core.spawn_height),
        format!(
            "  物理频率: {} Hz, 控制器频率: {} Hz (D = {})",
            core.frequency_hz,
            core.controller_rate_hz(),
            core.divisor
        ),
        format!("  驱动方式: {:?}", core.actuation),
        format!(
            "  复位: 预热 {} tick, 稳定 {} tick, 关节总数 {}",
            core.warmup_ticks, core.settle_ticks, core.total_joints
        ),
    ];
    match &runtime.perception {
        Some(cam) => lines.push(format!(
            "  相机: {}x{} @ {} Hz, 深度 ({}, {}) m",
            cam.width(),
            cam.height(),
            cam.rate_hz,
            cam.min_depth,
            cam.max_depth
        )),
        None => lines.push("  相机: 关闭".to_string()),
    }
    match &runtime.controller_library {
        Some(library) => lines.push(format!("  控制器: {}", library.display())),
        None => lines.push("  控制器: (未设置)".to_string()),
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_check() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quadsim.toml");

        init(&path, false).unwrap();
        let summary = check(&path).unwrap();
        assert!(summary.contains("Plane"));
        assert!(summary.contains("D = 1"));
        assert!(summary.contains("相机: 关闭"));
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quadsim.toml");
        fs::write(&path, "# keep me\n").unwrap();

        assert!(init(&path, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# keep me\n");
        init(&path, true).unwrap();
        assert!(SimulationConfig::load_from_file(&path).is_ok());
    }

    #[test]
    fn test_check_reports_invalid_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[communication]\ndivide = 0\n").unwrap();

        let err = check(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("communication.divide"));
    }
}
