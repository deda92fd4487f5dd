//! # quadsim CLI
//!
//! 配置文件与控制器共享库的命令行工具。
//!
//! ```bash
//! # 生成默认配置
//! quadsim-cli config init quadsim.toml
//!
//! # 校验配置并打印运行时参数
//! quadsim-cli config check quadsim.toml
//!
//! # 检查控制器共享库的导出符号，并试运行一次
//! quadsim-cli probe /opt/gait/libquadruped_ctrl.so --smoke
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, ProbeCommand};

/// quadsim CLI - 四足仿真桥命令行工具
#[derive(Parser, Debug)]
#[command(name = "quadsim-cli")]
#[command(about = "Command-line tools for the quadsim simulation bridge", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置文件管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 加载控制器共享库
    Probe {
        #[command(flatten)]
        args: ProbeCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quadsim=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Probe { args } => args.execute(),
    }
}
