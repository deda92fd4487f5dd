//! 集成测试共享工具

#![allow(dead_code)]

use quadsim_driver::mock::{MockPhysics, ScriptedController};
use quadsim_sdk::{RuntimeConfig, Simulation, SimulationConfig};
use std::thread;
use std::time::{Duration, Instant};

/// 加快复位过程的最小配置
pub const FAST_CONFIG: &str = r#"
[simulation]
freq = 500.0

[reset]
warmup_ticks = 2
settle_ticks = 20
"#;

/// 轮询直到条件成立或超时
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

/// 以快速配置为基础，应用 `edit` 后解析
pub fn config_with(edit: impl FnOnce(&mut SimulationConfig)) -> SimulationConfig {
    let mut config = SimulationConfig::from_toml_str(FAST_CONFIG).unwrap();
    edit(&mut config);
    config
}

/// 使用 mock 物理与计数控制器启动仿真
pub fn start(config: &SimulationConfig) -> (Simulation, MockPhysics, ScriptedController) {
    let runtime = RuntimeConfig::from_config(config).unwrap();
    let physics = MockPhysics::new(runtime.core.total_joints);
    let controller = ScriptedController::counting();
    let sim = runtime
        .builder()
        .physics(physics.clone())
        .controller(controller.clone())
        .build()
        .unwrap();
    (sim, physics, controller)
}
