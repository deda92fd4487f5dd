//! 命令定义和实现

pub mod config;
pub mod probe;

pub use config::ConfigCommand;
pub use probe::ProbeCommand;
