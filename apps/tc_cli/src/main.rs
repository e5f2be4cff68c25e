// apps/tc_cli/src/main.rs

//! TurbClosure 命令行界面
//!
//! 在二维槽道上驱动湍流闭合模型，列出模型与默认系数，校验配置文件。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// TurbClosure 湍流闭合命令行工具
#[derive(Parser)]
#[command(name = "tc_cli")]
#[command(author = "TurbClosure Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "RANS turbulence closure driver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 在槽道流上推进模型
    Run(commands::run::RunArgs),
    /// 列出模型与默认系数
    Info(commands::info::InfoArgs),
    /// 校验配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // 同时接管 tc_physics 的 log 记录
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("初始化日志失败: {e}"))?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
