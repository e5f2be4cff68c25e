// apps/tc_cli/src/commands/info.rs

//! 模型信息
//!
//! 列出已注册模型，或打印某个模型的默认系数字典。

use super::sample_mesh;
use anyhow::Result;
use clap::Args;
use tc_config::ClosureConfig;
use tc_physics::turbulence::ClosureRegistry;
use tracing::info;

/// 信息参数
#[derive(Args)]
pub struct InfoArgs {
    /// 打印该模型的默认系数
    #[arg(short, long)]
    pub model: Option<String>,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== TurbClosure 信息 ===");
    let registry = ClosureRegistry::with_defaults();

    match args.model {
        Some(name) => {
            let model = registry.create(&name, &sample_mesh()?, &ClosureConfig::new(&name))?;
            let state = model.state();
            println!("模型: {}", model.name());
            println!(
                "附加场: v2={}, γ={}, 非线性应力={}",
                state.v2.is_some(),
                state.gamma.is_some(),
                state.anisotropy.is_some()
            );
            println!("默认系数:");
            println!("{}", model.coefficients().to_json_pretty()?);
        }
        None => {
            println!("TurbClosure CLI 版本: {}", env!("CARGO_PKG_VERSION"));
            println!("可用模型:");
            for name in registry.names() {
                println!("  - {name}");
            }
        }
    }
    Ok(())
}
