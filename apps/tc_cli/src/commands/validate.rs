// apps/tc_cli/src/commands/validate.rs

//! 配置校验
//!
//! 检查配置文件的结构、求解器参数、模型名与系数取值。
//! 模型不识别的系数键记为警告，`--strict` 下视为错误。

use super::sample_mesh;
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use tc_config::ClosureConfig;
use tc_physics::turbulence::ClosureRegistry;
use tracing::{error, info, warn};

/// 校验参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// 执行校验命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== TurbClosure 配置校验 ===");
    let mut result = ValidationResult::default();

    match ClosureConfig::from_file(&args.config) {
        Ok(config) => check_model(&config, &mut result)?,
        Err(e) => result.errors.push(format!("配置无效: {e}")),
    }

    for w in &result.warnings {
        warn!("{w}");
    }
    for e in &result.errors {
        error!("{e}");
    }

    let failed = !result.errors.is_empty() || (args.strict && !result.warnings.is_empty());
    if failed {
        bail!(
            "校验失败: {} 个错误, {} 个警告",
            result.errors.len(),
            result.warnings.len()
        );
    }
    info!("校验通过 ({} 个警告)", result.warnings.len());
    Ok(())
}

fn check_model(config: &ClosureConfig, result: &mut ValidationResult) -> Result<()> {
    let registry = ClosureRegistry::with_defaults();
    let model = match registry.create_from_config(&sample_mesh()?, config) {
        Ok(model) => model,
        Err(e) => {
            result.errors.push(e.to_string());
            return Ok(());
        }
    };

    let known = model.coefficients();
    for key in config.coefficients.keys() {
        if !known.contains(key) {
            result
                .warnings
                .push(format!("模型 {} 不使用系数 {key}", model.name()));
        }
    }
    info!("模型 {}: {} 个系数", model.name(), known.len());
    Ok(())
}
