// apps/tc_cli/src/commands/mod.rs

//! 子命令

pub mod info;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use std::path::Path;
use tc_config::ClosureConfig;
use tc_physics::mesh::{FvMesh, StructuredMesh};

/// 读取配置文件，未给出时使用模型默认配置
pub fn load_config(path: Option<&Path>, model: &str) -> Result<ClosureConfig> {
    match path {
        Some(p) => ClosureConfig::from_file(p)
            .with_context(|| format!("读取配置失败: {}", p.display())),
        None => Ok(ClosureConfig::new(model)),
    }
}

/// 单单元样例网格，仅用于构建模型以读取系数
pub fn sample_mesh() -> Result<FvMesh> {
    StructuredMesh::new(1, 1, 1.0, 1.0)
        .build()
        .context("构建样例网格失败")
}
