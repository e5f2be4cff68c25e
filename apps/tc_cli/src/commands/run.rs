// apps/tc_cli/src/commands/run.rs

//! 槽道流驱动
//!
//! 给定抛物线速度剖面 u = U·4η(1 − η)，η = y/H，
//! 冻结平均流并反复调用 `correct()`，输出湍流场统计。

use super::load_config;
use anyhow::{bail, Context, Result};
use clap::Args;
use glam::DVec3;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tc_physics::mesh::{FvMesh, StructuredMesh};
use tc_physics::state::MeanFlowState;
use tc_physics::turbulence::{ClosureRegistry, TurbulenceClosure};
use tracing::{info, warn};

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 模型名（未给出配置文件时使用）
    #[arg(short, long, default_value = "kOmegaSST")]
    pub model: String,

    /// 流向单元数
    #[arg(long, default_value = "20")]
    pub nx: usize,

    /// 法向单元数
    #[arg(long, default_value = "40")]
    pub ny: usize,

    /// 槽道长度 [m]
    #[arg(long, default_value = "1.0")]
    pub length: f64,

    /// 槽道高度 [m]
    #[arg(long, default_value = "0.1")]
    pub height: f64,

    /// 近壁网格加密比
    #[arg(long, default_value = "1.0")]
    pub grading: f64,

    /// 中心线速度 [m/s]
    #[arg(long, default_value = "1.0")]
    pub u_max: f64,

    /// 分子运动黏度 [m²/s]
    #[arg(long, default_value = "1.5e-5")]
    pub nu: f64,

    /// 时间步数
    #[arg(short = 'n', long, default_value = "100")]
    pub steps: usize,

    /// 时间步长 [s]
    #[arg(long, default_value = "1e-3")]
    pub dt: f64,

    /// 统计输出间隔（步）
    #[arg(long, default_value = "10")]
    pub report_interval: usize,

    /// 结果输出文件（JSON）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== TurbClosure 槽道流 ===");
    if args.dt <= 0.0 || !args.dt.is_finite() {
        bail!("时间步长必须为正: {}", args.dt);
    }

    let config = load_config(args.config.as_deref(), &args.model)?;
    let mesh = StructuredMesh::new(args.nx, args.ny, args.length, args.height)
        .with_grading(args.grading)
        .build()
        .context("构建网格失败")?;
    info!("网格: {} 单元, {} 面", mesh.n_cells(), mesh.n_faces());

    let h = args.height;
    let velocity = mesh
        .cell_centers()
        .iter()
        .map(|c| {
            let eta = c.y / h;
            DVec3::new(args.u_max * 4.0 * eta * (1.0 - eta), 0.0, 0.0)
        })
        .collect();
    let flow = MeanFlowState::from_velocity(&mesh, velocity, mesh.nearest_wall_distance(), args.nu)
        .context("构建平均流失败")?;

    let mut model = ClosureRegistry::with_defaults()
        .create_from_config(&mesh, &config)
        .context("创建湍流模型失败")?;
    model.validate(&mesh, &flow)?;

    let start = Instant::now();
    let interval = args.report_interval.max(1);
    let mut unconverged = 0usize;
    for step in 1..=args.steps {
        let report = model
            .correct(&mesh, &flow, args.dt)
            .with_context(|| format!("第 {step} 步失败"))?;
        if !report.all_converged() {
            unconverged += 1;
        }
        if step % interval == 0 || step == args.steps {
            let (k_min, k_max) = range(model.k());
            let (_, nut_max) = range(model.eddy_viscosity());
            info!(
                "step {:>5}: k ∈ [{:.3e}, {:.3e}], νt,max = {:.3e}, 截断单元 {}",
                step, k_min, k_max, nut_max, report.clipped_cells
            );
        }
    }
    if unconverged > 0 {
        warn!("{} 步存在未收敛方程", unconverged);
    }
    info!(
        "=== 完成: {} 步, {:.2} s ===",
        args.steps,
        start.elapsed().as_secs_f64()
    );

    if let Some(path) = &args.output {
        write_profile(path, model.as_ref(), &mesh, &flow)?;
        info!("结果已写入 {}", path.display());
    }
    Ok(())
}

fn range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// 写出全部单元的湍流场
fn write_profile(
    path: &Path,
    model: &dyn TurbulenceClosure,
    mesh: &FvMesh,
    flow: &MeanFlowState,
) -> Result<()> {
    let centers: Vec<[f64; 2]> = mesh.cell_centers().iter().map(|c| [c.x, c.y]).collect();
    let doc = serde_json::json!({
        "model": model.name(),
        "coefficients": model.coefficients(),
        "cell_centers": centers,
        "k": model.k(),
        "omega": model.omega(),
        "epsilon": model.epsilon(mesh, flow)?,
        "nut": model.eddy_viscosity(),
        "v2": model.v2(),
        "gamma": model.gamma_intermittency(),
    });
    let text = serde_json::to_string_pretty(&doc)?;
    std::fs::write(path, text).with_context(|| format!("写入失败: {}", path.display()))?;
    Ok(())
}
