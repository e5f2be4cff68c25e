// crates/tc_physics/src/turbulence/transport.rs

//! 湍流标量输运求解
//!
//! 每个方程：组装 → Jacobi 预条件 BiCGStab → 检查结果。
//! 系数在整个求解期间冻结（滞后系数迭代）。
//!
//! 失败策略：
//! - `MaxIterationsReached` / `Stagnated` 且解有限：记录警告，接受结果
//! - `Diverged` 或解含非有限值：场保持求解前的值，返回 [`TcError::LinearSolve`]

use crate::mesh::FvMesh;
use crate::numerics::discretization::{EquationTerms, TransportAssembler};
use crate::numerics::linear_algebra::{
    BiCgStabSolver, IterativeSolver, JacobiPreconditioner, SolverConfig, SolverStatus,
};
use crate::state::{MeanFlowState, ScalarField};
use log::{debug, warn};
use tc_config::TransportSolverConfig;
use tc_foundation::scalar::all_finite;
use tc_foundation::{ensure, TcError, TcResult};

/// 单个方程的求解报告
#[derive(Debug, Clone, PartialEq)]
pub struct EquationReport {
    /// 场名称
    pub field: String,
    /// 最后一次线性求解的状态
    pub status: SolverStatus,
    /// 所有扫描的累计迭代次数
    pub iterations: usize,
    /// 首次扫描的初始残差
    pub initial_residual: f64,
    /// 末次扫描的最终残差
    pub final_residual: f64,
}

impl EquationReport {
    /// 是否收敛
    pub fn converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// 标量输运求解器
pub struct ScalarTransport {
    assembler: TransportAssembler,
    solver: BiCgStabSolver,
    config: TransportSolverConfig,
    work: Vec<f64>,
}

impl ScalarTransport {
    /// 按网格与求解配置创建
    pub fn new(mesh: &FvMesh, config: &TransportSolverConfig) -> TcResult<Self> {
        ensure!(config.n_sweeps > 0, TcError::config("nSweeps 必须至少为 1"));
        Ok(Self {
            assembler: TransportAssembler::new(mesh)?.with_bounded(config.bounded),
            solver: BiCgStabSolver::new(SolverConfig::from(config)),
            config: config.clone(),
            work: vec![0.0; mesh.n_cells()],
        })
    }

    /// 求解配置
    pub fn config(&self) -> &TransportSolverConfig {
        &self.config
    }

    /// 求解一个标量方程，成功时原位更新 `field`
    pub fn solve(
        &mut self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
        field: &mut ScalarField,
        terms: &EquationTerms,
        dt: f64,
    ) -> TcResult<EquationReport> {
        let relax = self.config.relaxation.for_field(field.name());
        let mut report = EquationReport {
            field: field.name().to_string(),
            status: SolverStatus::Converged,
            iterations: 0,
            initial_residual: 0.0,
            final_residual: 0.0,
        };

        let original = field.values().to_vec();

        for sweep in 0..self.config.n_sweeps {
            self.assembler
                .assemble(mesh, flow, field, terms, dt, relax)?;
            let precond = JacobiPreconditioner::from_matrix(self.assembler.matrix());

            self.work.clear();
            self.work.extend_from_slice(field.values());
            let result = self.solver.solve(
                self.assembler.matrix(),
                self.assembler.rhs(),
                &mut self.work,
                &precond,
            );

            if sweep == 0 {
                report.initial_residual = result.initial_residual_norm;
            }
            report.iterations += result.iterations;
            report.final_residual = result.residual_norm;
            report.status = result.status;

            if result.status == SolverStatus::Diverged || !all_finite(&self.work) {
                field.values_mut().copy_from_slice(&original);
                return Err(TcError::linear_solve(
                    field.name(),
                    format!(
                        "{:?}，迭代 {} 次，残差 {:.3e}",
                        result.status, result.iterations, result.residual_norm
                    ),
                ));
            }
            if !result.is_converged() {
                warn!(
                    "{} 方程未收敛 ({:?})，迭代 {} 次，相对残差 {:.3e}",
                    field.name(),
                    result.status,
                    result.iterations,
                    result.relative_residual
                );
            }

            field.values_mut().copy_from_slice(&self.work);
        }

        debug!(
            "{}: {} 次迭代，残差 {:.3e} -> {:.3e}",
            report.field, report.iterations, report.initial_residual, report.final_residual
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StructuredMesh;
    use crate::numerics::discretization::CellSource;
    use crate::turbulence::VelocityGradient;

    fn quiescent(mesh: &FvMesh) -> MeanFlowState {
        let n = mesh.n_cells();
        MeanFlowState::uniform_gradient(mesh, VelocityGradient::zero(), vec![1.0; n], 1e-5)
            .unwrap()
    }

    #[test]
    fn test_steady_source_sink_balance() {
        let mesh = StructuredMesh::new(4, 3, 1.0, 1.0).build().unwrap();
        let flow = quiescent(&mesh);
        let n = mesh.n_cells();
        let mut field = ScalarField::uniform("k", &mesh, 1.0);
        // φ = su/sp 为零梯度边界下的稳态解
        let terms = EquationTerms::new(
            vec![1e-3; n],
            vec![CellSource { su: 2.0, sp: 4.0 }; n],
        );
        let mut transport = ScalarTransport::new(&mesh, &TransportSolverConfig::default()).unwrap();
        let report = transport
            .solve(&mesh, &flow, &mut field, &terms, f64::INFINITY)
            .unwrap();
        assert!(report.converged());
        assert_eq!(report.field, "k");
        for &v in field.values() {
            assert!((v - 0.5).abs() < 1e-8);
        }
    }

    #[test]
    fn test_zero_sweeps_rejected() {
        let mesh = StructuredMesh::new(2, 2, 1.0, 1.0).build().unwrap();
        let cfg = TransportSolverConfig {
            n_sweeps: 0,
            ..Default::default()
        };
        assert!(ScalarTransport::new(&mesh, &cfg).is_err());
    }

    #[test]
    fn test_invalid_terms_leave_field_untouched() {
        let mesh = StructuredMesh::new(3, 3, 1.0, 1.0).build().unwrap();
        let flow = quiescent(&mesh);
        let mut field = ScalarField::uniform("omega", &mesh, 7.0);
        let terms = EquationTerms::new(vec![1e-3; 2], vec![CellSource::default(); 2]);
        let mut transport = ScalarTransport::new(&mesh, &TransportSolverConfig::default()).unwrap();
        assert!(transport.solve(&mesh, &flow, &mut field, &terms, 1.0).is_err());
        assert!(field.values().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_unconverged_solve_is_accepted() {
        let mesh = StructuredMesh::new(6, 4, 1.0, 1.0).build().unwrap();
        let flow = quiescent(&mesh);
        let n = mesh.n_cells();
        let mut field = ScalarField::uniform("k", &mesh, 1.0);
        let sources = (0..n)
            .map(|i| CellSource {
                su: 1.0 + i as f64,
                sp: 0.5,
            })
            .collect();
        let terms = EquationTerms::new(vec![1e-2; n], sources);
        let cfg = TransportSolverConfig {
            rtol: 1e-30,
            atol: 0.0,
            max_iter: 1,
            ..Default::default()
        };
        let mut transport = ScalarTransport::new(&mesh, &cfg).unwrap();
        let report = transport.solve(&mesh, &flow, &mut field, &terms, 10.0).unwrap();
        assert!(!report.converged());
        assert_eq!(report.iterations, 1);
        assert!(field.values().iter().all(|v| v.is_finite()));
        assert!(field.values().iter().any(|&v| v != 1.0));
    }

    #[test]
    fn test_overflowing_solve_restores_field() {
        let mesh = StructuredMesh::new(3, 3, 1.0, 1.0).build().unwrap();
        let flow = quiescent(&mesh);
        let n = mesh.n_cells();
        let mut field = ScalarField::uniform("omega", &mesh, 3.0);
        let terms = EquationTerms::new(
            vec![1e-3; n],
            vec![CellSource { su: f64::MAX, sp: 1e-3 }; n],
        );
        let mut transport = ScalarTransport::new(&mesh, &TransportSolverConfig::default()).unwrap();
        let err = transport
            .solve(&mesh, &flow, &mut field, &terms, f64::INFINITY)
            .unwrap_err();
        assert!(matches!(err, TcError::LinearSolve { field: ref name, .. } if name == "omega"));
        assert!(field.values().iter().all(|&v| v == 3.0));
    }
}
