// crates/tc_physics/src/numerics/linear_algebra/solver.rs

//! 迭代线性求解器
//!
//! 输运方程矩阵因迎风对流而非对称，使用预条件 BiCGStab。
//! 求解结果带状态码，由调用方决定失败策略。

use super::csr::CsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};
use serde::{Deserialize, Serialize};
use tc_config::TransportSolverConfig;

/// 停滞判据
const STAGNATION_TOL: f64 = 1e-30;
/// 发散判据：残差超过初始残差的倍数
const DIVERGENCE_FACTOR: f64 = 1e6;

/// 求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 相对收敛容差
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 是否输出迭代残差
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-14,
            max_iter: 1000,
            verbose: false,
        }
    }
}

impl SolverConfig {
    /// 创建求解器配置
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }

    /// 设置绝对容差
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }
}

impl From<&TransportSolverConfig> for SolverConfig {
    fn from(cfg: &TransportSolverConfig) -> Self {
        Self {
            rtol: cfg.rtol,
            atol: cfg.atol,
            max_iter: cfg.max_iter,
            verbose: cfg.verbose,
        }
    }
}

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞
    Stagnated,
}

/// 求解器结果
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
    /// 相对残差
    pub relative_residual: f64,
}

impl SolverResult {
    /// 是否收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    fn finish(status: SolverStatus, iterations: usize, residual: f64, initial: f64) -> Self {
        Self {
            status,
            iterations,
            residual_norm: residual,
            initial_residual_norm: initial,
            relative_residual: if initial > 0.0 { residual / initial } else { 0.0 },
        }
    }
}

/// 迭代求解器 trait
pub trait IterativeSolver {
    /// 求解 Ax = b，`x` 输入初值、输出解
    fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult;

    /// 求解器名称
    fn name(&self) -> &'static str;
}

/// 预条件 BiCGStab 求解器
pub struct BiCgStabSolver {
    config: SolverConfig,
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    z: Vec<f64>,
}

impl BiCgStabSolver {
    /// 创建求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            z: Vec::new(),
        }
    }

    /// 配置
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.r0 = vec![0.0; n];
            self.p = vec![0.0; n];
            self.v = vec![0.0; n];
            self.s = vec![0.0; n];
            self.t = vec![0.0; n];
            self.z = vec![0.0; n];
        }
    }
}

impl IterativeSolver for BiCgStabSolver {
    fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult {
        let n = b.len();
        self.ensure_workspace(n);
        let rtol = self.config.rtol;
        let atol = self.config.atol;

        // r = b - A*x
        matrix.mul_vec(x, &mut self.r);
        for i in 0..n {
            self.r[i] = b[i] - self.r[i];
        }

        let initial_norm = norm2(&self.r);
        if initial_norm <= atol {
            return SolverResult::finish(SolverStatus::Converged, 0, initial_norm, initial_norm);
        }

        // 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);

        let mut rho_old = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;
        self.v.fill(0.0);
        self.p.fill(0.0);

        for iter in 0..self.config.max_iter {
            let rho = dot(&self.r0, &self.r);
            if rho.abs() < STAGNATION_TOL {
                let res = norm2(&self.r);
                return SolverResult::finish(SolverStatus::Stagnated, iter, res, initial_norm);
            }

            let beta = if iter == 0 {
                0.0
            } else {
                (rho / rho_old) * (alpha / omega)
            };
            rho_old = rho;

            // p = r + beta * (p - omega * v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            precond.apply(&self.p, &mut self.z);
            matrix.mul_vec(&self.z, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < STAGNATION_TOL {
                let res = norm2(&self.r);
                return SolverResult::finish(SolverStatus::Stagnated, iter, res, initial_norm);
            }
            alpha = rho / r0v;

            // s = r - alpha * v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            let s_norm = norm2(&self.s);
            if s_norm <= atol || s_norm / initial_norm < rtol {
                axpy(alpha, &self.z, x);
                return SolverResult::finish(
                    SolverStatus::Converged,
                    iter + 1,
                    s_norm,
                    initial_norm,
                );
            }

            // x += alpha * M⁻¹p
            axpy(alpha, &self.z, x);

            precond.apply(&self.s, &mut self.z);
            matrix.mul_vec(&self.z, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt < STAGNATION_TOL {
                1.0
            } else {
                dot(&self.t, &self.s) / tt
            };

            if omega.abs() < STAGNATION_TOL {
                return SolverResult::finish(
                    SolverStatus::Stagnated,
                    iter + 1,
                    s_norm,
                    initial_norm,
                );
            }

            // x += omega * M⁻¹s
            axpy(omega, &self.z, x);

            // r = s - omega * t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);
            let rel_res = res_norm / initial_norm;

            if self.config.verbose {
                log::trace!("BiCGStab iter {}: residual = {:.6e}", iter + 1, res_norm);
            }

            if res_norm <= atol || rel_res < rtol {
                return SolverResult::finish(
                    SolverStatus::Converged,
                    iter + 1,
                    res_norm,
                    initial_norm,
                );
            }

            if !res_norm.is_finite() || res_norm > initial_norm * DIVERGENCE_FACTOR {
                return SolverResult::finish(
                    SolverStatus::Diverged,
                    iter + 1,
                    res_norm,
                    initial_norm,
                );
            }
        }

        let res = norm2(&self.r);
        SolverResult::finish(
            SolverStatus::MaxIterationsReached,
            self.config.max_iter,
            res,
            initial_norm,
        )
    }

    fn name(&self) -> &'static str {
        "BiCGStab"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::csr::CsrBuilder;
    use crate::numerics::linear_algebra::preconditioner::{
        IdentityPreconditioner, JacobiPreconditioner,
    };

    /// 非对称对角占优矩阵（迎风对流 + 扩散）
    fn convection_matrix(n: usize) -> CsrMatrix {
        let mut b = CsrBuilder::new_square(n);
        for i in 0..n {
            b.set(i, i, 3.0);
            if i > 0 {
                b.set(i, i - 1, -1.5);
            }
            if i + 1 < n {
                b.set(i, i + 1, -0.5);
            }
        }
        b.build()
    }

    #[test]
    fn test_bicgstab_nonsymmetric() {
        let n = 20;
        let a = convection_matrix(n);
        let x_true: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 * 0.1).collect();
        let mut b = vec![0.0; n];
        a.mul_vec(&x_true, &mut b);

        let mut x = vec![0.0; n];
        let pc = JacobiPreconditioner::from_matrix(&a);
        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-12, 200));
        let result = solver.solve(&a, &b, &mut x, &pc);

        assert!(result.is_converged());
        for (xi, ti) in x.iter().zip(x_true.iter()) {
            assert!((xi - ti).abs() < 1e-8);
        }
    }

    #[test]
    fn test_zero_rhs_converges_immediately() {
        let a = convection_matrix(4);
        let mut x = vec![0.0; 4];
        let mut solver = BiCgStabSolver::new(SolverConfig::default());
        let result = solver.solve(&a, &[0.0; 4], &mut x, &IdentityPreconditioner);
        assert!(result.is_converged());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_max_iterations() {
        let a = convection_matrix(50);
        let b = vec![1.0; 50];
        let mut x = vec![0.0; 50];
        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-30, 1).with_atol(0.0));
        let result = solver.solve(&a, &b, &mut x, &IdentityPreconditioner);
        assert_eq!(result.status, SolverStatus::MaxIterationsReached);
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg = SolverConfig::new(1e-6, 42).with_atol(1e-12);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rtol, 1e-6);
        assert_eq!(back.atol, 1e-12);
        assert_eq!(back.max_iter, 42);
        assert!(!back.verbose);
    }

    #[test]
    fn test_from_transport_config_json() {
        let cfg: TransportSolverConfig =
            serde_json::from_str(r#"{"rtol": 1e-5, "max_iter": 7}"#).unwrap();
        let sc = SolverConfig::from(&cfg);
        assert_eq!(sc.rtol, 1e-5);
        assert_eq!(sc.max_iter, 7);
        assert_eq!(sc.atol, TransportSolverConfig::default().atol);
    }

    #[test]
    fn test_from_transport_config() {
        let cfg = TransportSolverConfig::default();
        let sc = SolverConfig::from(&cfg);
        assert_eq!(sc.max_iter, cfg.max_iter);
        assert_eq!(sc.rtol, cfg.rtol);
    }
}
