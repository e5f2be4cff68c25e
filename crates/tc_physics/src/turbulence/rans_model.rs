// crates/tc_physics/src/turbulence/rans_model.rs

//! 通用 RANS 模型驱动
//!
//! [`RasModel<C>`] 拥有一个闭合变体 `C`、其 [`TurbulenceState`] 与输运求解器，
//! 为任意 `C: TwoEquationClosure` 实现宿主接口 [`TurbulenceClosure`]。
//!
//! # 单步顺序
//!
//! ```text
//! begin_step → ω → k → 附加方程 (v2 / γ) → 截断 → νt, a^(ex)
//! ```
//!
//! 每个方程求解前刷新 ∇k、∇ω 与混合函数，使后解的方程看到先解的场。
//! 任一步失败时模型状态整体回退到本步之前。

use super::context::{CellKinematics, ClosureContext, StepCache};
use super::traits::{ClosureCoefficients, ExtraEquation, TurbulenceClosure, TwoEquationClosure};
use super::transport::{EquationReport, ScalarTransport};
use crate::mesh::FvMesh;
use crate::numerics::discretization::{CellSource, EquationTerms};
use crate::numerics::gradient::GreenGaussGradient;
use crate::state::{read_bounds, MeanFlowState, TurbulenceState};
use glam::DMat3;
use log::{debug, info, warn};
use rayon::prelude::*;
use tc_config::{ClosureConfig, CoeffDict, CoeffReader};
use tc_foundation::{require, TcError, TcResult};

/// 截断单元占比超过该值时告警
const CLIP_WARN_FRACTION: f64 = 0.1;

/// 单步报告
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectReport {
    /// 各方程求解报告（按求解顺序）
    pub equations: Vec<EquationReport>,
    /// 可实现性截断的单元数（各场累计）
    pub clipped_cells: usize,
}

impl CorrectReport {
    /// 所有方程是否收敛
    pub fn all_converged(&self) -> bool {
        self.equations.iter().all(EquationReport::converged)
    }

    /// 按场名查找报告
    pub fn equation(&self, field: &str) -> Option<&EquationReport> {
        self.equations.iter().find(|r| r.field == field)
    }
}

/// 通用 RANS 模型
pub struct RasModel<C: TwoEquationClosure> {
    closure: C,
    state: TurbulenceState,
    transport: ScalarTransport,
    gradient: GreenGaussGradient,
}

impl<C: TwoEquationClosure> RasModel<C> {
    /// 由配置构建
    ///
    /// 系数或下界非法时返回配置错误；未使用的字典键只记录警告。
    pub fn from_config(mesh: &FvMesh, config: &ClosureConfig) -> TcResult<Self> {
        config.validate()?;
        let mut reader = CoeffReader::new(&config.coefficients);
        let coeffs = C::Coeffs::read_from(&mut reader)?;
        read_bounds(&mut reader, &config.bounds)?;
        let closure = C::from_coefficients(coeffs);
        reader.warn_unused(closure.name());

        let state = TurbulenceState::from_config(mesh, config, closure.layout())?;
        let transport = ScalarTransport::new(mesh, &config.solver)?;
        info!("湍流模型: {} ({} 单元)", closure.name(), mesh.n_cells());

        Ok(Self {
            closure,
            state,
            transport,
            gradient: GreenGaussGradient::new(),
        })
    }

    /// 闭合变体
    pub fn closure(&self) -> &C {
        &self.closure
    }

    /// 可变状态（用于宿主设置初场）
    pub fn state_mut(&mut self) -> &mut TurbulenceState {
        &mut self.state
    }

    /// 按当前冻结场计算涡黏度，不修改模型
    pub fn compute_eddy_viscosity(
        &self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
    ) -> TcResult<Vec<f64>> {
        let cache = self.frozen_cache(mesh, flow)?;
        let ctx = ClosureContext::new(mesh, flow, &self.state, &cache);
        Ok(self.eval(&ctx, |c, ctx, i| c.eddy_viscosity(ctx, i).max(0.0)))
    }

    /// 当前场下的 k 产生项（已截断为非负，含产生限制器）
    pub fn production_k(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<Vec<f64>> {
        let cache = self.frozen_cache(mesh, flow)?;
        let ctx = ClosureContext::new(mesh, flow, &self.state, &cache);
        Ok(self.eval(&ctx, |c, ctx, i| c.production_k(ctx, i).max(0.0)))
    }

    /// 当前场下的混合函数
    pub fn blending(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<Vec<f64>> {
        Ok(self.frozen_cache(mesh, flow)?.blend)
    }

    // =========================================================================
    // 内部
    // =========================================================================

    fn check_inputs(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<()> {
        TcError::check_size("mesh cells", self.state.n_cells(), mesh.n_cells())?;
        flow.validate(mesh)
    }

    /// 逐单元并行求值
    fn eval<T, F>(&self, ctx: &ClosureContext<'_>, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&C, &ClosureContext<'_>, usize) -> T + Sync + Send,
    {
        let closure = &self.closure;
        (0..ctx.n_cells())
            .into_par_iter()
            .map(|i| f(closure, ctx, i))
            .collect()
    }

    fn frozen_cache(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<StepCache> {
        self.check_inputs(mesh, flow)?;
        let mut cache = StepCache::new(CellKinematics::compute(flow));
        self.refresh(mesh, flow, &mut cache);
        Ok(cache)
    }

    fn refresh(&self, mesh: &FvMesh, flow: &MeanFlowState, cache: &mut StepCache) {
        cache.refresh_gradients(mesh, &self.state, &self.gradient);
        let blend = {
            let ctx = ClosureContext::new(mesh, flow, &self.state, cache);
            self.eval(&ctx, |c, ctx, i| c.blending(ctx, i).max(0.0).min(1.0))
        };
        cache.blend = blend;
    }

    fn omega_terms(&self, ctx: &ClosureContext<'_>) -> EquationTerms {
        let (diffusivity, sources) = self
            .eval(ctx, |c, ctx, i| {
                let src = CellSource {
                    su: c.production_omega(ctx, i).max(0.0),
                    sp: c.destruction_omega(ctx, i).max(0.0),
                } + c.omega_source(ctx, i);
                (c.omega_diffusivity(ctx, i), src)
            })
            .into_iter()
            .unzip();
        EquationTerms::new(diffusivity, sources)
    }

    fn k_terms(&self, ctx: &ClosureContext<'_>) -> EquationTerms {
        let (diffusivity, sources) = self
            .eval(ctx, |c, ctx, i| {
                let src = CellSource {
                    su: c.production_k(ctx, i).max(0.0),
                    sp: c.destruction_k(ctx, i).max(0.0),
                } + c.k_source(ctx, i);
                (c.k_diffusivity(ctx, i), src)
            })
            .into_iter()
            .unzip();
        EquationTerms::new(diffusivity, sources)
    }

    fn extra_terms(&self, eq: ExtraEquation, ctx: &ClosureContext<'_>) -> EquationTerms {
        let (diffusivity, sources) = self
            .eval(ctx, |c, ctx, i| {
                (c.extra_diffusivity(eq, ctx, i), c.extra_source(eq, ctx, i))
            })
            .into_iter()
            .unzip();
        EquationTerms::new(diffusivity, sources)
    }

    /// 重算涡黏度与各向异性
    fn update_derived(&mut self, mesh: &FvMesh, flow: &MeanFlowState, cache: &StepCache) {
        let (nut, anisotropy, gamma) = {
            let ctx = ClosureContext::new(mesh, flow, &self.state, cache);
            let nut = self.eval(&ctx, |c, ctx, i| c.eddy_viscosity(ctx, i).max(0.0));
            let anisotropy = self.state.anisotropy.as_ref().map(|_| {
                self.eval(&ctx, |c, ctx, i| c.anisotropy(ctx, i).unwrap_or(DMat3::ZERO))
            });
            let gamma = self.closure.has_algebraic_intermittency().then(|| {
                self.eval(&ctx, |c, ctx, i| {
                    c.algebraic_intermittency(ctx, i).max(0.0).min(1.0)
                })
            });
            (nut, anisotropy, gamma)
        };
        self.state.nut = nut;
        if anisotropy.is_some() {
            self.state.anisotropy = anisotropy;
        }
        if let (Some(values), Some(field)) = (gamma, self.state.gamma.as_mut()) {
            field.values_mut().copy_from_slice(&values);
        }
    }

    fn advance(
        &mut self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
        dt: f64,
    ) -> TcResult<CorrectReport> {
        let kinematics = CellKinematics::compute(flow);
        self.closure
            .begin_step(mesh, flow, &self.state, &kinematics, dt)?;
        let mut cache = StepCache::new(kinematics);
        let mut report = CorrectReport::default();
        let bounds = self.state.bounds;

        // ω
        self.refresh(mesh, flow, &mut cache);
        let terms = self.omega_terms(&ClosureContext::new(mesh, flow, &self.state, &cache));
        let r = self
            .transport
            .solve(mesh, flow, &mut self.state.omega, &terms, dt)?;
        report.equations.push(r);
        report.clipped_cells += self.state.omega.bound(bounds.omega_min);

        // k
        self.refresh(mesh, flow, &mut cache);
        let terms = self.k_terms(&ClosureContext::new(mesh, flow, &self.state, &cache));
        let r = self
            .transport
            .solve(mesh, flow, &mut self.state.k, &terms, dt)?;
        report.equations.push(r);
        report.clipped_cells += self.state.k.bound(bounds.k_min);

        // 附加方程
        for &eq in self.closure.extra_equations() {
            self.refresh(mesh, flow, &mut cache);
            let terms = self.extra_terms(eq, &ClosureContext::new(mesh, flow, &self.state, &cache));
            let field = require!(
                match eq {
                    ExtraEquation::V2 => self.state.v2.as_mut(),
                    ExtraEquation::Intermittency => self.state.gamma.as_mut(),
                },
                TcError::invalid_input(format!("状态中缺少场 {}", eq.field_name()))
            );
            let r = self.transport.solve(mesh, flow, field, &terms, dt)?;
            report.equations.push(r);
            report.clipped_cells += match eq {
                ExtraEquation::V2 => field.bound(bounds.v2_min),
                ExtraEquation::Intermittency => field.clamp(0.0, 1.0),
            };
        }

        report.clipped_cells += self.state.bound_all();
        self.refresh(mesh, flow, &mut cache);
        self.update_derived(mesh, flow, &cache);

        let n = self.state.n_cells();
        if report.clipped_cells as f64 > CLIP_WARN_FRACTION * n as f64 {
            warn!(
                "{}: {} 个单元触发可实现性截断 (共 {} 单元)",
                self.closure.name(),
                report.clipped_cells,
                n
            );
        }
        let (k_min, k_max) = self.state.k.min_max();
        let (w_min, w_max) = self.state.omega.min_max();
        debug!(
            "{}: k ∈ [{:.3e}, {:.3e}], ω ∈ [{:.3e}, {:.3e}]",
            self.closure.name(),
            k_min,
            k_max,
            w_min,
            w_max
        );
        Ok(report)
    }

    fn field_map<F>(&self, mesh: &FvMesh, flow: &MeanFlowState, f: F) -> TcResult<Vec<f64>>
    where
        F: Fn(&C, &ClosureContext<'_>, usize) -> f64 + Sync + Send,
    {
        let cache = self.frozen_cache(mesh, flow)?;
        let ctx = ClosureContext::new(mesh, flow, &self.state, &cache);
        Ok(self.eval(&ctx, f))
    }
}

impl<C: TwoEquationClosure> TurbulenceClosure for RasModel<C> {
    fn name(&self) -> &'static str {
        self.closure.name()
    }

    fn state(&self) -> &TurbulenceState {
        &self.state
    }

    fn epsilon(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<Vec<f64>> {
        self.field_map(mesh, flow, |c, ctx, i| c.epsilon(ctx, i))
    }

    fn dk_eff(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<Vec<f64>> {
        self.field_map(mesh, flow, |c, ctx, i| c.k_diffusivity(ctx, i))
    }

    fn domega_eff(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<Vec<f64>> {
        self.field_map(mesh, flow, |c, ctx, i| c.omega_diffusivity(ctx, i))
    }

    fn validate(&mut self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<()> {
        self.state.bound_all();
        let cache = self.frozen_cache(mesh, flow)?;
        self.update_derived(mesh, flow, &cache);
        Ok(())
    }

    fn correct(
        &mut self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
        dt: f64,
    ) -> TcResult<CorrectReport> {
        self.check_inputs(mesh, flow)?;
        let state = self.state.clone();
        let closure = self.closure.clone();
        match self.advance(mesh, flow, dt) {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!("{}: 本步失败，状态回退: {}", self.closure.name(), e);
                self.state = state;
                self.closure = closure;
                Err(e)
            }
        }
    }

    fn read(&mut self, dict: &CoeffDict) -> TcResult<bool> {
        let mut merged = TurbulenceClosure::coefficients(self);
        merged.merge(dict);
        let mut reader = CoeffReader::new(&merged);
        let coeffs = C::Coeffs::read_from(&mut reader)?;
        let bounds = read_bounds(&mut reader, &self.state.bounds)?;
        reader.warn_unused(self.closure.name());

        let changed = coeffs != *self.closure.coefficients() || bounds != self.state.bounds;
        if changed {
            self.closure.set_coefficients(coeffs);
            self.state.bounds = bounds;
            info!("{}: 系数已更新", self.closure.name());
        }
        Ok(changed)
    }

    fn coefficients(&self) -> CoeffDict {
        let b = &self.state.bounds;
        self.closure
            .coefficients()
            .to_dict()
            .with_scalar("kMin", b.k_min)
            .with_scalar("omegaMin", b.omega_min)
            .with_scalar("v2Min", b.v2_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StructuredMesh;
    use crate::state::StateLayout;
    use crate::turbulence::models::{KOmegaClosure, KOmegaCoeffs};
    use crate::turbulence::VelocityGradient;

    /// k-ω 加可注入的 k 方程显式源项与汇项，并记录 begin_step 次数
    #[derive(Debug, Clone, Default)]
    struct InjectedK {
        inner: KOmegaClosure,
        k_su: f64,
        k_sink: Option<f64>,
        steps: u32,
    }

    impl TwoEquationClosure for InjectedK {
        type Coeffs = KOmegaCoeffs;

        fn from_coefficients(coeffs: KOmegaCoeffs) -> Self {
            Self {
                inner: KOmegaClosure::from_coefficients(coeffs),
                ..Default::default()
            }
        }

        fn name(&self) -> &'static str {
            "injectedK"
        }

        fn layout(&self) -> StateLayout {
            self.inner.layout()
        }

        fn coefficients(&self) -> &KOmegaCoeffs {
            self.inner.coefficients()
        }

        fn set_coefficients(&mut self, coeffs: KOmegaCoeffs) {
            self.inner.set_coefficients(coeffs);
        }

        fn begin_step(
            &mut self,
            _mesh: &FvMesh,
            _flow: &MeanFlowState,
            _state: &TurbulenceState,
            _kinematics: &[CellKinematics],
            _dt: f64,
        ) -> TcResult<()> {
            self.steps += 1;
            Ok(())
        }

        fn k_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
            self.inner.k_diffusivity(ctx, cell)
        }

        fn omega_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
            self.inner.omega_diffusivity(ctx, cell)
        }

        fn production_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
            self.inner.production_k(ctx, cell)
        }

        fn destruction_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
            self.k_sink
                .unwrap_or_else(|| self.inner.destruction_k(ctx, cell))
        }

        fn production_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
            self.inner.production_omega(ctx, cell)
        }

        fn destruction_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
            self.inner.destruction_omega(ctx, cell)
        }

        fn k_source(&self, _ctx: &ClosureContext<'_>, _cell: usize) -> CellSource {
            CellSource::explicit(self.k_su)
        }

        fn eddy_viscosity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
            self.inner.eddy_viscosity(ctx, cell)
        }

        fn epsilon(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
            self.inner.epsilon(ctx, cell)
        }
    }

    fn setup() -> (FvMesh, MeanFlowState, RasModel<InjectedK>) {
        let mesh = StructuredMesh::new(4, 3, 1.0, 1.0).build().unwrap();
        let flow = MeanFlowState::uniform_gradient(
            &mesh,
            VelocityGradient::simple_shear(10.0),
            vec![0.1; mesh.n_cells()],
            1e-5,
        )
        .unwrap();
        let model = RasModel::<InjectedK>::from_config(&mesh, &ClosureConfig::new("injectedK")).unwrap();
        (mesh, flow, model)
    }

    #[test]
    fn test_k_failure_rolls_back_omega_and_closure() {
        let (mesh, flow, mut model) = setup();
        model.closure.k_su = f64::NAN;
        let before = model.state().clone();

        assert!(model.correct(&mesh, &flow, 1e-2).is_err());
        assert_eq!(model.state(), &before);
        assert_eq!(model.closure().steps, 0);
    }

    #[test]
    fn test_diverged_k_solve_rolls_back() {
        let (mesh, flow, mut model) = setup();
        model.closure.k_su = f64::MAX;
        model.closure.k_sink = Some(1e-12);
        let before = model.state().clone();

        let err = model.correct(&mesh, &flow, f64::INFINITY).unwrap_err();
        assert!(matches!(err, TcError::LinearSolve { field: ref name, .. } if name == "k"));
        assert_eq!(model.state(), &before);
        assert_eq!(model.closure().steps, 0);
    }

    #[test]
    fn test_step_succeeds_after_fault_cleared() {
        let (mesh, flow, mut model) = setup();
        model.closure.k_su = f64::NAN;
        assert!(model.correct(&mesh, &flow, 1e-2).is_err());

        model.closure.k_su = 0.0;
        let report = model.correct(&mesh, &flow, 1e-2).unwrap();
        assert_eq!(report.equations.len(), 2);
        assert_eq!(report.equations[0].field, "omega");
        assert_eq!(report.equations[1].field, "k");
        assert_eq!(model.closure().steps, 1);
        assert!(model.state().k.values().iter().all(|&v| v.is_finite() && v > 0.0));
    }
}
