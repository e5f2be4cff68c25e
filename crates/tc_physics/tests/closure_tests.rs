//! 湍流闭合集成测试
//!
//! 在二维槽道网格上检查全部注册模型的可实现性、涡黏度公式与系数热更新。

use glam::{DMat3, DVec3};
use tc_config::{ClosureConfig, CoeffDict, InitialConditions};
use tc_physics::mesh::{FvMesh, StructuredMesh};
use tc_physics::state::MeanFlowState;
use tc_physics::turbulence::{
    ClosureRegistry, Earsm, GammaSst, KOmega, KOmegaSst, TurbulenceClosure, TwoEquationClosure,
    VelocityGradient,
};

const NU: f64 = 1.5e-5;

fn channel() -> FvMesh {
    StructuredMesh::new(8, 6, 2.0, 1.0).build().unwrap()
}

/// 抛物线型槽道流 u = U·4y(1 − y)
fn channel_flow(mesh: &FvMesh, u_max: f64) -> MeanFlowState {
    let velocity = mesh
        .cell_centers()
        .iter()
        .map(|c| DVec3::new(u_max * 4.0 * c.y * (1.0 - c.y), 0.0, 0.0))
        .collect();
    MeanFlowState::from_velocity(mesh, velocity, mesh.nearest_wall_distance(), NU).unwrap()
}

/// 槽道抛物线叠加中心高斯涡
fn swirl_flow(mesh: &FvMesh) -> MeanFlowState {
    let velocity = mesh
        .cell_centers()
        .iter()
        .map(|c| {
            let (dx, dy) = (c.x - 1.0, c.y - 0.5);
            let g = 5.0 * (-(dx * dx + dy * dy) / 0.05).exp();
            DVec3::new(4.0 * c.y * (1.0 - c.y) - g * dy, g * dx, 0.0)
        })
        .collect();
    MeanFlowState::from_velocity(mesh, velocity, mesh.nearest_wall_distance(), NU).unwrap()
}

fn shear_flow(mesh: &FvMesh, rate: f64, y: f64) -> MeanFlowState {
    MeanFlowState::uniform_gradient(
        mesh,
        VelocityGradient::simple_shear(rate),
        vec![y; mesh.n_cells()],
        NU,
    )
    .unwrap()
}

fn config(name: &str) -> ClosureConfig {
    ClosureConfig::new(name).with_initial(InitialConditions {
        k: 1e-3,
        omega: 10.0,
        v2: 5e-4,
        gamma: 1.0,
    })
}

fn assert_realizable(model: &dyn TurbulenceClosure) {
    let state = model.state();
    let b = state.bounds;
    assert!(model.k().iter().all(|&k| k.is_finite() && k >= b.k_min), "{}: k", model.name());
    assert!(
        model.omega().iter().all(|&w| w.is_finite() && w >= b.omega_min),
        "{}: omega",
        model.name()
    );
    assert!(
        model.eddy_viscosity().iter().all(|&nut| nut.is_finite() && nut >= 0.0),
        "{}: nut",
        model.name()
    );
    if let Some(v2) = model.v2() {
        assert!(v2.iter().all(|&v| v.is_finite() && v >= b.v2_min), "{}: v2", model.name());
    }
    if let Some(gamma) = model.gamma_intermittency() {
        assert!(
            gamma.iter().all(|&g| (0.0..=1.0).contains(&g)),
            "{}: gamma",
            model.name()
        );
    }
    if let Some(stress) = model.nonlinear_stress() {
        for t in stress {
            assert!(t.is_finite());
            assert!((t.x_axis.x + t.y_axis.y + t.z_axis.z).abs() < 1e-10);
            assert!(t.abs_diff_eq(t.transpose(), 1e-12));
        }
    }
}

#[test]
fn test_all_models_stay_realizable() {
    let mesh = channel();
    let flow = channel_flow(&mesh, 1.0);
    let registry = ClosureRegistry::with_defaults();

    for name in registry.names() {
        let mut model = registry.create(name, &mesh, &config(name)).unwrap();
        model.validate(&mesh, &flow).unwrap();
        assert_realizable(model.as_ref());

        for _ in 0..5 {
            let report = model.correct(&mesh, &flow, 1e-3).unwrap();
            assert!(report.equation("k").is_some(), "{name}");
            assert!(report.equation("omega").is_some(), "{name}");
            assert_realizable(model.as_ref());
        }
    }
}

#[test]
fn test_unconverged_solves_keep_fields_bounded() {
    let mesh = channel();
    let flow = channel_flow(&mesh, 1.0);
    let registry = ClosureRegistry::with_defaults();

    for name in registry.names() {
        let mut cfg = config(name);
        cfg.solver.rtol = 1e-30;
        cfg.solver.atol = 0.0;
        cfg.solver.max_iter = 1;
        let mut model = registry.create(name, &mesh, &cfg).unwrap();

        for _ in 0..5 {
            let report = model.correct(&mesh, &flow, 10.0).unwrap();
            assert!(!report.all_converged(), "{name}");
            assert_realizable(model.as_ref());
        }
    }
}

#[test]
fn test_extra_equations_reported() {
    let mesh = channel();
    let flow = channel_flow(&mesh, 1.0);
    let registry = ClosureRegistry::with_defaults();

    let mut kv2 = registry.create("kv2Omega", &mesh, &config("kv2Omega")).unwrap();
    let report = kv2.correct(&mesh, &flow, 1e-3).unwrap();
    assert_eq!(report.equations.len(), 3);
    assert!(report.equation("v2").is_some());

    let mut gamma = registry.create("gammaSST", &mesh, &config("gammaSST")).unwrap();
    let report = gamma.correct(&mesh, &flow, 1e-3).unwrap();
    assert!(report.equation("gammaInt").is_some());

    let mut trans = registry.create("EARSMTrans", &mesh, &config("EARSMTrans")).unwrap();
    let report = trans.correct(&mesh, &flow, 1e-3).unwrap();
    assert_eq!(report.equations.len(), 2);
    assert!(trans.gamma_intermittency().is_some());
}

#[test]
fn test_k_omega_viscosity_in_uniform_shear() {
    let mesh = channel();
    let flow = shear_flow(&mesh, 50.0, 0.1);
    let mut model = KOmega::from_config(&mesh, &config("kOmega")).unwrap();

    let nut = model.compute_eddy_viscosity(&mesh, &flow).unwrap();
    assert!(nut.iter().all(|&v| (v - 1e-3 / 10.0).abs() < 1e-15));

    model.validate(&mesh, &flow).unwrap();
    assert_eq!(model.eddy_viscosity(), nut.as_slice());
}

#[test]
fn test_sst_stress_limiter() {
    let mesh = channel();
    let model = KOmegaSst::from_config(&mesh, &config("kOmegaSST")).unwrap();

    // 弱剪切：νt = k/ω
    let nut = model
        .compute_eddy_viscosity(&mesh, &shear_flow(&mesh, 1.0, 1e-3))
        .unwrap();
    assert!(nut.iter().all(|&v| (v - 1e-4).abs() < 1e-15));

    // 强剪切、近壁 F2 = 1：νt = a1·k/|S|
    let nut = model
        .compute_eddy_viscosity(&mesh, &shear_flow(&mesh, 1000.0, 1e-3))
        .unwrap();
    assert!(nut.iter().all(|&v| (v - 0.31e-3 / 1000.0).abs() < 1e-15));
}

#[test]
fn test_production_limiter_caps_at_ten_destruction() {
    let mesh = channel();
    let flow = shear_flow(&mesh, 1000.0, 0.1);
    let mut cfg = config("kOmega");
    cfg.coefficients = CoeffDict::new().with_switch("productionLimiter", true);
    let limited = KOmega::from_config(&mesh, &cfg).unwrap();
    let cap = 10.0 * 0.09 * 1e-3 * 10.0;
    for p in limited.production_k(&mesh, &flow).unwrap() {
        assert!((p - cap).abs() < 1e-12);
    }

    let free = KOmega::from_config(&mesh, &config("kOmega")).unwrap();
    for p in free.production_k(&mesh, &flow).unwrap() {
        assert!(p > cap);
    }
}

#[test]
fn test_blending_ranges() {
    let mesh = channel();
    let flow = channel_flow(&mesh, 1.0);

    let sst = KOmegaSst::from_config(&mesh, &config("kOmegaSST")).unwrap();
    let f1 = sst.blending(&mesh, &flow).unwrap();
    assert!(f1.iter().all(|f| (0.0..=1.0).contains(f)));

    let k_omega = KOmega::from_config(&mesh, &config("kOmega")).unwrap();
    assert!(k_omega.blending(&mesh, &flow).unwrap().iter().all(|&f| f == 1.0));

    let gamma = GammaSst::from_config(&mesh, &config("gammaSST")).unwrap();
    let f = gamma.blending(&mesh, &flow).unwrap();
    assert!(f.iter().zip(&f1).all(|(a, b)| *a >= *b - 1e-15 && *a <= 1.0));
}

#[test]
fn test_earsm_quiescent_flow_has_no_extra_stress() {
    let mesh = channel();
    let flow = shear_flow(&mesh, 0.0, 0.1);
    let registry = ClosureRegistry::with_defaults();
    for name in ["EARSM", "EARSMTrans"] {
        let mut model = registry.create(name, &mesh, &config(name)).unwrap();
        model.validate(&mesh, &flow).unwrap();
        for t in model.nonlinear_stress().unwrap() {
            assert!(t.abs_diff_eq(DMat3::ZERO, 1e-15));
        }
    }
}

#[test]
fn test_linear_models_have_no_extra_stress() {
    let mesh = channel();
    let registry = ClosureRegistry::with_defaults();
    for name in ["kOmega", "kOmegaSST", "gammaSST", "kv2Omega"] {
        let model = registry.create(name, &mesh, &config(name)).unwrap();
        assert!(model.nonlinear_stress().is_none(), "{name}");
    }
}

#[test]
fn test_read_detects_changes() {
    let mesh = channel();
    let mut model = KOmegaSst::from_config(&mesh, &config("kOmegaSST")).unwrap();

    let current = model.coefficients();
    assert!(!model.read(&current).unwrap());
    assert!(!model.read(&CoeffDict::new()).unwrap());

    assert!(model.read(&CoeffDict::new().with_scalar("a1", 0.3)).unwrap());
    assert_eq!(model.closure().coefficients().a1, 0.3);
    assert!(!model.read(&CoeffDict::new().with_scalar("a1", 0.3)).unwrap());
}

#[test]
fn test_read_rejects_invalid_without_partial_update() {
    let mesh = channel();
    let mut model = KOmegaSst::from_config(&mesh, &config("kOmegaSST")).unwrap();
    let before = model.coefficients();

    let bad = CoeffDict::new()
        .with_scalar("a1", 0.4)
        .with_scalar("betaStar", -1.0);
    assert!(model.read(&bad).is_err());
    assert_eq!(model.coefficients(), before);
}

#[test]
fn test_correct_rejects_mismatched_mesh() {
    let mesh = channel();
    let other = StructuredMesh::new(3, 3, 1.0, 1.0).build().unwrap();
    let flow = channel_flow(&other, 1.0);
    let mut model = KOmegaSst::from_config(&mesh, &config("kOmegaSST")).unwrap();
    let before = model.state().clone();

    assert!(model.correct(&other, &flow, 1e-3).is_err());
    assert_eq!(model.state(), &before);
}

#[test]
fn test_correct_rejects_non_finite_flow() {
    let mesh = channel();
    let mut flow = channel_flow(&mesh, 1.0);
    flow.nu[3] = f64::NAN;
    let registry = ClosureRegistry::with_defaults();
    let mut model = registry.create("kOmega", &mesh, &config("kOmega")).unwrap();
    let before = model.state().clone();

    assert!(model.correct(&mesh, &flow, 1e-3).is_err());
    assert_eq!(model.state(), &before);
}

#[test]
fn test_gamma_sst_reynolds_numbers() {
    let mesh = channel();
    let flow = channel_flow(&mesh, 1.0);
    let model = GammaSst::from_config(&mesh, &config("gammaSST")).unwrap();
    let r_t = model.turbulence_reynolds(&flow).unwrap();
    let expected = 1e-3 / (NU * 10.0);
    assert!(r_t.iter().all(|&r| (r - expected).abs() < 1e-9 * expected));
}

#[test]
fn test_earsm_curvature_correction_ramps_in() {
    let mesh = StructuredMesh::new(12, 8, 2.0, 1.0).build().unwrap();
    let flow = swirl_flow(&mesh);
    let switched = config("EARSM")
        .with_coefficients(CoeffDict::new().with_switch("curvatureCorrection", true));
    let mut plain = Earsm::from_config(&mesh, &config("EARSM")).unwrap();
    let mut corrected = Earsm::from_config(&mesh, &switched).unwrap();
    assert_eq!(corrected.closure().curvature().weight(), 0.0);

    let mut prev = 0.0;
    for step in 1..=20 {
        plain.correct(&mesh, &flow, 1e-3).unwrap();
        corrected.correct(&mesh, &flow, 1e-3).unwrap();
        let w = corrected.closure().curvature().weight();
        assert!(w > prev, "step {step}");
        assert!((w - step as f64 / 20.0).abs() < 1e-12, "step {step}");
        assert_eq!(plain.closure().curvature().weight(), 0.0);
        assert_realizable(&corrected);
        prev = w;
    }
    assert!((prev - 1.0).abs() < 1e-12);

    let max_rel = plain
        .eddy_viscosity()
        .iter()
        .zip(corrected.eddy_viscosity())
        .map(|(a, b)| (a - b).abs() / a.max(1e-30))
        .fold(0.0, f64::max);
    assert!(max_rel > 1e-3, "max relative nut difference {max_rel}");

    // 关闭开关同样逐步退出
    assert!(corrected
        .read(&CoeffDict::new().with_switch("curvatureCorrection", false))
        .unwrap());
    corrected.correct(&mesh, &flow, 1e-3).unwrap();
    assert!((corrected.closure().curvature().weight() - 0.95).abs() < 1e-12);
}
