// crates/tc_physics/src/turbulence/registry.rs

//! 闭合模型注册表
//!
//! 按名称创建 `Box<dyn TurbulenceClosure>`。未注册的名称返回
//! [`TcError::UnknownModel`](tc_foundation::TcError)，并列出全部可用名称。
//!
//! ```
//! use tc_config::ClosureConfig;
//! use tc_physics::mesh::StructuredMesh;
//! use tc_physics::turbulence::ClosureRegistry;
//!
//! let mesh = StructuredMesh::new(4, 4, 1.0, 1.0).build().unwrap();
//! let registry = ClosureRegistry::with_defaults();
//! let model = registry.create("kOmegaSST", &mesh, &ClosureConfig::new("kOmegaSST")).unwrap();
//! assert_eq!(model.name(), "kOmegaSST");
//! assert!(registry.create("kEpsilon", &mesh, &ClosureConfig::new("kEpsilon")).is_err());
//! ```

use super::models::{
    EarsmClosure, EarsmTransClosure, GammaSstClosure, KOmegaClosure, KOmegaSstClosure,
    Kv2OmegaClosure,
};
use super::traits::{TurbulenceClosure, TwoEquationClosure};
use super::RasModel;
use crate::mesh::FvMesh;
use log::info;
use std::collections::HashMap;
use tc_config::ClosureConfig;
use tc_foundation::{TcError, TcResult};

/// 工厂函数
pub type ClosureFactory = fn(&FvMesh, &ClosureConfig) -> TcResult<Box<dyn TurbulenceClosure>>;

fn build<C: TwoEquationClosure + 'static>(
    mesh: &FvMesh,
    config: &ClosureConfig,
) -> TcResult<Box<dyn TurbulenceClosure>> {
    Ok(Box::new(RasModel::<C>::from_config(mesh, config)?))
}

/// 模型注册表
#[derive(Clone, Default)]
pub struct ClosureRegistry {
    factories: HashMap<String, ClosureFactory>,
    /// 注册顺序
    order: Vec<String>,
}

impl std::fmt::Debug for ClosureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureRegistry")
            .field("models", &self.order)
            .finish()
    }
}

impl ClosureRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部内置模型
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("kOmega", build::<KOmegaClosure>);
        registry.register("kOmegaSST", build::<KOmegaSstClosure>);
        registry.register("gammaSST", build::<GammaSstClosure>);
        registry.register("kv2Omega", build::<Kv2OmegaClosure>);
        registry.register("EARSM", build::<EarsmClosure>);
        registry.register("EARSMTrans", build::<EarsmTransClosure>);
        registry
    }

    /// 注册（同名覆盖，保留原顺序）
    pub fn register(&mut self, name: impl Into<String>, factory: ClosureFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_none() {
            self.order.push(name);
        }
    }

    /// 是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// 已注册名称（按注册顺序）
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按名称创建
    pub fn create(
        &self,
        name: &str,
        mesh: &FvMesh,
        config: &ClosureConfig,
    ) -> TcResult<Box<dyn TurbulenceClosure>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            TcError::unknown_model(name, self.order.clone())
        })?;
        let model = factory(mesh, config)?;
        info!("创建湍流模型 {} ({} 单元)", name, mesh.n_cells());
        Ok(model)
    }

    /// 按配置中的模型名创建
    pub fn create_from_config(
        &self,
        mesh: &FvMesh,
        config: &ClosureConfig,
    ) -> TcResult<Box<dyn TurbulenceClosure>> {
        self.create(&config.model, mesh, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StructuredMesh;

    fn mesh() -> FvMesh {
        StructuredMesh::new(3, 3, 1.0, 1.0).build().unwrap()
    }

    #[test]
    fn test_default_names() {
        let r = ClosureRegistry::with_defaults();
        assert_eq!(
            r.names(),
            vec!["kOmega", "kOmegaSST", "gammaSST", "kv2Omega", "EARSM", "EARSMTrans"]
        );
    }

    #[test]
    fn test_create_every_default() {
        let r = ClosureRegistry::with_defaults();
        let mesh = mesh();
        for name in r.names() {
            let model = r.create(name, &mesh, &ClosureConfig::new(name)).unwrap();
            assert_eq!(model.name(), name);
            assert_eq!(model.eddy_viscosity().len(), mesh.n_cells());
        }
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let r = ClosureRegistry::with_defaults();
        let err = r
            .create("kEpsilon", &mesh(), &ClosureConfig::new("kEpsilon"))
            .err().unwrap();
        match err {
            TcError::UnknownModel { name, available } => {
                assert_eq!(name, "kEpsilon");
                assert_eq!(available.len(), 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_register_overrides_without_duplicate() {
        let mut r = ClosureRegistry::with_defaults();
        r.register("kOmega", build::<KOmegaSstClosure>);
        assert_eq!(r.len(), 6);
        let model = r
            .create("kOmega", &mesh(), &ClosureConfig::new("kOmega"))
            .unwrap();
        assert_eq!(model.name(), "kOmegaSST");
    }
}
