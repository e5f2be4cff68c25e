// crates/tc_physics/src/turbulence/models/mod.rs

//! 闭合变体
//!
//! | 名称         | 类型                          | 附加场          |
//! |--------------|-------------------------------|-----------------|
//! | `kOmega`     | [`KOmega`]                    | -               |
//! | `kOmegaSST`  | [`KOmegaSst`]                 | -               |
//! | `gammaSST`   | [`GammaSst`]                  | γ               |
//! | `kv2Omega`   | [`Kv2Omega`]                  | v2              |
//! | `EARSM`      | [`Earsm`]                     | a^(ex)          |
//! | `EARSMTrans` | [`EarsmTrans`]                | γ（代数）、a^(ex) |

pub mod earsm;
pub mod earsm_trans;
pub mod gamma_sst;
pub mod k_omega;
pub mod k_omega_sst;
pub mod kv2_omega;

pub use earsm::{CurvatureTracker, Earsm, EarsmClosure, EarsmCoeffs};
pub use earsm_trans::{EarsmTrans, EarsmTransClosure, EarsmTransCoeffs};
pub use gamma_sst::{GammaSst, GammaSstClosure, GammaSstCoeffs};
pub use k_omega::{KOmega, KOmegaClosure, KOmegaCoeffs};
pub use k_omega_sst::{KOmegaSst, KOmegaSstClosure, SstCoeffs};
pub use kv2_omega::{Kv2CellTerms, Kv2Omega, Kv2OmegaClosure, Kv2OmegaCoeffs};
