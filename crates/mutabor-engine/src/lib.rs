//! # Mutabor Engine
//!
//! The transformation scheduling core: scope strategies that turn a global
//! mutation quota into per-scope quotas, and the engine that drives the
//! select/apply/validate/retry loop over a shared corpus, accumulates
//! results, and hands them to the manifest sink exactly once per run.
//!
//! Execution is strictly sequential and deterministic: given the same
//! corpus, the same registry (same policies in the same order), the same
//! scope strategy and the same seed, every selection and every mutation
//! replays identically.
//!
//! ## Key components
//!
//! - [`ScopeStrategy`]: how a quota distributes across units and subunits
//! - [`Engine`]: the `Idle → Running → Finished` run driver
//! - [`RunConfig`]: the TOML configuration surface
//! - [`ConfigurationError`] / [`EngineError`]: the failure taxonomy

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod scope;

// Re-exports
pub use config::{PoliciesConfig, PolicyToggle, RandomnessChoice, RunConfig};
pub use engine::{Engine, RunSummary, DEFAULT_QUOTA, DEFAULT_SEED};
pub use error::{ConfigurationError, EngineError};
pub use scope::ScopeStrategy;
