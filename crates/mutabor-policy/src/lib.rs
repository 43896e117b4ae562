//! # Mutabor Policies
//!
//! The mutation capability layer: the [`MutationPolicy`] contract, the
//! [`PolicyRegistry`] with its weighting validation, the
//! [`TransformationResult`] provenance model, and the shipped mutators.
//!
//! A policy applies exactly one syntactic change to one randomly chosen
//! eligible location inside the scope it is handed. Every policy owns a
//! private seeded random stream, so reseeding a run reseeds every policy
//! identically and the whole selection sequence replays.
//!
//! ## Key components
//!
//! - [`MutationPolicy`]: the capability contract (requirements, categories,
//!   exclusivity, compile-check and use-header toggles, `apply`)
//! - [`PolicyRegistry`]: ordered, duplicate-free policy collection with an
//!   optional explicit weighting map
//! - [`TransformationResult`]: `Empty` | `Applied` with snapshot provenance
//! - [`mutators`]: the shipped mutation policies

#![deny(unsafe_code)]

pub mod category;
pub mod mutators;
pub mod names;
pub mod policy;
pub mod registry;
pub mod result;

// Re-exports
pub use category::Category;
pub use names::{NameFactory, Randomness};
pub use policy::{ApplyEnv, MutationPolicy, PolicyCore, Requirement};
pub use registry::{PolicyRegistry, RegistryError};
pub use result::{
    AppliedTransformation, DebugDetail, TransformationResult, REMOVE_COMMENTS_POLICY,
};
