//! # Mutabor Manifest
//!
//! Durable, structured record of what a run mutated, where, and why.
//!
//! The [`ManifestSink`] contract takes the full ordered result list of a run
//! — `Empty` results included — filters the `Empty` ones transparently, and
//! persists exactly one transformation row per applied result, plus one info
//! row recording the tool version, even for an empty run.
//!
//! [`SqliteManifestSink`] is the reference backend: six relational tables in
//! a SQLite database, written in a single transaction. [`MemorySink`] is the
//! in-process stand-in for tests and development.

#![deny(unsafe_code)]

pub mod error;
pub mod sink;
pub mod sqlite;

// Re-exports
pub use error::StorageError;
pub use sink::{ManifestSink, MemorySink};
pub use sqlite::{SqliteManifestSink, IN_MEMORY_TARGET};
