//! # Mutabor Reference Language
//!
//! The reference [`AstProvider`](mutabor_tree::AstProvider) implementation:
//! a deliberately small brace language, just rich enough to exercise every
//! shipped mutation policy and every scope strategy.
//!
//! ```text
//! use std.print;
//!
//! unit Greeter {
//!     // salutation helper
//!     fn greet(name) {
//!         let msg = "hello " + name;
//!         print(msg);
//!         return msg;
//!     }
//! }
//! ```
//!
//! Units are the top-level compilable items, functions the subunits. Line
//! comments are real tree nodes, so comment-oriented mutations and the
//! engine's comment-removal pass have something to act on.

#![deny(unsafe_code)]

pub mod checker;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod provider;

// Re-exports
pub use checker::BUILTINS;
pub use error::ParseError;
pub use provider::{LangProvider, SOURCE_EXTENSION};
