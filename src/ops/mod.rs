//! High-level operations.
//!
//! This module contains the implementation of sasbuild commands.

pub mod build;
pub mod clean;
pub mod compile;

pub use build::{build_target, BuildOptions, BuildReport, CompileFailed};
pub use clean::clean;
pub use compile::{compile_target, CompileOptions, CompileReport, UnitError, UnitFailure};
