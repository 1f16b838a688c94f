//! sasbuild - dependency resolution and bundling for SAS service and job projects
//!
//! This crate provides the core library functionality for sasbuild:
//! manifest extraction, macro dependency resolution, program embedding,
//! unit assembly and bundle building.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for sasbuild unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory filesystem and on-disk project
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{Project, ServerKind, Target, Unit, UnitKind};

pub use resolver::{Resolution, Resolver};
pub use util::context::GlobalContext;
