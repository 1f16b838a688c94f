//! Core data structures for sasbuild.
//!
//! This module contains the foundational types used throughout the build:
//! - Units (services and jobs) and their kinds
//! - Targets, server kinds and search locations
//! - Manifest extraction from SAS source headers
//! - The `sasbuild.toml` project file

pub mod manifest;
pub mod project;
pub mod target;
pub mod unit;

pub use manifest::{
    extract_macro_names, extract_program_entries, DeprecationPolicy, MacroManifest,
    ManifestError, ProgramEntry,
};
pub use project::{Project, PROJECT_FILE_NAME};
pub use target::{LocationKind, SearchLocation, ServerKind, Target, UnitSettings};
pub use unit::{Unit, UnitKind};
