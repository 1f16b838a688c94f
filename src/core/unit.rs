//! Compilation units.
//!
//! A unit is one service or job file that has been copied into a target's
//! build output tree and is compiled in place.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kind of unit being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Web service, published through the server's service primitive
    Service,

    /// Batch job
    Job,
}

impl UnitKind {
    /// Label used in section markers (`* Service start;`).
    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Service => "Service",
            UnitKind::Job => "Job",
        }
    }

    /// Name of the top-level folder holding units of this kind in the output tree.
    pub fn folder(&self) -> &'static str {
        match self {
            UnitKind::Service => "services",
            UnitKind::Job => "jobs",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnitKind::Service => "service",
            UnitKind::Job => "job",
        })
    }
}

/// A single service or job awaiting compilation.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Service or job
    pub kind: UnitKind,

    /// Path relative to the target's output root (e.g. `services/admin/x.sas`)
    pub relative_path: PathBuf,

    /// Absolute path of the file in the output tree
    pub path: PathBuf,

    /// Raw source text
    pub body: String,

    /// Name of the target this unit is compiled for
    pub target: String,
}

impl Unit {
    /// Create a new unit.
    pub fn new(
        kind: UnitKind,
        relative_path: impl Into<PathBuf>,
        path: impl Into<PathBuf>,
        body: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Unit {
            kind,
            relative_path: relative_path.into(),
            path: path.into(),
            body: body.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::util::fs::to_slash(&self.relative_path))
    }
}
