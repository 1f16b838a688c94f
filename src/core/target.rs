//! Build targets.
//!
//! A [`Target`] is the fully resolved, engine-facing view of one
//! `[[targets]]` entry: absolute search locations in precedence order,
//! merged service variables, and the init/term fragments that apply.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::unit::UnitKind;

/// The kind of server a target deploys to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    /// SAS Viya
    #[serde(alias = "viya")]
    SasViya,

    /// SAS 9 (Stored Process server)
    #[serde(alias = "sas9")]
    Sas9,
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServerKind::SasViya => "sasviya",
            ServerKind::Sas9 => "sas9",
        })
    }
}

impl FromStr for ServerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sasviya" | "viya" => Ok(ServerKind::SasViya),
            "sas9" => Ok(ServerKind::Sas9),
            other => Err(format!(
                "unknown server kind `{}` (expected `sasviya` or `sas9`)",
                other
            )),
        }
    }
}

/// Whether a search location overrides the shared library or is the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    /// Project- or target-declared folder
    Override,

    /// Bundled shared macro library
    Library,
}

/// A named folder searched for macro files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLocation {
    /// Name as written in configuration
    pub name: String,

    /// Absolute path
    pub path: PathBuf,

    /// Override or library
    pub kind: LocationKind,
}

impl SearchLocation {
    /// Create an override location.
    pub fn override_at(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SearchLocation {
            name: name.into(),
            path: path.into(),
            kind: LocationKind::Override,
        }
    }

    /// Create a library location.
    pub fn library_at(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SearchLocation {
            name: name.into(),
            path: path.into(),
            kind: LocationKind::Library,
        }
    }

    /// Check whether this location is the shared library.
    pub fn is_library(&self) -> bool {
        self.kind == LocationKind::Library
    }

    /// Check whether `path` lies under this location.
    pub fn contains(&self, path: &Path) -> bool {
        crate::util::fs::is_inside(path, &self.path)
    }
}

/// Per-kind settings after project/target merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSettings {
    /// Absolute path of the init fragment, if any
    pub init_program: Option<PathBuf>,

    /// Absolute path of the term fragment, if any
    pub term_program: Option<PathBuf>,

    /// Name/value pairs rendered as `%let` statements, project entries first
    pub vars: Vec<(String, String)>,
}

/// A resolved build target.
#[derive(Debug, Clone)]
pub struct Target {
    /// Target name
    pub name: String,

    /// Server kind
    pub server: ServerKind,

    /// Deployment root on the server (e.g. `/Public/app/myapp`)
    pub app_loc: String,

    /// Macro search locations in precedence order, library last
    pub macro_locations: Vec<SearchLocation>,

    /// Override folders pinned by this target
    pub pinned_locations: Vec<PathBuf>,

    /// Folders searched for embedded programs, in order
    pub program_locations: Vec<PathBuf>,

    /// Source folders copied to `services/` in the output tree
    pub service_folders: Vec<PathBuf>,

    /// Source folders copied to `jobs/` in the output tree
    pub job_folders: Vec<PathBuf>,

    /// Settings applied to services
    pub service_settings: UnitSettings,

    /// Settings applied to jobs
    pub job_settings: UnitSettings,
}

impl Target {
    /// Create a target with no folders configured.
    pub fn new(name: impl Into<String>, server: ServerKind) -> Self {
        Target {
            name: name.into(),
            server,
            app_loc: String::new(),
            macro_locations: Vec::new(),
            pinned_locations: Vec::new(),
            program_locations: Vec::new(),
            service_folders: Vec::new(),
            job_folders: Vec::new(),
            service_settings: UnitSettings::default(),
            job_settings: UnitSettings::default(),
        }
    }

    /// Settings for the given unit kind.
    pub fn settings(&self, kind: UnitKind) -> &UnitSettings {
        match kind {
            UnitKind::Service => &self.service_settings,
            UnitKind::Job => &self.job_settings,
        }
    }

    /// Source folders for the given unit kind.
    pub fn source_folders(&self, kind: UnitKind) -> &[PathBuf] {
        match kind {
            UnitKind::Service => &self.service_folders,
            UnitKind::Job => &self.job_folders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_kind_parse() {
        assert_eq!("sasviya".parse::<ServerKind>().unwrap(), ServerKind::SasViya);
        assert_eq!("VIYA".parse::<ServerKind>().unwrap(), ServerKind::SasViya);
        assert_eq!("sas9".parse::<ServerKind>().unwrap(), ServerKind::Sas9);
        assert!("sas10".parse::<ServerKind>().is_err());
    }

    #[test]
    fn test_location_contains() {
        let loc = SearchLocation::library_at("core", "/proj/node_modules/@sasjs/core");
        assert!(loc.is_library());
        assert!(loc.contains(Path::new("/proj/node_modules/@sasjs/core/base/mf_abort.sas")));
        assert!(!loc.contains(Path::new("/proj/macros/mf_abort.sas")));
    }

    #[test]
    fn test_settings_by_kind() {
        let mut target = Target::new("viya", ServerKind::SasViya);
        target.job_settings.init_program = Some(PathBuf::from("/proj/jobinit.sas"));

        assert!(target.settings(UnitKind::Service).init_program.is_none());
        assert!(target.settings(UnitKind::Job).init_program.is_some());
    }
}
