//! `sasbuild.toml` project file parsing and schema.
//!
//! All relative paths in the project file are relative to the directory that
//! contains it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::core::target::{SearchLocation, ServerKind, Target, UnitSettings};

/// Project file name.
pub const PROJECT_FILE_NAME: &str = "sasbuild.toml";

/// Default folder receiving build output.
pub const DEFAULT_BUILD_OUTPUT: &str = "sasbuild";

/// Default location of the shared macro library.
pub const DEFAULT_LIBRARY_FOLDER: &str = "node_modules/@sasjs/core";

/// Errors locating the project file.
#[derive(Debug, Error)]
pub enum ProjectFileError {
    #[error("could not find `{}` in `{}` or any parent directory", PROJECT_FILE_NAME, .dir.display())]
    NotFound { dir: PathBuf },
}

/// Return the project file in `dir`, if present.
pub fn find_project_file(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(PROJECT_FILE_NAME);
    path.is_file().then_some(path)
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Project name
    pub name: String,

    /// Folder receiving compiled output and bundles
    #[serde(default = "default_build_output")]
    pub build_output: PathBuf,

    /// Project-wide macro override folders, in precedence order
    #[serde(default)]
    pub macro_folders: Vec<PathBuf>,

    /// Project-wide program folders, in search order
    #[serde(default)]
    pub program_folders: Vec<PathBuf>,

    /// Shared macro library searched after every override folder
    #[serde(default = "default_library_folder")]
    pub library_folder: PathBuf,
}

fn default_build_output() -> PathBuf {
    PathBuf::from(DEFAULT_BUILD_OUTPUT)
}

fn default_library_folder() -> PathBuf {
    PathBuf::from(DEFAULT_LIBRARY_FOLDER)
}

/// `[service_config]` / `[job_config]` sections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnitConfigSpec {
    /// Fragment inserted before every unit body
    pub init_program: Option<PathBuf>,

    /// Fragment inserted after every unit body
    pub term_program: Option<PathBuf>,

    /// `%let` variables (services only)
    pub vars: BTreeMap<String, String>,
}

/// One `[[targets]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    /// Target name
    pub name: String,

    /// Server kind
    pub server: ServerKind,

    /// Deployment root on the server
    #[serde(default)]
    pub app_loc: String,

    /// Target macro override folders, searched before the project's
    #[serde(default)]
    pub macro_folders: Vec<PathBuf>,

    /// Override folders whose matches beat every other override
    #[serde(default)]
    pub pinned_macro_folders: Vec<PathBuf>,

    /// Target program folders, searched before the project's
    #[serde(default)]
    pub program_folders: Vec<PathBuf>,

    /// Folders compiled as services
    #[serde(default)]
    pub service_folders: Vec<PathBuf>,

    /// Folders compiled as jobs
    #[serde(default)]
    pub job_folders: Vec<PathBuf>,

    /// Target-level service settings
    #[serde(default)]
    pub service_config: Option<UnitConfigSpec>,

    /// Target-level job settings
    #[serde(default)]
    pub job_config: Option<UnitConfigSpec>,
}

/// The raw project file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectFile {
    pub project: ProjectSection,

    #[serde(default)]
    pub service_config: UnitConfigSpec,

    #[serde(default)]
    pub job_config: UnitConfigSpec,

    #[serde(default)]
    pub targets: Vec<TargetSpec>,
}

/// A loaded project rooted at the directory holding `sasbuild.toml`.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    file: ProjectFile,
}

impl Project {
    /// Load a project from its project file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read project file: {}", path.display()))?;
        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::from_toml(&contents, root)
            .with_context(|| format!("failed to parse project file: {}", path.display()))
    }

    /// Parse a project from TOML text.
    pub fn from_toml(contents: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let file: ProjectFile = toml::from_str(contents)?;
        let project = Project {
            root: root.into(),
            file,
        };
        project.validate()?;
        Ok(project)
    }

    fn validate(&self) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        for target in &self.file.targets {
            if seen.contains(&target.name.as_str()) {
                bail!("target `{}` is defined more than once", target.name);
            }
            seen.push(&target.name);
        }
        Ok(())
    }

    /// Project name.
    pub fn name(&self) -> &str {
        &self.file.project.name
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder receiving build output.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.file.project.build_output)
    }

    /// Output tree for one target.
    pub fn target_dir(&self, target: &str) -> PathBuf {
        self.build_dir().join(target)
    }

    /// Names of every configured target.
    pub fn target_names(&self) -> Vec<&str> {
        self.file.targets.iter().map(|t| t.name.as_str()).collect()
    }

    /// Resolve a target by name, or the only target when `name` is `None`.
    pub fn target(&self, name: Option<&str>) -> Result<Target> {
        let spec = match name {
            Some(name) => self
                .file
                .targets
                .iter()
                .find(|t| t.name == name)
                .with_context(|| {
                    format!(
                        "unknown target `{}`\navailable targets: {}",
                        name,
                        self.available_targets()
                    )
                })?,
            None => match self.file.targets.as_slice() {
                [only] => only,
                [] => bail!("no targets defined in {}", PROJECT_FILE_NAME),
                _ => bail!(
                    "several targets defined, pick one with --target\navailable targets: {}",
                    self.available_targets()
                ),
            },
        };
        Ok(self.resolve_target(spec))
    }

    fn available_targets(&self) -> String {
        let names = self.target_names();
        if names.is_empty() {
            "(none)".to_string()
        } else {
            names.join(", ")
        }
    }

    fn resolve_target(&self, spec: &TargetSpec) -> Target {
        let project = &self.file.project;
        let mut target = Target::new(&spec.name, spec.server);
        target.app_loc = spec.app_loc.clone();

        target.pinned_locations = spec
            .pinned_macro_folders
            .iter()
            .map(|p| self.root.join(p))
            .collect();

        let mut locations: Vec<SearchLocation> = Vec::new();
        let overrides = spec
            .pinned_macro_folders
            .iter()
            .chain(&spec.macro_folders)
            .chain(&project.macro_folders);
        for folder in overrides {
            let path = self.root.join(folder);
            if !locations.iter().any(|l| l.path == path) {
                locations.push(SearchLocation::override_at(
                    folder.to_string_lossy(),
                    path,
                ));
            }
        }
        locations.push(SearchLocation::library_at(
            project.library_folder.to_string_lossy(),
            self.root.join(&project.library_folder),
        ));
        target.macro_locations = locations;

        target.program_locations = spec
            .program_folders
            .iter()
            .chain(&project.program_folders)
            .map(|p| self.root.join(p))
            .collect();

        target.service_folders = spec.service_folders.iter().map(|p| self.root.join(p)).collect();
        target.job_folders = spec.job_folders.iter().map(|p| self.root.join(p)).collect();

        target.service_settings =
            self.merge_settings(&self.file.service_config, spec.service_config.as_ref());
        target.job_settings = self.merge_settings(&self.file.job_config, spec.job_config.as_ref());

        target
    }

    /// Target settings win over project settings; vars keep project order
    /// with target entries replacing same-named ones in place.
    fn merge_settings(
        &self,
        project: &UnitConfigSpec,
        target: Option<&UnitConfigSpec>,
    ) -> UnitSettings {
        let pick = |t: Option<&PathBuf>, p: Option<&PathBuf>| t.or(p).map(|p| self.root.join(p));

        let mut vars: Vec<(String, String)> = project
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(target) = target {
            for (key, value) in &target.vars {
                match vars.iter_mut().find(|(k, _)| k == key) {
                    Some(existing) => existing.1 = value.clone(),
                    None => vars.push((key.clone(), value.clone())),
                }
            }
        }

        UnitSettings {
            init_program: pick(
                target.and_then(|t| t.init_program.as_ref()),
                project.init_program.as_ref(),
            ),
            term_program: pick(
                target.and_then(|t| t.term_program.as_ref()),
                project.term_program.as_ref(),
            ),
            vars,
        }
    }
}
