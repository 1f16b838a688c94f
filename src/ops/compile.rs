//! Implementation of `sasbuild compile`.
//!
//! Copies a target's service and job folders into its output tree, then
//! compiles every unit in place. Units are independent: they are compiled on
//! a rayon pool and a failing unit does not stop its siblings. Configuration
//! errors (a macro folder that does not exist) abort the whole target.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use thiserror::Error;

use crate::builder::assemble::{assemble, MacroSource};
use crate::builder::embed::{embed, EmbedError};
use crate::core::manifest::{extract_program_entries, DeprecationPolicy, ManifestError};
use crate::core::project::Project;
use crate::core::target::Target;
use crate::core::unit::{Unit, UnitKind};
use crate::resolver::{ResolveError, Resolver};
use crate::util::diagnostic::Diagnostic;
use crate::util::fs::{relative_path, to_slash, FileSystem};

/// Options for the compile command.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Number of parallel jobs
    pub jobs: Option<usize>,

    /// Handling of the deprecated dependency heading
    pub policy: DeprecationPolicy,

    /// Date the deprecation policy is checked against
    pub today: NaiveDate,

    /// Draw a progress bar
    pub progress: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            jobs: None,
            policy: DeprecationPolicy::default(),
            today: chrono::Local::now().date_naive(),
            progress: false,
        }
    }
}

/// Error compiling a single unit.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{}: {source}", .file.display())]
    Manifest {
        file: PathBuf,
        source: ManifestError,
    },

    #[error("{}: {source}", .file.display())]
    Embed { file: PathBuf, source: EmbedError },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl UnitError {
    /// Fatal errors abort the whole build instead of one unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UnitError::Resolve(e) if e.is_configuration_error())
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            UnitError::Resolve(err) => err.to_diagnostic(),
            UnitError::Manifest { file, source } => {
                source.to_diagnostic().with_location(file.clone())
            }
            UnitError::Embed { file, source } => source.to_diagnostic().with_location(file.clone()),
            UnitError::Io(err) => Diagnostic::error(format!("{:#}", err)),
        }
    }
}

/// A unit that failed to compile.
#[derive(Debug)]
pub struct UnitFailure {
    /// Path relative to the target's output tree
    pub unit: PathBuf,
    pub error: UnitError,
}

/// Result of compiling one target.
#[derive(Debug)]
pub struct CompileReport {
    /// Target name
    pub target: String,

    /// Output tree holding the compiled units
    pub output_dir: PathBuf,

    /// Units compiled successfully, relative to `output_dir`
    pub compiled: Vec<PathBuf>,

    /// Units that failed, in discovery order
    pub failures: Vec<UnitFailure>,
}

impl CompileReport {
    /// Check whether every unit compiled.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Init/term fragment text for one unit kind.
#[derive(Debug, Clone, Default)]
struct Fragments {
    init: Option<String>,
    term: Option<String>,
}

/// Compile every unit of `target`.
pub fn compile_target(
    fs: &dyn FileSystem,
    project: &Project,
    target: &Target,
    opts: &CompileOptions,
) -> Result<CompileReport> {
    let output_dir = project.target_dir(&target.name);
    tracing::info!("compiling target `{}` into {}", target.name, output_dir.display());

    fs.remove_dir_all(&output_dir)?;
    copy_sources(fs, target, &output_dir)?;

    let units = discover_units(fs, target, &output_dir)?;
    let service_fragments = load_fragments(fs, target, UnitKind::Service)?;
    let job_fragments = load_fragments(fs, target, UnitKind::Job)?;

    if let Some(j) = opts.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(j)
            .build_global()
            .ok(); // Ignore if already set
    }

    let pb = if opts.progress && units.len() > 1 {
        let pb = ProgressBar::new(units.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results: Vec<Result<String, UnitError>> = units
        .par_iter()
        .map(|unit| {
            let fragments = match unit.kind {
                UnitKind::Service => &service_fragments,
                UnitKind::Job => &job_fragments,
            };
            let result = compile_unit(fs, target, unit, fragments, opts);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            result
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut report = CompileReport {
        target: target.name.clone(),
        output_dir,
        compiled: Vec::new(),
        failures: Vec::new(),
    };

    for (unit, result) in units.iter().zip(results) {
        match result {
            Ok(compiled) => {
                fs.write_text_file(&unit.path, &compiled)?;
                tracing::debug!("compiled {}", unit);
                report.compiled.push(unit.relative_path.clone());
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => report.failures.push(UnitFailure {
                unit: unit.relative_path.clone(),
                error: err,
            }),
        }
    }

    tracing::info!(
        "compiled {} unit(s) for `{}`, {} failed",
        report.compiled.len(),
        target.name,
        report.failures.len()
    );

    Ok(report)
}

/// Compile a single unit into its final text.
fn compile_unit(
    fs: &dyn FileSystem,
    target: &Target,
    unit: &Unit,
    fragments: &Fragments,
    opts: &CompileOptions,
) -> Result<String, UnitError> {
    let origin = to_slash(&unit.relative_path);

    // Init and term fragments may declare macros of their own.
    let mut sources: Vec<(&str, &str)> = Vec::new();
    if let Some(init) = &fragments.init {
        sources.push((init.as_str(), "init program"));
    }
    sources.push((unit.body.as_str(), origin.as_str()));
    if let Some(term) = &fragments.term {
        sources.push((term.as_str(), "term program"));
    }

    let resolution = Resolver::for_target(fs, target)
        .with_policy(opts.policy, opts.today)
        .resolve_all(&sources)?;

    let mut macros = Vec::with_capacity(resolution.paths.len());
    for path in resolution.paths {
        let content = fs
            .read_text_file(&path)?
            .with_context(|| format!("macro file vanished: {}", path.display()))?;
        macros.push(MacroSource::new(path, content));
    }

    let entries =
        extract_program_entries(&unit.body).map_err(|source| UnitError::Manifest {
            file: unit.relative_path.clone(),
            source,
        })?;
    let plan = embed(fs, &entries, &target.program_locations).map_err(|source| {
        UnitError::Embed {
            file: unit.relative_path.clone(),
            source,
        }
    })?;

    Ok(assemble(
        unit,
        &macros,
        &plan,
        target.settings(unit.kind),
        fragments.init.as_deref(),
        fragments.term.as_deref(),
    ))
}

fn copy_sources(fs: &dyn FileSystem, target: &Target, output_dir: &Path) -> Result<()> {
    for kind in [UnitKind::Service, UnitKind::Job] {
        for folder in target.source_folders(kind) {
            if !fs.directory_exists(folder) {
                bail!("{} folder not found: {}", kind, folder.display());
            }
            let name = folder
                .file_name()
                .with_context(|| format!("{} folder has no name: {}", kind, folder.display()))?;
            let dst = output_dir.join(kind.folder()).join(name);
            tracing::debug!("copying {} to {}", folder.display(), dst.display());
            fs.copy_dir(folder, &dst)?;
        }
    }
    Ok(())
}

fn discover_units(fs: &dyn FileSystem, target: &Target, output_dir: &Path) -> Result<Vec<Unit>> {
    let mut units = Vec::new();
    for kind in [UnitKind::Service, UnitKind::Job] {
        let root = output_dir.join(kind.folder());
        if fs.directory_exists(&root) {
            collect_units(fs, target, kind, output_dir, &root, &mut units)?;
        }
    }
    Ok(units)
}

fn collect_units(
    fs: &dyn FileSystem,
    target: &Target,
    kind: UnitKind,
    output_dir: &Path,
    dir: &Path,
    units: &mut Vec<Unit>,
) -> Result<()> {
    for file_name in fs.list_files(dir)? {
        if !file_name.to_ascii_lowercase().ends_with(".sas") {
            continue;
        }
        let path = dir.join(&file_name);
        let body = fs
            .read_text_file(&path)?
            .with_context(|| format!("failed to read {}", path.display()))?;
        let relative = relative_path(output_dir, &path);
        units.push(Unit::new(kind, relative, path, body, target.name.clone()));
    }
    for sub in fs.list_subdirectories(dir)? {
        collect_units(fs, target, kind, output_dir, &dir.join(sub), units)?;
    }
    Ok(())
}

fn load_fragments(fs: &dyn FileSystem, target: &Target, kind: UnitKind) -> Result<Fragments> {
    let settings = target.settings(kind);
    let load = |path: Option<&PathBuf>| -> Result<Option<String>> {
        match path {
            Some(path) => fs
                .read_text_file(path)?
                .with_context(|| format!("{} program not found: {}", kind, path.display()))
                .map(Some),
            None => Ok(None),
        }
    };
    Ok(Fragments {
        init: load(settings.init_program.as_ref())?,
        term: load(settings.term_program.as_ref())?,
    })
}
