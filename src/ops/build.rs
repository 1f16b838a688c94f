//! Implementation of `sasbuild build`.
//!
//! Compiles a target and folds its output tree into `<target>.sas` (the flat
//! deployable program) and `<target>.json` (the tree document), both written
//! next to the target's output folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::builder::bundle::{build_bundle, TreeDocument};
use crate::builder::server::Publisher;
use crate::core::manifest::MACROS_HEADING;
use crate::core::project::Project;
use crate::core::target::Target;
use crate::ops::compile::{compile_target, CompileOptions, CompileReport, UnitFailure};
use crate::resolver::Resolver;
use crate::util::fs::FileSystem;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub compile: CompileOptions,
}

/// Paths and contents produced by a build.
#[derive(Debug)]
pub struct BuildReport {
    pub compile: CompileReport,

    /// Flat program
    pub program_path: PathBuf,

    /// Tree document
    pub tree_path: PathBuf,

    pub tree: TreeDocument,
}

/// Some units failed, so no bundle was written.
#[derive(Debug, Error)]
#[error("{} unit(s) failed to compile for target `{target}`", .failures.len())]
pub struct CompileFailed {
    pub target: String,
    pub failures: Vec<UnitFailure>,
}

/// Compile `target` and write its bundle.
pub fn build_target(
    fs: &dyn FileSystem,
    project: &Project,
    target: &Target,
    opts: &BuildOptions,
) -> Result<BuildReport> {
    let mut compile = compile_target(fs, project, target, &opts.compile)?;
    if !compile.is_success() {
        return Err(CompileFailed {
            target: target.name.clone(),
            failures: std::mem::take(&mut compile.failures),
        }
        .into());
    }

    let publisher = target.server.publisher();
    let bundle = build_bundle(fs, &compile.output_dir, publisher)?;

    let mut program = preamble(fs, target, publisher, &opts.compile)?;
    program.push_str(&bundle.program);

    let build_dir = project.build_dir();
    let program_path = build_dir.join(format!("{}.sas", target.name));
    let tree_path = build_dir.join(format!("{}.json", target.name));

    fs.write_text_file(&program_path, &program)?;
    let json = serde_json::to_string_pretty(&bundle.tree)
        .context("failed to serialize the tree document")?;
    fs.write_text_file(&tree_path, &json)?;

    tracing::info!(
        "built `{}`: {} and {}",
        target.name,
        program_path.display(),
        tree_path.display()
    );

    Ok(BuildReport {
        compile,
        program_path,
        tree_path,
        tree: bundle.tree,
    })
}

/// `%let appLoc=...;` followed by the publish macro and its dependencies.
fn preamble(
    fs: &dyn FileSystem,
    target: &Target,
    publisher: &dyn Publisher,
    opts: &CompileOptions,
) -> Result<String> {
    let mut out = format!("%let appLoc={};\n", target.app_loc);

    let manifest = format!(
        "/**\n  {}\n  @li {}\n**/\n",
        MACROS_HEADING,
        publisher.publish_macro()
    );
    let resolution = Resolver::for_target(fs, target)
        .with_policy(opts.policy, opts.today)
        .resolve(&manifest, "bundle preamble")?;

    if !resolution.unresolved.is_empty() {
        tracing::warn!(
            "{} was not found; the bundle will not be able to publish services",
            publisher.publish_macro()
        );
    }

    for path in resolution.paths {
        let content = fs
            .read_text_file(&path)?
            .with_context(|| format!("macro file vanished: {}", path.display()))?;
        out.push_str(&content);
        if !content.ends_with('\n') {
            out.push('\n');
        }
    }

    Ok(out)
}
