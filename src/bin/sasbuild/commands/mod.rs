//! Command implementations.

pub mod build;
pub mod clean;
pub mod compile;

use anyhow::{anyhow, Result};

use sasbuild::core::manifest::DeprecationPolicy;
use sasbuild::core::{Project, Target};
use sasbuild::ops::{CompileOptions, UnitFailure};
use sasbuild::util::config::{load_config, Config};
use sasbuild::util::diagnostic::{emit, suggestions};
use sasbuild::util::GlobalContext;

/// The loaded project together with its merged tool configuration.
pub struct Session {
    pub project: Project,
    pub config: Config,
}

impl Session {
    /// Find and load the project enclosing the working directory.
    pub fn open(ctx: &GlobalContext) -> Result<Self> {
        let project_file = ctx
            .find_project_file()
            .map_err(|e| anyhow!("{}\n{}", e, suggestions::NO_PROJECT))?;
        let project = Project::load(&project_file)?;
        let config = load_config(&ctx.config_path(), &ctx.project_config_path(project.root()));
        Ok(Session { project, config })
    }

    /// Resolve the target named on the command line, else the configured default.
    pub fn target(&self, name: Option<&str>) -> Result<Target> {
        let name = name.or(self.config.build.default_target.as_deref());
        self.project
            .target(name)
            .map_err(|e| anyhow!("{:#}\n{}", e, suggestions::TARGET_NOT_FOUND))
    }

    /// Compile options: CLI > config > defaults.
    pub fn compile_options(&self, ctx: &GlobalContext, jobs: Option<usize>) -> CompileOptions {
        let mut opts = CompileOptions {
            jobs: jobs.or(self.config.build.jobs),
            progress: !ctx.is_verbose(),
            ..CompileOptions::default()
        };
        if let Some(cutover) = self.config.build.deprecation_cutover {
            opts.policy = DeprecationPolicy::new(cutover);
        }
        opts
    }
}

/// Print one diagnostic per failed unit.
pub fn report_failures(failures: &[UnitFailure], ctx: &GlobalContext) {
    for failure in failures {
        let diag = failure
            .error
            .to_diagnostic()
            .with_context(format!("while compiling {}", failure.unit.display()));
        emit(&diag, ctx.color());
    }
}
