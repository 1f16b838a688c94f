//! `sasbuild build` command

use anyhow::{bail, Result};

use crate::cli::BuildArgs;
use crate::commands::{report_failures, Session};
use sasbuild::ops::{build_target, BuildOptions, CompileFailed};
use sasbuild::util::diagnostic::suggestions;
use sasbuild::util::{GlobalContext, RealFileSystem};

pub fn execute(args: BuildArgs, ctx: &GlobalContext) -> Result<()> {
    let session = Session::open(ctx)?;
    let target = session.target(args.target.as_deref())?;
    let opts = BuildOptions {
        compile: session.compile_options(ctx, args.jobs),
    };

    let report = match build_target(&RealFileSystem, &session.project, &target, &opts) {
        Ok(report) => report,
        Err(e) => match e.downcast::<CompileFailed>() {
            Ok(failed) => {
                report_failures(&failed.failures, ctx);
                bail!("{}\n{}", failed, suggestions::BUILD_FAILED);
            }
            Err(e) => return Err(e),
        },
    };

    eprintln!(
        "    Finished `{}` -> {}, {}",
        target.name,
        report.program_path.display(),
        report.tree_path.display()
    );
    Ok(())
}
