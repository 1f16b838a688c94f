//! `sasbuild compile` command

use anyhow::{bail, Result};

use crate::cli::CompileArgs;
use crate::commands::{report_failures, Session};
use sasbuild::ops::compile_target;
use sasbuild::util::diagnostic::suggestions;
use sasbuild::util::{GlobalContext, RealFileSystem};

pub fn execute(args: CompileArgs, ctx: &GlobalContext) -> Result<()> {
    let session = Session::open(ctx)?;
    let target = session.target(args.target.as_deref())?;
    let opts = session.compile_options(ctx, args.jobs);

    let report = compile_target(&RealFileSystem, &session.project, &target, &opts)?;

    if !report.is_success() {
        report_failures(&report.failures, ctx);
        bail!(
            "{} unit(s) failed to compile for target `{}`\n{}",
            report.failures.len(),
            target.name,
            suggestions::BUILD_FAILED
        );
    }

    eprintln!(
        "    Finished `{}` -> {} ({} unit(s))",
        target.name,
        report.output_dir.display(),
        report.compiled.len()
    );
    Ok(())
}
