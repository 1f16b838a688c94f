//! `sasbuild clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use crate::commands::Session;
use sasbuild::ops::clean;
use sasbuild::util::{GlobalContext, RealFileSystem};

pub fn execute(args: CleanArgs, ctx: &GlobalContext) -> Result<()> {
    let session = Session::open(ctx)?;

    let removed = clean(&RealFileSystem, &session.project, args.target.as_deref())?;
    if removed.is_empty() {
        eprintln!("     Nothing to clean");
    }
    for path in removed {
        eprintln!("     Removed {}", path.display());
    }
    Ok(())
}
