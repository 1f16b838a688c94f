//! Implementation of `sasbuild clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::project::Project;
use crate::util::fs::FileSystem;

/// Remove one target's build output, or the whole build folder.
///
/// Returns the paths that were removed.
pub fn clean(
    fs: &dyn FileSystem,
    project: &Project,
    target: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    match target {
        Some(name) => {
            // Fails on unknown target names
            project.target(Some(name))?;

            let dir = project.target_dir(name);
            if fs.directory_exists(&dir) {
                fs.remove_dir_all(&dir)?;
                removed.push(dir);
            }
            for ext in ["sas", "json"] {
                let file = project.build_dir().join(format!("{}.{}", name, ext));
                if fs.read_text_file(&file)?.is_some() {
                    fs.remove_file(&file)?;
                    removed.push(file);
                }
            }
        }
        None => {
            let dir = project.build_dir();
            if fs.directory_exists(&dir) {
                fs.remove_dir_all(&dir)?;
                removed.push(dir);
            }
        }
    }

    for path in &removed {
        tracing::debug!("removed {}", path.display());
    }
    Ok(removed)
}
