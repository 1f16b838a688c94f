//! Filesystem utilities.
//!
//! The build engine never touches `std::fs` directly: everything goes through
//! the [`FileSystem`] trait so resolution and assembly can be exercised
//! against an in-memory tree.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// File-system collaborator used by the resolver, embedder and bundler.
pub trait FileSystem: Send + Sync {
    /// Read a text file. `Ok(None)` means the file does not exist.
    fn read_text_file(&self, path: &Path) -> Result<Option<String>>;

    /// Write a text file, creating parent directories if needed.
    fn write_text_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Names of the regular files directly inside `dir`, sorted.
    fn list_files(&self, dir: &Path) -> Result<Vec<String>>;

    /// Names of the subdirectories directly inside `dir`, sorted.
    fn list_subdirectories(&self, dir: &Path) -> Result<Vec<String>>;

    /// Recursively find every file named `name` below `root`, sorted by path.
    fn find_file_by_name(&self, name: &str, root: &Path) -> Result<Vec<PathBuf>>;

    /// Check whether `path` is an existing directory.
    fn directory_exists(&self, path: &Path) -> bool;

    /// Recursively copy a directory.
    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Remove a directory and all its contents, if it exists.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove a file, if it exists.
    fn remove_file(&self, path: &Path) -> Result<()>;
}

/// [`FileSystem`] backed by the real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_text_file(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read file: {}", path.display())),
        }
    }

    fn write_text_file(&self, path: &Path, contents: &str) -> Result<()> {
        write_string(path, contents)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        list_entries(dir, |ty| ty.is_file())
    }

    fn list_subdirectories(&self, dir: &Path) -> Result<Vec<String>> {
        list_entries(dir, |ty| ty.is_dir())
    }

    fn find_file_by_name(&self, name: &str, root: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("failed to walk directory: {}", root.display()))?;
            if entry.file_type().is_file() && entry.file_name() == name {
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }

    fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()> {
        copy_dir_all(src, dst)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        remove_dir_all_if_exists(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove file: {}", path.display())),
        }
    }
}

fn list_entries(dir: &Path, keep: impl Fn(&fs::FileType) -> bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        if keep(&entry.file_type()?) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Recursively copy a directory.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("failed to create directory: {}", dst.display()))?;

    for entry in fs::read_dir(src)
        .with_context(|| format!("failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let ty = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if ty.is_dir() {
            copy_dir_all(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    src_path.display(),
                    dst_path.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
///
/// The contents land in a sibling temp file first and are renamed into place,
/// so an interrupted build never leaves a half-written artifact behind.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    Ok(())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Check if a path is inside another path.
pub fn is_inside(path: &Path, parent: &Path) -> bool {
    path.starts_with(parent)
}

/// Render a relative path with forward slashes, whatever the host platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
