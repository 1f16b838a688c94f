//! Test utilities and mocks for sasbuild unit tests.
//!
//! This module provides an in-memory [`FileSystem`] so resolution, embedding
//! and bundling can be tested without touching the disk, plus fixtures that
//! lay out realistic projects on disk for the `ops` tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use sasbuild::test_support::MockFileSystem;
//!
//! #[test]
//! fn test_example() {
//!     let mut fs = MockFileSystem::new();
//!     fs.add_file("/proj/macros/mf_abort.sas", "%macro mf_abort;%mend;");
//!
//!     // Hand `&fs` to the resolver...
//! }
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{bail, Result};

use crate::util::fs::FileSystem;

pub use fixtures::*;

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MockState {
    fn add_dir(&mut self, path: &Path) {
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }

    fn add_file(&mut self, path: &Path, content: String) {
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path.to_path_buf(), content);
    }
}

/// Mock filesystem for testing without real I/O.
///
/// Listings come back sorted, matching [`crate::util::RealFileSystem`].
#[derive(Debug, Default)]
pub struct MockFileSystem {
    state: RwLock<MockState>,
}

impl MockFileSystem {
    /// Create a new empty mock filesystem.
    pub fn new() -> Self {
        MockFileSystem::default()
    }

    /// Add a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.state
            .get_mut()
            .unwrap()
            .add_file(path.as_ref(), content.into());
    }

    /// Add a directory (and its parents).
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        self.state.get_mut().unwrap().add_dir(path.as_ref());
    }

    /// Read a file for assertions.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.read().unwrap().files.get(path.as_ref()).cloned()
    }

    /// All file paths, sorted.
    pub fn all_files(&self) -> Vec<PathBuf> {
        self.state.read().unwrap().files.keys().cloned().collect()
    }
}

impl FileSystem for MockFileSystem {
    fn read_text_file(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.state.read().unwrap().files.get(path).cloned())
    }

    fn write_text_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.state
            .write()
            .unwrap()
            .add_file(path, contents.to_string());
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        let state = self.state.read().unwrap();
        if !state.dirs.contains(dir) {
            bail!("failed to read directory: {}", dir.display());
        }
        Ok(state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect())
    }

    fn list_subdirectories(&self, dir: &Path) -> Result<Vec<String>> {
        let state = self.state.read().unwrap();
        if !state.dirs.contains(dir) {
            bail!("failed to read directory: {}", dir.display());
        }
        Ok(state
            .dirs
            .iter()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect())
    }

    fn find_file_by_name(&self, name: &str, root: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.read().unwrap();
        Ok(state
            .files
            .keys()
            .filter(|p| p.starts_with(root))
            .filter(|p| p.file_name().is_some_and(|n| n == name))
            .cloned()
            .collect())
    }

    fn directory_exists(&self, path: &Path) -> bool {
        self.state.read().unwrap().dirs.contains(path)
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if !state.dirs.contains(src) {
            bail!("failed to read directory: {}", src.display());
        }
        let dirs: Vec<PathBuf> = state
            .dirs
            .iter()
            .filter_map(|d| d.strip_prefix(src).ok())
            .map(|rel| dst.join(rel))
            .collect();
        let files: Vec<(PathBuf, String)> = state
            .files
            .iter()
            .filter_map(|(p, c)| p.strip_prefix(src).ok().map(|rel| (dst.join(rel), c.clone())))
            .collect();
        for dir in dirs {
            state.add_dir(&dir);
        }
        for (path, content) in files {
            state.add_file(&path, content);
        }
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|d| !d.starts_with(path));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.state.write().unwrap().files.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_listing() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/out/services/admin/b.sas", "b");
        fs.add_file("/out/services/admin/a.sas", "a");
        fs.add_dir("/out/services/empty");

        assert_eq!(
            fs.list_files(Path::new("/out/services/admin")).unwrap(),
            vec!["a.sas", "b.sas"]
        );
        assert_eq!(
            fs.list_subdirectories(Path::new("/out/services")).unwrap(),
            vec!["admin", "empty"]
        );
        assert!(fs.directory_exists(Path::new("/out")));
    }

    #[test]
    fn test_mock_copy_and_remove() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/src/services/common/ping.sas", "%put ping;");

        fs.copy_dir(Path::new("/src/services/common"), Path::new("/out/services/common"))
            .unwrap();
        assert_eq!(
            fs.file("/out/services/common/ping.sas").as_deref(),
            Some("%put ping;")
        );

        fs.remove_dir_all(Path::new("/out")).unwrap();
        assert!(!fs.directory_exists(Path::new("/out")));
        assert!(fs.file("/src/services/common/ping.sas").is_some());
    }
}
