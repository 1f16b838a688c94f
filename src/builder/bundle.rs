//! Bundle building.
//!
//! Walks a target's compiled output tree depth-first and produces both the
//! flat deployable program and the JSON tree document. Directory entries are
//! visited in name order: files first, then subdirectories.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::comments::strip_comments;
use crate::builder::server::Publisher;
use crate::core::manifest::MACRO_EXTENSION;
use crate::core::unit::UnitKind;
use crate::util::fs::{relative_path, to_slash, FileSystem};

/// A node of the tree document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Folder { name: String, members: Vec<Node> },
    Service { name: String, code: String },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Folder { name, .. } | Node::Service { name, .. } => name,
        }
    }
}

/// The tree document describing every unit of a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDocument {
    pub members: Vec<Node>,
}

/// Output of a bundle build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// Flat program, one publish wrapper per unit
    pub program: String,

    /// Tree document
    pub tree: TreeDocument,
}

/// Service name used in the bundle: the file name without `.sas`.
pub fn service_name(file_name: &str) -> &str {
    let stem_len = file_name.len().saturating_sub(MACRO_EXTENSION.len());
    match file_name.get(stem_len..) {
        Some(ext) if stem_len > 0 && ext.eq_ignore_ascii_case(MACRO_EXTENSION) => {
            &file_name[..stem_len]
        }
        _ => file_name,
    }
}

fn is_unit_file(file_name: &str) -> bool {
    service_name(file_name).len() != file_name.len()
}

/// Build the bundle for the compiled tree rooted at `target_root`.
///
/// Only the top-level containers are visited; files lying directly in the
/// root are not units. Children of the top-level `services` folder are
/// spliced into the root of the tree document.
pub fn build_bundle(
    fs: &dyn FileSystem,
    target_root: &Path,
    publisher: &dyn Publisher,
) -> Result<Bundle> {
    let mut program = String::new();
    let mut tree = TreeDocument::default();

    if !fs.directory_exists(target_root) {
        return Ok(Bundle { program, tree });
    }

    for container in fs.list_subdirectories(target_root)? {
        let dir = target_root.join(&container);
        let members = walk(fs, target_root, &dir, publisher, &mut program)?;
        if container == UnitKind::Service.folder() {
            tree.members.extend(members);
        } else {
            tree.members.push(Node::Folder {
                name: container,
                members,
            });
        }
    }

    Ok(Bundle { program, tree })
}

fn walk(
    fs: &dyn FileSystem,
    root: &Path,
    dir: &Path,
    publisher: &dyn Publisher,
    program: &mut String,
) -> Result<Vec<Node>> {
    let relative = relative_path(root, dir);
    program.push_str(&format!("%let path={};\n", to_slash(&relative)));

    let mut members = Vec::new();

    for file_name in fs.list_files(dir)? {
        if !is_unit_file(&file_name) {
            continue;
        }
        let path = dir.join(&file_name);
        let compiled = fs
            .read_text_file(&path)?
            .with_context(|| format!("compiled unit vanished: {}", path.display()))?;
        let name = service_name(&file_name);

        tracing::debug!("bundling {}", path.display());
        program.push_str(&publisher.wrap_service(name, &compiled));
        members.push(Node::Service {
            name: name.to_string(),
            code: strip_comments(&compiled),
        });
    }

    for sub in fs.list_subdirectories(dir)? {
        let child = dir.join(&sub);
        let nested = walk(fs, root, &child, publisher, program)?;
        members.push(Node::Folder {
            name: sub,
            members: nested,
        });
    }

    Ok(members)
}
