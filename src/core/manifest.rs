//! Dependency manifests embedded in SAS source headers.
//!
//! A unit declares what it needs in its doc header:
//!
//! ```text
//! /**
//!   @file
//!   @brief Returns the list of users
//!
//!   <h4> SAS Macros </h4>
//!   @li mf_abort.sas
//!   @li mm_getusers.sas
//!
//!   <h4> SAS Programs </h4>
//!   @li usertable.sas utab
//! **/
//! ```
//!
//! Extraction is a pure parse; validation of filerefs happens in the embedder.

use chrono::NaiveDate;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Extension every macro dependency must carry.
pub const MACRO_EXTENSION: &str = ".sas";

/// Heading that opens the macro dependency list.
pub const MACROS_HEADING: &str = "<h4> SAS Macros </h4>";

/// Older heading for the macro dependency list.
pub const DEPRECATED_MACROS_HEADING: &str = "<h4> Dependencies </h4>";

/// Heading that opens the program dependency list.
pub const PROGRAMS_HEADING: &str = "<h4> SAS Programs </h4>";

const HEADING_OPEN: &str = "<h4>";
const BULLET_MARKER: &str = "@li";

/// Errors raised while reading a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("SAS program entry `{entry}` is missing a file name")]
    MissingFileName { entry: String },

    #[error("SAS program `{file_name}` is missing a fileref")]
    MissingEmbedId { file_name: String },

    #[error("`<h4> Dependencies </h4>` is no longer supported (removed on {cutover})")]
    DeprecatedHeading { cutover: NaiveDate },
}

impl ManifestError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ManifestError::MissingFileName { .. } | ManifestError::MissingEmbedId { .. } => diag
                .with_context("SAS programs are listed as `@li <filename> <fileref>`")
                .with_suggestion("Add the missing part to the entry under `<h4> SAS Programs </h4>`"),
            ManifestError::DeprecatedHeading { .. } => {
                diag.with_suggestion(suggestions::DEPRECATED_HEADING)
            }
        }
    }
}

/// Macro names declared by a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroManifest {
    /// Declared file names, deduplicated, in declaration order
    pub names: Vec<String>,

    /// Whether the deprecated heading was used
    pub uses_deprecated_heading: bool,
}

/// One `<fileName> <embedId>` program entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramEntry {
    /// File name looked up in the program folders
    pub file_name: String,

    /// Fileref the program content is exposed under
    pub embed_id: String,
}

impl ProgramEntry {
    /// Create a new program entry.
    pub fn new(file_name: impl Into<String>, embed_id: impl Into<String>) -> Self {
        ProgramEntry {
            file_name: file_name.into(),
            embed_id: embed_id.into(),
        }
    }
}

/// Extract the macro file names declared under either macro heading.
pub fn extract_macro_names(text: &str) -> MacroManifest {
    let current = list_entries(text, MACROS_HEADING);
    let deprecated = list_entries(text, DEPRECATED_MACROS_HEADING);
    let uses_deprecated_heading = header_scope(text)
        .to_ascii_lowercase()
        .contains(&DEPRECATED_MACROS_HEADING.to_ascii_lowercase());

    let mut names: Vec<String> = Vec::new();
    for entry in current.iter().chain(deprecated.iter()) {
        let name = strip_bullet(entry);
        if is_macro_file(name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    MacroManifest {
        names,
        uses_deprecated_heading,
    }
}

/// Extract `<fileName> <embedId>` entries declared under the programs heading.
pub fn extract_program_entries(text: &str) -> Result<Vec<ProgramEntry>, ManifestError> {
    list_entries(text, PROGRAMS_HEADING)
        .iter()
        .map(|entry| {
            let mut tokens = strip_bullet(entry).split_whitespace();
            let file_name = tokens.next().ok_or_else(|| ManifestError::MissingFileName {
                entry: entry.to_string(),
            })?;
            let embed_id = tokens.next().ok_or_else(|| ManifestError::MissingEmbedId {
                file_name: file_name.to_string(),
            })?;
            Ok(ProgramEntry::new(file_name, embed_id))
        })
        .collect()
}

fn is_macro_file(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(char::is_whitespace)
        && name.len() > MACRO_EXTENSION.len()
        && name
            .to_ascii_lowercase()
            .ends_with(MACRO_EXTENSION)
}

fn strip_bullet(entry: &str) -> &str {
    entry
        .strip_prefix(BULLET_MARKER)
        .unwrap_or(entry)
        .trim()
}

/// Non-blank lines following `heading`, up to the next heading or the end of
/// the header. Lines are trimmed but keep their bullet marker.
fn list_entries<'a>(text: &'a str, heading: &str) -> Vec<&'a str> {
    let heading = heading.to_ascii_lowercase();
    let mut entries = Vec::new();
    let mut in_block = false;

    for line in header_scope(text).lines() {
        let lowered = line.to_ascii_lowercase();
        if lowered.contains(&heading) {
            in_block = true;
            continue;
        }
        if lowered.contains(HEADING_OPEN) {
            in_block = false;
            continue;
        }
        if !in_block {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with("*/") || trimmed.starts_with("**/") {
            in_block = false;
            continue;
        }
        if !trimmed.is_empty() {
            entries.push(trimmed);
        }
    }

    entries
}

/// The doc header (`/** ... **/`) if the text has one, otherwise the whole text.
fn header_scope(text: &str) -> &str {
    let Some(start) = text.find("/**") else {
        return text;
    };
    let body = &text[start + 3..];
    match body.find("*/") {
        Some(end) => {
            let header = &body[..end];
            header.strip_suffix('*').unwrap_or(header)
        }
        None => body,
    }
}

/// Time-gated handling of the deprecated macro heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeprecationPolicy {
    /// Last day on which the deprecated heading is only warned about
    pub cutover: NaiveDate,
}

impl Default for DeprecationPolicy {
    fn default() -> Self {
        DeprecationPolicy {
            cutover: NaiveDate::from_ymd_opt(2022, 5, 2).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl DeprecationPolicy {
    /// Create a policy with a specific cutover date.
    pub fn new(cutover: NaiveDate) -> Self {
        DeprecationPolicy { cutover }
    }

    /// Warn before the cutover, fail after it.
    pub fn check(&self, today: NaiveDate, source: &str) -> Result<(), ManifestError> {
        if today > self.cutover {
            return Err(ManifestError::DeprecatedHeading {
                cutover: self.cutover,
            });
        }
        tracing::warn!(
            "{} uses `<h4> Dependencies </h4>`, which stops working after {}; use `<h4> SAS Macros </h4>` instead",
            source,
            self.cutover
        );
        Ok(())
    }
}
