//! Embedding plain-text programs under a fileref.
//!
//! Every entry listed under `<h4> SAS Programs </h4>` is looked up in the
//! target's program folders and rendered as a data step that recreates the
//! file in a temporary fileref. Filerefs are validated up front; a missing
//! program file is only a warning.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::builder::render::put_lines;
use crate::core::manifest::ProgramEntry;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::FileSystem;

/// Longest fileref SAS accepts.
pub const MAX_FILEREF_LEN: usize = 8;

static FILEREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[_a-zA-Z][_a-zA-Z0-9]*$").unwrap());

/// Why a fileref was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilerefProblem {
    Empty,
    TooLong,
    InvalidCharacters,
}

impl std::fmt::Display for FilerefProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilerefProblem::Empty => write!(f, "it is empty"),
            FilerefProblem::TooLong => write!(
                f,
                "filerefs can have a maximum of {} characters",
                MAX_FILEREF_LEN
            ),
            FilerefProblem::InvalidCharacters => write!(
                f,
                "filerefs must start with a letter or underscore and contain only letters, numbers and underscores"
            ),
        }
    }
}

/// Errors raised while planning program embeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    #[error("invalid fileref `{embed_id}` for SAS program `{file_name}`: {problem}")]
    InvalidFileref {
        file_name: String,
        embed_id: String,
        problem: FilerefProblem,
    },

    #[error("the following SAS programs have duplicate filerefs: {}", format_groups(.groups))]
    DuplicateFilerefs {
        /// (fileref, every file name declaring it), in declaration order
        groups: Vec<(String, Vec<String>)>,
    },

    #[error(transparent)]
    Io(#[from] ReadFailure),
}

/// A program file that exists but could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to read SAS program {}: {message}", .path.display())]
pub struct ReadFailure {
    pub path: PathBuf,
    pub message: String,
}

fn format_groups(groups: &[(String, Vec<String>)]) -> String {
    groups
        .iter()
        .map(|(id, files)| format!("{} ({})", id, files.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl EmbedError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EmbedError::InvalidFileref {
                file_name,
                embed_id,
                problem,
            } => Diagnostic::error(format!("invalid fileref `{}`", embed_id))
                .with_context(format!("declared for `{}`", file_name))
                .with_context(problem.to_string()),

            EmbedError::DuplicateFilerefs { groups } => {
                let mut diag =
                    Diagnostic::error("the following SAS programs have duplicate filerefs");
                for (id, files) in groups {
                    diag = diag.with_context(format!("fileref `{}`: {}", id, files.join(", ")));
                }
                diag.with_suggestion("Give every SAS program its own fileref")
            }

            EmbedError::Io(err) => Diagnostic::error(err.to_string()),
        }
    }
}

/// Check a fileref against SAS naming rules.
pub fn validate_fileref(embed_id: &str) -> Result<(), FilerefProblem> {
    if embed_id.is_empty() {
        return Err(FilerefProblem::Empty);
    }
    if embed_id.chars().count() > MAX_FILEREF_LEN {
        return Err(FilerefProblem::TooLong);
    }
    if !FILEREF_PATTERN.is_match(embed_id) {
        return Err(FilerefProblem::InvalidCharacters);
    }
    Ok(())
}

/// A program resolved to its file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedProgram {
    pub embed_id: String,
    pub file_name: String,
    pub path: PathBuf,
    pub content: String,
}

impl EmbeddedProgram {
    /// Render the data step recreating this program under its fileref.
    pub fn render(&self) -> String {
        let id = &self.embed_id;
        format!(
            "filename {id} temp;\ndata _null_;\nfile {id} lrecl=32767;\n{}run;\n",
            put_lines(&self.content)
        )
    }
}

/// Programs to embed into one unit, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedPlan {
    pub programs: Vec<EmbeddedProgram>,

    /// Declared file names not found in any program folder
    pub missing: Vec<String>,
}

impl EmbedPlan {
    /// Render every program fragment, in declaration order.
    pub fn render(&self) -> String {
        self.programs.iter().map(EmbeddedProgram::render).collect()
    }
}

/// Validate `entries` and locate each program in `program_locations`.
pub fn embed(
    fs: &dyn FileSystem,
    entries: &[ProgramEntry],
    program_locations: &[PathBuf],
) -> Result<EmbedPlan, EmbedError> {
    for entry in entries {
        validate_fileref(&entry.embed_id).map_err(|problem| EmbedError::InvalidFileref {
            file_name: entry.file_name.clone(),
            embed_id: entry.embed_id.clone(),
            problem,
        })?;
    }
    check_duplicates(entries)?;

    let mut plan = EmbedPlan::default();
    for entry in entries {
        match find_program(fs, &entry.file_name, program_locations)? {
            Some((path, content)) => {
                tracing::debug!("embedding {} as {}", path.display(), entry.embed_id);
                plan.programs.push(EmbeddedProgram {
                    embed_id: entry.embed_id.clone(),
                    file_name: entry.file_name.clone(),
                    path,
                    content,
                });
            }
            None => plan.missing.push(entry.file_name.clone()),
        }
    }

    if !plan.missing.is_empty() {
        tracing::warn!(
            "the following files were listed under SAS Programs but could not be found: {}",
            plan.missing.join(", ")
        );
        tracing::warn!("{}", suggestions::MISSING_PROGRAM);
    }

    Ok(plan)
}

fn check_duplicates(entries: &[ProgramEntry]) -> Result<(), EmbedError> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for entry in entries {
        let key = entry.embed_id.to_ascii_lowercase();
        match groups.iter_mut().find(|(id, _)| id.to_ascii_lowercase() == key) {
            Some((_, files)) => files.push(entry.file_name.clone()),
            None => groups.push((entry.embed_id.clone(), vec![entry.file_name.clone()])),
        }
    }
    groups.retain(|(_, files)| files.len() > 1);

    if groups.is_empty() {
        Ok(())
    } else {
        Err(EmbedError::DuplicateFilerefs { groups })
    }
}

/// First folder containing `file_name` wins.
fn find_program(
    fs: &dyn FileSystem,
    file_name: &str,
    program_locations: &[PathBuf],
) -> Result<Option<(PathBuf, String)>, EmbedError> {
    for location in program_locations {
        let path = location.join(file_name);
        let content = fs.read_text_file(&path).map_err(|e| ReadFailure {
            path: path.clone(),
            message: format!("{:#}", e),
        })?;
        if let Some(content) = content {
            return Ok(Some((path, content)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFileSystem;

    #[test]
    fn test_fileref_rules() {
        for ok in ["a", "_x", "ref_1", "ABCDEFGH", "_2345678"] {
            assert_eq!(validate_fileref(ok), Ok(()), "{ok}");
        }
        assert_eq!(validate_fileref(""), Err(FilerefProblem::Empty));
        assert_eq!(validate_fileref("abcdefghi"), Err(FilerefProblem::TooLong));
        assert_eq!(
            validate_fileref("my-ref"),
            Err(FilerefProblem::InvalidCharacters)
        );
        assert_eq!(
            validate_fileref("1ref"),
            Err(FilerefProblem::InvalidCharacters)
        );
    }

    #[test]
    fn test_duplicate_filerefs_case_insensitive() {
        let fs = MockFileSystem::new();
        let entries = vec![
            ProgramEntry::new("one.sas", "ref"),
            ProgramEntry::new("two.sas", "REF"),
            ProgramEntry::new("three.sas", "other"),
        ];

        let err = embed(&fs, &entries, &[]).unwrap_err();
        match &err {
            EmbedError::DuplicateFilerefs { groups } => {
                assert_eq!(
                    groups,
                    &vec![(
                        "ref".to_string(),
                        vec!["one.sas".to_string(), "two.sas".to_string()]
                    )]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("one.sas"));
        assert!(message.contains("two.sas"));
    }

    #[test]
    fn test_invalid_fileref_names_the_file() {
        let fs = MockFileSystem::new();
        let entries = vec![ProgramEntry::new("table.sas", "toolongref")];

        let err = embed(&fs, &entries, &[]).unwrap_err();
        assert_eq!(
            err,
            EmbedError::InvalidFileref {
                file_name: "table.sas".to_string(),
                embed_id: "toolongref".to_string(),
                problem: FilerefProblem::TooLong,
            }
        );
    }

    #[test]
    fn test_first_location_wins_and_missing_is_skipped() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/proj/tgt_programs/t.sas", "target copy");
        fs.add_file("/proj/programs/t.sas", "project copy");
        let locations = vec![
            PathBuf::from("/proj/tgt_programs"),
            PathBuf::from("/proj/programs"),
        ];
        let entries = vec![
            ProgramEntry::new("t.sas", "tref"),
            ProgramEntry::new("gone.sas", "gref"),
        ];

        let plan = embed(&fs, &entries, &locations).unwrap();
        assert_eq!(plan.programs.len(), 1);
        assert_eq!(plan.programs[0].content, "target copy");
        assert_eq!(plan.missing, vec!["gone.sas"]);
    }

    #[test]
    fn test_render_fragment() {
        let program = EmbeddedProgram {
            embed_id: "tref".to_string(),
            file_name: "t.sas".to_string(),
            path: PathBuf::from("/proj/programs/t.sas"),
            content: "proc print data=sashelp.class;\nrun;".to_string(),
        };

        assert_eq!(
            program.render(),
            "filename tref temp;\n\
             data _null_;\n\
             file tref lrecl=32767;\n \
             put 'proc print data=sashelp.class;';\n \
             put 'run;';\n\
             run;\n"
        );
    }
}
