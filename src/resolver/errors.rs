//! Resolution error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::manifest::ManifestError;
use crate::util::diagnostic::{suggestions, Diagnostic, MissingLocationError};

/// Error during macro dependency resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A configured search location is not a directory while declared
    /// dependencies were still unresolved.
    #[error(transparent)]
    MissingLocation(#[from] MissingLocationError),

    /// A unit or one of its dependencies has an unusable manifest.
    #[error("{}: {source}", .file.display())]
    Manifest {
        file: PathBuf,
        source: ManifestError,
    },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl ResolveError {
    /// Configuration errors abort the whole build, not just one unit.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ResolveError::MissingLocation(_))
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::MissingLocation(err) => Diagnostic::error(err.to_string())
                .with_context(format!(
                    "source path {} does not exist",
                    err.location.display()
                ))
                .with_suggestion(suggestions::MISSING_LOCATION),

            ResolveError::Manifest { file, source } => {
                source.to_diagnostic().with_location(file.clone())
            }

            ResolveError::Io(err) => Diagnostic::error(format!("{:#}", err)),
        }
    }
}
