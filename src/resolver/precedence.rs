//! Override tie-breaking for macro files found in several locations.
//!
//! For every file name that matched more than one path:
//! 1. library matches are dropped when any override matched;
//! 2. if the target pins folders and a survivor lies in one, only pinned
//!    survivors are kept;
//! 3. one winner remains: the survivor from the highest-precedence location,
//!    the last one found if that location matched more than once.
//!
//! Names that matched a single path pass through untouched.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::target::SearchLocation;

/// Apply override precedence to an accumulated path list, preserving order.
pub fn prioritise(
    paths: Vec<PathBuf>,
    locations: &[SearchLocation],
    pinned: &[PathBuf],
) -> Vec<PathBuf> {
    let mut names: Vec<OsString> = Vec::new();
    for path in &paths {
        if let Some(name) = path.file_name() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_os_string());
            }
        }
    }

    let mut discard: HashSet<PathBuf> = HashSet::new();

    for name in &names {
        let mut candidates: Vec<&PathBuf> = Vec::new();
        for path in paths.iter().filter(|p| p.file_name() == Some(name.as_os_str())) {
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }
        if candidates.len() < 2 {
            continue;
        }

        let (library, overrides): (Vec<&PathBuf>, Vec<&PathBuf>) = candidates
            .into_iter()
            .partition(|p| is_library_path(p, locations));

        let mut survivors = if overrides.is_empty() {
            library
        } else {
            discard.extend(library.into_iter().cloned());
            overrides
        };

        if !pinned.is_empty() {
            let (in_pinned, others): (Vec<&PathBuf>, Vec<&PathBuf>) = survivors
                .iter()
                .copied()
                .partition(|p| pinned.iter().any(|pin| p.starts_with(pin)));
            if !in_pinned.is_empty() {
                discard.extend(others.into_iter().cloned());
                survivors = in_pinned;
            }
        }

        if survivors.len() > 1 {
            let winner = pick_winner(&survivors, locations);
            tracing::debug!(
                "{} found in {} places, using {}",
                name.to_string_lossy(),
                survivors.len(),
                winner.display()
            );
            discard.extend(
                survivors
                    .into_iter()
                    .filter(|p| *p != winner)
                    .cloned(),
            );
        }
    }

    paths
        .into_iter()
        .filter(|p| !discard.contains(p))
        .collect()
}

/// The most specific location containing `path`, with its precedence rank.
fn location_of<'a>(
    path: &Path,
    locations: &'a [SearchLocation],
) -> Option<(usize, &'a SearchLocation)> {
    locations
        .iter()
        .enumerate()
        .filter(|(_, loc)| loc.contains(path))
        .max_by_key(|(rank, loc)| (loc.path.components().count(), std::cmp::Reverse(*rank)))
}

fn is_library_path(path: &Path, locations: &[SearchLocation]) -> bool {
    location_of(path, locations).is_some_and(|(_, loc)| loc.is_library())
}

fn pick_winner<'a>(survivors: &[&'a PathBuf], locations: &[SearchLocation]) -> &'a PathBuf {
    let rank = |p: &Path| location_of(p, locations).map_or(usize::MAX, |(rank, _)| rank);

    let mut best = survivors[0];
    let mut best_rank = rank(best.as_path());
    for &candidate in &survivors[1..] {
        let candidate_rank = rank(candidate.as_path());
        if candidate_rank <= best_rank {
            best = candidate;
            best_rank = candidate_rank;
        }
    }
    best
}
