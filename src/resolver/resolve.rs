//! Recursive macro dependency resolution.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;

use crate::core::manifest::{extract_macro_names, DeprecationPolicy};
use crate::core::target::{SearchLocation, Target};
use crate::resolver::errors::ResolveError;
use crate::resolver::precedence::prioritise;
use crate::util::diagnostic::MissingLocationError;
use crate::util::fs::FileSystem;

/// The outcome of resolving one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Macro files to include, transitive dependencies before their dependants
    pub paths: Vec<PathBuf>,

    /// Declared names that were not found in any location
    pub unresolved: Vec<Unresolved>,
}

/// A declared macro no location provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub name: String,

    /// Source whose header declared it
    pub origin: String,
}

/// Accumulator threaded through the recursive walk.
#[derive(Default)]
struct Walk {
    visited: HashSet<PathBuf>,
    paths: Vec<PathBuf>,
    unresolved: Vec<Unresolved>,
}

/// Resolves declared macro names to files across ordered search locations.
pub struct Resolver<'a> {
    fs: &'a dyn FileSystem,
    locations: &'a [SearchLocation],
    pinned: &'a [PathBuf],
    policy: DeprecationPolicy,
    today: NaiveDate,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over explicit locations.
    pub fn new(
        fs: &'a dyn FileSystem,
        locations: &'a [SearchLocation],
        pinned: &'a [PathBuf],
    ) -> Self {
        Resolver {
            fs,
            locations,
            pinned,
            policy: DeprecationPolicy::default(),
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Create a resolver over a target's macro locations.
    pub fn for_target(fs: &'a dyn FileSystem, target: &'a Target) -> Self {
        Self::new(fs, &target.macro_locations, &target.pinned_locations)
    }

    /// Use a specific deprecation policy and clock.
    pub fn with_policy(mut self, policy: DeprecationPolicy, today: NaiveDate) -> Self {
        self.policy = policy;
        self.today = today;
        self
    }

    /// Resolve every macro declared in `text`, transitively.
    ///
    /// `origin` names the text in log messages and errors.
    pub fn resolve(&self, text: &str, origin: &str) -> Result<Resolution, ResolveError> {
        self.resolve_all(&[(text, origin)])
    }

    /// Resolve several texts (e.g. init fragment, body, term fragment) as
    /// one unit. Each text is scanned on its own so every doc header counts;
    /// precedence is applied once over the combined result.
    pub fn resolve_all(&self, sources: &[(&str, &str)]) -> Result<Resolution, ResolveError> {
        let mut walk = Walk::default();
        for (text, origin) in sources {
            self.collect(text, origin, &mut walk)?;
        }

        let prioritised = prioritise(walk.paths, self.locations, self.pinned);
        let mut seen = HashSet::new();
        let paths: Vec<PathBuf> = prioritised
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        let mut origins: Vec<&str> = Vec::new();
        for missing in &walk.unresolved {
            if !origins.contains(&missing.origin.as_str()) {
                origins.push(&missing.origin);
            }
        }
        for origin in origins {
            let names: Vec<&str> = walk
                .unresolved
                .iter()
                .filter(|m| m.origin == origin)
                .map(|m| m.name.as_str())
                .collect();
            tracing::warn!(
                "{}: the following macros could not be found in any macro folder: {}",
                origin,
                names.join(", ")
            );
        }

        Ok(Resolution {
            paths,
            unresolved: walk.unresolved,
        })
    }

    fn collect(&self, text: &str, origin: &str, walk: &mut Walk) -> Result<(), ResolveError> {
        let manifest = extract_macro_names(text);
        if manifest.uses_deprecated_heading {
            self.policy
                .check(self.today, origin)
                .map_err(|source| ResolveError::Manifest {
                    file: PathBuf::from(origin),
                    source,
                })?;
        }

        let names = manifest.names;
        if names.is_empty() {
            return Ok(());
        }

        // Locations are searched in precedence order so a missing folder
        // reports exactly the names nothing earlier provided.
        let mut matches: Vec<Vec<PathBuf>> = vec![Vec::new(); names.len()];
        for location in self.locations {
            if !self.fs.directory_exists(&location.path) {
                let unresolved: Vec<String> = names
                    .iter()
                    .zip(&matches)
                    .filter(|(_, found)| found.is_empty())
                    .map(|(name, _)| name.clone())
                    .collect();
                if unresolved.is_empty() {
                    tracing::debug!(
                        "skipping missing macro folder {} (nothing left to find)",
                        location.path.display()
                    );
                    continue;
                }
                return Err(MissingLocationError {
                    location: location.path.clone(),
                    unresolved,
                }
                .into());
            }

            for (name, found) in names.iter().zip(matches.iter_mut()) {
                let hits = self.fs.find_file_by_name(name, &location.path)?;
                if !hits.is_empty() {
                    tracing::debug!("{}: {} found in {}", origin, name, location.name);
                }
                found.extend(hits);
            }
        }

        // Descend in declaration order; dependencies land before dependants.
        for (name, found) in names.iter().zip(&matches) {
            if found.is_empty() {
                if !walk.unresolved.iter().any(|m| &m.name == name) {
                    walk.unresolved.push(Unresolved {
                        name: name.clone(),
                        origin: origin.to_string(),
                    });
                }
                continue;
            }
            for path in found {
                if walk.visited.insert(path.clone()) {
                    let content = self
                        .fs
                        .read_text_file(path)?
                        .ok_or_else(|| anyhow!("macro file disappeared: {}", path.display()))?;
                    self.collect(&content, &path.display().to_string(), walk)?;
                }
                walk.paths.push(path.clone());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::ManifestError;
    use crate::test_support::MockFileSystem;
    use std::path::Path;

    fn header(macros: &[&str]) -> String {
        let mut text = String::from("/**\n  @file\n  <h4> SAS Macros </h4>\n");
        for m in macros {
            text.push_str(&format!("  @li {}\n", m));
        }
        text.push_str("**/\n");
        text
    }

    fn locations() -> Vec<SearchLocation> {
        vec![
            SearchLocation::override_at("macros", "/proj/macros"),
            SearchLocation::library_at("core", "/proj/core"),
        ]
    }

    fn fs() -> MockFileSystem {
        let mut fs = MockFileSystem::new();
        fs.add_file("/proj/core/base/a.sas", "%macro a;%mend;");
        fs.add_file("/proj/core/base/b.sas", "%macro b_lib;%mend;");
        fs.add_file("/proj/macros/b.sas", "%macro b_override;%mend;");
        fs
    }

    #[test]
    fn test_override_and_library_mix() {
        let fs = fs();
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let resolution = resolver
            .resolve(&header(&["a.sas", "b.sas"]), "svc.sas")
            .unwrap();

        assert_eq!(
            resolution.paths,
            vec![
                PathBuf::from("/proj/core/base/a.sas"),
                PathBuf::from("/proj/macros/b.sas"),
            ]
        );
        assert!(resolution.unresolved.is_empty());
    }

    #[test]
    fn test_transitive_dependencies_come_first() {
        let mut fs = fs();
        fs.add_file("/proj/macros/top.sas", header(&["mid.sas"]));
        fs.add_file("/proj/core/mid.sas", header(&["a.sas"]));
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let resolution = resolver.resolve(&header(&["top.sas"]), "svc.sas").unwrap();

        assert_eq!(
            resolution.paths,
            vec![
                PathBuf::from("/proj/core/base/a.sas"),
                PathBuf::from("/proj/core/mid.sas"),
                PathBuf::from("/proj/macros/top.sas"),
            ]
        );
    }

    #[test]
    fn test_cycles_terminate() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/proj/macros/x.sas", header(&["y.sas"]));
        fs.add_file("/proj/macros/y.sas", header(&["x.sas"]));
        fs.add_dir("/proj/core");
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let resolution = resolver.resolve(&header(&["x.sas"]), "svc.sas").unwrap();

        // x is reached again from y before y itself is recorded
        assert_eq!(
            resolution.paths,
            vec![
                PathBuf::from("/proj/macros/x.sas"),
                PathBuf::from("/proj/macros/y.sas"),
            ]
        );
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/proj/macros/x.sas", header(&["x.sas"]));
        fs.add_dir("/proj/core");
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let resolution = resolver.resolve(&header(&["x.sas"]), "svc.sas").unwrap();
        assert_eq!(resolution.paths, vec![PathBuf::from("/proj/macros/x.sas")]);
    }

    #[test]
    fn test_missing_location_is_fatal() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/proj/core/a.sas", "");
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let err = resolver
            .resolve(&header(&["a.sas", "zz.sas"]), "svc.sas")
            .unwrap_err();

        match err {
            ResolveError::MissingLocation(e) => {
                assert_eq!(e.location, Path::new("/proj/macros"));
                assert_eq!(e.unresolved, vec!["a.sas", "zz.sas"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_location_after_everything_found_is_skipped() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/proj/macros/a.sas", "");
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let resolution = resolver.resolve(&header(&["a.sas"]), "svc.sas").unwrap();
        assert_eq!(resolution.paths, vec![PathBuf::from("/proj/macros/a.sas")]);
    }

    #[test]
    fn test_unfound_names_are_reported() {
        let fs = fs();
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let resolution = resolver
            .resolve(&header(&["a.sas", "ghost.sas"]), "svc.sas")
            .unwrap();
        assert_eq!(
            resolution.unresolved,
            vec![Unresolved {
                name: "ghost.sas".to_string(),
                origin: "svc.sas".to_string(),
            }]
        );
        assert_eq!(resolution.paths.len(), 1);
    }

    #[test]
    fn test_unfound_names_keep_their_declaring_source() {
        let fs = fs();
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let body = header(&["a.sas", "ghost.sas"]);
        let term = header(&["a.sas"]);
        let resolution = resolver
            .resolve_all(&[(body.as_str(), "svc.sas"), (term.as_str(), "term program")])
            .unwrap();

        assert_eq!(resolution.unresolved.len(), 1);
        assert_eq!(resolution.unresolved[0].name, "ghost.sas");
        assert_eq!(resolution.unresolved[0].origin, "svc.sas");
    }

    #[test]
    fn test_no_manifest_skips_location_checks() {
        let fs = MockFileSystem::new();
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let resolution = resolver.resolve("%put hi;", "svc.sas").unwrap();
        assert_eq!(resolution, Resolution::default());
    }

    #[test]
    fn test_deprecated_heading_after_cutover() {
        let fs = fs();
        let locations = locations();
        let cutover = NaiveDate::from_ymd_opt(2022, 5, 2).unwrap();
        let resolver = Resolver::new(&fs, &locations, &[]).with_policy(
            DeprecationPolicy::new(cutover),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        );

        let text = "/**\n <h4> Dependencies </h4>\n @li a.sas\n**/";
        let err = resolver.resolve(text, "svc.sas").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Manifest {
                source: ManifestError::DeprecatedHeading { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_deprecated_heading_before_cutover_still_resolves() {
        let fs = fs();
        let locations = locations();
        let cutover = NaiveDate::from_ymd_opt(2022, 5, 2).unwrap();
        let resolver = Resolver::new(&fs, &locations, &[]).with_policy(
            DeprecationPolicy::new(cutover),
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        );

        let text = "/**\n <h4> Dependencies </h4>\n @li a.sas\n**/";
        let resolution = resolver.resolve(text, "svc.sas").unwrap();
        assert_eq!(resolution.paths, vec![PathBuf::from("/proj/core/base/a.sas")]);
    }

    #[test]
    fn test_resolve_all_reads_every_header() {
        let fs = fs();
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);

        let init = header(&["b.sas"]);
        let body = header(&["a.sas"]);
        let resolution = resolver
            .resolve_all(&[(init.as_str(), "init.sas"), (body.as_str(), "svc.sas")])
            .unwrap();

        assert_eq!(
            resolution.paths,
            vec![
                PathBuf::from("/proj/macros/b.sas"),
                PathBuf::from("/proj/core/base/a.sas"),
            ]
        );
    }

    #[test]
    fn test_resolution_is_stable() {
        let fs = fs();
        let locations = locations();
        let resolver = Resolver::new(&fs, &locations, &[]);
        let text = header(&["b.sas", "a.sas"]);

        let first = resolver.resolve(&text, "svc.sas").unwrap();
        let second = resolver.resolve(&text, "svc.sas").unwrap();
        assert_eq!(first, second);
    }
}
