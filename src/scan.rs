//! Project scanning and aggregation.
//!
//! Enumerates the tree with VCS ignore rules honored, fans per-file
//! extraction out over a rayon worker pool, and merges the results into
//! a [`ProjectIndex`] in a single controlling step. The licenses
//! directory populates the declared-license map instead of being
//! scanned as subject files.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::coverage::{self, CoverageDeclaration};
use crate::error::Result;
use crate::extract::{self, SIDECAR_SUFFIX};
use crate::models::{FileMetadata, ProjectIndex};

/// Directory holding one license text per declared license.
pub const LICENSES_DIR: &str = "LICENSES";

/// Scanner behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Descend into git submodule trees.
    pub include_submodules: bool,
    /// Descend into `subprojects/` vendored trees.
    pub include_subprojects: bool,
}

/// Configuration files that describe the scan itself; never subject files.
fn is_own_config(rel: &Path) -> bool {
    matches!(
        rel.to_str(),
        Some("lintel.toml") | Some("lintel.yaml") | Some("lintel.yml")
    )
}

fn read_declared(root: &Path, index: &mut ProjectIndex) -> Result<()> {
    let dir = root.join(LICENSES_DIR);
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_string());
        index.declared.insert(stem.to_string(), extension);
    }
    Ok(())
}

fn enumerate(root: &Path, opts: &ScanOptions) -> Vec<PathBuf> {
    let include_submodules = opts.include_submodules;
    let include_subprojects = opts.include_subprojects;
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .filter_entry(move |entry| {
            let name = entry.file_name().to_string_lossy();
            if name == ".git" || name == ".lintel" {
                return false;
            }
            if entry.depth() == 1 && name == LICENSES_DIR {
                return false;
            }
            if entry.depth() == 1 && name == "subprojects" && !include_subprojects {
                return false;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir && entry.depth() > 0 && !include_submodules {
                // A .git *file* marks a submodule root.
                if entry.path().join(".git").is_file() {
                    return false;
                }
            }
            true
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(SIDECAR_SUFFIX) {
            continue;
        }
        let rel = pathdiff::diff_paths(entry.path(), root)
            .unwrap_or_else(|| entry.path().to_path_buf());
        if is_own_config(&rel) {
            continue;
        }
        files.push(rel);
    }
    files.sort();
    files
}

fn merge_coverage(index: &mut ProjectIndex, decl: &CoverageDeclaration) {
    for meta in index.files.values_mut() {
        let matches = decl.matching(&meta.path);
        let Some(first) = matches.first() else {
            continue;
        };
        let conflicting = matches.iter().any(|a| !first.agrees_with(a));
        if conflicting {
            // Never silently pick one interpretation; surface the overlap.
            let note = "conflicting coverage declarations match this file".to_string();
            meta.read_error = Some(match meta.read_error.take() {
                Some(prev) => format!("{prev}; {note}"),
                None => note,
            });
            continue;
        }
        let copyrights: BTreeSet<String> = matches
            .iter()
            .flat_map(|a| a.copyrights.iter().cloned())
            .collect();
        meta.merge_external(&copyrights, first.expression.as_ref());
    }
}

/// Scan `root` into a complete, immutable [`ProjectIndex`].
///
/// Per-file extraction runs on the rayon pool with read-only shared
/// inputs; results are merged here, after the join, by this single
/// caller. Per-file I/O failures land in that file's `read_error` and
/// never abort the scan. A malformed coverage declaration does.
pub fn scan(root: &Path, opts: &ScanOptions) -> Result<ProjectIndex> {
    let mut index = ProjectIndex::new(root.to_path_buf());
    read_declared(root, &mut index)?;

    let files = enumerate(root, opts);
    debug!(files = files.len(), "enumerated subject files");

    let extracted: Vec<FileMetadata> = files
        .par_iter()
        .map(|rel| extract::extract_file(root, rel))
        .collect();
    for meta in extracted {
        index.files.insert(meta.path.clone(), meta);
    }

    let coverage_path = root.join(coverage::COVERAGE_FILE);
    if coverage_path.is_file() {
        let decl = coverage::load(&coverage_path)?;
        merge_coverage(&mut index, &decl);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_collects_files_and_declared_licenses() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "src/main.rs",
            "// SPDX-FileCopyrightText: 2024 Jane\n// SPDX-License-Identifier: MIT\n",
        );
        write(root, "LICENSES/MIT.txt", "MIT License text");
        write(root, "LICENSES/COPYING", "extension-less");

        let index = scan(root, &ScanOptions::default()).unwrap();
        assert!(index.files.contains_key(Path::new("src/main.rs")));
        // License texts are not subject files.
        assert!(!index
            .files
            .keys()
            .any(|p| p.starts_with(LICENSES_DIR)));
        assert_eq!(index.declared.get("MIT"), Some(&Some("txt".to_string())));
        assert_eq!(index.declared.get("COPYING"), Some(&None));
        assert_eq!(
            index.used_licenses().into_iter().collect::<Vec<_>>(),
            vec!["MIT".to_string()]
        );
    }

    #[test]
    fn test_scan_skips_sidecars_as_subject_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "logo.png", "not really a png");
        write(
            root,
            "logo.png.license",
            "SPDX-FileCopyrightText: 2024 Jane\nSPDX-License-Identifier: CC0-1.0\n",
        );
        let index = scan(root, &ScanOptions::default()).unwrap();
        assert!(index.files.contains_key(Path::new("logo.png")));
        assert!(!index.files.contains_key(Path::new("logo.png.license")));
        let meta = &index.files[Path::new("logo.png")];
        assert!(meta.has_copyright() && meta.has_license());
    }

    #[test]
    fn test_scan_honors_gitignore() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        write(root, ".gitignore", "target/\n");
        write(root, "target/out.o", "object code");
        write(root, "src/lib.rs", "pub fn f() {}\n");

        let index = scan(root, &ScanOptions::default()).unwrap();
        assert!(index.files.contains_key(Path::new("src/lib.rs")));
        assert!(!index.files.contains_key(Path::new("target/out.o")));
        // The ignore file itself is a subject file.
        assert!(index.files.contains_key(Path::new(".gitignore")));
    }

    #[test]
    fn test_submodules_skipped_unless_opted_in() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "a.rs", "fn a() {}\n");
        write(root, "vendor/lib/.git", "gitdir: ../../.git/modules/lib\n");
        write(root, "vendor/lib/b.rs", "fn b() {}\n");

        let index = scan(root, &ScanOptions::default()).unwrap();
        assert!(!index.files.contains_key(Path::new("vendor/lib/b.rs")));

        let opts = ScanOptions {
            include_submodules: true,
            ..Default::default()
        };
        let index = scan(root, &opts).unwrap();
        assert!(index.files.contains_key(Path::new("vendor/lib/b.rs")));
    }

    #[test]
    fn test_subprojects_skipped_unless_opted_in() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "subprojects/dep/c.rs", "fn c() {}\n");
        let index = scan(root, &ScanOptions::default()).unwrap();
        assert!(index.files.is_empty());

        let opts = ScanOptions {
            include_subprojects: true,
            ..Default::default()
        };
        let index = scan(root, &opts).unwrap();
        assert!(index.files.contains_key(Path::new("subprojects/dep/c.rs")));
    }

    #[test]
    fn test_coverage_fills_only_untagged_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "tagged.rs",
            "// SPDX-FileCopyrightText: 2024 Jane\n// SPDX-License-Identifier: MIT\n",
        );
        write(root, "untagged.bin", "data");
        write(
            root,
            ".lintel/coverage.toml",
            r#"
[[annotations]]
path = "*"
copyright = ["2020 Acme Corp"]
license = "CC0-1.0"
"#,
        );
        let index = scan(root, &ScanOptions::default()).unwrap();
        let tagged = &index.files[Path::new("tagged.rs")];
        assert!(tagged.copyright_lines.contains("2024 Jane"));
        assert!(!tagged.copyright_lines.contains("2020 Acme Corp"));
        let untagged = &index.files[Path::new("untagged.bin")];
        assert!(untagged.copyright_lines.contains("2020 Acme Corp"));
        assert_eq!(
            untagged
                .expressions
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>(),
            vec!["CC0-1.0".to_string()]
        );
    }

    #[test]
    fn test_overlapping_conflicting_declarations_detected() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "assets/logo.png", "data");
        write(
            root,
            ".lintel/coverage.toml",
            r#"
[[annotations]]
path = "assets/**"
license = "MIT"

[[annotations]]
path = "assets/*.png"
license = "CC0-1.0"
"#,
        );
        let index = scan(root, &ScanOptions::default()).unwrap();
        let meta = &index.files[Path::new("assets/logo.png")];
        assert!(!meta.has_license());
        assert!(meta
            .read_error
            .as_deref()
            .unwrap()
            .contains("conflicting coverage declarations"));
    }

    #[test]
    fn test_malformed_coverage_aborts_scan() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "a.rs", "fn a() {}\n");
        write(root, ".lintel/coverage.toml", "this is not toml = =\n");
        assert!(scan(root, &ScanOptions::default()).is_err());
    }
}
