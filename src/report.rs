//! Compliance report: a pure derived view over a completed project index.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

use crate::licenses::{self, Classification};
use crate::models::ProjectIndex;

/// Aggregate counts and the verdict.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub files_total: usize,
    pub files_with_copyright: usize,
    pub files_with_license: usize,
    pub compliant: bool,
}

/// Categorized compliance findings. Built once from a completed
/// [`ProjectIndex`]; never mutated afterwards.
#[derive(Debug, Serialize)]
pub struct ComplianceReport {
    /// Unrecognized identifiers, with the files using them.
    pub bad_licenses: BTreeMap<String, BTreeSet<PathBuf>>,
    /// Declared licenses deprecated by SPDX.
    pub deprecated_licenses: BTreeSet<String>,
    /// Declared license texts with no file extension.
    pub licenses_without_extension: BTreeSet<String>,
    /// Used licenses with no text in the licenses directory.
    pub missing_licenses: BTreeMap<String, BTreeSet<PathBuf>>,
    /// Declared licenses not used by any file.
    pub unused_licenses: BTreeSet<String>,
    pub read_errors: BTreeMap<PathBuf, String>,
    pub files_without_copyright: BTreeSet<PathBuf>,
    pub files_without_license: BTreeSet<PathBuf>,
    pub used_licenses: BTreeSet<String>,
    pub summary: Summary,
}

impl ComplianceReport {
    /// Cross-reference declared against used licenses and categorize
    /// every finding.
    pub fn from_index(index: &ProjectIndex) -> Self {
        // base license id -> files using it
        let mut usage: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();
        let mut bad_licenses: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();
        let mut read_errors = BTreeMap::new();
        let mut files_without_copyright = BTreeSet::new();
        let mut files_without_license = BTreeSet::new();
        let mut files_with_copyright = 0;
        let mut files_with_license = 0;

        for meta in index.files.values() {
            if let Some(err) = &meta.read_error {
                read_errors.insert(meta.path.clone(), err.clone());
            }
            if meta.has_copyright() {
                files_with_copyright += 1;
            } else {
                files_without_copyright.insert(meta.path.clone());
            }
            if meta.has_license() {
                files_with_license += 1;
            } else {
                files_without_license.insert(meta.path.clone());
            }
            for expr in &meta.expressions {
                for id in expr.base_ids() {
                    usage.entry(id).or_default().insert(meta.path.clone());
                }
                for exc in expr.exceptions() {
                    if !licenses::is_known_exception(&exc) {
                        bad_licenses
                            .entry(exc)
                            .or_default()
                            .insert(meta.path.clone());
                    }
                }
            }
        }

        for (id, files) in &usage {
            if licenses::classify(id) == Classification::Bad {
                bad_licenses
                    .entry(id.clone())
                    .or_default()
                    .extend(files.iter().cloned());
            }
        }

        let used_licenses: BTreeSet<String> = usage.keys().cloned().collect();
        let missing_licenses: BTreeMap<String, BTreeSet<PathBuf>> = usage
            .iter()
            .filter(|(id, _)| {
                !index.declared.contains_key(*id) && !bad_licenses.contains_key(*id)
            })
            .map(|(id, files)| (id.clone(), files.clone()))
            .collect();
        let unused_licenses: BTreeSet<String> = index
            .declared
            .keys()
            .filter(|id| !used_licenses.contains(*id))
            .cloned()
            .collect();
        let deprecated_licenses: BTreeSet<String> = index
            .declared
            .keys()
            .filter(|id| licenses::classify(id) == Classification::Deprecated)
            .cloned()
            .collect();
        let licenses_without_extension: BTreeSet<String> = index
            .declared
            .iter()
            .filter(|(_, ext)| ext.is_none())
            .map(|(id, _)| id.clone())
            .collect();

        let compliant = bad_licenses.is_empty()
            && missing_licenses.is_empty()
            && files_without_copyright.is_empty()
            && files_without_license.is_empty();

        let summary = Summary {
            files_total: index.files.len(),
            files_with_copyright,
            files_with_license,
            compliant,
        };
        Self {
            bad_licenses,
            deprecated_licenses,
            licenses_without_extension,
            missing_licenses,
            unused_licenses,
            read_errors,
            files_without_copyright,
            files_without_license,
            used_licenses,
            summary,
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.summary.compliant
    }
}
