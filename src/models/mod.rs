//! Shared data model: per-file metadata and the aggregated project index.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

use crate::expression::LicenseExpression;

/// Copyright and licensing metadata extracted for one file.
///
/// Created once per scan and treated as immutable afterwards, except for
/// the explicit [`FileMetadata::merge_external`] overlay step.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    /// Path relative to the project root.
    pub path: PathBuf,
    pub copyright_lines: BTreeSet<String>,
    pub expressions: BTreeSet<LicenseExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
}

impl FileMetadata {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            copyright_lines: BTreeSet::new(),
            expressions: BTreeSet::new(),
            read_error: None,
        }
    }

    pub fn has_copyright(&self) -> bool {
        !self.copyright_lines.is_empty()
    }

    pub fn has_license(&self) -> bool {
        !self.expressions.is_empty()
    }

    /// Overlay externally declared metadata. Each field is filled only
    /// when the file supplied nothing of its own; an in-file header or
    /// sidecar always wins.
    pub fn merge_external(
        &mut self,
        copyrights: &BTreeSet<String>,
        expression: Option<&LicenseExpression>,
    ) {
        if self.copyright_lines.is_empty() {
            self.copyright_lines.extend(copyrights.iter().cloned());
        }
        if self.expressions.is_empty() {
            if let Some(expr) = expression {
                self.expressions.insert(expr.clone());
            }
        }
    }
}

/// The aggregated result of scanning a project tree.
///
/// Owns all per-file metadata; reports derive from it without keeping
/// back-references.
#[derive(Debug, Serialize)]
pub struct ProjectIndex {
    pub root: PathBuf,
    pub files: BTreeMap<PathBuf, FileMetadata>,
    /// Licenses declared in the licenses directory: identifier mapped to
    /// the text file's extension (`None` when the file has no extension).
    pub declared: BTreeMap<String, Option<String>>,
}

impl ProjectIndex {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            files: BTreeMap::new(),
            declared: BTreeMap::new(),
        }
    }

    /// Union of base license identifiers used across all files.
    pub fn used_licenses(&self) -> BTreeSet<String> {
        let mut used = BTreeSet::new();
        for meta in self.files.values() {
            for expr in &meta.expressions {
                used.extend(expr.base_ids());
            }
        }
        used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse;

    #[test]
    fn test_merge_external_never_overrides_own_header() {
        let mut meta = FileMetadata::new(PathBuf::from("a.rs"));
        meta.copyright_lines.insert("2024 Jane Doe".into());
        meta.expressions.insert(parse("MIT").unwrap());

        let external: BTreeSet<String> = ["2020 Acme Corp".to_string()].into();
        let apache = parse("Apache-2.0").unwrap();
        meta.merge_external(&external, Some(&apache));

        assert_eq!(meta.copyright_lines.len(), 1);
        assert!(meta.copyright_lines.contains("2024 Jane Doe"));
        assert_eq!(meta.expressions.len(), 1);
        assert!(meta.expressions.contains(&parse("MIT").unwrap()));
    }

    #[test]
    fn test_merge_external_fills_missing_fields() {
        let mut meta = FileMetadata::new(PathBuf::from("logo.png"));
        let external: BTreeSet<String> = ["2020 Acme Corp".to_string()].into();
        let mit = parse("MIT").unwrap();
        meta.merge_external(&external, Some(&mit));
        assert!(meta.has_copyright());
        assert!(meta.has_license());
    }

    #[test]
    fn test_used_licenses_unions_base_ids() {
        let mut index = ProjectIndex::new(PathBuf::from("."));
        let mut a = FileMetadata::new(PathBuf::from("a.rs"));
        a.expressions.insert(parse("MIT OR Apache-2.0+").unwrap());
        let mut b = FileMetadata::new(PathBuf::from("b.rs"));
        b.expressions.insert(parse("MIT").unwrap());
        index.files.insert(a.path.clone(), a);
        index.files.insert(b.path.clone(), b);

        let used = index.used_licenses();
        assert_eq!(
            used.into_iter().collect::<Vec<_>>(),
            vec!["Apache-2.0".to_string(), "MIT".to_string()]
        );
    }
}
