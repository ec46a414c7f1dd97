//! External coverage declarations.
//!
//! A coverage declaration assigns copyright/license metadata to files by
//! path pattern, for files that cannot embed a header. The file lives at
//! `.lintel/coverage.toml`:
//!
//! ```toml
//! version = 1
//!
//! [[annotations]]
//! path = ["assets/**", "*.bin"]
//! copyright = ["2024 Acme Corp"]
//! license = "CC0-1.0"
//! ```
//!
//! A malformed declaration is fatal: silently ignoring it could invert
//! the header-wins precedence. Overlap conflicts between annotations are
//! detected per file during the merge, not here.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use glob::Pattern;
use serde::Deserialize;

use crate::error::{LintelError, Result};
use crate::expression::{self, LicenseExpression};

/// Location of the declaration, relative to the project root.
pub const COVERAGE_FILE: &str = ".lintel/coverage.toml";

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Deserialize)]
struct RawDeclaration {
    #[serde(default)]
    annotations: Vec<RawAnnotation>,
}

#[derive(Deserialize)]
struct RawAnnotation {
    path: OneOrMany,
    #[serde(default)]
    copyright: Option<OneOrMany>,
    #[serde(default)]
    license: Option<String>,
}

/// One declaration entry with compiled patterns and a parsed expression.
#[derive(Debug)]
pub struct Annotation {
    pub patterns: Vec<Pattern>,
    pub copyrights: BTreeSet<String>,
    pub expression: Option<LicenseExpression>,
}

impl Annotation {
    pub fn matches(&self, rel: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches_path(rel))
    }

    /// Whether two annotations would assign the same metadata.
    pub fn agrees_with(&self, other: &Annotation) -> bool {
        self.copyrights == other.copyrights && self.expression == other.expression
    }
}

/// The parsed coverage declaration.
#[derive(Debug, Default)]
pub struct CoverageDeclaration {
    pub annotations: Vec<Annotation>,
}

impl CoverageDeclaration {
    /// All annotations whose patterns match `rel`.
    pub fn matching(&self, rel: &Path) -> Vec<&Annotation> {
        self.annotations.iter().filter(|a| a.matches(rel)).collect()
    }
}

/// Load and validate a coverage declaration. Any malformed part (TOML
/// syntax, glob pattern, SPDX expression) is a fatal `ConfigError`.
pub fn load(path: &Path) -> Result<CoverageDeclaration> {
    let text = fs::read_to_string(path).map_err(|e| {
        LintelError::config(format!("cannot read {}: {e}", path.display()))
    })?;
    let raw: RawDeclaration = toml::from_str(&text).map_err(|e| {
        LintelError::config(format!("invalid coverage declaration {}: {e}", path.display()))
    })?;

    let mut annotations = Vec::with_capacity(raw.annotations.len());
    for entry in raw.annotations {
        let mut patterns = Vec::new();
        for pat in entry.path.into_vec() {
            let compiled = Pattern::new(&pat).map_err(|e| {
                LintelError::config(format!("bad path pattern '{pat}': {e}"))
            })?;
            patterns.push(compiled);
        }
        let expression = match entry.license {
            Some(raw_expr) => Some(expression::parse(&raw_expr).map_err(|e| {
                LintelError::config(format!("bad license expression '{raw_expr}': {e}"))
            })?),
            None => None,
        };
        let copyrights = entry
            .copyright
            .map(|c| c.into_vec().into_iter().collect())
            .unwrap_or_default();
        annotations.push(Annotation {
            patterns,
            copyrights,
            expression,
        });
    }
    Ok(CoverageDeclaration { annotations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_and_load(body: &str) -> Result<CoverageDeclaration> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coverage.toml");
        fs::write(&path, body).unwrap();
        load(&path)
    }

    #[test]
    fn test_load_and_match() {
        let decl = write_and_load(
            r#"
version = 1

[[annotations]]
path = ["assets/**", "*.bin"]
copyright = ["2024 Acme Corp"]
license = "CC0-1.0"

[[annotations]]
path = "docs/*.md"
license = "CC-BY-4.0"
"#,
        )
        .unwrap();
        assert_eq!(decl.annotations.len(), 2);
        assert_eq!(decl.matching(Path::new("assets/img/logo.svg")).len(), 1);
        assert_eq!(decl.matching(Path::new("dump.bin")).len(), 1);
        assert_eq!(decl.matching(Path::new("docs/intro.md")).len(), 1);
        assert!(decl.matching(Path::new("src/main.rs")).is_empty());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = write_and_load("annotations = not toml").unwrap_err();
        assert!(matches!(err, LintelError::Config(_)));
    }

    #[test]
    fn test_bad_expression_is_config_error() {
        let err = write_and_load(
            r#"
[[annotations]]
path = "*"
license = "MIT AND"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, LintelError::Config(_)));
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let err = write_and_load(
            r#"
[[annotations]]
path = "src/[bad"
license = "MIT"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, LintelError::Config(_)));
    }

    #[test]
    fn test_agreement_check() {
        let decl = write_and_load(
            r#"
[[annotations]]
path = "a/**"
license = "MIT"

[[annotations]]
path = "a/b/**"
license = "MIT"

[[annotations]]
path = "a/b/c/**"
license = "ISC"
"#,
        )
        .unwrap();
        let a = &decl.annotations[0];
        let b = &decl.annotations[1];
        let c = &decl.annotations[2];
        assert!(a.agrees_with(b));
        assert!(!a.agrees_with(c));
    }
}
