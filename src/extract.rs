//! Per-file copyright/license tag extraction.
//!
//! Scans a bounded leading window of a file (or its `.license` sidecar,
//! which takes precedence) for `SPDX-FileCopyrightText:` and
//! `SPDX-License-Identifier:` lines. A legacy `Copyright ...` / `© ...`
//! phrasing is recognized on read only; the writer never produces it.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::expression::{self, LicenseExpression, ParseError};
use crate::models::FileMetadata;

/// Tag prefix for copyright statements.
pub const COPYRIGHT_TAG: &str = "SPDX-FileCopyrightText:";
/// Tag prefix for license expressions.
pub const LICENSE_TAG: &str = "SPDX-License-Identifier:";
/// Suffix of sidecar metadata files.
pub const SIDECAR_SUFFIX: &str = ".license";
/// Bytes inspected at the head of each file.
pub const HEADER_WINDOW_BYTES: usize = 4096;

static LEGACY_COPYRIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Copyright\s+(?:\([cC]\)\s+)?|©\s+)\S.*").unwrap());

/// Sidecar path for a file: `src/logo.png` -> `src/logo.png.license`.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(SIDECAR_SUFFIX);
    path.with_file_name(name)
}

/// Tags pulled out of one block of text.
#[derive(Debug, Default)]
pub struct ExtractedTags {
    pub copyrights: BTreeSet<String>,
    pub expressions: BTreeSet<LicenseExpression>,
    pub parse_errors: Vec<ParseError>,
}

impl ExtractedTags {
    /// Whether any copyright or license tag was found.
    pub fn has_any(&self) -> bool {
        !self.copyrights.is_empty() || !self.expressions.is_empty()
    }
}

fn strip_closers(s: &str) -> &str {
    s.trim()
        .trim_end_matches("*/")
        .trim_end_matches("-->")
        .trim_end_matches("*)")
        .trim()
}

/// Extract all tags from `text`. Expression parse failures are collected
/// but do not stop extraction of the remaining tags.
pub fn extract_tags(text: &str) -> ExtractedTags {
    let mut tags = ExtractedTags::default();
    for line in text.lines() {
        if let Some(at) = line.find(LICENSE_TAG) {
            let value = strip_closers(&line[at + LICENSE_TAG.len()..]);
            match expression::parse(value) {
                Ok(expr) => {
                    tags.expressions.insert(expr);
                }
                Err(err) => tags.parse_errors.push(err),
            }
        } else if let Some(at) = line.find(COPYRIGHT_TAG) {
            let value = strip_closers(&line[at + COPYRIGHT_TAG.len()..]);
            if !value.is_empty() {
                tags.copyrights.insert(value.to_string());
            }
        } else if let Some(m) = LEGACY_COPYRIGHT.find(line) {
            let value = strip_closers(m.as_str());
            if !value.is_empty() {
                tags.copyrights.insert(value.to_string());
            }
        }
    }
    tags
}

fn read_window(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::with_capacity(HEADER_WINDOW_BYTES);
    reader
        .by_ref()
        .take(HEADER_WINDOW_BYTES as u64)
        .read_to_end(&mut buf)?;
    // A tag line straddling the window boundary must not be cut mid-value.
    if buf.len() == HEADER_WINDOW_BYTES && !buf.ends_with(b"\n") {
        reader.read_until(b'\n', &mut buf)?;
    }
    // Binary content degrades to lossy text; tag lines in it are still found.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Extract metadata for one file under `root`.
///
/// The `.license` sidecar, when present, takes precedence over any
/// in-file header. I/O and parse failures are recorded on the returned
/// metadata rather than propagated.
pub fn extract_file(root: &Path, rel: &Path) -> FileMetadata {
    let mut meta = FileMetadata::new(rel.to_path_buf());
    let abs = root.join(rel);
    let sidecar = sidecar_path(&abs);
    let source = if sidecar.is_file() { sidecar } else { abs };
    match read_window(&source) {
        Ok(text) => {
            let tags = extract_tags(&text);
            meta.copyright_lines = tags.copyrights;
            meta.expressions = tags.expressions;
            if !tags.parse_errors.is_empty() {
                let msgs: Vec<String> =
                    tags.parse_errors.iter().map(|e| e.to_string()).collect();
                meta.read_error = Some(msgs.join("; "));
            }
        }
        Err(err) => meta.read_error = Some(err.to_string()),
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_extract_spdx_tags() {
        let text = "// SPDX-FileCopyrightText: 2024 Jane Doe <jane@example.com>\n\
                    // SPDX-License-Identifier: MIT OR Apache-2.0\n\
                    fn main() {}\n";
        let tags = extract_tags(text);
        assert!(tags
            .copyrights
            .contains("2024 Jane Doe <jane@example.com>"));
        assert_eq!(tags.expressions.len(), 1);
        assert!(tags.parse_errors.is_empty());
    }

    #[test]
    fn test_extract_strips_multiline_closers() {
        let text = "/* SPDX-License-Identifier: MIT */\n<!-- SPDX-FileCopyrightText: 2024 Acme -->\n";
        let tags = extract_tags(text);
        assert_eq!(tags.expressions.len(), 1);
        assert!(tags.copyrights.contains("2024 Acme"));
    }

    #[test]
    fn test_legacy_copyright_recognized_on_read() {
        let text = "# Copyright (c) 2019 Example Org\n# © 2020 Another Org\n";
        let tags = extract_tags(text);
        assert!(tags.copyrights.contains("Copyright (c) 2019 Example Org"));
        assert!(tags.copyrights.contains("© 2020 Another Org"));
    }

    #[test]
    fn test_parse_failure_does_not_stop_extraction() {
        let text = "// SPDX-License-Identifier: MIT AND\n\
                    // SPDX-License-Identifier: ISC\n\
                    // SPDX-FileCopyrightText: 2024 Jane\n";
        let tags = extract_tags(text);
        assert_eq!(tags.parse_errors.len(), 1);
        assert_eq!(tags.expressions.len(), 1);
        assert_eq!(tags.copyrights.len(), 1);
    }

    #[test]
    fn test_sidecar_takes_precedence() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("blob.bin"),
            b"// SPDX-License-Identifier: MIT\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("blob.bin.license"),
            "SPDX-FileCopyrightText: 2024 Acme\nSPDX-License-Identifier: ISC\n",
        )
        .unwrap();
        let meta = extract_file(dir.path(), Path::new("blob.bin"));
        assert!(meta.copyright_lines.contains("2024 Acme"));
        let exprs: Vec<String> = meta.expressions.iter().map(|e| e.to_string()).collect();
        assert_eq!(exprs, vec!["ISC".to_string()]);
    }

    #[test]
    fn test_unreadable_file_records_read_error() {
        let dir = tempdir().unwrap();
        let meta = extract_file(dir.path(), Path::new("missing.rs"));
        assert!(meta.read_error.is_some());
        assert!(!meta.has_copyright());
        assert!(!meta.has_license());
    }

    #[test]
    fn test_window_is_bounded() {
        let dir = tempdir().unwrap();
        let mut body = " ".repeat(HEADER_WINDOW_BYTES);
        body.push_str("\n// SPDX-License-Identifier: MIT\n");
        fs::write(dir.path().join("late.rs"), &body).unwrap();
        let meta = extract_file(dir.path(), Path::new("late.rs"));
        assert!(!meta.has_license());
    }

    #[test]
    fn test_tag_line_straddling_window_boundary() {
        let dir = tempdir().unwrap();
        let mut body = format!("// {}\n", "x".repeat(HEADER_WINDOW_BYTES - 30));
        body.push_str("// SPDX-License-Identifier: MIT OR Apache-2.0\n");
        assert!(body.len() > HEADER_WINDOW_BYTES);
        fs::write(dir.path().join("wide.rs"), &body).unwrap();
        let meta = extract_file(dir.path(), Path::new("wide.rs"));
        assert!(meta.read_error.is_none(), "{:?}", meta.read_error);
        let exprs: Vec<String> = meta.expressions.iter().map(|e| e.to_string()).collect();
        assert_eq!(exprs, vec!["MIT OR Apache-2.0".to_string()]);
    }

    #[test]
    fn test_sidecar_path_suffix() {
        assert_eq!(
            sidecar_path(Path::new("a/b/logo.png")),
            PathBuf::from("a/b/logo.png.license")
        );
    }
}
