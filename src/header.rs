//! Header synthesis: building and merging commented metadata blocks.
//!
//! The pure entry point is [`synthesize`], which rewrites file content in
//! memory; [`annotate_path`] wraps it with the filesystem concerns
//! (binary detection, sidecar fallback, style resolution, the actual
//! write). Running the same annotation twice with `skip_existing` set
//! leaves the file untouched on the second pass.

use std::collections::BTreeSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::comment::{CommentStyle, StyleError};
use crate::error::{LintelError, Result};
use crate::expression::LicenseExpression;
use crate::extract::{self, COPYRIGHT_TAG, LICENSE_TAG};

/// Default template: just the two mandatory slots.
pub const DEFAULT_TEMPLATE: &str = "{{ copyright }}\n{{ license }}";

const COPYRIGHT_SLOT: &str = "{{ copyright }}";
const LICENSE_SLOT: &str = "{{ license }}";

/// How the new block relates to an existing header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Discard the old header, optionally merging its metadata lines.
    Replace,
    /// Leave the old header untouched and insert after it.
    Append,
}

/// Requested comment form when the resolved style supports several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentForm {
    SingleLine,
    MultiLine,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template text contains no metadata placeholder slots")]
    NoPlaceholders,
    #[error("rendered header is missing both copyright and license content")]
    MissingContent,
}

/// Metadata to write.
pub struct HeaderInput<'a> {
    pub copyrights: &'a BTreeSet<String>,
    pub expression: Option<&'a LicenseExpression>,
    /// Already-resolved template text; `None` uses [`DEFAULT_TEMPLATE`].
    pub template: Option<&'a str>,
}

/// Behavior switches for one annotation run.
pub struct HeaderOptions {
    pub mode: WriteMode,
    pub merge_copyrights: bool,
    pub skip_existing: bool,
    pub sidecar: bool,
    pub forced_style: Option<&'static CommentStyle>,
    pub forced_form: Option<CommentForm>,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            mode: WriteMode::Replace,
            merge_copyrights: true,
            skip_existing: false,
            sidecar: false,
            forced_style: None,
            forced_form: None,
        }
    }
}

/// Render the template with both slots substituted.
///
/// The copyright slot expands to one `SPDX-FileCopyrightText:` line per
/// statement, the license slot to one `SPDX-License-Identifier:` line per
/// expression. A slot with no content disappears together with its line.
pub fn render_template(
    template: &str,
    copyrights: &BTreeSet<String>,
    expressions: &BTreeSet<LicenseExpression>,
) -> std::result::Result<String, TemplateError> {
    if !template.contains(COPYRIGHT_SLOT) && !template.contains(LICENSE_SLOT) {
        return Err(TemplateError::NoPlaceholders);
    }
    let mut out: Vec<String> = Vec::new();
    for line in template.lines() {
        if line.trim() == COPYRIGHT_SLOT {
            out.extend(
                copyrights
                    .iter()
                    .map(|c| format!("{COPYRIGHT_TAG} {c}")),
            );
        } else if line.trim() == LICENSE_SLOT {
            out.extend(
                expressions
                    .iter()
                    .map(|e| format!("{LICENSE_TAG} {e}")),
            );
        } else {
            out.push(line.to_string());
        }
    }
    let has_content = out
        .iter()
        .any(|l| l.contains(COPYRIGHT_TAG) || l.contains(LICENSE_TAG));
    if !has_content {
        return Err(TemplateError::MissingContent);
    }
    Ok(out.join("\n"))
}

/// Wrap rendered text in the style's comment syntax. The result always
/// ends with a newline.
pub fn wrap_block(
    style: &CommentStyle,
    form: Option<CommentForm>,
    text: &str,
) -> std::result::Result<String, StyleError> {
    let form = match form {
        Some(CommentForm::SingleLine) if !style.supports_single_line() => {
            return Err(StyleError::UnsupportedForm {
                style: style.name,
                form: "single-line",
            })
        }
        Some(CommentForm::MultiLine) if !style.supports_multi_line() => {
            return Err(StyleError::UnsupportedForm {
                style: style.name,
                form: "multi-line",
            })
        }
        Some(f) => f,
        None if style.supports_single_line() => CommentForm::SingleLine,
        None => CommentForm::MultiLine,
    };
    let mut out = String::new();
    match form {
        CommentForm::SingleLine => {
            let prefix = style.single.expect("checked above");
            for line in text.lines() {
                if line.is_empty() {
                    out.push_str(prefix);
                } else {
                    out.push_str(prefix);
                    out.push(' ');
                    out.push_str(line);
                }
                out.push('\n');
            }
        }
        CommentForm::MultiLine => {
            let multi = style.multi.expect("checked above");
            out.push_str(multi.start);
            out.push('\n');
            for line in text.lines() {
                match multi.middle {
                    Some(mid) if line.is_empty() => out.push_str(mid.trim_end()),
                    Some(mid) => {
                        out.push_str(mid);
                        out.push(' ');
                        out.push_str(line);
                    }
                    None => out.push_str(line),
                }
                out.push('\n');
            }
            out.push_str(multi.end.trim_start());
            out.push('\n');
        }
    }
    Ok(out)
}

/// Locate an existing leading comment block in `content` matching the
/// style's delimiters. Returns the byte span and the block's text.
fn find_old_header(content: &str, style: &CommentStyle) -> Option<(Range<usize>, String)> {
    if let Some(multi) = style.multi {
        let start_tok = multi.start;
        if content.starts_with(start_tok) {
            let end_tok = multi.end.trim();
            let after_start = start_tok.len();
            if let Some(rel) = content[after_start..].find(end_tok) {
                let mut end = after_start + rel + end_tok.len();
                // Consume the rest of the closing line.
                if let Some(nl) = content[end..].find('\n') {
                    end += nl + 1;
                } else {
                    end = content.len();
                }
                return Some((0..end, content[..end].to_string()));
            }
        }
    }
    if let Some(prefix) = style.single {
        let mut end = 0;
        for line in content.split_inclusive('\n') {
            if line.starts_with(prefix) {
                end += line.len();
            } else {
                break;
            }
        }
        if end > 0 {
            return Some((0..end, content[..end].to_string()));
        }
    }
    None
}

/// Rewrite `content` with a synthesized metadata header.
///
/// Returns the new content and whether it differs from the input. A
/// leading shebang line always stays at the top.
pub fn synthesize(
    content: &str,
    style: &CommentStyle,
    input: &HeaderInput<'_>,
    opts: &HeaderOptions,
) -> Result<(String, bool)> {
    let (prelude, rest) = if content.starts_with("#!") {
        match content.find('\n') {
            Some(nl) => content.split_at(nl + 1),
            None => (content, ""),
        }
    } else {
        ("", content)
    };

    let old = find_old_header(rest, style);

    if opts.skip_existing {
        let window = &rest[..rest.len().min(extract::HEADER_WINDOW_BYTES)];
        let existing = extract::extract_tags(window);
        if existing.has_any() {
            return Ok((content.to_string(), false));
        }
    }

    let mut copyrights = input.copyrights.clone();
    let mut expressions: BTreeSet<LicenseExpression> =
        input.expression.cloned().into_iter().collect();
    if opts.mode == WriteMode::Replace && opts.merge_copyrights {
        if let Some((_, old_text)) = &old {
            let old_tags = extract::extract_tags(old_text);
            copyrights.extend(old_tags.copyrights);
            expressions.extend(old_tags.expressions);
        }
    }

    let rendered = render_template(
        input.template.unwrap_or(DEFAULT_TEMPLATE),
        &copyrights,
        &expressions,
    )?;
    let block = wrap_block(style, opts.forced_form, &rendered)?;

    let mut out = String::with_capacity(content.len() + block.len() + 8);
    out.push_str(prelude);
    if !prelude.is_empty() && !prelude.ends_with('\n') {
        out.push('\n');
    }
    match opts.mode {
        WriteMode::Replace => {
            let remainder = match &old {
                Some((span, _)) => &rest[span.end..],
                None => rest,
            };
            let remainder = remainder.trim_start_matches('\n');
            out.push_str(&block);
            if !remainder.is_empty() {
                out.push('\n');
                out.push_str(remainder);
            }
        }
        WriteMode::Append => {
            let insert_at = old.as_ref().map(|(span, _)| span.end).unwrap_or(0);
            out.push_str(&rest[..insert_at]);
            out.push_str(&block);
            let remainder = rest[insert_at..].trim_start_matches('\n');
            if !remainder.is_empty() {
                out.push('\n');
                out.push_str(remainder);
            }
        }
    }
    let changed = out != content;
    Ok((out, changed))
}

/// Outcome of annotating one path.
#[derive(Debug)]
pub struct AnnotateOutcome {
    pub path: PathBuf,
    /// Where the block went: the file itself or its sidecar.
    pub target: PathBuf,
    pub changed: bool,
    pub skipped: Option<String>,
}

/// Per-path result of a batch annotation run.
#[derive(Debug)]
pub enum PathOutcome {
    Done(AnnotateOutcome),
    /// The path's comment style cannot satisfy the request; skipped.
    StyleSkipped { path: PathBuf, error: StyleError },
    Failed { path: PathBuf, error: LintelError },
}

/// Annotate every path, isolating each problem to its own slot.
///
/// A style the path cannot satisfy skips that path; any other error is
/// recorded as a failure. The run never aborts early, so later paths
/// are still annotated.
pub fn annotate_many(
    paths: &[PathBuf],
    input: &HeaderInput<'_>,
    opts: &HeaderOptions,
) -> Vec<PathOutcome> {
    paths
        .iter()
        .map(|path| match annotate_path(path, input, opts) {
            Ok(outcome) => PathOutcome::Done(outcome),
            Err(LintelError::Style(error)) => PathOutcome::StyleSkipped {
                path: path.clone(),
                error,
            },
            Err(error) => PathOutcome::Failed {
                path: path.clone(),
                error,
            },
        })
        .collect()
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(1024).any(|b| *b == 0)
}

fn annotate_sidecar(
    path: &Path,
    input: &HeaderInput<'_>,
    opts: &HeaderOptions,
) -> Result<AnnotateOutcome> {
    let sidecar = extract::sidecar_path(path);
    let existing = fs::read_to_string(&sidecar).unwrap_or_default();
    let existing_tags = extract::extract_tags(&existing);
    if opts.skip_existing && existing_tags.has_any() {
        return Ok(AnnotateOutcome {
            path: path.to_path_buf(),
            target: sidecar,
            changed: false,
            skipped: Some("already contains license metadata".into()),
        });
    }
    let mut copyrights = input.copyrights.clone();
    let mut expressions: BTreeSet<LicenseExpression> =
        input.expression.cloned().into_iter().collect();
    if opts.mode == WriteMode::Replace && opts.merge_copyrights {
        copyrights.extend(existing_tags.copyrights);
        expressions.extend(existing_tags.expressions);
    }
    let mut rendered = render_template(
        input.template.unwrap_or(DEFAULT_TEMPLATE),
        &copyrights,
        &expressions,
    )?;
    rendered.push('\n');
    let changed = rendered != existing;
    if changed {
        fs::write(&sidecar, &rendered)?;
    }
    Ok(AnnotateOutcome {
        path: path.to_path_buf(),
        target: sidecar,
        changed,
        skipped: None,
    })
}

/// Annotate one file on disk. Binary files and explicit sidecar mode
/// write `<file>.license` and leave the original untouched.
pub fn annotate_path(
    path: &Path,
    input: &HeaderInput<'_>,
    opts: &HeaderOptions,
) -> Result<AnnotateOutcome> {
    let bytes = fs::read(path)?;
    if opts.sidecar || looks_binary(&bytes) {
        debug!(path = %path.display(), "writing sidecar");
        return annotate_sidecar(path, input, opts);
    }
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        // Undecodable text is treated like a binary.
        Err(_) => return annotate_sidecar(path, input, opts),
    };
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let head = content.lines().next().unwrap_or("");
    let style = match opts.forced_style {
        Some(style) => style,
        None => crate::comment::lookup(&filename, head)
            .ok_or_else(|| LintelError::Style(StyleError::Unknown(filename.clone())))?,
    };
    let (new_content, changed) = synthesize(&content, style, input, opts)?;
    if changed {
        fs::write(path, &new_content)?;
    }
    let skipped = if !changed && opts.skip_existing {
        Some("already contains license metadata".into())
    } else {
        None
    };
    Ok(AnnotateOutcome {
        path: path.to_path_buf(),
        target: path.to_path_buf(),
        changed,
        skipped,
    })
}
