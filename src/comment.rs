//! Comment style registry.
//!
//! Maps a file's name or extension to a comment syntax descriptor via an
//! explicit ordered rule table. Exact filename rules win over extension
//! rules; a shebang sniff is the last resort.

use thiserror::Error;

/// Multi-line comment delimiters: opening, optional per-line prefix for
/// middle lines, and closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiLine {
    pub start: &'static str,
    pub middle: Option<&'static str>,
    pub end: &'static str,
}

/// A comment syntax descriptor. At least one of the two forms is present
/// for every entry in the static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentStyle {
    pub name: &'static str,
    pub single: Option<&'static str>,
    pub multi: Option<MultiLine>,
}

impl CommentStyle {
    pub fn supports_single_line(&self) -> bool {
        self.single.is_some()
    }

    pub fn supports_multi_line(&self) -> bool {
        self.multi.is_some()
    }
}

/// Requested comment form cannot be satisfied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("no comment style known for '{0}'")]
    Unknown(String),
    #[error("comment style '{style}' does not support {form} comments")]
    UnsupportedForm {
        style: &'static str,
        form: &'static str,
    },
}

pub static HASH: CommentStyle = CommentStyle {
    name: "hash",
    single: Some("#"),
    multi: None,
};

pub static C: CommentStyle = CommentStyle {
    name: "c",
    single: Some("//"),
    multi: Some(MultiLine {
        start: "/*",
        middle: Some(" *"),
        end: " */",
    }),
};

pub static HTML: CommentStyle = CommentStyle {
    name: "html",
    single: None,
    multi: Some(MultiLine {
        start: "<!--",
        middle: None,
        end: "-->",
    }),
};

pub static DASH: CommentStyle = CommentStyle {
    name: "dash",
    single: Some("--"),
    multi: None,
};

pub static SEMICOLON: CommentStyle = CommentStyle {
    name: "semicolon",
    single: Some(";"),
    multi: None,
};

pub static PERCENT: CommentStyle = CommentStyle {
    name: "percent",
    single: Some("%"),
    multi: None,
};

pub static ML: CommentStyle = CommentStyle {
    name: "ml",
    single: None,
    multi: Some(MultiLine {
        start: "(*",
        middle: Some("   "),
        end: " *)",
    }),
};

pub static BATCH: CommentStyle = CommentStyle {
    name: "batch",
    single: Some("REM"),
    multi: None,
};

pub static VIM: CommentStyle = CommentStyle {
    name: "vim",
    single: Some("\""),
    multi: None,
};

pub static FORTRAN: CommentStyle = CommentStyle {
    name: "fortran",
    single: Some("!"),
    multi: None,
};

enum Rule {
    Filename(&'static str),
    Extension(&'static str),
}

/// Ordered dispatch table: all exact filename rules precede all extension
/// rules, and within each group the first match wins.
static RULES: &[(Rule, &CommentStyle)] = &[
    (Rule::Filename("Makefile"), &HASH),
    (Rule::Filename("GNUmakefile"), &HASH),
    (Rule::Filename("Dockerfile"), &HASH),
    (Rule::Filename("Containerfile"), &HASH),
    (Rule::Filename("CMakeLists.txt"), &HASH),
    (Rule::Filename("Rakefile"), &HASH),
    (Rule::Filename("Gemfile"), &HASH),
    (Rule::Filename("Vagrantfile"), &HASH),
    (Rule::Filename("Justfile"), &HASH),
    (Rule::Filename(".gitignore"), &HASH),
    (Rule::Filename(".gitattributes"), &HASH),
    (Rule::Filename(".gitmodules"), &HASH),
    (Rule::Filename(".dockerignore"), &HASH),
    (Rule::Filename(".editorconfig"), &HASH),
    (Rule::Filename(".vimrc"), &VIM),
    (Rule::Extension("rs"), &C),
    (Rule::Extension("c"), &C),
    (Rule::Extension("h"), &C),
    (Rule::Extension("cc"), &C),
    (Rule::Extension("cpp"), &C),
    (Rule::Extension("hpp"), &C),
    (Rule::Extension("cs"), &C),
    (Rule::Extension("go"), &C),
    (Rule::Extension("java"), &C),
    (Rule::Extension("js"), &C),
    (Rule::Extension("jsx"), &C),
    (Rule::Extension("ts"), &C),
    (Rule::Extension("tsx"), &C),
    (Rule::Extension("kt"), &C),
    (Rule::Extension("swift"), &C),
    (Rule::Extension("scala"), &C),
    (Rule::Extension("css"), &C),
    (Rule::Extension("scss"), &C),
    (Rule::Extension("proto"), &C),
    (Rule::Extension("zig"), &C),
    (Rule::Extension("dart"), &C),
    (Rule::Extension("php"), &C),
    (Rule::Extension("py"), &HASH),
    (Rule::Extension("sh"), &HASH),
    (Rule::Extension("bash"), &HASH),
    (Rule::Extension("zsh"), &HASH),
    (Rule::Extension("fish"), &HASH),
    (Rule::Extension("rb"), &HASH),
    (Rule::Extension("pl"), &HASH),
    (Rule::Extension("tcl"), &HASH),
    (Rule::Extension("toml"), &HASH),
    (Rule::Extension("yml"), &HASH),
    (Rule::Extension("yaml"), &HASH),
    (Rule::Extension("cfg"), &HASH),
    (Rule::Extension("ini"), &HASH),
    (Rule::Extension("mk"), &HASH),
    (Rule::Extension("nix"), &HASH),
    (Rule::Extension("cmake"), &HASH),
    (Rule::Extension("awk"), &HASH),
    (Rule::Extension("tf"), &HASH),
    (Rule::Extension("html"), &HTML),
    (Rule::Extension("htm"), &HTML),
    (Rule::Extension("xml"), &HTML),
    (Rule::Extension("svg"), &HTML),
    (Rule::Extension("md"), &HTML),
    (Rule::Extension("vue"), &HTML),
    (Rule::Extension("xsd"), &HTML),
    (Rule::Extension("sql"), &DASH),
    (Rule::Extension("hs"), &DASH),
    (Rule::Extension("lua"), &DASH),
    (Rule::Extension("elm"), &DASH),
    (Rule::Extension("adb"), &DASH),
    (Rule::Extension("ads"), &DASH),
    (Rule::Extension("lisp"), &SEMICOLON),
    (Rule::Extension("el"), &SEMICOLON),
    (Rule::Extension("clj"), &SEMICOLON),
    (Rule::Extension("scm"), &SEMICOLON),
    (Rule::Extension("asm"), &SEMICOLON),
    (Rule::Extension("tex"), &PERCENT),
    (Rule::Extension("sty"), &PERCENT),
    (Rule::Extension("bib"), &PERCENT),
    (Rule::Extension("ml"), &ML),
    (Rule::Extension("mli"), &ML),
    (Rule::Extension("bat"), &BATCH),
    (Rule::Extension("cmd"), &BATCH),
    (Rule::Extension("vim"), &VIM),
    (Rule::Extension("f90"), &FORTRAN),
    (Rule::Extension("f95"), &FORTRAN),
    (Rule::Extension("f03"), &FORTRAN),
];

/// Resolve the comment style for a file.
///
/// Tie-break order: exact filename, then extension, then a shebang sniff
/// on the leading content. Returns `None` when nothing matches.
pub fn lookup(filename: &str, content_head: &str) -> Option<&'static CommentStyle> {
    for (rule, style) in RULES {
        if let Rule::Filename(name) = rule {
            if *name == filename {
                return Some(style);
            }
        }
    }
    if let Some((_, ext)) = filename.rsplit_once('.') {
        for (rule, style) in RULES {
            if let Rule::Extension(e) = rule {
                if *e == ext {
                    return Some(style);
                }
            }
        }
    }
    if content_head.starts_with("#!") {
        return Some(&HASH);
    }
    None
}

/// Resolve a style by its registered name, for forced-style requests.
pub fn by_name(name: &str) -> Option<&'static CommentStyle> {
    let all: &[&CommentStyle] = &[
        &HASH, &C, &HTML, &DASH, &SEMICOLON, &PERCENT, &ML, &BATCH, &VIM, &FORTRAN,
    ];
    all.iter().find(|s| s.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_filename_beats_extension() {
        // CMakeLists.txt must not resolve through a ".txt" fallback path.
        assert_eq!(lookup("CMakeLists.txt", "").unwrap().name, "hash");
        assert_eq!(lookup("Makefile", "").unwrap().name, "hash");
    }

    #[test]
    fn test_extension_dispatch() {
        assert_eq!(lookup("main.rs", "").unwrap().name, "c");
        assert_eq!(lookup("index.html", "").unwrap().name, "html");
        assert_eq!(lookup("query.sql", "").unwrap().name, "dash");
        assert_eq!(lookup("init.el", "").unwrap().name, "semicolon");
    }

    #[test]
    fn test_shebang_sniff_is_last_resort() {
        assert_eq!(lookup("run", "#!/bin/sh\necho hi\n").unwrap().name, "hash");
        assert!(lookup("run", "echo hi\n").is_none());
        // Extension wins over content sniffing.
        assert_eq!(lookup("run.js", "#!/usr/bin/env node\n").unwrap().name, "c");
    }

    #[test]
    fn test_form_predicates() {
        assert!(HASH.supports_single_line());
        assert!(!HASH.supports_multi_line());
        assert!(!HTML.supports_single_line());
        assert!(HTML.supports_multi_line());
        assert!(C.supports_single_line() && C.supports_multi_line());
    }

    #[test]
    fn test_every_style_has_a_form() {
        for (_, style) in RULES {
            assert!(
                style.supports_single_line() || style.supports_multi_line(),
                "{} has no comment form",
                style.name
            );
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("c").unwrap().name, "c");
        assert!(by_name("nope").is_none());
    }
}
