//! SPDX license expression parser and validator.
//!
//! Grammar:
//! ```text
//! expr := term (("AND"|"OR") expr)?
//! term := atom ("WITH" exception_id)?
//! atom := identifier["+"] | "(" expr ")"
//! ```
//!
//! Parsing never consults the identifier tables; unknown identifiers are
//! a validation concern, reported through [`LicenseExpression::validate`].
//! Expressions are compared structurally, so `(MIT)` and `MIT` parse to
//! equal trees and parenthesization is not preserved on output.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::licenses::{self, Classification};

/// Nesting bound for parenthesized expressions.
const MAX_DEPTH: usize = 64;

/// A parsed SPDX expression as a tagged tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LicenseExpression {
    Identifier { id: String, or_later: bool },
    And(Box<LicenseExpression>, Box<LicenseExpression>),
    Or(Box<LicenseExpression>, Box<LicenseExpression>),
    With {
        license: Box<LicenseExpression>,
        exception: String,
    },
}

/// Failure to parse an expression, pointing at the offending substring.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid SPDX expression at offset {position}: '{offending}'")]
pub struct ParseError {
    pub offending: String,
    pub position: usize,
}

impl ParseError {
    fn new(offending: impl Into<String>, position: usize) -> Self {
        Self {
            offending: offending.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok<'a> {
    Ident(&'a str),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<(Tok<'_>, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c == '(' {
            tokens.push((Tok::LParen, i));
            i += 1;
        } else if c == ')' {
            tokens.push((Tok::RParen, i));
            i += 1;
        } else {
            let start = i;
            while i < bytes.len() {
                let c = bytes[i] as char;
                if c.is_ascii_whitespace() || c == '(' || c == ')' {
                    break;
                }
                i += 1;
            }
            tokens.push((Tok::Ident(&input[start..i]), start));
        }
    }
    Ok(tokens)
}

fn is_operator(word: &str) -> bool {
    word.eq_ignore_ascii_case("AND")
        || word.eq_ignore_ascii_case("OR")
        || word.eq_ignore_ascii_case("WITH")
}

fn valid_identifier(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '+')
}

struct Parser<'a> {
    tokens: Vec<(Tok<'a>, usize)>,
    pos: usize,
    input_len: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&(Tok<'a>, usize)> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<(Tok<'a>, usize)> {
        let t = self.tokens.get(self.pos).copied();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn err_here(&self) -> ParseError {
        match self.peek() {
            Some((Tok::Ident(w), at)) => ParseError::new(*w, *at),
            Some((Tok::LParen, at)) => ParseError::new("(", *at),
            Some((Tok::RParen, at)) => ParseError::new(")", *at),
            None => ParseError::new("", self.input_len),
        }
    }

    fn parse_expr(&mut self, depth: usize) -> Result<LicenseExpression, ParseError> {
        if depth > MAX_DEPTH {
            return Err(self.err_here());
        }
        let left = self.parse_term(depth)?;
        match self.peek() {
            Some((Tok::Ident(w), _)) if w.eq_ignore_ascii_case("AND") => {
                self.bump();
                let right = self.parse_expr(depth + 1)?;
                Ok(LicenseExpression::And(Box::new(left), Box::new(right)))
            }
            Some((Tok::Ident(w), _)) if w.eq_ignore_ascii_case("OR") => {
                self.bump();
                let right = self.parse_expr(depth + 1)?;
                Ok(LicenseExpression::Or(Box::new(left), Box::new(right)))
            }
            _ => Ok(left),
        }
    }

    fn parse_term(&mut self, depth: usize) -> Result<LicenseExpression, ParseError> {
        let atom = self.parse_atom(depth)?;
        if let Some((Tok::Ident(w), _)) = self.peek() {
            if w.eq_ignore_ascii_case("WITH") {
                self.bump();
                return match self.bump() {
                    Some((Tok::Ident(exc), at)) => {
                        if is_operator(exc) || !valid_identifier(exc) {
                            Err(ParseError::new(exc, at))
                        } else {
                            Ok(LicenseExpression::With {
                                license: Box::new(atom),
                                exception: exc.to_string(),
                            })
                        }
                    }
                    Some((Tok::LParen, at)) => Err(ParseError::new("(", at)),
                    Some((Tok::RParen, at)) => Err(ParseError::new(")", at)),
                    None => Err(ParseError::new("", self.input_len)),
                };
            }
        }
        Ok(atom)
    }

    fn parse_atom(&mut self, depth: usize) -> Result<LicenseExpression, ParseError> {
        match self.bump() {
            Some((Tok::LParen, _)) => {
                let inner = self.parse_expr(depth + 1)?;
                match self.bump() {
                    Some((Tok::RParen, _)) => Ok(inner),
                    Some((Tok::Ident(w), at)) => Err(ParseError::new(w, at)),
                    Some((Tok::LParen, at)) => Err(ParseError::new("(", at)),
                    None => Err(ParseError::new("", self.input_len)),
                }
            }
            Some((Tok::Ident(w), at)) => {
                if is_operator(w) || !valid_identifier(w) {
                    return Err(ParseError::new(w, at));
                }
                let (id, or_later) = match w.strip_suffix('+') {
                    Some(base) if !base.is_empty() && !base.contains('+') => (base, true),
                    _ if w.contains('+') => return Err(ParseError::new(w, at)),
                    _ => (w, false),
                };
                Ok(LicenseExpression::Identifier {
                    id: id.to_string(),
                    or_later,
                })
            }
            Some((Tok::RParen, at)) => Err(ParseError::new(")", at)),
            None => Err(ParseError::new("", self.input_len)),
        }
    }
}

/// Parse an SPDX expression into its structural tree.
pub fn parse(input: &str) -> Result<LicenseExpression, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.len(),
    };
    let expr = parser.parse_expr(0)?;
    if parser.peek().is_some() {
        return Err(parser.err_here());
    }
    Ok(expr)
}

impl LicenseExpression {
    /// License identifiers as rendered (trailing `+` kept), one entry per
    /// occurrence class, depth-first.
    pub fn rendered_ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let LicenseExpression::Identifier { id, or_later } = node {
                if *or_later {
                    out.push(format!("{id}+"));
                } else {
                    out.push(id.clone());
                }
            }
        });
        out
    }

    /// Base license identifiers (without any `+` marker). These key the
    /// cross-reference against the licenses directory.
    pub fn base_ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let LicenseExpression::Identifier { id, .. } = node {
                out.push(id.clone());
            }
        });
        out
    }

    /// Exception identifiers appearing after `WITH`.
    pub fn exceptions(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let LicenseExpression::With { exception, .. } = node {
                out.push(exception.clone());
            }
        });
        out
    }

    /// Classify every identifier in the tree. Unknown exceptions are
    /// reported as [`Classification::Bad`] alongside the license ids.
    pub fn validate(&self) -> Vec<(String, Classification)> {
        let mut out: Vec<(String, Classification)> = self
            .rendered_ids()
            .into_iter()
            .map(|id| {
                let class = licenses::classify(&id);
                (id, class)
            })
            .collect();
        for exc in self.exceptions() {
            if !licenses::is_known_exception(&exc) {
                out.push((exc, Classification::Bad));
            }
        }
        out
    }

    fn walk(&self, f: &mut impl FnMut(&LicenseExpression)) {
        // Explicit stack; expressions from hostile inputs may nest deeply.
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            f(node);
            match node {
                LicenseExpression::And(l, r) | LicenseExpression::Or(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                LicenseExpression::With { license, .. } => stack.push(license),
                LicenseExpression::Identifier { .. } => {}
            }
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            LicenseExpression::And(..) | LicenseExpression::Or(..)
        )
    }
}

impl fmt::Display for LicenseExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Left operands are parenthesized when compound so that the
        // right-recursive grammar re-parses the output to an equal tree.
        fn left(f: &mut fmt::Formatter<'_>, e: &LicenseExpression) -> fmt::Result {
            if e.is_compound() {
                write!(f, "({e})")
            } else {
                write!(f, "{e}")
            }
        }
        match self {
            LicenseExpression::Identifier { id, or_later } => {
                if *or_later {
                    write!(f, "{id}+")
                } else {
                    write!(f, "{id}")
                }
            }
            LicenseExpression::And(l, r) => {
                left(f, l)?;
                write!(f, " AND {r}")
            }
            LicenseExpression::Or(l, r) => {
                left(f, l)?;
                write!(f, " OR {r}")
            }
            LicenseExpression::With { license, exception } => {
                if license.is_compound() {
                    write!(f, "({license}) WITH {exception}")
                } else {
                    write!(f, "{license} WITH {exception}")
                }
            }
        }
    }
}

impl Serialize for LicenseExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(id: &str) -> LicenseExpression {
        LicenseExpression::Identifier {
            id: id.into(),
            or_later: false,
        }
    }

    #[test]
    fn test_parse_single_identifier() {
        assert_eq!(parse("MIT").unwrap(), ident("MIT"));
    }

    #[test]
    fn test_parse_or_later_marker() {
        assert_eq!(
            parse("Apache-2.0+").unwrap(),
            LicenseExpression::Identifier {
                id: "Apache-2.0".into(),
                or_later: true,
            }
        );
    }

    #[test]
    fn test_parse_and_or_right_recursion() {
        let e = parse("MIT AND Apache-2.0 OR ISC").unwrap();
        assert_eq!(
            e,
            LicenseExpression::And(
                Box::new(ident("MIT")),
                Box::new(LicenseExpression::Or(
                    Box::new(ident("Apache-2.0")),
                    Box::new(ident("ISC")),
                )),
            )
        );
    }

    #[test]
    fn test_parens_not_preserved() {
        assert_eq!(parse("(MIT)").unwrap(), parse("MIT").unwrap());
        assert_eq!(
            parse("(MIT AND ISC)").unwrap(),
            parse("MIT AND ISC").unwrap()
        );
    }

    #[test]
    fn test_parse_with_exception() {
        let e = parse("GPL-3.0-or-later WITH Classpath-exception-2.0").unwrap();
        assert_eq!(
            e,
            LicenseExpression::With {
                license: Box::new(ident("GPL-3.0-or-later")),
                exception: "Classpath-exception-2.0".into(),
            }
        );
    }

    #[test]
    fn test_parse_error_carries_position() {
        let err = parse("MIT AND").unwrap_err();
        assert_eq!(err.position, "MIT AND".len());
        let err = parse("MIT OR OR ISC").unwrap_err();
        assert_eq!(err.offending, "OR");
        assert_eq!(err.position, 7);
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        assert!(parse("").is_err());
        assert!(parse("MIT AND (ISC").is_err());
        assert!(parse("MIT)").is_err());
        assert!(parse("MIT ISC").is_err());
        assert!(parse("M!T").is_err());
        assert!(parse("MIT WITH (ISC)").is_err());
    }

    #[test]
    fn test_depth_guard() {
        let mut s = String::new();
        for _ in 0..200 {
            s.push('(');
        }
        s.push_str("MIT");
        for _ in 0..200 {
            s.push(')');
        }
        assert!(parse(&s).is_err());
    }

    #[test]
    fn test_round_trip_structural_equality() {
        let inputs = [
            "MIT",
            "Apache-2.0+",
            "MIT AND Apache-2.0",
            "MIT OR Apache-2.0 AND ISC",
            "(MIT AND Apache-2.0) OR ISC",
            "(MIT OR ISC) AND (Apache-2.0 OR Zlib)",
            "GPL-2.0-or-later WITH Linux-syscall-note",
            "(MIT AND ISC) WITH LLVM-exception OR 0BSD",
        ];
        for input in inputs {
            let tree = parse(input).unwrap();
            let reparsed = parse(&tree.to_string()).unwrap();
            assert_eq!(tree, reparsed, "round-trip failed for '{input}'");
        }
    }

    #[test]
    fn test_validate_classifies_every_identifier() {
        let e = parse("MIT AND GPL-3.0 OR LicenseRef-Internal AND Bogus-1.0").unwrap();
        let classes: Vec<_> = e.validate();
        assert_eq!(classes.len(), 4);
        for (id, class) in classes {
            let expected = match id.as_str() {
                "MIT" => Classification::Current,
                "GPL-3.0" => Classification::Deprecated,
                "LicenseRef-Internal" => Classification::ProjectLocal,
                "Bogus-1.0" => Classification::Bad,
                other => panic!("unexpected id {other}"),
            };
            assert_eq!(class, expected);
        }
    }

    #[test]
    fn test_validate_flags_unknown_exception() {
        let e = parse("MIT WITH Made-up-exception").unwrap();
        let classes = e.validate();
        assert!(classes
            .iter()
            .any(|(id, c)| id == "Made-up-exception" && *c == Classification::Bad));
    }
}
