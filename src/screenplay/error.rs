//! Error types for screenplay parsing
//!
//! Every failure the parser can report is one of the enums below. The
//! top-level [`ParseError`] wraps the stage-specific errors so that callers of
//! [`ScreenplayParser`](crate::screenplay::parser::ScreenplayParser) only deal
//! with a single type.

use crate::screenplay::tokens::TokenKind;
use std::path::PathBuf;
use thiserror::Error;

/// Longest line excerpt kept in a [`TokenizeError`]
const EXCERPT_MAX_CHARS: usize = 80;

/// No child of the current rule node accepted a line.
///
/// This aborts the whole tokenization: there is no skip-and-continue mode.
/// The usual fix is to extend the rule graph, not to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "could not tokenize line #{line_number} ({line:?}), current rule node: {node_kind} {node_name:?}"
)]
pub struct TokenizeError {
    pub line_number: usize,
    pub line: String,
    pub node_kind: String,
    pub node_name: String,
}

impl TokenizeError {
    pub fn new(line_number: usize, line: &str, node_kind: &str, node_name: &str) -> Self {
        TokenizeError {
            line_number,
            line: excerpt(line),
            node_kind: node_kind.to_string(),
            node_name: node_name.to_string(),
        }
    }
}

fn excerpt(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= EXCERPT_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(EXCERPT_MAX_CHARS).collect();
    cut.push('…');
    cut
}

/// Two tokens could not be merged.
///
/// The post-processing pass never asks for an illegal merge, so seeing this
/// error means a bug in the caller, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("cannot merge a {left} token with a {right} token")]
    DifferentKinds { left: TokenKind, right: TokenKind },

    #[error("{0} tokens cannot be merged")]
    NotMergeable(TokenKind),
}

/// A declarative rule source could not be turned into a rule graph.
#[derive(Debug, Error)]
pub enum RuleGraphError {
    #[error("rule source is empty")]
    Empty,

    #[error("line {line}: the root node must not be indented")]
    IndentedRoot { line: usize },

    #[error("line {line}: only one root node is allowed")]
    SecondRoot { line: usize },

    #[error("line {line}: indentation of {indent} spaces is not a multiple of 4")]
    BadIndentation { line: usize, indent: usize },

    #[error("line {line}: indentation jumps from depth {from} to depth {to}")]
    IndentationJump { line: usize, from: usize, to: usize },

    #[error("line {line}: unknown token kind {kind:?}")]
    UnknownKind { line: usize, kind: String },

    #[error("line {line}: malformed node name {name:?}, expected a double-quoted string")]
    MalformedName { line: usize, name: String },

    #[error("line {line}: only the root node may have no token kind")]
    MisplacedNone { line: usize },

    #[error("could not read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A sequence name template is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template {0:?} has no {{count}} placeholder")]
    MissingCount(String),

    #[error("template {template:?} has an unknown placeholder {placeholder:?}")]
    UnknownPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("template {0:?} has unbalanced braces")]
    UnbalancedBraces(String),

    #[error("template {template:?} has an invalid width {width:?}")]
    InvalidWidth { template: String, width: String },
}

/// Top-level error of a screenplay parse.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not read screenplay {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Rules(#[from] RuleGraphError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("could not serialize project: {0}")]
    Serialize(#[from] serde_json::Error),
}
