//! Line Tokenizer
//!
//! Walks the screenplay line by line while moving a cursor through the
//! [`RuleGraph`]. Each line is classified by the first child of the current
//! node whose recognizer accepts it, and that child becomes the new cursor.
//!
//! `BlankLine` and `Discardable` tokens move the cursor but never reach the
//! output. A line no child accepts aborts the whole tokenization.
//!
//! Lines break on every Unicode line boundary, not only `\n`: old Mac files
//! end lines with a lone `\r`, and PDF text dumps put a form feed at each page
//! break.

use crate::screenplay::error::TokenizeError;
use crate::screenplay::rules::{NodeId, RuleGraph};
use crate::screenplay::tokens::{CharacterRules, Token};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static LINE_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r\n|[\n\r\x0B\x0C\x1C-\x1E\x{85}\x{2028}\x{2029}]").unwrap()
});

/// Split `text` into lines. A break at the very end does not open an extra line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = LINE_BREAK_RE.split(text).collect();
    if lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines
}

/// Single-use tokenizer: one instance per parse.
///
/// The graph is shared read-only; the cursor belongs to this tokenizer only.
pub struct Tokenizer<'g> {
    graph: &'g RuleGraph,
    cursor: NodeId,
    character_rules: CharacterRules,
}

impl<'g> Tokenizer<'g> {
    pub fn new(graph: &'g RuleGraph, character_rules: CharacterRules) -> Self {
        Tokenizer {
            graph,
            cursor: graph.root(),
            character_rules,
        }
    }

    /// Classify every line of `text`.
    ///
    /// Leading whitespace is stripped before recognition. Consumes the
    /// tokenizer since the cursor cannot be rewound.
    pub fn tokenize(mut self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();
        for (idx, raw_line) in split_lines(text).into_iter().enumerate() {
            let line_number = idx + 1;
            let line = raw_line.trim_start();
            let token = self.advance(line_number, line)?;
            if !token.kind().is_transient() {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }

    /// Try the children of the current node in order; the first match wins.
    fn advance(&mut self, line_number: usize, line: &str) -> Result<Token, TokenizeError> {
        for &child in self.graph.children(self.cursor) {
            let node = self.graph.node(child);
            let Some(kind) = node.kind() else {
                continue;
            };
            if let Some(token) = kind.tokenize(line, &self.character_rules) {
                debug!(
                    line_number,
                    line,
                    kind = kind.name(),
                    node = node.name(),
                    "tokenized line"
                );
                self.cursor = child;
                return Ok(token);
            }
        }

        let current = self.graph.node(self.cursor);
        Err(TokenizeError::new(
            line_number,
            line,
            current.kind_name(),
            current.name(),
        ))
    }
}
