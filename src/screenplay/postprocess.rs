//! Token Stream Post-Processing
//!
//! Two order-preserving passes run on the raw token stream:
//!
//! 1. [`merge_adjacent_tokens`] folds each run of adjacent tokens of one
//!    mergeable kind into a single token, so that a dialog or an action
//!    spread over several physical lines becomes one logical token.
//! 2. [`replace_false_characters`] turns every `Character` cue that is not
//!    followed by a `Parenthetical` or a `Dialog` into a `ShotInstruction`.
//!
//! The merge must run first: the one-token lookahead of the second pass only
//! makes sense once multi-line blocks are folded.

use crate::screenplay::error::MergeError;
use crate::screenplay::tokens::{Token, TokenKind};

/// Fold runs of adjacent same-kind tokens.
///
/// Runs of kinds that refuse to merge (two scene headings in a row, two
/// cues in a row) are passed through token by token.
pub fn merge_adjacent_tokens(tokens: Vec<Token>) -> Result<Vec<Token>, MergeError> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match merged.last() {
            Some(last) if last.kind() == token.kind() && token.kind().is_mergeable() => {
                if let Some(last) = merged.pop() {
                    merged.push(last.merge(token)?);
                }
            }
            _ => merged.push(token),
        }
    }
    Ok(merged)
}

/// Replace character cues that do not introduce a dialog.
///
/// The cue recognizer accepts any short uppercase line, which also catches
/// shot directions and emphasized action lines. Each cue is decided from the
/// next token only, in a single left-to-right pass.
pub fn replace_false_characters(tokens: Vec<Token>) -> Vec<Token> {
    let introduces_dialog: Vec<bool> = tokens
        .iter()
        .skip(1)
        .map(|next| matches!(next.kind(), TokenKind::Parenthetical | TokenKind::Dialog))
        .chain(std::iter::once(false))
        .collect();

    tokens
        .into_iter()
        .zip(introduces_dialog)
        .map(|(token, followed_by_dialog)| match token {
            Token::Character { name } if !followed_by_dialog => {
                Token::ShotInstruction { instruction: name }
            }
            other => other,
        })
        .collect()
}

/// Run both passes in order.
pub fn clean_tokens(tokens: Vec<Token>) -> Result<Vec<Token>, MergeError> {
    Ok(replace_false_characters(merge_adjacent_tokens(tokens)?))
}
