//! Screenplay parsing
//!
//! A screenplay is read line by line. Each line is classified into a token by
//! walking a rule graph, the token stream is cleaned up, and the result is
//! reduced into a project breakdown:
//!
//! 1. [`tokens`]: token kinds, line recognizers and token merging
//! 2. [`rules`]: the rule graph telling which token may follow which
//! 3. [`tokenizer`]: the line loop moving a cursor through the rule graph
//! 4. [`postprocess`]: merging of multi-line blocks, false cue detection
//! 5. [`reducer`]: folding of the token stream into a [`project::Project`]
//! 6. [`parser`]: the [`parser::ScreenplayParser`] entry point tying it together

pub mod config;
pub mod discrepancies;
pub mod error;
pub mod parser;
pub mod postprocess;
pub mod project;
pub mod reducer;
pub mod rules;
pub mod tokenizer;
pub mod tokens;
