//! # screenplay
//!
//! A parser for plain-text screenplays. It breaks a script down into a
//! project made of sequences (one per scene heading) and of the assets cast
//! in them, and exports that breakdown as JSON.
//!
//! ```text
//! INT. KITCHEN - DAY
//!
//! JOHN
//! Hello there.
//! ```
//!
//! becomes a project with one sequence, `0010`, casting the character `JOHN`.

pub mod screenplay;

pub use screenplay::config::{Loader, ParserConfig};
pub use screenplay::discrepancies::ProjectDiscrepancies;
pub use screenplay::error::ParseError;
pub use screenplay::parser::ScreenplayParser;
pub use screenplay::project::{Asset, AssetType, Project, ProjectChild, Sequence};
pub use screenplay::rules::{RuleGraph, TokensRule};
pub use screenplay::tokens::{MultipleCharactersSpeaking, Token, TokenKind};
