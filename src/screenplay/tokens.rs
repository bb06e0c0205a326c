//! Screenplay Tokens
//!
//! A token is the classification of one line of screenplay text (or of a run
//! of lines once adjacent tokens are merged). The set of token kinds is closed:
//!
//! - `ShotInstruction`: transition ending with a colon (`CUT TO:`)
//! - `SceneHeading`: scene boundary (`INT. KITCHEN - DAY`)
//! - `Action`: narrative description, the fallback outside of dialogs
//! - `BlankLine`: empty line, only used as parsing context
//! - `Discardable`: front matter before the first scene heading
//! - `Character`: all-caps character cue introducing a dialog
//! - `Parenthetical`: `(indication)` attached to a dialog
//! - `Dialog`: spoken content, the fallback inside dialogs
//!
//! Each kind owns a recognizer ([`TokenKind::tokenize`]). The fallback kinds
//! (`Action`, `Dialog`, `Discardable`) accept every line: which one applies is
//! decided by the position in the rule graph, not by the line content.

use crate::screenplay::error::MergeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Default maximum number of words in a character cue.
///
/// All-caps action lines exist, so long uppercase lines must not become cues.
/// The limit still lets names like "GROUP OF ANGRY PROTESTERS" through.
pub const CHARACTER_NAME_WORDS_LIMIT: usize = 6;

/// Transitions: uppercase letters and spaces, ending with a colon
static SHOT_INSTRUCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<instruction>[A-Z ]+):$").unwrap());

// Matches:
//   EXT. COURTHOUSE - DEWY MORNING
//   INT./EXT.    JOHN'S CAR - SEAHAVEN.    DAY.
//   FLASHBACK – EXT. TRAIN TRACKS – DAY
//   EXT. TRAIN TRACKS - DAY (FLASHBACK)
//   INT. COURTHOUSE                      (no lighting scenario)
// The separator before the lighting may be a hyphen, an en dash or an em dash.
static SCENE_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<location>(?:FLASHBACK\s+(?:-|–|—)\s+)?(?:INT|EXT|INT\.?/EXT)\..+?)",
        r"(?:(?:-|–|—)(?P<lighting>[A-Z .]+)(?:[A-Z() ]+)?)?$",
    ))
    .unwrap()
});

// The first part of the name needs at least two letters so that a sentence
// starting with "A" is not a cue. Later parts may be a single letter ("GUARD A").
// The name may be followed by an extension, "(V.O.)", "(o.s.)", "(TV)", and/or
// by "(CONT'D)".
static CHARACTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<name>[A-Z.]{2,}[.\-–— ]*?[A-Z][A-Z'\d&\-–— ]*)",
        r"(?: *?\([A-Za-z.]+\))?",
        r"(?: *?\((?:cont'd|CONT'D)\))?$",
    ))
    .unwrap()
});

/// Character-name shaped span anywhere inside a line, without extensions
static CONTAINS_CHARACTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z.]{2,}[.\-–— ]*?[A-Z][A-Z' ]*").unwrap());

/// Same shape as [`CONTAINS_CHARACTER_RE`], anchored on both ends
static CHARACTER_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z.]{2,}[.\-–— ]*?[A-Z][A-Z' ]*$").unwrap());

static PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\((?P<indication>.+?)\)$").unwrap());

/// How a cue naming several characters ("BOB & ALICE") is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleCharactersSpeaking {
    /// Keep the whole name, "BOB & ALICE"
    KeepAll,
    /// Keep the text before the first ampersand, "BOB"
    #[default]
    KeepFirstCharacter,
}

impl MultipleCharactersSpeaking {
    pub fn as_str(self) -> &'static str {
        match self {
            MultipleCharactersSpeaking::KeepAll => "keep_all",
            MultipleCharactersSpeaking::KeepFirstCharacter => "keep_first_character",
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            MultipleCharactersSpeaking::KeepAll => name.to_string(),
            MultipleCharactersSpeaking::KeepFirstCharacter => name
                .split('&')
                .next()
                .unwrap_or_default()
                .trim_end()
                .to_string(),
        }
    }
}

impl fmt::Display for MultipleCharactersSpeaking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MultipleCharactersSpeaking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep_all" => Ok(MultipleCharactersSpeaking::KeepAll),
            "keep_first_character" => Ok(MultipleCharactersSpeaking::KeepFirstCharacter),
            other => Err(format!(
                "{:?} is not a valid multiple characters policy (expected keep_all or keep_first_character)",
                other
            )),
        }
    }
}

/// Knobs of the character cue recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterRules {
    pub multiple_characters: MultipleCharactersSpeaking,
    pub word_limit: usize,
}

impl Default for CharacterRules {
    fn default() -> Self {
        CharacterRules {
            multiple_characters: MultipleCharactersSpeaking::default(),
            word_limit: CHARACTER_NAME_WORDS_LIMIT,
        }
    }
}

/// The kind of a token, without its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    ShotInstruction,
    SceneHeading,
    Action,
    BlankLine,
    Discardable,
    Character,
    Parenthetical,
    Dialog,
}

impl TokenKind {
    pub const ALL: [TokenKind; 8] = [
        TokenKind::ShotInstruction,
        TokenKind::SceneHeading,
        TokenKind::Action,
        TokenKind::BlankLine,
        TokenKind::Discardable,
        TokenKind::Character,
        TokenKind::Parenthetical,
        TokenKind::Dialog,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::ShotInstruction => "ShotInstruction",
            TokenKind::SceneHeading => "SceneHeading",
            TokenKind::Action => "Action",
            TokenKind::BlankLine => "BlankLine",
            TokenKind::Discardable => "Discardable",
            TokenKind::Character => "Character",
            TokenKind::Parenthetical => "Parenthetical",
            TokenKind::Dialog => "Dialog",
        }
    }

    /// Whether two adjacent tokens of this kind fold into one.
    pub fn is_mergeable(self) -> bool {
        matches!(
            self,
            TokenKind::ShotInstruction | TokenKind::Action | TokenKind::Dialog
        )
    }

    /// Kinds that only move the rule graph cursor and never reach the output.
    pub fn is_transient(self) -> bool {
        matches!(self, TokenKind::BlankLine | TokenKind::Discardable)
    }

    /// Recognize `line` as a token of this kind.
    ///
    /// Pure function of its inputs: returns `None` when the line does not match.
    pub fn tokenize(self, line: &str, rules: &CharacterRules) -> Option<Token> {
        match self {
            TokenKind::ShotInstruction => SHOT_INSTRUCTION_RE
                .captures(line)
                .map(|caps| Token::shot_instruction(&caps["instruction"])),
            TokenKind::SceneHeading => SCENE_HEADING_RE.captures(line).map(|caps| {
                Token::scene_heading(
                    &caps["location"],
                    caps.name("lighting").map_or("", |m| m.as_str()),
                )
            }),
            TokenKind::Action => Some(Token::action(line)),
            TokenKind::BlankLine => line.trim().is_empty().then_some(Token::BlankLine),
            TokenKind::Discardable => Some(Token::Discardable),
            TokenKind::Character => tokenize_character(line, rules),
            TokenKind::Parenthetical => PARENTHETICAL_RE
                .captures(line)
                .map(|caps| Token::parenthetical(&caps["indication"])),
            TokenKind::Dialog => Some(Token::dialog(line)),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown token kind {:?}", s))
    }
}

fn tokenize_character(line: &str, rules: &CharacterRules) -> Option<Token> {
    let caps = CHARACTER_RE.captures(line)?;
    let name = caps["name"].trim();
    if name.split_whitespace().count() > rules.word_limit {
        return None;
    }
    Some(Token::Character {
        name: rules.multiple_characters.apply(name),
    })
}

/// Find the character-name shaped spans inside an action line.
///
/// Characters are usually written in uppercase the first time they appear in
/// an action line ("HARLAN THROMBEY himself."). Props, sounds or effects are
/// highlighted the same way, so the result is only a candidate list. Unlike
/// cues, no extension is allowed and no word limit applies.
pub fn find_characters(line: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut from = 0;
    while let Some(m) = CONTAINS_CHARACTER_RE.find_at(line, from) {
        match settle_span(line, m.start(), m.end()) {
            Some(end) => {
                names.push(line[m.start()..end].trim().to_string());
                from = end;
            }
            None => {
                from = m.start()
                    + line[m.start()..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
            }
        }
    }
    names
}

/// Shorten a candidate span until it is not glued to a lowercase letter.
///
/// "THE FIXER walks" first matches "THE FIXER " which is followed by `w`;
/// the settled span is "THE FIXER". Returns `None` when no prefix of the span
/// is a valid name.
fn settle_span(line: &str, start: usize, mut end: usize) -> Option<usize> {
    loop {
        let glued = line[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase());
        if !glued && CHARACTER_SPAN_RE.is_match(&line[start..end]) {
            return Some(end);
        }
        end = line[start..end].char_indices().next_back()?.0 + start;
        if end == start {
            return None;
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A classified screenplay line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    ShotInstruction { instruction: String },
    SceneHeading { location: String, lighting_scenario: String },
    Action { content: String },
    BlankLine,
    Discardable,
    Character { name: String },
    Parenthetical { indication: String },
    Dialog { content: String },
}

impl Token {
    pub fn shot_instruction(instruction: &str) -> Self {
        Token::ShotInstruction {
            instruction: instruction.to_string(),
        }
    }

    /// Both parts are whitespace-normalized: "INT.    KITCHEN " becomes "INT. KITCHEN".
    pub fn scene_heading(location: &str, lighting_scenario: &str) -> Self {
        Token::SceneHeading {
            location: normalize_whitespace(location),
            lighting_scenario: normalize_whitespace(lighting_scenario),
        }
    }

    pub fn action(content: &str) -> Self {
        Token::Action {
            content: normalize_whitespace(content),
        }
    }

    pub fn character(name: &str) -> Self {
        Token::Character {
            name: name.to_string(),
        }
    }

    pub fn parenthetical(indication: &str) -> Self {
        Token::Parenthetical {
            indication: normalize_whitespace(indication),
        }
    }

    pub fn dialog(content: &str) -> Self {
        Token::Dialog {
            content: normalize_whitespace(content),
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::ShotInstruction { .. } => TokenKind::ShotInstruction,
            Token::SceneHeading { .. } => TokenKind::SceneHeading,
            Token::Action { .. } => TokenKind::Action,
            Token::BlankLine => TokenKind::BlankLine,
            Token::Discardable => TokenKind::Discardable,
            Token::Character { .. } => TokenKind::Character,
            Token::Parenthetical { .. } => TokenKind::Parenthetical,
            Token::Dialog { .. } => TokenKind::Dialog,
        }
    }

    /// Main text carried by the token (the location for scene headings).
    pub fn text(&self) -> &str {
        match self {
            Token::ShotInstruction { instruction } => instruction,
            Token::SceneHeading { location, .. } => location,
            Token::Action { content } | Token::Dialog { content } => content,
            Token::Character { name } => name,
            Token::Parenthetical { indication } => indication,
            Token::BlankLine | Token::Discardable => "",
        }
    }

    /// Combine two adjacent tokens of the same kind.
    ///
    /// Shot instructions are joined with a newline, actions and dialogs with a
    /// space. Every other kind is complete on its own line and refuses to merge.
    pub fn merge(self, other: Token) -> Result<Token, MergeError> {
        match (self, other) {
            (
                Token::ShotInstruction { instruction: left },
                Token::ShotInstruction { instruction: right },
            ) => Ok(Token::ShotInstruction {
                instruction: format!("{}\n{}", left, right),
            }),
            (Token::Action { content: left }, Token::Action { content: right }) => {
                Ok(Token::action(&format!("{} {}", left, right)))
            }
            (Token::Dialog { content: left }, Token::Dialog { content: right }) => {
                Ok(Token::dialog(&format!("{} {}", left, right)))
            }
            (left, right) if left.kind() == right.kind() => {
                Err(MergeError::NotMergeable(left.kind()))
            }
            (left, right) => Err(MergeError::DifferentKinds {
                left: left.kind(),
                right: right.kind(),
            }),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::SceneHeading {
                location,
                lighting_scenario,
            } => write!(f, "SceneHeading({} - {})", location, lighting_scenario),
            other => write!(f, "{}({})", other.kind(), other.text()),
        }
    }
}
