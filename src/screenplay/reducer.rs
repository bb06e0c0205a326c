//! Project Reduction
//!
//! Folds a cleaned token stream into a [`Project`]:
//!
//! 1. Everything up to and including the first scene heading is front matter
//!    and is skipped. Without any scene heading the project stays empty.
//! 2. Each scene heading opens a new [`Sequence`], named by a [`SequenceNamer`].
//! 3. Character cues cast a confirmed character in the current sequence.
//!    Uppercase spans found in action lines are cast as provisional characters.
//! 4. Once the walk is over, provisional characters never confirmed by a cue
//!    anywhere in the script are removed, or demoted to `undefined` assets.
//!
//! Provisional assets are created eagerly because an uppercase span in an
//! action line can only be told apart from a prop or a sound once the whole
//! script has been read.

use crate::screenplay::error::TemplateError;
use crate::screenplay::project::{Asset, AssetType, Project, Sequence};
use crate::screenplay::tokens::{find_characters, Token, TokenKind};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_SEQUENCE_NAME_FORMAT: &str = "{count:03}0";
pub const DEFAULT_SEQUENCE_INITIAL_COUNT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Count { width: usize, zero_pad: bool },
}

/// A sequence name format such as `"{count:03}0"` or `"SEQ_{count}"`.
///
/// The only placeholder is `count`, with an optional width (`{count:3}`) and
/// zero padding (`{count:03}`). Braces are escaped by doubling them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceNameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl SequenceNameTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(TemplateError::UnbalancedBraces(template.to_string()))
                            }
                            Some(other) => placeholder.push(other),
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(template, &placeholder)?);
                }
                '}' => return Err(TemplateError::UnbalancedBraces(template.to_string())),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments
            .iter()
            .any(|segment| matches!(segment, Segment::Count { .. }))
        {
            return Err(TemplateError::MissingCount(template.to_string()));
        }

        Ok(SequenceNameTemplate {
            source: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(&self, count: u32) -> String {
        let mut name = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => name.push_str(text),
                Segment::Count {
                    width,
                    zero_pad: true,
                } => name.push_str(&format!("{:0width$}", count, width = *width)),
                Segment::Count {
                    width,
                    zero_pad: false,
                } => name.push_str(&format!("{:width$}", count, width = *width)),
            }
        }
        name
    }
}

fn parse_placeholder(template: &str, placeholder: &str) -> Result<Segment, TemplateError> {
    let (key, format) = match placeholder.split_once(':') {
        Some((key, format)) => (key, format),
        None => (placeholder, ""),
    };
    if key != "count" {
        return Err(TemplateError::UnknownPlaceholder {
            template: template.to_string(),
            placeholder: placeholder.to_string(),
        });
    }
    if format.is_empty() {
        return Ok(Segment::Count {
            width: 0,
            zero_pad: false,
        });
    }

    let (zero_pad, width) = match format.strip_prefix('0') {
        Some(width) => (true, width),
        None => (false, format),
    };
    let invalid_width = || TemplateError::InvalidWidth {
        template: template.to_string(),
        width: format.to_string(),
    };
    if width.is_empty() || !width.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_width());
    }
    let width = width.parse::<usize>().map_err(|_| invalid_width())?;
    Ok(Segment::Count { width, zero_pad })
}

impl Default for SequenceNameTemplate {
    fn default() -> Self {
        SequenceNameTemplate {
            source: DEFAULT_SEQUENCE_NAME_FORMAT.to_string(),
            segments: vec![
                Segment::Count {
                    width: 3,
                    zero_pad: true,
                },
                Segment::Literal("0".to_string()),
            ],
        }
    }
}

impl FromStr for SequenceNameTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SequenceNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Running sequence counter of one reduction.
#[derive(Debug, Clone)]
pub struct SequenceNamer {
    template: SequenceNameTemplate,
    next: u32,
}

impl SequenceNamer {
    pub fn new(template: SequenceNameTemplate, initial_count: u32) -> Self {
        SequenceNamer {
            template,
            next: initial_count,
        }
    }

    pub fn next_name(&mut self) -> String {
        let name = self.template.render(self.next);
        self.next = self.next.saturating_add(1);
        name
    }
}

impl Default for SequenceNamer {
    fn default() -> Self {
        SequenceNamer::new(SequenceNameTemplate::default(), DEFAULT_SEQUENCE_INITIAL_COUNT)
    }
}

/// Build the project of a cleaned token stream.
pub fn reduce_tokens(
    project_name: &str,
    tokens: &[Token],
    namer: &mut SequenceNamer,
    keep_undefined_assets: bool,
) -> Project {
    let mut project = Project::new(project_name);

    let mut body = tokens
        .iter()
        .skip_while(|token| token.kind() != TokenKind::SceneHeading);
    if body.next().is_none() {
        debug!(project = project_name, "no scene heading, project is empty");
        return project;
    }
    project.add_sequence(Sequence::new(namer.next_name()));

    let mut confirmed: HashSet<&str> = HashSet::new();
    for token in body {
        match token {
            Token::Character { name } => {
                confirmed.insert(name.as_str());
                project.cast(Asset::character(name.as_str()));
            }
            Token::Action { content } => {
                for name in find_characters(content) {
                    project.cast(Asset::character(name));
                }
            }
            Token::SceneHeading { .. } => project.add_sequence(Sequence::new(namer.next_name())),
            _ => {}
        }
    }

    resolve_unconfirmed_characters(&mut project, &confirmed, keep_undefined_assets);
    project
}

/// Remove or demote the characters that never had a cue of their own.
fn resolve_unconfirmed_characters(
    project: &mut Project,
    confirmed: &HashSet<&str>,
    keep_undefined_assets: bool,
) {
    let mut unconfirmed: BTreeSet<Asset> = BTreeSet::new();
    for sequence in project.sequences_mut() {
        let demoted: Vec<Asset> = sequence
            .assets
            .iter()
            .filter(|asset| {
                asset.asset_type == AssetType::Character && !confirmed.contains(asset.name.as_str())
            })
            .cloned()
            .collect();
        for asset in demoted {
            sequence.assets.remove(&asset);
            if keep_undefined_assets {
                sequence.assets.insert(Asset::undefined(asset.name.as_str()));
            }
            unconfirmed.insert(asset);
        }
    }

    for asset in unconfirmed {
        project.remove_asset(&asset);
        if keep_undefined_assets {
            warn!(asset = %asset.name, "character never has a cue, kept as undefined asset");
            project.add_asset(Asset::undefined(asset.name));
        } else {
            debug!(asset = %asset.name, "character never has a cue, dropped");
        }
    }
}
