//! Token Rule Graph
//!
//! The rule graph encodes which token kind may follow which. The tokenizer
//! keeps a cursor on one node and, for every line, tries the children of that
//! node in declaration order: the first child whose recognizer accepts the line
//! becomes the new cursor.
//!
//! The graph is cyclic ("an action may be followed by an action", "a dialog may
//! return to a character cue"), so nodes live in a flat arena and edges are
//! [`NodeId`] lists. A node is identified by its `(kind, name)` pair only.
//!
//! # Source format
//!
//! ```text
//! None, "Start"
//!     SceneHeading
//!         Action
//!             Action
//!             SceneHeading
//! ```
//!
//! One node per line, four spaces of indentation per level. The name defaults
//! to the kind name and must be given when a kind appears several times. A
//! `(kind, name)` pair seen earlier is a back-reference to that node; lines
//! nested under a back-reference add children to the referenced node. Blank
//! lines and `#` comments are ignored.

use crate::screenplay::error::RuleGraphError;
use crate::screenplay::tokens::TokenKind;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const INDENT_WIDTH: usize = 4;
const ROOT_NAME: &str = "Start";

/// Built-in grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokensRule {
    /// Works with a majority of scripts
    #[default]
    Default,
    /// Blank lines between a cue and its dialog do not end the dialog
    BlankLineNotDelimiter,
}

impl TokensRule {
    pub const ALL: [TokensRule; 2] = [TokensRule::Default, TokensRule::BlankLineNotDelimiter];

    pub fn as_str(self) -> &'static str {
        match self {
            TokensRule::Default => "default",
            TokensRule::BlankLineNotDelimiter => "blank_line_not_delimiter",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TokensRule::Default => "Blank lines end dialogs. Works with a majority of scripts.",
            TokensRule::BlankLineNotDelimiter => {
                "Blank lines between a character cue and its dialog are allowed."
            }
        }
    }

    /// Declarative source of the grammar.
    pub fn source(self) -> &'static str {
        match self {
            TokensRule::Default => include_str!("rules/default.rules"),
            TokensRule::BlankLineNotDelimiter => include_str!("rules/blank_line_not_delimiter.rules"),
        }
    }
}

impl fmt::Display for TokensRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokensRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokensRule::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| format!("unknown token parsing rules {:?}", s))
    }
}

/// Index of a node inside its [`RuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A rule node: a token kind (none for the root), a name and ordered successors.
#[derive(Debug, Clone)]
pub struct RuleNode {
    kind: Option<TokenKind>,
    name: String,
    children: Vec<NodeId>,
}

impl RuleNode {
    pub fn kind(&self) -> Option<TokenKind> {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Kind name used in diagnostics, `None` for the root.
    pub fn kind_name(&self) -> &'static str {
        self.kind.map_or("None", TokenKind::name)
    }
}

// Identity is (kind, name); children are left out since the graph is cyclic.
impl PartialEq for RuleNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for RuleNode {}

/// Immutable, cycle-friendly graph of token rules.
#[derive(Debug, Clone)]
pub struct RuleGraph {
    nodes: Vec<RuleNode>,
    index: HashMap<(Option<TokenKind>, String), NodeId>,
}

impl RuleGraph {
    /// Build the graph of a built-in grammar.
    pub fn builtin(rule: TokensRule) -> Result<Self, RuleGraphError> {
        Self::parse(rule.source())
    }

    /// Build the graph described in a rules file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RuleGraphError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| RuleGraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    /// Build the graph from its declarative source.
    pub fn parse(source: &str) -> Result<Self, RuleGraphError> {
        let mut lines = source
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(_, line)| {
                let content = line.trim();
                !content.is_empty() && !content.starts_with('#')
            });

        let (root_line, root_text) = lines.next().ok_or(RuleGraphError::Empty)?;
        if indentation(root_line, root_text)? != 0 {
            return Err(RuleGraphError::IndentedRoot { line: root_line });
        }
        let (root_kind, root_name) = parse_entry(root_line, root_text.trim())?;

        let mut graph = RuleGraph {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        let root = graph.insert(root_kind, root_name.unwrap_or_else(|| ROOT_NAME.to_string()));

        // stack[depth] is the node most recently declared at that depth
        let mut stack = vec![root];
        for (line_number, text) in lines {
            let depth = indentation(line_number, text)? / INDENT_WIDTH;
            if depth == 0 {
                return Err(RuleGraphError::SecondRoot { line: line_number });
            }
            if depth > stack.len() {
                return Err(RuleGraphError::IndentationJump {
                    line: line_number,
                    from: stack.len() - 1,
                    to: depth,
                });
            }
            stack.truncate(depth);
            let parent = stack[depth - 1];

            let (kind, name) = parse_entry(line_number, text.trim())?;
            let kind = kind.ok_or(RuleGraphError::MisplacedNone { line: line_number })?;
            let name = name.unwrap_or_else(|| kind.name().to_string());

            let id = match graph.find(Some(kind), &name) {
                Some(existing) => existing,
                None => graph.insert(Some(kind), name),
            };
            let siblings = &mut graph.nodes[parent.0].children;
            if !siblings.contains(&id) {
                siblings.push(id);
            }
            stack.push(id);
        }

        Ok(graph)
    }

    fn insert(&mut self, kind: Option<TokenKind>, name: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert((kind, name.clone()), id);
        self.nodes.push(RuleNode {
            kind,
            name,
            children: Vec::new(),
        });
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &RuleNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Look a node up by identity.
    pub fn find(&self, kind: Option<TokenKind>, name: &str) -> Option<NodeId> {
        self.index.get(&(kind, name.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        depth: usize,
        printed: &mut HashSet<NodeId>,
    ) -> fmt::Result {
        let node = self.node(id);
        let pad = " ".repeat(depth * INDENT_WIDTH);
        if !printed.insert(id) {
            return writeln!(f, "{}Ref to {} {}", pad, node.kind_name(), node.name);
        }
        writeln!(f, "{}{}, {}", pad, node.kind_name(), node.name)?;
        for child in &node.children {
            self.fmt_node(f, *child, depth + 1, printed)?;
        }
        Ok(())
    }
}

impl fmt::Display for RuleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printed = HashSet::new();
        self.fmt_node(f, self.root(), 0, &mut printed)
    }
}

fn indentation(line_number: usize, text: &str) -> Result<usize, RuleGraphError> {
    let indent = text.len() - text.trim_start_matches(' ').len();
    if indent % INDENT_WIDTH != 0 || text[indent..].starts_with(char::is_whitespace) {
        return Err(RuleGraphError::BadIndentation {
            line: line_number,
            indent,
        });
    }
    Ok(indent)
}

/// Parse `Kind` or `Kind, "Name"`. `None` stands for "no token kind".
fn parse_entry(
    line_number: usize,
    entry: &str,
) -> Result<(Option<TokenKind>, Option<String>), RuleGraphError> {
    let (kind_text, name_text) = match entry.split_once(',') {
        Some((kind, name)) => (kind.trim(), Some(name.trim())),
        None => (entry, None),
    };

    let kind = match kind_text {
        "None" => None,
        other => Some(other.parse::<TokenKind>().map_err(|_| RuleGraphError::UnknownKind {
            line: line_number,
            kind: other.to_string(),
        })?),
    };

    let name = match name_text {
        None => None,
        Some(quoted) => {
            let inner = quoted
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .filter(|inner| !inner.is_empty() && !inner.contains('"'))
                .ok_or_else(|| RuleGraphError::MalformedName {
                    line: line_number,
                    name: quoted.to_string(),
                })?;
            Some(inner.to_string())
        }
    };

    Ok((kind, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(graph: &RuleGraph, id: NodeId) -> Vec<String> {
        graph
            .children(id)
            .iter()
            .map(|child| graph.node(*child).name().to_string())
            .collect()
    }

    const REFERENCES: &str = "\
None, \"Start\"
    BlankLine
        ShotInstruction
    ShotInstruction
        BlankLine
";

    #[test]
    fn test_back_references_point_to_the_same_node() {
        let graph = RuleGraph::parse(REFERENCES).unwrap();
        let blank = graph.find(Some(TokenKind::BlankLine), "BlankLine").unwrap();
        let shot = graph.find(Some(TokenKind::ShotInstruction), "ShotInstruction").unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.children(graph.root()), &[blank, shot]);
        assert_eq!(graph.children(blank), &[shot]);
        assert_eq!(graph.children(shot), &[blank]);
    }

    #[test]
    fn test_node_identity_ignores_children() {
        let graph = RuleGraph::parse(REFERENCES).unwrap();
        let other = RuleGraph::parse("None, \"Start\"\n    BlankLine\n").unwrap();
        let blank = graph.find(Some(TokenKind::BlankLine), "BlankLine").unwrap();
        let other_blank = other.find(Some(TokenKind::BlankLine), "BlankLine").unwrap();
        assert_eq!(graph.node(blank), other.node(other_blank));
        assert_ne!(graph.node(blank), graph.node(graph.root()));
    }

    #[test]
    fn test_default_grammar() {
        let graph = RuleGraph::builtin(TokensRule::Default).unwrap();
        let root = graph.node(graph.root());
        assert_eq!(root.kind(), None);
        assert_eq!(root.name(), "Start");
        assert_eq!(
            names(&graph, graph.root()),
            vec!["Start BlankLine", "Start ShotInstruction", "SceneHeading", "Discardable"]
        );

        let character = graph.find(Some(TokenKind::Character), "Character").unwrap();
        assert_eq!(
            names(&graph, character),
            vec!["Parenthetical", "Character BlankLine", "Dialog"]
        );

        let action = graph.find(Some(TokenKind::Action), "Action").unwrap();
        assert!(graph.children(action).contains(&action));

        let dialog = graph.find(Some(TokenKind::Dialog), "Dialog").unwrap();
        assert!(graph.children(dialog).contains(&character));
    }

    #[test]
    fn test_every_builtin_grammar_parses() {
        for rule in TokensRule::ALL {
            let graph = RuleGraph::builtin(rule).unwrap();
            for kind in TokenKind::ALL {
                assert!(
                    (0..graph.len()).any(|idx| graph.node(NodeId(idx)).kind() == Some(kind)),
                    "{} grammar has no {} node",
                    rule,
                    kind
                );
            }
        }
    }

    #[test]
    fn test_children_under_a_reference_extend_the_node() {
        let source = "\
None, \"Start\"
    SceneHeading
        Action
    Action
        Action
        SceneHeading
";
        let graph = RuleGraph::parse(source).unwrap();
        let action = graph.find(Some(TokenKind::Action), "Action").unwrap();
        assert_eq!(names(&graph, action), vec!["Action", "SceneHeading"]);
        assert_eq!(names(&graph, graph.root()), vec!["SceneHeading", "Action"]);
    }

    #[test]
    fn test_display_marks_references() {
        let graph = RuleGraph::parse(REFERENCES).unwrap();
        assert_eq!(
            graph.to_string(),
            "\
None, Start
    BlankLine, BlankLine
        ShotInstruction, ShotInstruction
            Ref to BlankLine BlankLine
    Ref to ShotInstruction ShotInstruction
"
        );
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let graph = RuleGraph::parse("# grammar\n\nNone, \"Start\"\n\n    # start\n    Action\n").unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(RuleGraph::parse(""), Err(RuleGraphError::Empty)));
        assert!(matches!(
            RuleGraph::parse("    None, \"Start\""),
            Err(RuleGraphError::IndentedRoot { line: 1 })
        ));
        assert!(matches!(
            RuleGraph::parse("None, \"Start\"\nAction"),
            Err(RuleGraphError::SecondRoot { line: 2 })
        ));
        assert!(matches!(
            RuleGraph::parse("None, \"Start\"\n  Action"),
            Err(RuleGraphError::BadIndentation { line: 2, indent: 2 })
        ));
        assert!(matches!(
            RuleGraph::parse("None, \"Start\"\n        Action"),
            Err(RuleGraphError::IndentationJump { line: 2, from: 0, to: 2 })
        ));
        assert!(matches!(
            RuleGraph::parse("None, \"Start\"\n    Narration"),
            Err(RuleGraphError::UnknownKind { line: 2, .. })
        ));
        assert!(matches!(
            RuleGraph::parse("None, \"Start\"\n    Action, Scene Action"),
            Err(RuleGraphError::MalformedName { line: 2, .. })
        ));
        assert!(matches!(
            RuleGraph::parse("None, \"Start\"\n    None"),
            Err(RuleGraphError::MisplacedNone { line: 2 })
        ));
        assert!(matches!(
            RuleGraph::from_file("/nonexistent/grammar.rules"),
            Err(RuleGraphError::Io { .. })
        ));
    }

    #[test]
    fn test_tokens_rule_from_str() {
        for rule in TokensRule::ALL {
            assert_eq!(rule.as_str().parse::<TokensRule>(), Ok(rule));
        }
        assert!("strict".parse::<TokensRule>().is_err());
    }
}
