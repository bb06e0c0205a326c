//! Screenplay parser entry point.
//!
//! [`ScreenplayParser`] ties the stages together:
//!
//! 1. read the screenplay text (from a file or a string)
//! 2. tokenize it against the configured rule graph
//! 3. merge adjacent tokens and reclassify false character cues
//! 4. reduce the cleaned tokens into a [`Project`]
//! 5. export the project as JSON
//!
//! The rule graph and the sequence name template are built when the parser
//! is created, so configuration errors surface before any line is read. Each
//! call gets its own tokenizer: a parser can be used several times.

use crate::screenplay::config::ParserConfig;
use crate::screenplay::error::ParseError;
use crate::screenplay::postprocess::clean_tokens;
use crate::screenplay::project::Project;
use crate::screenplay::reducer::{reduce_tokens, SequenceNameTemplate, SequenceNamer};
use crate::screenplay::rules::RuleGraph;
use crate::screenplay::tokenizer::Tokenizer;
use crate::screenplay::tokens::Token;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub struct ScreenplayParser {
    name: String,
    text: String,
    config: ParserConfig,
    graph: RuleGraph,
    template: SequenceNameTemplate,
}

impl ScreenplayParser {
    /// Load a screenplay file. The project is named after the file stem.
    pub fn new(path: impl AsRef<Path>, config: ParserConfig) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_source(name, text, config)
    }

    /// Parser over text already in memory.
    pub fn from_source(
        name: impl Into<String>,
        text: impl Into<String>,
        config: ParserConfig,
    ) -> Result<Self, ParseError> {
        let name = name.into();
        let graph = match &config.rules_file {
            Some(path) => {
                debug!(path = %path.display(), "loading custom rules");
                RuleGraph::from_file(path)?
            }
            None => {
                debug!(rules = %config.rules, "loading built-in rules");
                RuleGraph::builtin(config.rules)?
            }
        };
        let template = SequenceNameTemplate::parse(&config.sequence.name_format)?;
        info!(
            project = %name,
            rules = %config.rules,
            nodes = graph.len(),
            "screenplay parser ready"
        );
        Ok(ScreenplayParser {
            name,
            text: text.into(),
            config,
            graph,
            template,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn rule_graph(&self) -> &RuleGraph {
        &self.graph
    }

    /// Raw token stream, before merging and reclassification.
    pub fn tokenize(&self) -> Result<Vec<Token>, ParseError> {
        info!(project = %self.name, "generating tokens");
        let tokenizer = Tokenizer::new(&self.graph, self.config.character_rules());
        Ok(tokenizer.tokenize(&self.text)?)
    }

    /// Token stream after both post-processing passes.
    pub fn tokens(&self) -> Result<Vec<Token>, ParseError> {
        Ok(clean_tokens(self.tokenize()?)?)
    }

    pub fn to_pmt_project(&self, keep_undefined_assets: bool) -> Result<Project, ParseError> {
        let tokens = self.tokens()?;
        info!(project = %self.name, tokens = tokens.len(), "parsing tokens");
        let mut namer = SequenceNamer::new(self.template.clone(), self.config.sequence.initial_count);
        Ok(reduce_tokens(
            &self.name,
            &tokens,
            &mut namer,
            keep_undefined_assets,
        ))
    }

    pub fn to_json(&self, keep_undefined_assets: bool) -> Result<String, ParseError> {
        Ok(self.to_pmt_project(keep_undefined_assets)?.to_json()?)
    }

    /// [`Self::to_pmt_project`] with `keep_undefined_assets` taken from the configuration.
    pub fn configured_project(&self) -> Result<Project, ParseError> {
        self.to_pmt_project(self.config.keep_undefined_assets)
    }

    /// [`Self::to_json`] with `keep_undefined_assets` taken from the configuration.
    pub fn configured_json(&self) -> Result<String, ParseError> {
        self.to_json(self.config.keep_undefined_assets)
    }
}
