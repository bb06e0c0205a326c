//! Parser configuration.
//!
//! Every setting has a value in `defaults/screenplay.default.toml`, which is
//! compiled into the crate: a user file only needs the keys it changes.
//! [`ParserConfig::default`] returns the same values as that file.
//!
//! A configuration belongs to one parser: two parsers with different
//! policies can run side by side.

use crate::screenplay::reducer::{
    SequenceNameTemplate, DEFAULT_SEQUENCE_INITIAL_COUNT, DEFAULT_SEQUENCE_NAME_FORMAT,
};
use crate::screenplay::rules::TokensRule;
use crate::screenplay::tokens::{
    CharacterRules, MultipleCharactersSpeaking, CHARACTER_NAME_WORDS_LIMIT,
};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../../defaults/screenplay.default.toml");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParserConfig {
    pub multiple_characters: MultipleCharactersSpeaking,
    pub rules: TokensRule,
    /// Custom grammar, used instead of `rules` when set
    #[serde(default)]
    pub rules_file: Option<PathBuf>,
    pub character_name_word_limit: usize,
    pub keep_undefined_assets: bool,
    pub sequence: SequenceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SequenceConfig {
    pub initial_count: u32,
    pub name_format: String,
}

impl ParserConfig {
    pub fn character_rules(&self) -> CharacterRules {
        CharacterRules {
            multiple_characters: self.multiple_characters,
            word_limit: self.character_name_word_limit,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            multiple_characters: MultipleCharactersSpeaking::default(),
            rules: TokensRule::default(),
            rules_file: None,
            character_name_word_limit: CHARACTER_NAME_WORDS_LIMIT,
            keep_undefined_assets: false,
            sequence: SequenceConfig::default(),
        }
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        SequenceConfig {
            initial_count: DEFAULT_SEQUENCE_INITIAL_COUNT,
            name_format: DEFAULT_SEQUENCE_NAME_FORMAT.to_string(),
        }
    }
}

/// Builds a [`ParserConfig`] from stacked TOML sources.
///
/// Sources apply in the order they are added, after the embedded defaults:
/// a project-wide file, then a per-script file, then command-line flags. A
/// later `rules_file` replaces an earlier one, and a `[sequence]` table only
/// overrides the keys it names.
#[derive(Debug, Clone)]
pub struct Loader {
    layers: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let layers =
            Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Loader { layers }
    }

    /// Add a TOML file that must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Add a TOML file that is skipped when absent, such as a per-user file.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.layers = self.layers.add_source(source);
        self
    }

    /// Set one dotted key (`rules`, `sequence.initial_count`) above every file.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.layers = self.layers.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers into a [`ParserConfig`].
    ///
    /// Unknown policies or grammar names fail here, and so does a
    /// `sequence.name_format` without a usable `{count}` placeholder.
    pub fn build(self) -> Result<ParserConfig, ConfigError> {
        let config: ParserConfig = self.layers.build()?.try_deserialize()?;
        SequenceNameTemplate::parse(&config.sequence.name_format)
            .map_err(|err| ConfigError::Message(format!("sequence.name_format: {}", err)))?;
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone.
pub fn load_defaults() -> Result<ParserConfig, ConfigError> {
    Loader::new().build()
}
