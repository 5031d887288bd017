//! Shared configuration loader for the larkdoc converter.
//!
//! `defaults/larkdoc.default.toml` is embedded into every build so that docs and
//! runtime behavior stay in sync. Hosts stack their own sources on top with
//! [`Loader`]: files, TOML blobs stored next to a document, `LARKDOC_*`
//! environment variables and single-key overrides, later layers winning. The
//! `[convert]` table deserializes straight into [`ConvertOptions`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, Map, ValueKind};
use larkdoc_babel::ConvertOptions;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/larkdoc.default.toml");

/// Prefix of environment overrides, e.g. `LARKDOC_CONVERT__EXPAND_MENTIONS=true`.
pub const ENV_PREFIX: &str = "LARKDOC";

/// Top-level configuration consumed by larkdoc hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LarkdocConfig {
    #[serde(default)]
    pub convert: ConvertOptions,
}

impl LarkdocConfig {
    /// Reject values the converter cannot use.
    fn validate(&self) -> Result<(), ConfigError> {
        let scheme = &self.convert.uri_scheme;
        if !is_uri_scheme(scheme) {
            return Err(ConfigError::Message(format!(
                "convert.uri_scheme {scheme:?} is not a valid URI scheme"
            )));
        }
        if self.convert.download_images && self.convert.image_dir.trim().is_empty() {
            return Err(ConfigError::Message(
                "convert.image_dir must be set when convert.download_images is on".to_string(),
            ));
        }
        Ok(())
    }
}

/// RFC 3986: a letter followed by letters, digits, `+`, `-` or `.`.
fn is_uri_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn environment(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(vars)
}

/// Layers configuration sources over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file. Missing files trigger an error.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.file(path.as_ref(), true)
    }

    /// Layer a TOML file if it exists, e.g. a per-user settings file.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.file(path.as_ref(), false)
    }

    fn file(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer TOML text, e.g. settings stored alongside a document.
    pub fn with_toml(mut self, toml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    /// Layer `LARKDOC_*` variables from the process environment. Nested keys
    /// use `__`: `LARKDOC_CONVERT__URI_SCHEME=feishu`.
    pub fn with_env(mut self) -> Self {
        self.builder = self.builder.add_source(environment(None));
        self
    }

    /// Layer `LARKDOC_*` variables from an explicit map instead of the process
    /// environment.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.builder = self.builder.add_source(environment(Some(vars)));
        self
    }

    /// Apply a single key/value override (e.g. `convert.expand_mentions`).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Pin the document the converted blocks belong to.
    pub fn for_document(self, document_id: &str) -> Result<Self, ConfigError> {
        self.set_override("convert.document_id", document_id)
    }

    /// Merge every layer, deserialize and validate.
    pub fn build(self) -> Result<LarkdocConfig, ConfigError> {
        let config: LarkdocConfig = self.builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Shortcut for hosts that only need the conversion options.
    pub fn options(self) -> Result<ConvertOptions, ConfigError> {
        self.build().map(|config| config.convert)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<LarkdocConfig, ConfigError> {
    Loader::new().build()
}
