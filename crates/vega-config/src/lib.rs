//! Configuration for the Vega language server core.
//!
//! Configuration is read from a TOML document (usually `vega.toml` at the
//! workspace root) or from the JSON `initializationOptions` of the client:
//!
//! ```toml
//! [logging]
//! level = "debug"
//! json = false
//!
//! [code_actions]
//! disabled_kinds = ["refactor.inline.call"]
//! resolve_edits = true
//!
//! [add_test]
//! prefer_constructor = true
//! ```
//!
//! Every field has a default, so an empty document is a valid configuration.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::prelude::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {message}")]
    Toml { message: String },
    #[error("invalid initialization options: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` includes a source snippet; the bare message is enough for clients.
        ConfigError::Toml {
            message: err.message().to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct VegaConfig {
    /// Global logging settings for Vega crates.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Code-action orchestration settings.
    #[serde(default)]
    pub code_actions: CodeActionsConfig,

    /// Settings for the "Add test" source action.
    #[serde(default)]
    pub add_test: AddTestConfig,
}

impl VegaConfig {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    /// Parse the `initializationOptions` payload sent by the client.
    ///
    /// `null` (no options) yields the default configuration.
    pub fn from_initialization_options(value: &serde_json::Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(VegaConfig)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level for all Vega crates: a simple level (`info`, `debug`, ...)
    /// or a full `tracing_subscriber::EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Mirror logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Create the effective `EnvFilter` for Vega tracing. `RUST_LOG`, when set,
    /// is merged into the configured directives.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);
        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

/// Install a global `tracing` subscriber for `config`.
///
/// Returns `false` when a global subscriber was already installed (for
/// example by an embedding process or a previous call).
pub fn init_tracing(config: &LoggingConfig) -> bool {
    if !config.stderr {
        return false;
    }
    let filter = config.env_filter();
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.is_ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CodeActionsConfig {
    /// Code-action kinds (or kind prefixes such as `refactor.inline`) that are never produced.
    #[serde(default)]
    pub disabled_kinds: Vec<String>,

    /// Return command-style actions with `data` for `codeAction/resolve`
    /// instead of `command` payloads, when the client supports it.
    #[serde(default = "CodeActionsConfig::default_resolve_edits")]
    pub resolve_edits: bool,

    /// Offer "Inline call" even for automatically triggered requests on an empty selection.
    #[serde(default)]
    pub inline_call_on_cursor: bool,
}

impl CodeActionsConfig {
    fn default_resolve_edits() -> bool {
        true
    }

    /// Whether `kind` is disabled, either exactly or through a disabled prefix.
    pub fn is_disabled(&self, kind: &str) -> bool {
        self.disabled_kinds.iter().any(|disabled| {
            kind == disabled
                || (kind.starts_with(disabled.as_str())
                    && kind.as_bytes().get(disabled.len()) == Some(&b'.'))
        })
    }
}

impl Default for CodeActionsConfig {
    fn default() -> Self {
        Self {
            disabled_kinds: Vec::new(),
            resolve_edits: Self::default_resolve_edits(),
            inline_call_on_cursor: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddTestConfig {
    /// Construct the receiver through a discoverable `New<Type>` constructor.
    #[serde(default = "AddTestConfig::default_prefer_constructor")]
    pub prefer_constructor: bool,
}

impl AddTestConfig {
    fn default_prefer_constructor() -> bool {
        true
    }
}

impl Default for AddTestConfig {
    fn default() -> Self {
        Self {
            prefer_constructor: Self::default_prefer_constructor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(VegaConfig::load_from_str("").unwrap(), VegaConfig::default());
    }

    #[test]
    fn parses_code_action_section() {
        let config = VegaConfig::load_from_str(
            r#"
[code_actions]
disabled_kinds = ["refactor.inline"]
resolve_edits = false
"#,
        )
        .unwrap();
        assert!(!config.code_actions.resolve_edits);
        assert!(config.code_actions.is_disabled("refactor.inline"));
        assert!(config.code_actions.is_disabled("refactor.inline.call"));
        assert!(!config.code_actions.is_disabled("refactor.inlineish"));
        assert!(!config.code_actions.is_disabled("refactor.extract"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = VegaConfig::load_from_str("[code_actions]\nbogus = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn level_synonyms_are_normalized() {
        assert_eq!(LoggingConfig::normalize_level_directives(" WARNING "), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
        assert_eq!(
            LoggingConfig::normalize_level_directives("vega_refactor=trace"),
            "vega_refactor=trace"
        );
    }

    #[test]
    fn loads_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vega.toml");
        std::fs::write(&path, "[add_test]\nprefer_constructor = false\n").unwrap();
        let config = VegaConfig::load_from_path(&path).unwrap();
        assert!(!config.add_test.prefer_constructor);
    }

    #[test]
    fn null_initialization_options_are_default() {
        let config = VegaConfig::from_initialization_options(&serde_json::Value::Null).unwrap();
        assert_eq!(config, VegaConfig::default());
    }

    #[test]
    fn schema_lists_every_section() {
        let schema = serde_json::to_value(VegaConfig::json_schema()).unwrap();
        let properties = &schema["properties"];
        for section in ["logging", "code_actions", "add_test"] {
            assert!(properties.get(section).is_some(), "missing {section}");
        }
    }

    #[test]
    fn silent_logging_installs_nothing() {
        let config = LoggingConfig {
            stderr: false,
            ..LoggingConfig::default()
        };
        assert!(!init_tracing(&config));
    }
}
