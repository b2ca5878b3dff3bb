//! Provider configuration with TOML preset support.
//!
//! [`ProviderConfig`] holds every data property of the embedding surface:
//! the file set, navigation defaults, entry, dependencies, bundler URL and
//! flags. Callbacks (file resolver, change callback) are attached to the
//! [`Provider`](crate::provider::Provider) directly since they cannot be
//! serialized.

mod client;
mod setup;

use std::path::Path;

pub use client::{ClientOptions, FileResolver};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use setup::{SandboxSetup, Template};

use crate::error::PreviewError;
use crate::files::{Dependencies, Files};

/// Bundler used when the configuration does not name one.
pub const DEFAULT_BUNDLER_URL: &str = "https://sandpack.codesandbox.io/";

/// Path shown in the live preview when none is configured.
pub const DEFAULT_BROWSER_PATH: &str = "/";

/// Data properties of a provider. All fields use `#[serde(default)]` so
/// partial TOML files work.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(default)]
pub struct ProviderConfig {
    /// Initial file set.
    pub files: Files,
    /// Path shown in the live preview at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_path: Option<String>,
    /// File open in editor views at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_path: Option<String>,
    /// Entry path used to synthesize `/package.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// npm dependencies used to synthesize `/package.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Dependencies>,
    /// Bundler page URL; [`DEFAULT_BUNDLER_URL`] when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundler_url: Option<String>,
    /// Transpile without evaluating.
    pub skip_eval: bool,
    /// Environment template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
}

impl ProviderConfig {
    /// Generate JSON Schema describing the configuration.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ProviderConfig)
    }

    /// Parse a configuration from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`PreviewError::OptionsParse`] on malformed TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, PreviewError> {
        toml::from_str(content)
            .map_err(|e| PreviewError::OptionsParse(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// I/O or parse failure.
    pub fn load(path: &Path) -> Result<Self, PreviewError> {
        let content = std::fs::read_to_string(path).map_err(PreviewError::Io)?;
        let config = Self::from_toml_str(&content)?;
        log::info!(
            "Loaded preview config '{}' ({} files)",
            path.display(),
            config.files.len()
        );
        Ok(config)
    }

    /// Save the configuration to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Serialization or I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), PreviewError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PreviewError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(PreviewError::Io)?;
        }
        std::fs::write(path, content).map_err(PreviewError::Io)
    }

    /// Bundler URL with the default applied.
    #[must_use]
    pub fn resolved_bundler_url(&self) -> &str {
        self.bundler_url.as_deref().unwrap_or(DEFAULT_BUNDLER_URL)
    }

    /// Whether any input that feeds the rendered file set differs.
    #[must_use]
    pub fn render_inputs_differ(&self, other: &Self) -> bool {
        self.files != other.files
            || self.dependencies != other.dependencies
            || self.entry != other.entry
            || self.template != other.template
    }
}
