use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::files::{Dependencies, Files};

/// Environment template the bundler uses to pick its transpiler preset.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    /// Zero-config parcel setup.
    Parcel,
    /// React via create-react-app.
    CreateReactApp,
    /// React + TypeScript via create-react-app.
    CreateReactAppTypescript,
    /// Vue via vue-cli.
    VueCli,
    /// Angular via angular-cli.
    AngularCli,
    /// Preact via preact-cli.
    PreactCli,
    /// Svelte.
    Svelte,
    /// Static HTML, no transpilation.
    Static,
}

impl Template {
    /// Wire name sent to the bundler.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parcel => "parcel",
            Self::CreateReactApp => "create-react-app",
            Self::CreateReactAppTypescript => "create-react-app-typescript",
            Self::VueCli => "vue-cli",
            Self::AngularCli => "angular-cli",
            Self::PreactCli => "preact-cli",
            Self::Svelte => "svelte",
            Self::Static => "static",
        }
    }
}

/// What the bundler should render: the file set plus the render
/// configuration that travels with it on every update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct SandboxSetup {
    /// Complete file set, always including `/package.json`.
    pub files: Files,
    /// Entry path, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// npm dependencies, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Dependencies>,
    /// Environment template, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
}
