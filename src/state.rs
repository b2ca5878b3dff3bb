//! Store contents: what the bundler last reported plus navigation state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::files::Files;

/// Bundler lifecycle status, as reported on the channel.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash,
)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Frame loaded, bundler not yet ready.
    #[default]
    Initializing,
    /// Fetching npm dependencies.
    InstallingDependencies,
    /// Transpiling modules.
    Transpiling,
    /// Evaluating the bundle.
    Evaluating,
    /// Running a test suite.
    RunningTests,
    /// Nothing in flight.
    Idle,
}

impl Status {
    /// Parse a wire status. Unknown values yield `None`.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "initializing" => Some(Self::Initializing),
            "installing-dependencies" => Some(Self::InstallingDependencies),
            "transpiling" => Some(Self::Transpiling),
            "evaluating" => Some(Self::Evaluating),
            "running-tests" => Some(Self::RunningTests),
            "idle" => Some(Self::Idle),
            _ => None,
        }
    }

    /// Whether the preview is settled.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// One compile or runtime error reported by the bundler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ModuleError {
    /// Short headline (e.g. `"SyntaxError"`).
    pub title: String,
    /// Path of the module the error points into.
    pub path: String,
    /// Full message.
    pub message: String,
    /// 1-based line, 0 when unknown.
    pub line: u32,
    /// 1-based column, 0 when unknown.
    pub column: u32,
}

/// Opaque bundler manager snapshot, kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct ManagerState(pub Value);

/// Where the preview and the editor currently point. The two paths are
/// independent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavigationState {
    /// Path shown in the live preview.
    pub browser_path: String,
    /// Path open in editor views.
    pub opened_path: String,
}

/// Everything the provider renders from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreviewState {
    /// Current file set.
    pub files: Files,
    /// Navigation paths.
    pub paths: NavigationState,
    /// Errors since the last build start, in arrival order.
    pub errors: Vec<ModuleError>,
    /// Last manager snapshot.
    pub manager_state: Option<ManagerState>,
    /// Last reported status.
    pub status: Status,
}

impl PreviewState {
    /// Fresh state for a file set and navigation defaults.
    #[must_use]
    pub fn new(files: Files, paths: NavigationState) -> Self {
        Self {
            files,
            paths,
            errors: Vec::new(),
            manager_state: None,
            status: Status::default(),
        }
    }

    /// Code of the file open in editor views.
    #[must_use]
    pub fn opened_code(&self) -> Option<&str> {
        self.files
            .get(&self.paths.opened_path)
            .map(|f| f.code.as_str())
    }
}
