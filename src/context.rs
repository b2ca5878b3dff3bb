//! What descendants of a provider see.
//!
//! A [`PreviewContext`] is a read-only snapshot of the store plus the
//! engine handle and resolved bundler URL. Consumers reach it three ways,
//! all built from the same store on demand:
//!
//! - [`Provider::subscribe`]: called with a fresh snapshot after every
//!   state change.
//! - [`Provider::consume`]: a closure gets the snapshot and the
//!   [`PreviewActions`] in one call.
//! - [`with_preview`]: bundles a snapshot next to caller-owned props, for
//!   code that takes its dependencies as plain arguments.

use std::fmt;
use std::rc::Rc;

use crate::engine::BundlerEngine;
use crate::error::PreviewError;
use crate::files::{Files, SandboxFile};
use crate::provider::{Provider, TranspilerContextRequest};
use crate::state::{ManagerState, ModuleError, NavigationState, Status};

/// Snapshot of provider state.
#[derive(Clone)]
pub struct PreviewContext {
    /// Current file set.
    pub files: Files,
    /// Navigation paths.
    pub paths: NavigationState,
    /// Errors since the last build start.
    pub errors: Vec<ModuleError>,
    /// Last manager snapshot.
    pub manager_state: Option<ManagerState>,
    /// Last reported status.
    pub status: Status,
    /// Engine handle, once the frame is mounted.
    pub engine: Option<Rc<dyn BundlerEngine>>,
    /// Bundler URL with defaults applied.
    pub bundler_url: String,
}

impl PreviewContext {
    /// The file open in editor views.
    #[must_use]
    pub fn opened_file(&self) -> Option<&SandboxFile> {
        self.files.get(&self.paths.opened_path)
    }

    /// Whether an engine is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.engine.is_some()
    }
}

impl fmt::Debug for PreviewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewContext")
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .field("paths", &self.paths)
            .field("errors", &self.errors)
            .field("status", &self.status)
            .field("mounted", &self.is_mounted())
            .field("bundler_url", &self.bundler_url)
            .finish_non_exhaustive()
    }
}

/// The operations a provider exposes to its consumers.
pub trait PreviewActions {
    /// Replace the whole file set, notify the change callback and push the
    /// files to the engine.
    ///
    /// # Errors
    ///
    /// A configuration error when the new set lacks `/package.json` and one
    /// cannot be synthesized.
    fn update_files(&mut self, files: Files) -> Result<(), PreviewError>;

    /// Replace the file at the opened path. No-op when the code is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// As [`update_files`](Self::update_files).
    fn update_current_file(&mut self, file: SandboxFile) -> Result<(), PreviewError>;

    /// Point editor views at `path`. The path is not checked.
    fn open_file(&mut self, path: &str);

    /// Ask the bundler for its transpiler registry.
    fn get_manager_transpiler_context(&self) -> TranspilerContextRequest;
}

/// Caller props with the preview snapshot injected alongside.
#[derive(Debug, Clone)]
pub struct WithPreview<P> {
    /// The wrapped props.
    pub props: P,
    /// Injected snapshot.
    pub preview: PreviewContext,
}

/// Inject the current snapshot of `provider` next to `props`.
#[must_use]
pub fn with_preview<P>(provider: &Provider, props: P) -> WithPreview<P> {
    WithPreview {
        props,
        preview: provider.context(),
    }
}
