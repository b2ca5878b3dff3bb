//! The operations a provider exposes through its context.

use super::{notify, Provider, TranspilerContextRequest};
use crate::context::PreviewActions;
use crate::error::PreviewError;
use crate::files::{
    create_missing_package_json, normalize_files, normalize_path, Files,
    SandboxFile,
};
use crate::message::EngineRequest;

impl PreviewActions for Provider {
    fn update_files(&mut self, files: Files) -> Result<(), PreviewError> {
        let files = create_missing_package_json(
            normalize_files(files),
            self.config.dependencies.as_ref(),
            self.config.entry.as_deref(),
        )?;
        self.shared.borrow_mut().state.files = files;

        if let Some(on_change) = self.on_change.as_mut() {
            let context = self.shared.borrow().context();
            on_change(&context.files, &context);
        }

        if let Some(engine) = self.engine() {
            engine.update_preview(&self.setup());
        }
        notify(&self.shared);
        Ok(())
    }

    fn update_current_file(&mut self, file: SandboxFile) -> Result<(), PreviewError> {
        let files = {
            let shared = self.shared.borrow();
            let opened = &shared.state.paths.opened_path;
            if shared.state.opened_code() == Some(file.code.as_str()) {
                log::debug!("{opened} unchanged, skipping update");
                return Ok(());
            }
            let mut files = shared.state.files.clone();
            let _ = files.insert(opened.clone(), file);
            files
        };
        self.update_files(files)
    }

    fn open_file(&mut self, path: &str) {
        self.shared.borrow_mut().state.paths.opened_path = normalize_path(path);
        notify(&self.shared);
    }

    fn get_manager_transpiler_context(&self) -> TranspilerContextRequest {
        let (request, slot) = TranspilerContextRequest::new();
        {
            let mut shared = self.shared.borrow_mut();
            shared.prune_transpiler_waiters();
            shared.transpiler_waiters.push(slot);
        }

        match self.engine() {
            Some(engine) => {
                engine.dispatch(&EngineRequest::GetTranspilerContext);
            }
            None => log::debug!(
                "transpiler context requested before mount; waiting for engine"
            ),
        }
        request
    }
}

impl Provider {
    /// Reload the preview without recompiling.
    pub fn refresh(&self) {
        if let Some(engine) = self.engine() {
            engine.dispatch(&EngineRequest::Refresh);
        }
    }
}
