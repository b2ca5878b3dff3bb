//! Re-synchronization when the embedding properties change.

use std::rc::Rc;

use super::{notify, Provider};
use crate::context::PreviewActions;
use crate::error::PreviewError;
use crate::files::{create_missing_package_json, normalize_files};
use crate::options::{FileResolver, ProviderConfig};

impl Provider {
    /// Apply new embedding properties.
    ///
    /// A change to files, dependencies, entry or template re-synthesizes
    /// `/package.json` and runs the full
    /// [`update_files`](PreviewActions::update_files) path. A change to
    /// `skip_eval` updates the engine options, before any file resync.
    /// Navigation state is left alone.
    ///
    /// # Errors
    ///
    /// A configuration error when the new file set cannot get a
    /// descriptor; the previous configuration stays in effect.
    pub fn set_config(&mut self, config: ProviderConfig) -> Result<(), PreviewError> {
        let render_changed = self.config.render_inputs_differ(&config);
        let skip_eval_changed = self.config.skip_eval != config.skip_eval;
        let bundler_changed = self.config.bundler_url != config.bundler_url;

        let files = if render_changed {
            Some(create_missing_package_json(
                normalize_files(config.files.clone()),
                config.dependencies.as_ref(),
                config.entry.as_deref(),
            )?)
        } else {
            None
        };

        self.config = config;

        if bundler_changed {
            log::warn!(
                "bundler URL changed to {}; takes effect on next mount",
                self.config.resolved_bundler_url()
            );
            self.shared.borrow_mut().bundler_url =
                self.config.resolved_bundler_url().to_owned();
        }

        // Options first, so new files never compile under the old flags.
        if skip_eval_changed {
            log::debug!("skip_eval now {}", self.config.skip_eval);
            self.push_options();
        }

        if let Some(files) = files {
            log::debug!("render inputs changed, resyncing files");
            self.update_files(files)?;
        } else if bundler_changed {
            notify(&self.shared);
        }
        Ok(())
    }

    /// Replace the file resolver and push the new options to the engine.
    pub fn set_file_resolver(&mut self, resolver: Option<Rc<dyn FileResolver>>) {
        self.file_resolver = resolver;
        self.push_options();
    }

    fn push_options(&self) {
        if let Some(engine) = self.engine() {
            engine.update_options(&self.client_options());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::super::test_support::{config, mounted};
    use super::*;
    use crate::channel::MessageBus;
    use crate::engine::FrameTransport;
    use crate::files::{Dependencies, SandboxFile, PACKAGE_JSON_PATH};
    use crate::options::Template;

    #[test]
    fn skip_eval_alone_updates_options_without_files() {
        let (mut provider, engine, _bus) = mounted(config());
        let cfg = ProviderConfig {
            skip_eval: true,
            ..provider.config().clone()
        };
        provider.set_config(cfg).unwrap();

        assert!(engine.previews.borrow().is_empty());
        let options = engine.options.borrow();
        assert_eq!(options.len(), 1);
        assert!(options[0].skip_eval);
    }

    #[test]
    fn unchanged_config_is_a_no_op() {
        let (mut provider, engine, _bus) = mounted(config());
        provider.set_config(provider.config().clone()).unwrap();
        assert!(engine.previews.borrow().is_empty());
        assert!(engine.options.borrow().is_empty());
    }

    #[test]
    fn dependency_change_resynthesizes_descriptor() {
        let (mut provider, engine, _bus) = mounted(config());
        let deps: Dependencies =
            [("vue".to_owned(), "^3.4.0".to_owned())].into_iter().collect();
        let cfg = ProviderConfig {
            dependencies: Some(deps.clone()),
            ..provider.config().clone()
        };
        provider.set_config(cfg).unwrap();

        let previews = engine.previews.borrow();
        assert_eq!(previews.len(), 1);
        let pkg: serde_json::Value =
            serde_json::from_str(&previews[0].files[PACKAGE_JSON_PATH].code)
                .unwrap();
        assert_eq!(pkg["dependencies"]["vue"], "^3.4.0");
        assert_eq!(previews[0].dependencies, Some(deps));
        assert!(engine.options.borrow().is_empty());
    }

    #[test]
    fn template_change_reaches_engine() {
        let (mut provider, engine, _bus) = mounted(config());
        let cfg = ProviderConfig {
            template: Some(Template::Svelte),
            ..provider.config().clone()
        };
        provider.set_config(cfg).unwrap();
        assert_eq!(engine.previews.borrow()[0].template, Some(Template::Svelte));
    }

    #[test]
    fn invalid_config_keeps_previous_one() {
        let (mut provider, engine, _bus) = mounted(config());
        let mut cfg = provider.config().clone();
        cfg.dependencies = None;
        let _ = cfg.files.insert("/extra.js".into(), SandboxFile::new(""));

        let err = provider.set_config(cfg).unwrap_err();
        assert!(err.is_configuration());
        assert!(provider.config().dependencies.is_some());
        assert!(engine.previews.borrow().is_empty());
    }

    #[test]
    fn bundler_url_change_updates_context_only() {
        let (mut provider, engine, _bus) = mounted(config());
        let cfg = ProviderConfig {
            bundler_url: Some("http://localhost:3000/".into()),
            ..provider.config().clone()
        };
        provider.set_config(cfg).unwrap();
        assert_eq!(provider.context().bundler_url, "http://localhost:3000/");
        assert!(engine.previews.borrow().is_empty());
        assert!(engine.options.borrow().is_empty());
    }

    #[derive(Default)]
    struct RecordingTransport {
        posted: RefCell<Vec<serde_json::Value>>,
    }

    impl FrameTransport for RecordingTransport {
        fn post(&self, message: &serde_json::Value) {
            self.posted.borrow_mut().push(message.clone());
        }
    }

    #[test]
    fn new_files_never_compile_with_stale_skip_eval() {
        let mut provider = Provider::new(config(), &MessageBus::new()).unwrap();
        let transport = Rc::new(RecordingTransport::default());
        provider.mount_frame(transport.clone()).unwrap();
        assert_eq!(transport.posted.borrow().len(), 1);

        let mut cfg = ProviderConfig {
            skip_eval: true,
            ..provider.config().clone()
        };
        let _ = cfg
            .files
            .insert("/index.js".into(), SandboxFile::new("edited()"));
        provider.set_config(cfg).unwrap();

        let posted = transport.posted.borrow();
        let compiles: Vec<_> = posted[1..]
            .iter()
            .filter(|m| m["type"] == "compile")
            .collect();
        for compile in &compiles {
            if compile["modules"]["/index.js"]["code"] == "edited()" {
                assert_eq!(compile["skipEval"], true);
            }
        }
        let last = compiles.last().unwrap();
        assert_eq!(last["modules"]["/index.js"]["code"], "edited()");
        assert_eq!(last["skipEval"], true);
    }

    #[test]
    fn file_resolver_change_pushes_options() {
        struct Empty;
        impl FileResolver for Empty {
            fn is_file(&self, _path: &str) -> bool {
                false
            }
            fn read_file(&self, _path: &str) -> Option<String> {
                None
            }
        }

        let (mut provider, engine, _bus) = mounted(config());
        provider.set_file_resolver(Some(Rc::new(Empty)));
        let options = engine.options.borrow();
        assert_eq!(options.len(), 1);
        assert!(options[0].has_file_resolver());
    }
}
