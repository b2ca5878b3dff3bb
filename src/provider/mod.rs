//! The provider: owns the store, the engine handle and the channel
//! subscription.
//!
//! Lifecycle:
//!
//! 1. [`Provider::new`] validates the configuration, synthesizes
//!    `/package.json` when needed and subscribes to the channel.
//! 2. [`Provider::mount`] (or [`Provider::mount_frame`]) constructs the
//!    engine once the hidden frame exists.
//! 3. Operations ([`PreviewActions`]) and property changes
//!    ([`Provider::set_config`]) keep the engine in sync.
//! 4. [`Provider::unmount`] (or drop) detaches the listener.

mod actions;
mod handler;
mod sync;
mod transpiler;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub use transpiler::{TranspilerContext, TranspilerContextRequest};

use self::transpiler::WaiterSlot;
use crate::channel::{MessageBus, Subscription};
use crate::context::{PreviewActions, PreviewContext};
use crate::engine::{BundlerEngine, FrameEngine, FrameTransport};
use crate::error::PreviewError;
use crate::files::{
    create_missing_package_json, normalize_files, normalize_path, Files,
    PACKAGE_JSON_PATH,
};
use crate::message::EngineRequest;
use crate::options::{
    ClientOptions, FileResolver, ProviderConfig, SandboxSetup,
    DEFAULT_BROWSER_PATH,
};
use crate::state::{NavigationState, PreviewState};

type Observer = Rc<dyn Fn(&PreviewContext)>;
type ChangeCallback = Box<dyn FnMut(&Files, &PreviewContext)>;

/// Handle returned by [`Provider::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// State shared between the provider and its channel listener.
struct Shared {
    state: PreviewState,
    bundler_url: String,
    engine: Option<Rc<dyn BundlerEngine>>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    transpiler_waiters: Vec<Weak<RefCell<WaiterSlot>>>,
}

impl Shared {
    fn context(&self) -> PreviewContext {
        PreviewContext {
            files: self.state.files.clone(),
            paths: self.state.paths.clone(),
            errors: self.state.errors.clone(),
            manager_state: self.state.manager_state.clone(),
            status: self.state.status,
            engine: self.engine.clone(),
            bundler_url: self.bundler_url.clone(),
        }
    }

    /// Forget waiters whose request has been dropped.
    fn prune_transpiler_waiters(&mut self) {
        self.transpiler_waiters.retain(|w| w.strong_count() > 0);
    }
}

/// Call every observer with a fresh snapshot. No borrow is held while
/// observers run.
fn notify(shared: &RefCell<Shared>) {
    let (context, observers) = {
        let s = shared.borrow();
        if s.observers.is_empty() {
            return;
        }
        let observers: Vec<Observer> =
            s.observers.iter().map(|(_, o)| Rc::clone(o)).collect();
        (s.context(), observers)
    };
    for observer in observers {
        observer(&context);
    }
}

/// Hosts one bundler preview and republishes its state.
pub struct Provider {
    shared: Rc<RefCell<Shared>>,
    config: ProviderConfig,
    file_resolver: Option<Rc<dyn FileResolver>>,
    on_change: Option<ChangeCallback>,
    bus: MessageBus,
    subscription: Option<Subscription>,
}

// ── Construction ─────────────────────────────────────────────────────────

impl Provider {
    /// Validate `config`, build the initial store and subscribe to `bus`.
    ///
    /// # Errors
    ///
    /// A configuration error when `/package.json` is missing and cannot be
    /// synthesized, or the configured opened path is not in the file set.
    /// Nothing is subscribed and no engine exists when this fails.
    pub fn new(config: ProviderConfig, bus: &MessageBus) -> Result<Self, PreviewError> {
        let files = create_missing_package_json(
            normalize_files(config.files.clone()),
            config.dependencies.as_ref(),
            config.entry.as_deref(),
        )?;
        let paths = initial_paths(&config, &files)?;

        let shared = Rc::new(RefCell::new(Shared {
            state: PreviewState::new(files, paths),
            bundler_url: config.resolved_bundler_url().to_owned(),
            engine: None,
            observers: Vec::new(),
            next_observer: 0,
            transpiler_waiters: Vec::new(),
        }));

        let mut provider = Self {
            shared,
            config,
            file_resolver: None,
            on_change: None,
            bus: bus.clone(),
            subscription: None,
        };
        provider.listen();
        log::info!(
            "preview provider created ({} files, bundler {})",
            provider.shared.borrow().state.files.len(),
            provider.config.resolved_bundler_url()
        );
        Ok(provider)
    }

    /// Attach an external file resolver passed to the engine.
    #[must_use]
    pub fn with_file_resolver(mut self, resolver: Rc<dyn FileResolver>) -> Self {
        self.file_resolver = Some(resolver);
        self
    }

    /// Register the change callback, invoked with the new file set and a
    /// full snapshot on every [`update_files`](PreviewActions::update_files).
    #[must_use]
    pub fn with_on_change(
        mut self,
        callback: impl FnMut(&Files, &PreviewContext) + 'static,
    ) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Subscribe the message handler if it is not attached.
    fn listen(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let weak = Rc::downgrade(&self.shared);
        self.subscription = Some(self.bus.subscribe(move |raw| {
            if let Some(shared) = weak.upgrade() {
                handler::handle_message(&shared, raw);
            }
        }));
    }
}

/// Apply navigation defaults and check the configured opened path.
fn initial_paths(
    config: &ProviderConfig,
    files: &Files,
) -> Result<NavigationState, PreviewError> {
    let opened_path = match config.opened_path.as_deref() {
        Some(path) => {
            let path = normalize_path(path);
            if !files.contains_key(&path) {
                return Err(PreviewError::UnknownOpenedPath(path));
            }
            path
        }
        None => default_opened_path(files, config.entry.as_deref()),
    };
    let browser_path = config
        .initial_path
        .clone()
        .unwrap_or_else(|| DEFAULT_BROWSER_PATH.to_owned());
    Ok(NavigationState {
        browser_path,
        opened_path,
    })
}

/// First file flagged active, else the entry, else the first source file.
fn default_opened_path(files: &Files, entry: Option<&str>) -> String {
    files
        .iter()
        .find(|(_, file)| file.active)
        .map(|(path, _)| path.clone())
        .or_else(|| {
            entry
                .map(normalize_path)
                .filter(|path| files.contains_key(path))
        })
        .or_else(|| {
            files
                .keys()
                .find(|path| path.as_str() != PACKAGE_JSON_PATH)
                .cloned()
        })
        .unwrap_or_else(|| PACKAGE_JSON_PATH.to_owned())
}

// ── Mounting ─────────────────────────────────────────────────────────────

impl Provider {
    /// Construct the engine for a freshly mounted frame.
    ///
    /// `connect` receives the initial setup (files including the
    /// synthesized descriptor, plus render configuration) and the adapter
    /// options. A later call replaces the engine, as when the frame element
    /// is recreated.
    ///
    /// # Errors
    ///
    /// Whatever `connect` returns; the previous engine stays in place.
    pub fn mount<F>(&mut self, connect: F) -> Result<(), PreviewError>
    where
        F: FnOnce(&SandboxSetup, &ClientOptions) -> Result<Rc<dyn BundlerEngine>, PreviewError>,
    {
        self.listen();
        let setup = self.setup();
        let options = self.client_options();
        let engine = connect(&setup, &options)?;
        let waiting = {
            let mut shared = self.shared.borrow_mut();
            shared.engine = Some(Rc::clone(&engine));
            shared.prune_transpiler_waiters();
            !shared.transpiler_waiters.is_empty()
        };
        log::info!("preview engine mounted");
        if waiting {
            log::debug!("requesting transpiler context for early waiters");
            engine.dispatch(&EngineRequest::GetTranspilerContext);
        }
        notify(&self.shared);
        Ok(())
    }

    /// Mount a [`FrameEngine`] speaking through `transport`.
    ///
    /// # Errors
    ///
    /// None today; the signature matches [`mount`](Self::mount).
    pub fn mount_frame(
        &mut self,
        transport: Rc<dyn FrameTransport>,
    ) -> Result<(), PreviewError> {
        let bus = self.bus.clone();
        self.mount(move |setup, options| {
            let engine: Rc<dyn BundlerEngine> =
                FrameEngine::connect(transport, &bus, setup, options);
            Ok(engine)
        })
    }

    /// Detach the channel listener and drop the engine handle.
    pub fn unmount(&mut self) {
        self.subscription = None;
        self.shared.borrow_mut().engine = None;
        log::info!("preview provider unmounted");
    }

    /// Whether the channel listener is attached.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }
}

// ── Accessors ────────────────────────────────────────────────────────────

impl Provider {
    /// Fresh snapshot of the store.
    #[must_use]
    pub fn context(&self) -> PreviewContext {
        self.shared.borrow().context()
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The channel this provider listens on.
    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Engine handle, once mounted.
    #[must_use]
    pub fn engine(&self) -> Option<Rc<dyn BundlerEngine>> {
        self.shared.borrow().engine.clone()
    }

    /// What the engine renders right now.
    #[must_use]
    pub fn setup(&self) -> SandboxSetup {
        SandboxSetup {
            files: self.shared.borrow().state.files.clone(),
            entry: self.config.entry.clone(),
            dependencies: self.config.dependencies.clone(),
            template: self.config.template,
        }
    }

    /// Adapter options derived from configuration and attached resolver.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            bundler_url: Some(self.config.resolved_bundler_url().to_owned()),
            skip_eval: self.config.skip_eval,
            file_resolver: self.file_resolver.clone(),
        }
    }

    /// Call `observer` with a fresh snapshot after every state change.
    #[must_use]
    pub fn subscribe(
        &self,
        observer: impl Fn(&PreviewContext) + 'static,
    ) -> ObserverId {
        let mut shared = self.shared.borrow_mut();
        let id = ObserverId(shared.next_observer);
        shared.next_observer += 1;
        shared.observers.push((id, Rc::new(observer)));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    #[must_use]
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut shared = self.shared.borrow_mut();
        let before = shared.observers.len();
        shared.observers.retain(|(oid, _)| *oid != id);
        shared.observers.len() != before
    }

    /// Run `f` with the current snapshot and the provider's actions.
    pub fn consume<R>(
        &mut self,
        f: impl FnOnce(&PreviewContext, &mut dyn PreviewActions) -> R,
    ) -> R {
        let context = self.context();
        f(&context, self)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("context", &self.context())
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::Provider;
    use crate::channel::MessageBus;
    use crate::engine::BundlerEngine;
    use crate::files::{files_from_code, Dependencies};
    use crate::message::EngineRequest;
    use crate::options::{ClientOptions, ProviderConfig, SandboxSetup};

    /// Engine fake that records every call.
    #[derive(Default)]
    pub(crate) struct RecordingEngine {
        pub(crate) constructed_with: RefCell<Option<(SandboxSetup, ClientOptions)>>,
        pub(crate) previews: RefCell<Vec<SandboxSetup>>,
        pub(crate) options: RefCell<Vec<ClientOptions>>,
        pub(crate) requests: RefCell<Vec<EngineRequest>>,
    }

    impl BundlerEngine for RecordingEngine {
        fn update_preview(&self, setup: &SandboxSetup) {
            self.previews.borrow_mut().push(setup.clone());
        }

        fn update_options(&self, options: &ClientOptions) {
            self.options.borrow_mut().push(options.clone());
        }

        fn dispatch(&self, request: &EngineRequest) {
            self.requests.borrow_mut().push(request.clone());
        }
    }

    pub(crate) fn config() -> ProviderConfig {
        ProviderConfig {
            files: files_from_code([
                ("/index.js", "import './styles.css';"),
                ("/styles.css", "body { margin: 0 }"),
            ]),
            entry: Some("/index.js".into()),
            dependencies: Some(Dependencies::new()),
            ..ProviderConfig::default()
        }
    }

    pub(crate) fn mounted(
        config: ProviderConfig,
    ) -> (Provider, Rc<RecordingEngine>, MessageBus) {
        let bus = MessageBus::new();
        let mut provider = Provider::new(config, &bus).unwrap();
        let engine = Rc::new(RecordingEngine::default());
        let handle = Rc::clone(&engine);
        provider
            .mount(move |setup, options| {
                *handle.constructed_with.borrow_mut() =
                    Some((setup.clone(), options.clone()));
                let engine: Rc<dyn BundlerEngine> = handle;
                Ok(engine)
            })
            .unwrap();
        (provider, engine, bus)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::test_support::{config, mounted};
    use super::*;
    use crate::context::with_preview;
    use crate::files::SandboxFile;
    use crate::state::Status;

    #[test]
    fn construction_without_dependencies_fails_before_subscribing() {
        let bus = MessageBus::new();
        let cfg = ProviderConfig {
            dependencies: None,
            ..config()
        };
        let err = Provider::new(cfg, &bus).unwrap_err();
        assert!(matches!(err, PreviewError::MissingDependencies));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn mount_passes_synthesized_descriptor_to_engine() {
        let (_provider, engine, _bus) = mounted(config());
        let constructed = engine.constructed_with.borrow();
        let (setup, options) = constructed.as_ref().unwrap();
        assert!(setup.files.contains_key(PACKAGE_JSON_PATH));
        assert_eq!(setup.entry.as_deref(), Some("/index.js"));
        assert!(!options.skip_eval);
        assert!(engine.previews.borrow().is_empty());
    }

    #[test]
    fn opened_path_defaults_to_entry() {
        let (provider, _engine, _bus) = mounted(config());
        let ctx = provider.context();
        assert_eq!(ctx.paths.opened_path, "/index.js");
        assert_eq!(ctx.paths.browser_path, "/");
        assert!(ctx.is_mounted());
    }

    #[test]
    fn active_file_wins_over_entry() {
        let mut cfg = config();
        let _ = cfg.files.insert(
            "/App.js".into(),
            SandboxFile {
                active: true,
                ..SandboxFile::new("export default 1")
            },
        );
        let provider = Provider::new(cfg, &MessageBus::new()).unwrap();
        assert_eq!(provider.context().paths.opened_path, "/App.js");
    }

    #[test]
    fn unknown_opened_path_is_rejected() {
        let cfg = ProviderConfig {
            opened_path: Some("/missing.js".into()),
            ..config()
        };
        let err = Provider::new(cfg, &MessageBus::new()).unwrap_err();
        assert!(matches!(err, PreviewError::UnknownOpenedPath(p) if p == "/missing.js"));
    }

    #[test]
    fn unmount_detaches_listener() {
        let (mut provider, _engine, bus) = mounted(config());
        assert_eq!(bus.listener_count(), 1);
        provider.unmount();
        assert_eq!(bus.listener_count(), 0);
        assert!(!provider.context().is_mounted());

        bus.publish(&json!({ "type": "status", "status": "idle" }));
        assert_eq!(provider.context().status, Status::Initializing);
    }

    #[test]
    fn observers_see_each_change_until_unsubscribed() {
        let (provider, _engine, bus) = mounted(config());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let id = provider.subscribe(move |ctx| s.borrow_mut().push(ctx.status));

        bus.publish(&json!({ "type": "status", "status": "transpiling" }));
        bus.publish(&json!({ "type": "status", "status": "idle" }));
        assert!(provider.unsubscribe(id));
        bus.publish(&json!({ "type": "status", "status": "evaluating" }));

        assert_eq!(*seen.borrow(), vec![Status::Transpiling, Status::Idle]);
        assert!(!provider.unsubscribe(id));
    }

    #[test]
    fn consume_and_inject_read_the_same_snapshot() {
        let (mut provider, _engine, _bus) = mounted(config());
        let injected = with_preview(&provider, "toolbar");
        let opened = provider.consume(|ctx, actions| {
            actions.open_file("/styles.css");
            ctx.paths.opened_path.clone()
        });
        assert_eq!(opened, injected.preview.paths.opened_path);
        assert_eq!(injected.props, "toolbar");
        assert_eq!(provider.context().paths.opened_path, "/styles.css");
    }

    #[test]
    fn remount_replaces_engine() {
        let (mut provider, first, _bus) = mounted(config());
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        provider
            .mount(move |_, _| {
                c.set(c.get() + 1);
                let engine: Rc<dyn BundlerEngine> =
                    Rc::new(test_support::RecordingEngine::default());
                Ok(engine)
            })
            .unwrap();
        provider.open_file("/styles.css");
        provider
            .update_current_file(SandboxFile::new("body {}"))
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert!(first.previews.borrow().is_empty());
    }
}
