//! Standalone preview window backed by winit.
//!
//! The window hosts a wry webview containing the bundler frame; a
//! [`Provider`] drives it and logs what the bundler reports.
//!
//! ```no_run
//! # use sandbox_preview::{ProviderConfig, Viewer};
//! let config = ProviderConfig::load("sandbox.toml".as_ref()).unwrap();
//! Viewer::builder().with_config(config).build().run().unwrap();
//! ```

use std::rc::Rc;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};
use wry::WebView;

use crate::channel::MessageBus;
use crate::error::PreviewError;
use crate::frame::FrameSpec;
use crate::options::ProviderConfig;
use crate::provider::Provider;
use crate::state::Status;
use crate::webview::{self, WebviewTransport};

/// How often IPC messages from the webview are drained.
const DRAIN_INTERVAL: Duration = Duration::from_millis(16);

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    config: ProviderConfig,
    title: String,
}

impl ViewerBuilder {
    /// Create a builder with an empty configuration and the default title.
    fn new() -> Self {
        Self {
            config: ProviderConfig::default(),
            title: "Sandbox Preview".into(),
        }
    }

    /// Set the provider configuration.
    #[must_use]
    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            config: self.config,
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window that shows a live bundler preview.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    config: ProviderConfig,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Configuration errors are reported before any window opens, then
    /// toolkit and event loop startup failures.
    pub fn run(self) -> Result<(), PreviewError> {
        let bus = MessageBus::new();
        let provider = Provider::new(self.config, &bus)?;
        let _ = provider.subscribe(log_changes());
        webview::init_platform()?;

        let event_loop =
            EventLoop::new().map_err(|e| PreviewError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = ViewerApp {
            window: None,
            webview: None,
            ipc_rx: None,
            provider,
            bus,
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| PreviewError::Viewer(e.to_string()))
    }
}

/// Observer that logs status transitions and newly reported errors.
fn log_changes() -> impl Fn(&crate::context::PreviewContext) {
    let last_status = std::cell::Cell::new(Status::Initializing);
    let last_errors = std::cell::Cell::new(0_usize);
    move |ctx| {
        if last_status.replace(ctx.status) != ctx.status {
            log::info!("bundler status: {:?}", ctx.status);
        }
        let seen = last_errors.replace(ctx.errors.len());
        for error in ctx.errors.iter().skip(seen) {
            log::error!(
                "{} in {}:{}:{}: {}",
                error.title,
                error.path,
                error.line,
                error.column,
                error.message
            );
        }
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    webview: Option<Rc<WebView>>,
    ipc_rx: Option<mpsc::Receiver<String>>,
    provider: Provider,
    bus: MessageBus,
    title: String,
}

impl ViewerApp {
    /// Create the webview inside `window` and mount the provider on it.
    fn mount(&mut self, window: &Window) -> Result<(), PreviewError> {
        let inner = window.inner_size();
        let spec = FrameSpec::hidden(&self.provider.context().bundler_url).filling();
        let (wv, rx) = webview::create_frame_webview(
            window,
            &spec,
            webview::full_bounds(inner.width, inner.height),
        )?;
        let wv = Rc::new(wv);
        self.provider
            .mount_frame(Rc::new(WebviewTransport::new(Rc::clone(&wv))))?;
        self.webview = Some(wv);
        self.ipc_rx = Some(rx);
        Ok(())
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.mount(&window) {
            log::error!("Failed to mount preview: {e}");
            event_loop.exit();
            return;
        }
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.provider.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref wv) = self.webview {
                    let _ = wv.set_bounds(webview::full_bounds(
                        size.width,
                        size.height,
                    ));
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        webview::pump_platform_events();
        if let Some(ref rx) = self.ipc_rx {
            let _ = webview::drain_into(rx, &self.bus);
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            Instant::now() + DRAIN_INTERVAL,
        ));
    }
}
