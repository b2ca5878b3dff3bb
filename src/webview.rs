//! Wry webview hosting the bundler frame natively.
//!
//! The webview loads a small host page over the `preview://` custom
//! protocol. The page contains the bundler `<iframe>` and a relay script:
//! frame messages go out through `window.ipc.postMessage`, and the native
//! side posts into the frame by evaluating `window.__preview_post(json)`.

use std::borrow::Cow;
use std::rc::Rc;
use std::sync::mpsc;

use serde_json::Value;
use wry::http::{header::CONTENT_TYPE, Response};
use wry::{dpi, Rect, WebView, WebViewBuilder};

use crate::channel::MessageBus;
use crate::engine::FrameTransport;
use crate::error::PreviewError;
use crate::frame::FrameSpec;

/// Custom protocol the host page is served from.
pub const HOST_SCHEME: &str = "preview";

/// URL of the host page.
const HOST_URL: &str = "preview://localhost/";

/// Element id of the bundler iframe in the host page.
const FRAME_ID: &str = "bundler";

/// Create the webview as a child of `window`, serving a host page that
/// embeds the frame described by `spec`.
///
/// Returns `(webview, ipc_rx)`; the receiver yields raw JSON text of every
/// message the bundler posts.
///
/// # Errors
///
/// [`PreviewError::Frame`] if wry cannot build the webview.
pub fn create_frame_webview<W: wry::raw_window_handle::HasWindowHandle>(
    window: &W,
    spec: &FrameSpec,
    bounds: Rect,
) -> Result<(WebView, mpsc::Receiver<String>), PreviewError> {
    let (tx, rx) = mpsc::channel();
    let page = host_page(spec);

    let webview = WebViewBuilder::new()
        .with_bounds(bounds)
        .with_custom_protocol(HOST_SCHEME.into(), move |_id, request| {
            let path = request.uri().path();
            if path == "/" || path == "/index.html" {
                Response::builder()
                    .header(CONTENT_TYPE, "text/html; charset=utf-8")
                    .body(Cow::from(page.clone().into_bytes()))
                    .unwrap_or_else(|_| Response::new(Cow::from(Vec::new())))
            } else {
                Response::builder()
                    .status(404)
                    .body(Cow::from(Vec::new()))
                    .unwrap_or_else(|_| Response::new(Cow::from(Vec::new())))
            }
        })
        .with_url(HOST_URL)
        .with_ipc_handler(move |req| {
            let _ = tx.send(req.body().clone());
        })
        .build_as_child(window)
        .map_err(|e| PreviewError::Frame(e.to_string()))?;

    log::info!("bundler webview created for {}", spec.src);
    Ok((webview, rx))
}

/// Initialize the platform webview toolkit. Call once before
/// [`create_frame_webview`]. Only Linux (GTK) needs this.
///
/// # Errors
///
/// [`PreviewError::Frame`] if GTK cannot start, e.g. without a display.
pub fn init_platform() -> Result<(), PreviewError> {
    #[cfg(target_os = "linux")]
    gtk::init().map_err(|e| PreviewError::Frame(format!("gtk init: {e}")))?;
    Ok(())
}

/// Run pending toolkit events so the webview paints and delivers IPC.
/// Call from the host event loop after [`init_platform`].
pub fn pump_platform_events() {
    #[cfg(target_os = "linux")]
    while gtk::events_pending() {
        let _ = gtk::main_iteration_do(false);
    }
}

/// [`Rect`] covering a `width` × `height` window from the origin.
#[must_use]
pub fn full_bounds(width: u32, height: u32) -> Rect {
    Rect {
        position: dpi::Position::Physical(dpi::PhysicalPosition::new(0, 0)),
        size: dpi::Size::Physical(dpi::PhysicalSize::new(width, height)),
    }
}

/// Publish every pending IPC message on `bus`. Returns how many were
/// drained.
#[must_use]
pub fn drain_into(rx: &mpsc::Receiver<String>, bus: &MessageBus) -> usize {
    let mut drained = 0;
    while let Ok(json) = rx.try_recv() {
        bus.publish_str(&json);
        drained += 1;
    }
    drained
}

/// [`FrameTransport`] that posts by evaluating script in the host page.
pub struct WebviewTransport {
    webview: Rc<WebView>,
}

impl WebviewTransport {
    /// Wrap a webview created by [`create_frame_webview`].
    #[must_use]
    pub fn new(webview: Rc<WebView>) -> Self {
        Self { webview }
    }
}

impl FrameTransport for WebviewTransport {
    fn post(&self, message: &Value) {
        let json = message.to_string();
        let escaped = json.replace('\\', "\\\\").replace('\'', "\\'");
        if let Err(e) = self
            .webview
            .evaluate_script(&format!("window.__preview_post('{escaped}')"))
        {
            log::warn!("failed to post to bundler webview: {e}");
        }
    }
}

// ── Internals ────────────────────────────────────────────────────────────

fn host_page(spec: &FrameSpec) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head>\
         <body style=\"margin: 0\">{}<script>{RELAY_JS}</script></body></html>",
        spec.to_html(FRAME_ID)
    )
}

/// Relay between the bundler iframe and the native side.
///
/// Posts made before the frame has spoken once are buffered and replayed
/// on its first message.
const RELAY_JS: &str = r"
(function() {
    var frame = document.getElementById('bundler');
    var ready = false;
    var queue = [];

    function send(msg) {
        frame.contentWindow.postMessage(msg, '*');
    }

    window.addEventListener('message', function(e) {
        if (e.source !== frame.contentWindow) return;
        if (!ready) {
            ready = true;
            queue.forEach(send);
            queue = [];
        }
        window.ipc.postMessage(JSON.stringify(e.data));
    });

    window.__preview_post = function(json) {
        var msg = JSON.parse(json);
        if (ready) send(msg); else queue.push(msg);
    };
})();
";
