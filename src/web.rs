//! Browser host: mounts the hidden iframe with `web-sys` and bridges
//! `window` message events to the [`MessageBus`].
//!
//! **Inbound** (frame → host): the bundler calls `parent.postMessage`; the
//! window `message` listener forwards payloads whose source is our frame.
//!
//! **Outbound** (host → frame): [`FrameTransport::post`] calls
//! `contentWindow.postMessage`. Messages posted before the frame has
//! spoken once are queued and flushed on its first message, since the
//! bundler page is not listening until it has loaded.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlIFrameElement, MessageEvent, Window};

use crate::channel::MessageBus;
use crate::engine::FrameTransport;
use crate::error::PreviewError;
use crate::frame::FrameSpec;
use crate::provider::Provider;

/// Install the console logger and panic hook. Later calls keep the
/// logger already installed.
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        log::debug!("console logger not installed: {e}");
    }
}

/// Messages waiting for the frame to come alive.
#[derive(Default)]
struct Outbox {
    ready: Cell<bool>,
    queue: RefCell<Vec<Value>>,
}

/// A mounted hidden iframe plus its window message listener.
///
/// Dropping the host removes the listener and the element.
pub struct IframeHost {
    window: Window,
    iframe: HtmlIFrameElement,
    outbox: Rc<Outbox>,
    on_message: Closure<dyn FnMut(MessageEvent)>,
}

impl IframeHost {
    /// Create the iframe described by `spec` inside `container` and start
    /// forwarding its messages to `bus`.
    ///
    /// # Errors
    ///
    /// [`PreviewError::Frame`] when there is no DOM or an element call
    /// throws.
    pub fn mount(
        container: &Element,
        spec: &FrameSpec,
        bus: &MessageBus,
    ) -> Result<Rc<Self>, PreviewError> {
        let window = web_sys::window()
            .ok_or_else(|| PreviewError::Frame("no global window".to_owned()))?;
        let document = window
            .document()
            .ok_or_else(|| PreviewError::Frame("no document".to_owned()))?;

        let iframe: HtmlIFrameElement = document
            .create_element("iframe")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| PreviewError::Frame("element is not an iframe".to_owned()))?;
        for (name, value) in spec.attributes() {
            iframe.set_attribute(name, value).map_err(js_error)?;
        }
        let _ = container.append_child(&iframe).map_err(js_error)?;

        let outbox = Rc::new(Outbox::default());
        let on_message = {
            let bus = bus.clone();
            let iframe = iframe.clone();
            let outbox = Rc::clone(&outbox);
            Closure::<dyn FnMut(MessageEvent)>::new(move |evt: MessageEvent| {
                if !is_from_frame(&evt, &iframe) {
                    return;
                }
                if !outbox.ready.replace(true) {
                    let queued = std::mem::take(&mut *outbox.queue.borrow_mut());
                    for message in &queued {
                        post_to(&iframe, message);
                    }
                }
                if let Some(message) = js_to_json(&evt.data()) {
                    bus.publish(&message);
                }
            })
        };
        window
            .add_event_listener_with_callback(
                "message",
                on_message.as_ref().unchecked_ref(),
            )
            .map_err(js_error)?;

        log::info!("mounted bundler iframe at {}", spec.src);
        Ok(Rc::new(Self {
            window,
            iframe,
            outbox,
            on_message,
        }))
    }

    /// The iframe element.
    #[must_use]
    pub fn element(&self) -> &HtmlIFrameElement {
        &self.iframe
    }
}

impl FrameTransport for IframeHost {
    fn post(&self, message: &Value) {
        if self.outbox.ready.get() {
            post_to(&self.iframe, message);
        } else {
            self.outbox.queue.borrow_mut().push(message.clone());
        }
    }
}

impl Drop for IframeHost {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            "message",
            self.on_message.as_ref().unchecked_ref(),
        );
        self.iframe.remove();
    }
}

/// Mount a hidden iframe for `provider` inside `container` and connect a
/// frame engine to it.
///
/// The returned host must be kept alive for as long as the preview runs.
///
/// # Errors
///
/// As [`IframeHost::mount`].
pub fn mount_provider(
    provider: &mut Provider,
    container: &Element,
) -> Result<Rc<IframeHost>, PreviewError> {
    let spec = FrameSpec::hidden(&provider.context().bundler_url);
    let host = IframeHost::mount(container, &spec, provider.bus())?;
    provider.mount_frame(host.clone())?;
    Ok(host)
}

fn is_from_frame(evt: &MessageEvent, iframe: &HtmlIFrameElement) -> bool {
    match (evt.source(), iframe.content_window()) {
        (Some(source), Some(frame_window)) => {
            JsValue::from(source) == JsValue::from(frame_window)
        }
        _ => false,
    }
}

fn post_to(iframe: &HtmlIFrameElement, message: &Value) {
    let Some(target) = iframe.content_window() else {
        log::warn!("bundler iframe has no content window; dropping message");
        return;
    };
    let Ok(payload) = js_sys::JSON::parse(&message.to_string()) else {
        return;
    };
    if let Err(e) = target.post_message(&payload, "*") {
        log::warn!("postMessage to bundler failed: {e:?}");
    }
}

fn js_to_json(value: &JsValue) -> Option<Value> {
    let text: String = js_sys::JSON::stringify(value).ok()?.into();
    serde_json::from_str(&text).ok()
}

#[allow(clippy::needless_pass_by_value)]
fn js_error(e: JsValue) -> PreviewError {
    PreviewError::Frame(format!("{e:?}"))
}
