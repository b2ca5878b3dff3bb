//! [`BundlerEngine`] over the bundler's postMessage protocol.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

use super::BundlerEngine;
use crate::channel::{MessageBus, Subscription};
use crate::message::{
    parse_message, EngineMessage, EngineRequest, FileMethod, FileRequest,
};
use crate::options::{ClientOptions, SandboxSetup, Template};

/// Protocol version stamped on compile messages.
const PROTOCOL_VERSION: u32 = 3;

/// Something that can post a JSON message into the bundler frame.
pub trait FrameTransport {
    /// Post `message` to the frame. Delivery is fire-and-forget.
    fn post(&self, message: &Value);
}

/// Build the `compile` message for a setup and option set.
#[must_use]
pub fn compile_message(setup: &SandboxSetup, options: &ClientOptions) -> Value {
    let modules: Map<String, Value> = setup
        .files
        .iter()
        .map(|(path, file)| {
            (
                path.clone(),
                serde_json::json!({ "path": path, "code": file.code }),
            )
        })
        .collect();

    serde_json::json!({
        "type": "compile",
        "codesandbox": true,
        "version": PROTOCOL_VERSION,
        "modules": modules,
        "externalResources": [],
        "hasFileResolver": options.has_file_resolver(),
        "template": setup.template.map(Template::as_str),
        "entry": setup.entry,
        "dependencies": setup.dependencies,
        "skipEval": options.skip_eval,
    })
}

/// Bundler handle that drives a frame through a [`FrameTransport`].
///
/// Keeps the last setup so option changes can recompile, and answers the
/// bundler's `fs/request` messages when a file resolver is configured.
pub struct FrameEngine {
    transport: Rc<dyn FrameTransport>,
    setup: RefCell<SandboxSetup>,
    options: Rc<RefCell<ClientOptions>>,
    _file_requests: Subscription,
}

impl FrameEngine {
    /// Construct the engine and send the initial compile.
    #[must_use]
    pub fn connect(
        transport: Rc<dyn FrameTransport>,
        bus: &MessageBus,
        setup: &SandboxSetup,
        options: &ClientOptions,
    ) -> Rc<Self> {
        let options = Rc::new(RefCell::new(options.clone()));

        let file_requests = {
            let transport = Rc::clone(&transport);
            let options = Rc::clone(&options);
            bus.subscribe(move |raw| {
                if let Some(EngineMessage::FileRequest(req)) = parse_message(raw)
                {
                    let reply = answer_file_request(&options.borrow(), req);
                    if let Some(reply) = reply {
                        transport.post(&reply.to_json());
                    }
                }
            })
        };

        let engine = Rc::new(Self {
            transport,
            setup: RefCell::new(setup.clone()),
            options,
            _file_requests: file_requests,
        });
        log::info!(
            "frame engine connected ({} files)",
            setup.files.len()
        );
        engine.compile();
        engine
    }

    /// Post a compile for the current setup and options.
    fn compile(&self) {
        let message = compile_message(&self.setup.borrow(), &self.options.borrow());
        self.transport.post(&message);
    }
}

impl BundlerEngine for FrameEngine {
    fn update_preview(&self, setup: &SandboxSetup) {
        *self.setup.borrow_mut() = setup.clone();
        self.compile();
    }

    fn update_options(&self, options: &ClientOptions) {
        if self.options.borrow().same_as(options) {
            return;
        }
        *self.options.borrow_mut() = options.clone();
        log::debug!("frame engine options changed: {options:?}");
        self.compile();
    }

    fn dispatch(&self, request: &EngineRequest) {
        self.transport.post(&request.to_json());
    }
}

/// Resolve a file request against the configured resolver.
fn answer_file_request(
    options: &ClientOptions,
    req: FileRequest,
) -> Option<EngineRequest> {
    let Some(resolver) = options.file_resolver.as_ref() else {
        log::debug!("ignoring fs/request for {}: no resolver", req.path);
        return None;
    };
    let result = match req.method {
        FileMethod::IsFile => Value::Bool(resolver.is_file(&req.path)),
        FileMethod::ReadFile => {
            resolver.read_file(&req.path).map_or(Value::Null, Value::String)
        }
    };
    Some(EngineRequest::FileResponse { id: req.id, result })
}
