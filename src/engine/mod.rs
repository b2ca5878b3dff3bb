//! The seam to the external bundler.
//!
//! The provider only ever talks to a [`BundlerEngine`]: it constructs one
//! when the hidden frame mounts, pushes file sets and options into it, and
//! dispatches requests. Everything the bundler says back arrives
//! asynchronously on the [`MessageBus`](crate::channel::MessageBus).
//!
//! [`FrameEngine`] is the stock implementation that speaks the bundler's
//! postMessage protocol through any [`FrameTransport`].

mod frame;

pub use frame::{compile_message, FrameEngine, FrameTransport};

use crate::message::EngineRequest;
use crate::options::{ClientOptions, SandboxSetup};

/// Handle to a running bundler instance.
///
/// Methods take `&self`: the handle is shared between the provider and
/// context consumers, so implementations keep their own interior state.
/// None of the methods report failure; build problems come back as
/// `show-error` messages on the channel.
pub trait BundlerEngine {
    /// Replace the rendered file set and render configuration, triggering
    /// an incremental rebuild.
    fn update_preview(&self, setup: &SandboxSetup);

    /// Replace the adapter options.
    fn update_options(&self, options: &ClientOptions);

    /// Send a one-off request to the bundler.
    fn dispatch(&self, request: &EngineRequest);
}
