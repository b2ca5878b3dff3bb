// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Tests use unwrap freely
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Host-side provider for an external in-browser bundler preview engine.
//!
//! The bundler (module resolution, transpilation, sandboxed evaluation)
//! runs inside a hidden frame and talks over a message channel. This crate
//! owns everything on the host side of that boundary: the file set, the
//! engine lifecycle, and the state the bundler reports back.
//!
//! # Key entry points
//!
//! - [`provider::Provider`] - owns the store, engine handle and channel
//!   subscription
//! - [`context::PreviewContext`] / [`context::PreviewActions`] - what
//!   consumers read and call
//! - [`channel::MessageBus`] - the pub/sub channel frames publish into
//! - [`engine::BundlerEngine`] - the seam to the bundler, with
//!   [`engine::FrameEngine`] as the postMessage implementation
//! - [`options::ProviderConfig`] - embedding properties, loadable from TOML
//!
//! # Hosts
//!
//! The `web` feature mounts the hidden iframe in a browser page via
//! `web-sys`. The `webview` feature hosts the same frame inside a native
//! `wry` webview, and `viewer` wraps that in a winit window.

pub mod channel;
pub mod context;
pub mod engine;
pub mod error;
pub mod files;
pub mod frame;
pub mod message;
pub mod options;
pub mod provider;
pub mod state;

#[cfg(feature = "viewer")]
pub mod viewer;
#[cfg(feature = "web")]
pub mod web;
#[cfg(feature = "webview")]
pub mod webview;

pub use channel::MessageBus;
pub use context::{with_preview, PreviewActions, PreviewContext, WithPreview};
pub use error::PreviewError;
pub use files::{Files, SandboxFile};
pub use options::ProviderConfig;
pub use provider::Provider;
pub use state::{ModuleError, Status};
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
