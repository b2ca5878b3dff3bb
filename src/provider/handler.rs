//! Inbound message dispatch.

use std::cell::RefCell;

use serde_json::Value;

use super::{notify, transpiler, Shared};
use crate::message::{parse_message, EngineMessage};
use crate::state::PreviewState;

/// Apply one raw channel message to the shared store, then notify
/// observers. Unknown kinds are ignored.
pub(super) fn handle_message(shared: &RefCell<Shared>, raw: &Value) {
    let Some(message) = parse_message(raw) else {
        return;
    };
    log::debug!("channel message: {}", message.kind());

    match message {
        EngineMessage::TranspilerContext(data) => {
            resolve_transpiler_waiters(shared, &data);
        }
        // Answered by the frame engine, which owns the resolver.
        EngineMessage::FileRequest(_) => {}
        other => {
            apply_message(&mut shared.borrow_mut().state, other);
            notify(shared);
        }
    }
}

/// The store's dispatch table.
pub(super) fn apply_message(state: &mut PreviewState, message: EngineMessage) {
    match message {
        EngineMessage::State(manager_state) => {
            state.manager_state = Some(manager_state);
        }
        EngineMessage::Start => state.errors.clear(),
        EngineMessage::Status(status) => state.status = status,
        EngineMessage::ShowError(error) => state.errors.push(error),
        EngineMessage::TranspilerContext(_) | EngineMessage::FileRequest(_) => {}
    }
}

fn resolve_transpiler_waiters(shared: &RefCell<Shared>, data: &Value) {
    let waiters = std::mem::take(&mut shared.borrow_mut().transpiler_waiters);
    for waiter in waiters {
        if let Some(slot) = waiter.upgrade() {
            transpiler::resolve(&slot, data.clone());
        }
    }
}
