//! Pending transpiler-context requests.
//!
//! A request resolves the first time a `transpiler-context` message arrives
//! after it was issued. There is no built-in timeout: callers that need one
//! race the future against their own timer. Dropping the request cancels
//! it.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

use serde_json::Value;

/// The bundler's transpiler registry, as reported.
#[derive(Debug, Clone, PartialEq)]
pub struct TranspilerContext(pub Value);

#[derive(Default)]
pub(super) struct WaiterSlot {
    value: Option<Value>,
    waker: Option<Waker>,
}

/// Future returned by
/// [`get_manager_transpiler_context`](crate::context::PreviewActions::get_manager_transpiler_context).
///
/// Never fails; stays pending until the bundler answers.
#[must_use = "dropping the request cancels it"]
pub struct TranspilerContextRequest {
    slot: Rc<RefCell<WaiterSlot>>,
}

impl TranspilerContextRequest {
    /// A fresh request and the weak handle the provider resolves through.
    pub(super) fn new() -> (Self, Weak<RefCell<WaiterSlot>>) {
        let slot = Rc::new(RefCell::new(WaiterSlot::default()));
        let weak = Rc::downgrade(&slot);
        (Self { slot }, weak)
    }

    /// Whether the reply has arrived.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.slot.borrow().value.is_some()
    }

    /// The reply, if it has arrived, without polling. The request can
    /// still be awaited afterwards.
    #[must_use]
    pub fn try_get(&self) -> Option<TranspilerContext> {
        self.slot.borrow().value.clone().map(TranspilerContext)
    }
}

impl Future for TranspilerContextRequest {
    type Output = TranspilerContext;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match slot.value.clone() {
            Some(value) => Poll::Ready(TranspilerContext(value)),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Fill `slot` with `value` and wake its task. Later replies are ignored.
pub(super) fn resolve(slot: &RefCell<WaiterSlot>, value: Value) {
    let waker = {
        let mut slot = slot.borrow_mut();
        if slot.value.is_some() {
            return;
        }
        slot.value = Some(value);
        slot.waker.take()
    };
    if let Some(waker) = waker {
        waker.wake();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pending_until_resolved() {
        let (mut request, weak) = TranspilerContextRequest::new();
        let mut cx = Context::from_waker(Waker::noop());

        assert!(Pin::new(&mut request).poll(&mut cx).is_pending());
        assert!(!request.is_resolved());

        resolve(&weak.upgrade().unwrap(), json!({ "babel": {} }));
        assert!(request.is_resolved());
        assert_eq!(
            Pin::new(&mut request).poll(&mut cx),
            Poll::Ready(TranspilerContext(json!({ "babel": {} })))
        );
    }

    #[test]
    fn first_reply_wins() {
        let (request, weak) = TranspilerContextRequest::new();
        let slot = weak.upgrade().unwrap();
        resolve(&slot, json!(1));
        resolve(&slot, json!(2));
        assert_eq!(request.try_get(), Some(TranspilerContext(json!(1))));
    }

    #[test]
    fn reading_early_does_not_consume_reply() {
        let (mut request, weak) = TranspilerContextRequest::new();
        resolve(&weak.upgrade().unwrap(), json!({ "ts": {} }));

        let expected = TranspilerContext(json!({ "ts": {} }));
        assert_eq!(request.try_get(), Some(expected.clone()));
        assert!(request.is_resolved());
        let mut cx = Context::from_waker(Waker::noop());
        assert_eq!(Pin::new(&mut request).poll(&mut cx), Poll::Ready(expected));
    }

    #[test]
    fn dropping_request_releases_slot() {
        let (request, weak) = TranspilerContextRequest::new();
        drop(request);
        assert!(weak.upgrade().is_none());
    }
}
