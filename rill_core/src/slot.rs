//! Error-first completion handler for one-shot deferred operations.
//!
//! A deferred operation reports its outcome by invoking a caller-supplied
//! completion handler whose **first parameter slot is the optional
//! fault**: `FnOnce(Option<Fault>, Option<T>)`. Consumers must check the
//! fault slot before touching the payload.
//!
//! [`CallbackSlot`] wraps the handler in a consuming API so the
//! channel rules hold by construction rather than by discipline:
//!
//! - `succeed` / `fail` / `cancel` each consume the slot, so the handler
//!   runs **at most once**;
//! - the handler is only ever invoked with `(Some(fault), None)` or
//!   `(None, Some(value))`, never both populated;
//! - a cancelled slot never invokes the handler at all — cancellation and
//!   failure are mutually exclusive terminal outcomes.
//!
//! The turn loop (see [`crate::turn::TurnLoop::defer`]) guarantees the
//! handler executes on a later turn than the call that scheduled it.

use rill_common::fault::Fault;
use tracing::trace;

/// Completion handler type: fault slot first, payload second.
pub type Completion<T> = Box<dyn FnOnce(Option<Fault>, Option<T>)>;

/// Single-use handle through which a deferred operation settles.
pub struct CallbackSlot<T> {
    completion: Completion<T>,
}

impl<T> CallbackSlot<T> {
    /// Wrap a completion handler.
    pub fn new(completion: impl FnOnce(Option<Fault>, Option<T>) + 'static) -> Self {
        Self {
            completion: Box::new(completion),
        }
    }

    /// Settle successfully: the handler sees `(None, Some(value))`.
    pub fn succeed(self, value: T) {
        (self.completion)(None, Some(value));
    }

    /// Settle with a fault: the handler sees `(Some(fault), None)`.
    pub fn fail(self, fault: Fault) {
        trace!(fault = %fault, "callback slot settled with fault");
        (self.completion)(Some(fault), None);
    }

    /// Settle from a synchronous result.
    pub fn settle(self, result: Result<T, Fault>) {
        match result {
            Ok(value) => self.succeed(value),
            Err(fault) => self.fail(fault),
        }
    }

    /// Drop the slot without invoking the handler.
    ///
    /// Used when the operation is cancelled before completion: no error
    /// report, no result, no double report later.
    pub fn cancel(self) {
        trace!("callback slot cancelled; handler will not run");
        drop(self.completion);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Seen<T> = Rc<RefCell<Vec<(Option<String>, Option<T>)>>>;

    fn recording_slot<T: 'static>(seen: &Seen<T>) -> CallbackSlot<T> {
        let seen = seen.clone();
        CallbackSlot::new(move |fault, value| {
            seen.borrow_mut()
                .push((fault.map(|f| f.message().to_string()), value));
        })
    }

    #[test]
    fn succeed_delivers_payload_only() {
        let seen: Seen<u32> = Rc::new(RefCell::new(Vec::new()));
        recording_slot(&seen).succeed(42);

        let calls = seen.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (None, Some(42)));
    }

    #[test]
    fn fail_delivers_fault_only() {
        let seen: Seen<u32> = Rc::new(RefCell::new(Vec::new()));
        recording_slot(&seen).fail(Fault::user("late failure"));

        let calls = seen.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_deref(), Some("late failure"));
        assert!(calls[0].1.is_none());
    }

    #[test]
    fn settle_routes_result() {
        let seen: Seen<&str> = Rc::new(RefCell::new(Vec::new()));
        recording_slot(&seen).settle(Ok("done"));
        recording_slot(&seen).settle(Err(Fault::runtime("bad")));

        let calls = seen.borrow();
        assert_eq!(calls[0], (None, Some("done")));
        assert!(calls[1].0.is_some() && calls[1].1.is_none());
    }

    #[test]
    fn cancel_never_invokes_handler() {
        let seen: Seen<u32> = Rc::new(RefCell::new(Vec::new()));
        recording_slot(&seen).cancel();
        assert!(seen.borrow().is_empty());
    }
}
