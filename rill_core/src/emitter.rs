//! Named-event publish/subscribe unit for long-lived resources.
//!
//! A resource that can fail at arbitrary points of its lifetime — possibly
//! several times — owns an [`Emitter`] and dispatches each failure as the
//! reserved [`ERROR_EVENT`] with the fault as payload. Subscription and
//! unsubscription are explicit operations exchanging a
//! [`SubscriberHandle`]; dispatch iterates the subscriber list in
//! subscription order, synchronously, and never mutates it mid-dispatch.
//!
//! ## Unhandled errors
//!
//! An `"error"` dispatch with zero subscribers is unhandled:
//! [`Emitter::dispatch_error`] hands the fault back so the caller can
//! escalate it to the crash boundary exactly once.
//!
//! ## Raising subscribers
//!
//! A subscriber that itself raises aborts the remaining subscribers for
//! that dispatch; its secondary fault is reported as
//! [`ErrorDispatch::SubscriberFault`] and should be escalated as
//! unhandled.

use std::collections::HashMap;

use rill_common::fault::Fault;
use tracing::{debug, trace};

/// Reserved event name carrying fault payloads.
pub const ERROR_EVENT: &str = "error";

type Callback<P> = Box<dyn FnMut(&P) -> Result<(), Fault>>;

/// Opaque handle identifying one subscription on one emitter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberHandle {
    event: String,
    id: u64,
}

impl SubscriberHandle {
    /// Event name this handle subscribes to.
    pub fn event(&self) -> &str {
        &self.event
    }
}

struct Entry<P> {
    id: u64,
    once: bool,
    fired: bool,
    callback: Callback<P>,
}

/// Publish/subscribe unit with ordered, handle-addressed subscribers.
///
/// Subscribers do not receive a reference to the emitter, so the list is
/// iterated — never mutated — during a dispatch.
pub struct Emitter<P> {
    events: HashMap<String, Vec<Entry<P>>>,
    next_id: u64,
}

impl<P> Emitter<P> {
    /// Emitter with an empty subscription map.
    pub fn new() -> Self {
        Self {
            events: HashMap::new(),
            next_id: 0,
        }
    }

    fn push(&mut self, event: String, once: bool, callback: Callback<P>) -> SubscriberHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.events.entry(event.clone()).or_default().push(Entry {
            id,
            once,
            fired: false,
            callback,
        });
        trace!(event = %event, id, once, "subscriber added");
        SubscriberHandle { event, id }
    }

    /// Subscribe `callback` to `event`. Dispatch order is subscription
    /// order. The callback may raise; see the module docs.
    pub fn subscribe(
        &mut self,
        event: impl Into<String>,
        callback: impl FnMut(&P) -> Result<(), Fault> + 'static,
    ) -> SubscriberHandle {
        self.push(event.into(), false, Box::new(callback))
    }

    /// Subscribe a single-shot callback: removed after its first
    /// invocation.
    pub fn once(
        &mut self,
        event: impl Into<String>,
        callback: impl FnOnce(&P) -> Result<(), Fault> + 'static,
    ) -> SubscriberHandle {
        let mut callback = Some(callback);
        self.push(
            event.into(),
            true,
            Box::new(move |payload| match callback.take() {
                Some(f) => f(payload),
                // Spent entries are removed right after dispatch.
                None => Ok(()),
            }),
        )
    }

    /// Remove the subscription identified by `handle`.
    /// Returns true if it was still present.
    pub fn unsubscribe(&mut self, handle: &SubscriberHandle) -> bool {
        let Some(entries) = self.events.get_mut(&handle.event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != handle.id);
        before != entries.len()
    }

    /// Number of current subscribers for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.events.get(event).map_or(0, Vec::len)
    }

    /// Dispatch `payload` to every current subscriber of `event`, in
    /// subscription order, synchronously within this call.
    ///
    /// Returns `Ok(n)` with the number of subscribers invoked, or
    /// `Err(fault)` if a subscriber raised — in which case the remaining
    /// subscribers are not invoked for this dispatch.
    pub fn emit(&mut self, event: &str, payload: &P) -> Result<usize, Fault> {
        let Some(entries) = self.events.get_mut(event) else {
            return Ok(0);
        };

        let mut invoked = 0usize;
        let mut raised = None;
        for entry in entries.iter_mut() {
            entry.fired = true;
            invoked += 1;
            if let Err(fault) = (entry.callback)(payload) {
                raised = Some(fault);
                break;
            }
        }
        entries.retain(|e| !(e.once && e.fired));

        trace!(event, invoked, aborted = raised.is_some(), "dispatch");
        match raised {
            Some(fault) => Err(fault),
            None => Ok(invoked),
        }
    }
}

impl<P> Default for Emitter<P> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Error channel ──────────────────────────────────────────────────

/// Routing outcome of one `"error"` dispatch.
#[derive(Debug)]
pub enum ErrorDispatch {
    /// At least one subscriber observed the fault.
    Consumed {
        /// Number of subscribers invoked.
        subscribers: usize,
    },
    /// No subscriber was registered; the fault is handed back for
    /// escalation to the crash boundary.
    Unhandled(Fault),
    /// A subscriber raised; its secondary fault is handed back for
    /// escalation. The remaining subscribers were skipped.
    SubscriberFault(Fault),
}

impl ErrorDispatch {
    /// The fault the caller must escalate, if any.
    pub fn unconsumed(self) -> Option<Fault> {
        match self {
            Self::Consumed { .. } => None,
            Self::Unhandled(fault) | Self::SubscriberFault(fault) => Some(fault),
        }
    }
}

impl Emitter<Fault> {
    /// Dispatch `fault` as the reserved `"error"` event.
    ///
    /// With zero subscribers the fault comes back as
    /// [`ErrorDispatch::Unhandled`] and must be escalated exactly once by
    /// the caller.
    pub fn dispatch_error(&mut self, fault: Fault) -> ErrorDispatch {
        if self.subscriber_count(ERROR_EVENT) == 0 {
            debug!(fault = %fault, "error dispatch with no subscribers");
            return ErrorDispatch::Unhandled(fault);
        }
        match self.emit(ERROR_EVENT, &fault) {
            Ok(subscribers) => ErrorDispatch::Consumed { subscribers },
            Err(secondary) => ErrorDispatch::SubscriberFault(secondary),
        }
    }

    /// Dispatch `fault` on the error event, escalating through `escalate`
    /// when unconsumed. Returns the number of subscribers invoked when
    /// the dispatch completed cleanly, 0 otherwise (no subscribers, or a
    /// subscriber raised and aborted the dispatch).
    pub fn raise(&mut self, fault: Fault, escalate: impl FnOnce(Fault)) -> usize {
        match self.dispatch_error(fault) {
            ErrorDispatch::Consumed { subscribers } => subscribers,
            dispatch => {
                if let Some(unconsumed) = dispatch.unconsumed() {
                    escalate(unconsumed);
                }
                0
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
