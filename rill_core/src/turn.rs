//! Single-consumer cooperative run loop.
//!
//! At most one piece of application logic runs at a time: turns are
//! drained FIFO from an owned queue, so independent deferred operations
//! complete in the order they were scheduled (first-scheduled-first-run).
//! Suspension happens only between turns, never mid-expression.
//!
//! ## Raise routing
//!
//! A synchronous raise is an `Err` returned up the current call stack. By
//! the time deferred work executes, the frame that scheduled it has long
//! since returned, so an `Err` inside deferred work can never resurface at
//! the scheduling call site. The loop makes that routing explicit:
//!
//! - [`TurnLoop::defer`] routes the work's `Err` into the pending
//!   [`CallbackSlot`]; the completion handler always executes on a later
//!   turn than the call that scheduled it.
//! - [`TurnLoop::schedule`] has no slot; an `Err` from the turn body is
//!   escalated to the crash boundary.
//!
//! ## Cancellation
//!
//! [`DeferHandle::cancel`] before the turn runs suppresses the completion
//! entirely: no fault, no result, no late double report.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use rill_common::fault::Fault;
use tracing::{debug, trace};

use crate::boundary;
use crate::slot::CallbackSlot;

type TurnBody = Box<dyn FnOnce(&mut TurnLoop)>;

/// Cancellation handle for a deferred operation.
///
/// Cancelling after the operation has already run is a no-op.
#[derive(Debug, Clone)]
pub struct DeferHandle {
    cancelled: Rc<Cell<bool>>,
}

impl DeferHandle {
    /// Suppress the deferred operation; its completion handler will never
    /// be invoked.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// True once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// FIFO turn queue with an escalation sink for unconsumed faults.
pub struct TurnLoop {
    queue: VecDeque<TurnBody>,
    sink: Box<dyn FnMut(Fault)>,
    turns_run: u64,
}

impl TurnLoop {
    /// Loop escalating unconsumed faults to the process crash boundary.
    pub fn new() -> Self {
        Self::with_escalation(boundary::escalate)
    }

    /// Loop with a custom escalation sink (embedding, tests).
    pub fn with_escalation(sink: impl FnMut(Fault) + 'static) -> Self {
        Self {
            queue: VecDeque::new(),
            sink: Box::new(sink),
            turns_run: 0,
        }
    }

    /// Schedule a fire-and-forget turn.
    ///
    /// An `Err` from the body has no consumer and is escalated to the
    /// boundary.
    pub fn schedule(&mut self, body: impl FnOnce(&mut TurnLoop) -> Result<(), Fault> + 'static) {
        self.queue.push_back(Box::new(move |turn_loop| {
            if let Err(fault) = body(turn_loop) {
                debug!(fault = %fault, "turn raised with no consumer");
                turn_loop.escalate(fault);
            }
        }));
    }

    /// Schedule a deferred operation with an error-first completion
    /// handler.
    ///
    /// `work` runs on a later turn; its result is routed into a
    /// [`CallbackSlot`] wrapping `completion`, so the handler observes
    /// either the fault or the payload, never both, and always executes
    /// after this call has returned.
    pub fn defer<T, W, C>(&mut self, work: W, completion: C) -> DeferHandle
    where
        T: 'static,
        W: FnOnce(&mut TurnLoop) -> Result<T, Fault> + 'static,
        C: FnOnce(Option<Fault>, Option<T>) + 'static,
    {
        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();
        self.queue.push_back(Box::new(move |turn_loop| {
            if flag.get() {
                trace!("deferred operation cancelled; completion suppressed");
                return;
            }
            CallbackSlot::new(completion).settle(work(turn_loop));
        }));
        DeferHandle { cancelled }
    }

    /// Hand an unconsumed fault to the escalation sink.
    pub fn escalate(&mut self, fault: Fault) {
        (self.sink)(fault);
    }

    /// Drain the queue, running turns FIFO until none remain.
    ///
    /// Turns scheduled by running turns are drained in the same call.
    pub fn run(&mut self) {
        while let Some(turn) = self.queue.pop_front() {
            self.turns_run += 1;
            turn(self);
        }
    }

    /// Number of turns waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// True when no turns are queued.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total turns executed since construction.
    pub fn turns_run(&self) -> u64 {
        self.turns_run
    }
}

impl Default for TurnLoop {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn collecting_loop() -> (TurnLoop, Rc<RefCell<Vec<String>>>) {
        let escalated = Rc::new(RefCell::new(Vec::new()));
        let sink = escalated.clone();
        let turn_loop = TurnLoop::with_escalation(move |fault: Fault| {
            sink.borrow_mut().push(fault.message().to_string());
        });
        (turn_loop, escalated)
    }

    #[test]
    fn turns_run_fifo() {
        let (mut turn_loop, _) = collecting_loop();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = order.clone();
            turn_loop.schedule(move |_| {
                order.borrow_mut().push(tag);
                Ok(())
            });
        }

        assert_eq!(turn_loop.pending(), 3);
        turn_loop.run();
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
        assert!(turn_loop.is_idle());
        assert_eq!(turn_loop.turns_run(), 3);
    }

    #[test]
    fn nested_turns_drain_in_same_run() {
        let (mut turn_loop, _) = collecting_loop();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        turn_loop.schedule(move |inner| {
            o.borrow_mut().push("outer");
            let o2 = o.clone();
            inner.schedule(move |_| {
                o2.borrow_mut().push("nested");
                Ok(())
            });
            Ok(())
        });

        turn_loop.run();
        assert_eq!(*order.borrow(), vec!["outer", "nested"]);
    }

    #[test]
    fn schedule_err_escalates() {
        let (mut turn_loop, escalated) = collecting_loop();
        turn_loop.schedule(|_| Err(Fault::user("nobody caught me")));
        turn_loop.run();
        assert_eq!(*escalated.borrow(), vec!["nobody caught me"]);
    }

    #[test]
    fn defer_success_routes_payload() {
        let (mut turn_loop, escalated) = collecting_loop();
        let seen = Rc::new(RefCell::new(None));

        let s = seen.clone();
        turn_loop.defer(
            |_| Ok(7u32),
            move |fault, value| {
                assert!(fault.is_none());
                *s.borrow_mut() = value;
            },
        );

        turn_loop.run();
        assert_eq!(*seen.borrow(), Some(7));
        assert!(escalated.borrow().is_empty());
    }

    #[test]
    fn defer_failure_routes_into_slot_not_boundary() {
        let (mut turn_loop, escalated) = collecting_loop();
        let seen = Rc::new(RefCell::new(None));

        let s = seen.clone();
        turn_loop.defer(
            |_| -> Result<(), Fault> { Err(Fault::user("late")) },
            move |fault, value: Option<()>| {
                assert!(value.is_none());
                *s.borrow_mut() = fault.map(|f| f.message().to_string());
            },
        );

        turn_loop.run();
        assert_eq!(seen.borrow().as_deref(), Some("late"));
        assert!(escalated.borrow().is_empty());
    }

    #[test]
    fn completion_runs_after_scheduling_call_returns() {
        let (mut turn_loop, _) = collecting_loop();
        let completed = Rc::new(Cell::new(false));

        let c = completed.clone();
        turn_loop.defer(|_| Ok(()), move |_, _| c.set(true));
        // The scheduling call has returned; the handler has not yet run.
        assert!(!completed.get());

        turn_loop.run();
        assert!(completed.get());
    }

    #[test]
    fn deferred_failures_complete_in_schedule_order() {
        let (mut turn_loop, _) = collecting_loop();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        turn_loop.defer(
            |_| -> Result<(), Fault> { Err(Fault::user("A")) },
            move |fault, _: Option<()>| {
                o.borrow_mut().push(fault.map(|f| f.message().to_string()));
            },
        );
        let o = order.clone();
        turn_loop.defer(
            |_| -> Result<(), Fault> { Err(Fault::user("B")) },
            move |fault, _: Option<()>| {
                o.borrow_mut().push(fault.map(|f| f.message().to_string()));
            },
        );

        turn_loop.run();
        let order = order.borrow();
        assert_eq!(order.len(), 2);
        assert_eq!(order[0].as_deref(), Some("A"));
        assert_eq!(order[1].as_deref(), Some("B"));
    }

    #[test]
    fn cancelled_defer_never_completes() {
        let (mut turn_loop, escalated) = collecting_loop();
        let invoked = Rc::new(Cell::new(false));

        let i = invoked.clone();
        let handle = turn_loop.defer(
            |_| -> Result<(), Fault> { Err(Fault::user("would fail")) },
            move |_, _| i.set(true),
        );
        handle.cancel();
        assert!(handle.is_cancelled());

        turn_loop.run();
        // Neither an error report nor a result: cancellation and failure
        // are mutually exclusive terminal outcomes.
        assert!(!invoked.get());
        assert!(escalated.borrow().is_empty());
    }
}
