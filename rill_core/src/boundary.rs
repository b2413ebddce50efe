//! Crash boundary: terminal handling for faults no channel consumed.
//!
//! The boundary is a two-state machine:
//!
//! - **Unhandled-Fatal** (default): any fault reaching the boundary is
//!   surfaced on stderr (kind, message, origin) and the process terminates
//!   with a non-zero status. No further application code runs.
//! - **Handled**: once a handler is installed via [`install`], it receives
//!   each unhandled fault and the process keeps running. Continuing after
//!   an unhandled fault is the handler's responsibility; in-flight state
//!   may be inconsistent, so handlers should clean up and then terminate
//!   deliberately.
//!
//! FATAL faults (every assertion fault, plus any fault marked with
//! [`FaultFlags::FATAL`][rill_common::fault::FaultFlags]) bypass the
//! installed handler entirely and always terminate. The flag is checked
//! before the handler slot is consulted.
//!
//! The decision core ([`Boundary::resolve`]) is pure and returns a
//! [`Disposition`]; the process-wide shell ([`escalate`]) applies it.
//! The shared handler slot is guarded by a mutex so parallel producers
//! serialize registration and escalation.

use std::sync::Mutex;

use rill_common::fault::Fault;
use static_assertions::assert_impl_all;
use tracing::{debug, error, warn};

// ─── Exit codes ─────────────────────────────────────────────────────

/// Process exit status for an unhandled, non-fatal fault.
pub const EXIT_UNHANDLED: i32 = 1;

/// Process exit status for a FATAL fault (128 + SIGABRT, mirroring an
/// abort on invariant violation).
pub const EXIT_FATAL: i32 = 134;

// ─── Decision core ──────────────────────────────────────────────────

/// Outcome of consulting the boundary for one fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// An installed handler received the fault; execution may continue.
    Delivered,
    /// The fault is terminal; the process must exit with `code`.
    Terminate {
        /// Exit status to terminate with.
        code: i32,
    },
}

type Handler = Box<dyn FnMut(&Fault) + Send>;

/// Boundary state: zero-or-one handler slot.
///
/// Embeddable for tests and nested runtimes; the process-wide instance
/// lives behind [`install`]/[`escalate`].
pub struct Boundary {
    handler: Option<Handler>,
}

assert_impl_all!(Boundary: Send);

impl Boundary {
    /// Boundary in its initial Unhandled-Fatal state.
    pub const fn new() -> Self {
        Self { handler: None }
    }

    /// Install `handler`, replacing any previous one (last write wins).
    pub fn install(&mut self, handler: impl FnMut(&Fault) + Send + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Remove the installed handler, returning to Unhandled-Fatal.
    /// Returns true if a handler was present.
    pub fn clear(&mut self) -> bool {
        self.handler.take().is_some()
    }

    /// True once a handler has been installed.
    pub fn is_handled(&self) -> bool {
        self.handler.is_some()
    }

    /// Consult the boundary for one unhandled fault.
    ///
    /// The FATAL flag is checked first: fatal faults terminate even in
    /// the Handled state. Each fault is resolved exactly once.
    pub fn resolve(&mut self, fault: &Fault) -> Disposition {
        if fault.is_fatal() {
            return Disposition::Terminate { code: EXIT_FATAL };
        }
        match &mut self.handler {
            Some(handler) => {
                handler(fault);
                Disposition::Delivered
            }
            None => Disposition::Terminate {
                code: EXIT_UNHANDLED,
            },
        }
    }
}

impl Default for Boundary {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Process-wide shell ─────────────────────────────────────────────

static PROCESS_BOUNDARY: Mutex<Boundary> = Mutex::new(Boundary::new());

fn with_process_boundary<R>(f: impl FnOnce(&mut Boundary) -> R) -> R {
    let mut guard = PROCESS_BOUNDARY
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    f(&mut guard)
}

/// Install the process-wide fallback handler (replace-on-register).
///
/// The handler runs with the boundary slot locked and therefore must not
/// call [`escalate`] or [`install`] itself.
pub fn install(handler: impl FnMut(&Fault) + Send + 'static) {
    debug!("installing process crash-boundary handler");
    with_process_boundary(|b| b.install(handler));
}

/// Remove the process-wide handler. Returns true if one was installed.
pub fn clear() -> bool {
    with_process_boundary(Boundary::clear)
}

/// True once a process-wide handler has been installed.
pub fn is_handled() -> bool {
    with_process_boundary(|b| b.is_handled())
}

/// Escalate a fault no channel consumed.
///
/// In the Handled state the installed handler receives the fault and this
/// function returns. Otherwise (or for FATAL faults) the fault is
/// surfaced on stderr — kind, code, message, origin — and the process
/// exits with a non-zero status. Does not return in that case.
pub fn escalate(fault: Fault) {
    let disposition = with_process_boundary(|b| b.resolve(&fault));
    match disposition {
        Disposition::Delivered => {
            warn!(fault = %fault, "unhandled fault delivered to crash-boundary handler");
        }
        Disposition::Terminate { code } => {
            error!(fault = %fault, code, "unhandled fault; terminating");
            eprintln!("unhandled {fault}");
            eprintln!("origin:\n{}", fault.origin());
            std::process::exit(code);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
