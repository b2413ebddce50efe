//! Rill Core Runtime
//!
//! Fault delivery for a cooperative, event-driven runtime. A failing
//! operation constructs a [`rill_common::fault::Fault`] and delivers it
//! through exactly one channel, chosen by how the operation was invoked:
//!
//! - **Synchronous call** — the operation returns `Result<T, Fault>`; the
//!   nearest enclosing `match`/`?` site in the caller's stack is the
//!   handling boundary.
//! - **One-shot deferred call** — the operation reports through a
//!   [`slot::CallbackSlot`], scheduled onto a later turn of the
//!   [`turn::TurnLoop`]. The completion handler always runs after the
//!   scheduling call has returned.
//! - **Long-lived resource** — the resource dispatches the reserved
//!   `"error"` event on its [`emitter::Emitter`].
//!
//! A fault that exits its channel unconsumed is escalated exactly once to
//! the [`boundary`] module's crash boundary, which terminates the process
//! unless a handler is installed. FATAL faults (every assertion fault)
//! terminate regardless.
//!
//! # Module Structure
//!
//! - [`turn`] - Single-consumer cooperative run loop
//! - [`slot`] - Error-first completion handler for deferred operations
//! - [`emitter`] - Named-event publish/subscribe unit
//! - [`boundary`] - Process-wide terminal handler for unhandled faults
//! - [`prelude`] - Common re-exports

pub mod boundary;
pub mod emitter;
pub mod prelude;
pub mod slot;
pub mod turn;
