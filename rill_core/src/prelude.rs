//! Prelude module for common re-exports.
//!
//! `use rill_core::prelude::*;` pulls in the runtime surface plus the
//! shared fault model.

// ─── Fault model ────────────────────────────────────────────────────
pub use rill_common::fault::{Fault, FaultFlags, FaultKind, FaultReport};

// ─── Turn loop ──────────────────────────────────────────────────────
pub use crate::turn::{DeferHandle, TurnLoop};

// ─── Channels ───────────────────────────────────────────────────────
pub use crate::emitter::{ERROR_EVENT, Emitter, ErrorDispatch, SubscriberHandle};
pub use crate::slot::CallbackSlot;

// ─── Crash boundary ─────────────────────────────────────────────────
pub use crate::boundary::{self, Boundary, Disposition};
