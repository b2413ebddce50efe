//! Prelude module for common re-exports.
//!
//! Provides convenient re-exports of the most commonly used types so that
//! consumers can do `use rill_common::prelude::*;` without listing
//! individual paths.

// ─── Fault model ────────────────────────────────────────────────────
pub use crate::fault::{Fault, FaultFlags, FaultKind, FaultReport, Origin};

// ─── Syscode registry ───────────────────────────────────────────────
pub use crate::syscode::{self, SysCodeInfo};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
