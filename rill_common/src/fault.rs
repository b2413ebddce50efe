//! Canonical failure record shared by every delivery channel.
//!
//! A [`Fault`] is the single representation of a failure inside the rill
//! runtime. It carries a closed [`FaultKind`] tag, an optional syscode
//! (present exactly when the fault is OS-originated), an immutable message,
//! an optional causal chain and the call context captured at construction.
//!
//! ## Kind taxonomy
//!
//! | kind | trigger |
//! |---|---|
//! | `Runtime` | language-level invalid operation |
//! | `System` | OS-level failure surfaced through an I/O or process primitive |
//! | `User` | raised explicitly by application code |
//! | `Assertion` | internal invariant violation; always fatal |
//!
//! The taxonomy is a closed tagged variant: consumers match on
//! [`Fault::kind`] exhaustively instead of downcasting.
//!
//! ## Invariants
//!
//! - Every fault has exactly one kind, fixed at construction.
//! - `code` is set if and only if the kind is [`FaultKind::System`].
//! - `Assertion` faults always carry [`FaultFlags::FATAL`].
//! - The causal chain is acyclic by construction: a new fault may wrap an
//!   existing one, an existing fault never retroactively gains a cause.

use std::backtrace::Backtrace;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

use crate::syscode;

// ─── Kind ───────────────────────────────────────────────────────────

/// Classification of a [`Fault`], fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultKind {
    /// Language-level invalid operation (bad evaluation, undefined
    /// reference, wrong argument type, out-of-range value).
    Runtime,
    /// Operating-system-level failure; carries a syscode.
    System,
    /// Raised explicitly by application-level code.
    User,
    /// Internal invariant violation. Always fatal.
    Assertion,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Runtime => "runtime",
            Self::System => "system",
            Self::User => "user",
            Self::Assertion => "assertion",
        };
        f.write_str(s)
    }
}

// ─── Flags ──────────────────────────────────────────────────────────

bitflags! {
    /// Per-fault marker flags.
    ///
    /// FATAL faults bypass any installed boundary handler and always
    /// terminate the process (see `rill_core::boundary`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultFlags: u8 {
        /// Unrecoverable at this layer; the crash boundary must not
        /// consult the installed handler.
        const FATAL = 0x01;
    }
}

impl Default for FaultFlags {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── Origin ─────────────────────────────────────────────────────────

/// Opaque capture of the call context at fault construction.
///
/// Captured exactly once, immutable thereafter.
#[derive(Debug)]
pub struct Origin(Backtrace);

impl Origin {
    fn capture() -> Self {
        Self(Backtrace::force_capture())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Fault ──────────────────────────────────────────────────────────

/// Canonical failure record carried across all delivery channels.
///
/// Fields are private; the kind-specific constructors enforce the
/// kind/code invariant. A `Fault` is not `Clone`: it moves through exactly
/// one channel and is consumed by exactly one handler. Use
/// [`Fault::report`] when a copyable snapshot is needed.
#[derive(Debug)]
pub struct Fault {
    kind: FaultKind,
    code: Option<String>,
    message: String,
    flags: FaultFlags,
    cause: Option<Box<Fault>>,
    origin: Origin,
}

assert_impl_all!(Fault: Send, std::error::Error);

impl Fault {
    fn new(kind: FaultKind, code: Option<String>, message: String, flags: FaultFlags) -> Self {
        Self {
            kind,
            code,
            message,
            flags,
            cause: None,
            origin: Origin::capture(),
        }
    }

    /// A language-level runtime fault (invalid operation).
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Runtime, None, message.into(), FaultFlags::empty())
    }

    /// A fault raised explicitly by application code.
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(FaultKind::User, None, message.into(), FaultFlags::empty())
    }

    /// An OS-originated fault.
    ///
    /// The registry label for `code` is prefixed onto `detail`, so
    /// `Fault::system("ENOENT", "open '/etc/rill.toml'")` renders as
    /// `no such file or directory, open '/etc/rill.toml'`. Unknown codes
    /// get the registry sentinel label; construction never fails.
    pub fn system(code: impl Into<String>, detail: impl Into<String>) -> Self {
        let code = code.into();
        let info = syscode::lookup(&code);
        let message = format!("{}, {}", info.label, detail.into());
        Self::new(FaultKind::System, Some(code), message, FaultFlags::empty())
    }

    /// An invariant violation. Always FATAL.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(
            FaultKind::Assertion,
            None,
            message.into(),
            FaultFlags::FATAL,
        )
    }

    /// Mark this fault unrecoverable at this layer.
    ///
    /// Builder-style; only meaningful before the fault enters a channel.
    #[must_use]
    pub fn fatal(mut self) -> Self {
        self.flags.insert(FaultFlags::FATAL);
        self
    }

    /// Wrap `cause` as the origin of this fault.
    ///
    /// Consumes both, so a fault already delivered through a channel can
    /// never retroactively gain a cause and the chain stays acyclic.
    #[must_use]
    pub fn caused_by(mut self, cause: Fault) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Classification tag, fixed at construction.
    #[inline]
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Syscode; `Some` exactly when `kind() == FaultKind::System`.
    #[inline]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Human-readable description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Marker flags.
    #[inline]
    pub fn flags(&self) -> FaultFlags {
        self.flags
    }

    /// True if the crash boundary must terminate regardless of any
    /// installed handler.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.flags.contains(FaultFlags::FATAL)
    }

    /// The wrapped cause, if any.
    #[inline]
    pub fn cause(&self) -> Option<&Fault> {
        self.cause.as_deref()
    }

    /// Call context captured at construction.
    #[inline]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Iterate the causal chain, starting with this fault.
    pub fn chain(&self) -> impl Iterator<Item = &Fault> {
        std::iter::successors(Some(self), |f| f.cause())
    }

    /// Copyable, serializable snapshot of this fault and its causal chain.
    pub fn report(&self) -> FaultReport {
        FaultReport {
            kind: self.kind,
            code: self.code.clone(),
            message: self.message.clone(),
            fatal: self.is_fatal(),
            origin: self.origin.to_string(),
            cause: self.cause.as_deref().map(|c| Box::new(c.report())),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} [{}]: {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

// ─── Report ─────────────────────────────────────────────────────────

/// Serializable snapshot of a [`Fault`] for diagnostics and logging.
///
/// The origin backtrace is flattened to text; the causal chain is kept.
#[derive(Debug, Clone, Serialize)]
pub struct FaultReport {
    /// Classification tag.
    pub kind: FaultKind,
    /// Syscode, for System faults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// True if the fault bypasses boundary handlers.
    pub fatal: bool,
    /// Origin backtrace rendered as text.
    pub origin: String,
    /// Snapshot of the wrapped cause, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<FaultReport>>,
}

// ─── Tests ──────────────────────────────────────────────────────────
