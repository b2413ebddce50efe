//! Static registry of OS-level error codes.
//!
//! Built once, immutable after construction. [`lookup`] is total: known
//! codes return their published entry, unknown codes return the
//! [`UNKNOWN`] sentinel. The registry is advisory metadata, not control
//! flow — it never fails.
//!
//! ## Stability
//!
//! The published code strings and their meanings are a stable contract:
//! consumer code matches on `code` (e.g. `"ENOENT"`). The table is
//! open-ended — new codes may be added — but an entry, once published,
//! never changes meaning.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

// ─── Entry ──────────────────────────────────────────────────────────

/// Metadata for one OS error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SysCodeInfo {
    /// The code string consumers match on (e.g. `"ENOENT"`).
    pub code: &'static str,
    /// Short human-readable label, used as a message prefix.
    pub label: &'static str,
    /// Longer description of the failure condition.
    pub description: &'static str,
}

/// Sentinel entry returned for codes not present in the table.
pub const UNKNOWN: SysCodeInfo = SysCodeInfo {
    code: "UNKNOWN",
    label: "unknown system error",
    description: "the code is not present in the syscode registry",
};

// ─── Table ──────────────────────────────────────────────────────────

/// Published code table. Append-only.
const TABLE: &[SysCodeInfo] = &[
    SysCodeInfo {
        code: "EACCES",
        label: "permission denied",
        description: "the operation was not permitted by the file mode or access control list",
    },
    SysCodeInfo {
        code: "EADDRINUSE",
        label: "address already in use",
        description: "the requested local address is already bound by another socket",
    },
    SysCodeInfo {
        code: "ECONNREFUSED",
        label: "connection refused",
        description: "the remote host actively refused the connection attempt",
    },
    SysCodeInfo {
        code: "ECONNRESET",
        label: "connection reset by peer",
        description: "the remote host closed the connection abruptly",
    },
    SysCodeInfo {
        code: "EEXIST",
        label: "file already exists",
        description: "the target path exists and exclusive creation was requested",
    },
    SysCodeInfo {
        code: "EISDIR",
        label: "illegal operation on a directory",
        description: "a file operation was attempted on a directory",
    },
    SysCodeInfo {
        code: "EMFILE",
        label: "too many open files",
        description: "the per-process file descriptor limit has been reached",
    },
    SysCodeInfo {
        code: "ENOENT",
        label: "no such file or directory",
        description: "a component of the given path does not exist",
    },
    SysCodeInfo {
        code: "ENOTDIR",
        label: "not a directory",
        description: "a path component used as a directory is not one",
    },
    SysCodeInfo {
        code: "ENOTEMPTY",
        label: "directory not empty",
        description: "the directory contains entries and cannot be removed",
    },
    SysCodeInfo {
        code: "EPERM",
        label: "operation not permitted",
        description: "the operation requires privileges the caller does not hold",
    },
    SysCodeInfo {
        code: "EPIPE",
        label: "broken pipe",
        description: "a write was attempted on a stream whose read end has closed",
    },
    SysCodeInfo {
        code: "ETIMEDOUT",
        label: "operation timed out",
        description: "the operation did not complete within the allotted time",
    },
];

// ─── Lookup ─────────────────────────────────────────────────────────

fn index() -> &'static HashMap<&'static str, &'static SysCodeInfo> {
    static INDEX: OnceLock<HashMap<&'static str, &'static SysCodeInfo>> = OnceLock::new();
    INDEX.get_or_init(|| TABLE.iter().map(|info| (info.code, info)).collect())
}

/// Look up the metadata for `code`.
///
/// Total and idempotent: known codes return their published entry,
/// unknown codes return [`UNKNOWN`]. O(1) after the first call.
pub fn lookup(code: &str) -> &'static SysCodeInfo {
    index().get(code).copied().unwrap_or(&UNKNOWN)
}

/// True if `code` has a published entry.
pub fn is_known(code: &str) -> bool {
    index().contains_key(code)
}

/// Iterate the published table in definition order.
pub fn codes() -> impl Iterator<Item = &'static SysCodeInfo> {
    TABLE.iter()
}

// ─── Tests ──────────────────────────────────────────────────────────
