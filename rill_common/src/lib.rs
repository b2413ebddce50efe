//! Rill Common Library
//!
//! This crate provides the shared fault model, the system error-code
//! registry and configuration loading utilities for all rill workspace
//! crates.
//!
//! # Module Structure
//!
//! - [`fault`] - Canonical failure record ([`fault::Fault`]) and its kind taxonomy
//! - [`syscode`] - Static registry of OS-level error codes
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! rill_common = { path = "../rill_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use rill_common::prelude::*;
//! ```

pub mod config;
pub mod fault;
pub mod prelude;
pub mod syscode;
