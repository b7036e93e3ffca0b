// SPDX-License-Identifier: MIT

//! Key Gate Core Library
//!
//! This crate provides the foundational types, traits, and utilities for the Key Gate
//! widget: a referrer-gated access-code generator with a 24-hour expiration, a single
//! persistent storage slot, and a live countdown.
//!
//! # Architecture
//!
//! The library is organized into modules representing core concerns:
//! - `token`: Access-key generation, expiration arithmetic, storage format
//! - `gate`: Referrer validation predicate
//! - `store`: Single-slot persistent key-value storage (file-backed and in-memory)
//! - `clock`: Time source abstraction
//! - `countdown`: The single controller-owned countdown timer handle
//! - `controller`: The key-gate state machine driving the UI
//! - `validate`: Offline key validation (format + acceptance check)
//! - `config`: Configuration management with validation
//! - `error`: Unified error types
//!
//! # Design Principles
//!
//! 1. **Capability injection**: Ambient environment (storage, clock, clipboard,
//!    confirmation prompt) lives behind small traits so tests substitute fakes
//! 2. **Storage as source of truth**: The UI never holds an independent key copy;
//!    every read goes back to the slot
//! 3. **Silent degradation**: Malformed state and clipboard failures degrade to
//!    the locked view rather than surfacing errors

pub mod clock;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod gate;
pub mod store;
pub mod token;
pub mod validate;

pub use error::{Error, Result};
pub use token::AccessKey;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Alphabet the access key is sampled from (62 characters)
pub const KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Fixed access-key length in characters
pub const KEY_LENGTH: usize = 24;

/// Key lifetime: 24 hours in milliseconds
pub const KEY_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Fixed name of the single storage slot
pub const STORAGE_SLOT: &str = "secure_key";

/// Default countdown tick period (once per minute)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 60_000;
