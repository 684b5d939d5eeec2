//! Passkey Manager - lifecycle service for passkeys.
//!
//! This module provides [`PasskeyManager`], which sits between a transport
//! and a [`PasskeyStore`](crate::traits::PasskeyStore):
//!
//! ```text
//! caller ──► PasskeyManager ──► PasskeyStore ──► SecretCodec
//!            (validate,         (persist,        (argon2id
//!             timestamps)        verify)          encode/verify)
//! ```
//!
//! # State machine
//!
//! ```text
//! nonexistent ──create──► active ──update/read──► active
//!                           │
//!                           ├──delete──► nonexistent
//!                           └──now >= expires_at──► expired (reads as not found)
//! ```
//!
//! Expiry is a read-time predicate: expired passkeys are invisible to
//! [`PasskeyManager::read`] but can still be updated or deleted until
//! [`PasskeyManager::purge_expired`] removes them.

#[allow(clippy::module_inception)]
pub mod manager;
pub mod requests;
mod validation;

// Re-export public types
pub use manager::PasskeyManager;
pub use requests::{
    CreatePasskeyRequest, CreatePasskeyResponse, DeletePasskeyRequest, PasskeyResponse,
    ReadPasskeyRequest, UpdatePasskeyRequest,
};
