//! Core traits for passkey storage

mod storage;

#[cfg(test)]
pub use storage::MockPasskeyStore;
pub use storage::{NewPasskey, PasskeyLookup, PasskeyStore, PasskeyUpdate};
