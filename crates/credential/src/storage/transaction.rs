//! Scoped transactions for the in-memory store
//!
//! A [`MemoryTransaction`] holds the store's write lock for its whole
//! lifetime and records an undo entry for every mutation. Unless
//! [`commit`](MemoryTransaction::commit) is called, dropping the transaction
//! replays the undo log in reverse, so every early return and `?` rolls back.

use std::collections::HashMap;

use parking_lot::RwLockWriteGuard;

use crate::core::{Passkey, PasskeyKey};

type Rows = HashMap<PasskeyKey, Passkey>;

enum Undo {
    /// Row was removed; put it back
    Restore(Passkey),
    /// Row was inserted where none existed; remove it
    Remove(PasskeyKey),
}

/// Exclusive, rollback-on-drop view of the in-memory rows
pub struct MemoryTransaction<'a> {
    rows: RwLockWriteGuard<'a, Rows>,
    undo: Vec<Undo>,
    committed: bool,
}

impl<'a> MemoryTransaction<'a> {
    pub(crate) fn begin(rows: RwLockWriteGuard<'a, Rows>) -> Self {
        Self {
            rows,
            undo: Vec::new(),
            committed: false,
        }
    }

    /// Look up a row inside the transaction
    pub fn get(&self, key: &PasskeyKey) -> Option<&Passkey> {
        self.rows.get(key)
    }

    /// Remove a row, returning it
    pub fn remove(&mut self, key: &PasskeyKey) -> Option<Passkey> {
        let removed = self.rows.remove(key)?;
        self.undo.push(Undo::Restore(removed.clone()));
        Some(removed)
    }

    /// Insert or replace a row
    pub fn insert(&mut self, passkey: Passkey) {
        let key = passkey.key();
        match self.rows.insert(key.clone(), passkey) {
            Some(previous) => self.undo.push(Undo::Restore(previous)),
            None => self.undo.push(Undo::Remove(key)),
        }
    }

    /// Keep every change made so far
    pub fn commit(mut self) {
        self.committed = true;
        self.undo.clear();
    }

    /// Discard every change made so far
    pub fn rollback(self) {
        // Drop does the work.
    }

    fn undo_all(&mut self) {
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Restore(passkey) => {
                    self.rows.insert(passkey.key(), passkey);
                }
                Undo::Remove(key) => {
                    self.rows.remove(&key);
                }
            }
        }
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.undo.is_empty() {
            tracing::debug!(changes = self.undo.len(), "rolling back memory transaction");
            self.undo_all();
        }
    }
}
