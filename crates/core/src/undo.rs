// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Undo actions and the built-in "undo" channel
//!
//! An [`Undo`] is shared by every holder and runs at most once, so an undo
//! that is reachable both from a nested call's handle and from its parent's
//! chain is still only executed a single time.

use crate::registry::Channel;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Name of the built-in undo channel
pub const UNDO: &str = "undo";

type Action = Box<dyn FnOnce() + Send>;

/// A clonable action that runs at most once
#[derive(Clone)]
pub struct Undo {
    action: Arc<Mutex<Option<Action>>>,
}

impl Undo {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Arc::new(Mutex::new(Some(Box::new(action)))),
        }
    }

    /// An undo with nothing to do
    pub fn noop() -> Self {
        Self {
            action: Arc::new(Mutex::new(None)),
        }
    }

    /// Combine several undos into one that runs them front to back
    pub fn sequence(undos: impl IntoIterator<Item = Undo>) -> Self {
        let undos: Vec<Undo> = undos.into_iter().collect();
        if undos.is_empty() {
            return Self::noop();
        }
        Self::new(move || {
            tracing::trace!(count = undos.len(), "undoing sequence");
            for undo in &undos {
                undo.run();
            }
        })
    }

    /// Run the action if nobody has yet. Returns whether this call ran it.
    pub fn run(&self) -> bool {
        // Take the action out before running so the lock is not held while
        // nested undos execute.
        let action = self
            .action
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match action {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// True once the action has run (or if there never was one)
    pub fn is_spent(&self) -> bool {
        self.action
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

impl fmt::Debug for Undo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Undo")
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// Idempotent, externally exposed form of a call's combined undo
#[derive(Clone, Debug)]
pub struct UndoHandle {
    action: Undo,
    undone: Arc<AtomicBool>,
}

impl UndoHandle {
    pub fn new(action: Undo) -> Self {
        Self {
            action,
            undone: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn noop() -> Self {
        Self::new(Undo::noop())
    }

    /// Undo the call. Calls after the first have no effect.
    pub fn undo(&self) {
        if self.undone.swap(true, Ordering::SeqCst) {
            tracing::trace!("already undone");
            return;
        }
        self.action.run();
    }

    /// Whether `undo` has been called on this handle (point-in-time)
    pub fn undone(&self) -> bool {
        self.undone.load(Ordering::SeqCst)
    }
}

/// The built-in channel collecting undo actions
///
/// Contributions are kept most-recent-first, so a parent's chain undoes its
/// children in reverse order and its own action last.
#[derive(Debug, Clone, Copy, Default)]
pub struct UndoChannel;

impl Channel for UndoChannel {
    type Value = Undo;
    type Bucket = VecDeque<Undo>;
    type Exposed = UndoHandle;

    fn bucket(&self) -> Self::Bucket {
        VecDeque::new()
    }

    fn add(&self, bucket: &mut Self::Bucket, value: Undo) {
        bucket.push_front(value);
    }

    fn combine(&self, bucket: Self::Bucket) -> Undo {
        Undo::sequence(bucket)
    }

    fn transform(&self, combined: Undo) -> UndoHandle {
        UndoHandle::new(combined)
    }
}

#[cfg(test)]
#[path = "undo_tests.rs"]
mod tests;
