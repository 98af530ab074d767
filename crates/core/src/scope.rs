// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracking scope stack
//!
//! The "current" scope is a task-local slot. [`enter`] makes a scope current
//! for the duration of a closure and [`instrument`] does the same for every
//! poll of a future; both put the caller's value back on every exit path,
//! including unwinding. Because async definitions are instrumented per poll,
//! call trees interleaved on one thread never see each other's scope, and a
//! spawned task starts with no ambient scope at all.
//!
//! A child that settles after its caller was harvested still belongs to that
//! caller: late undo actions are kept on the closed scope and run by the
//! caller's own undo (see [`ScopeRef::late_undo`]).

use crate::id::ScopeId;
use crate::registry::Erased;
use crate::undo::{Undo, UNDO};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::futures::TaskLocalFuture;

tokio::task_local! {
    static CURRENT: Option<ScopeRef>;
}

/// Contributions made while one reversible call is running
struct Scope {
    id: ScopeId,
    /// Chronological, across all channels
    contributions: Vec<(&'static str, Erased)>,
    /// Undo actions that arrived after close, oldest first
    late: Vec<Undo>,
    parent: Option<ScopeRef>,
    closed: bool,
    /// Set once the late actions were taken by the call's undo
    drained: bool,
}

/// Shared handle to a [`Scope`]
#[derive(Clone)]
pub(crate) struct ScopeRef(Arc<Mutex<Scope>>);

impl ScopeRef {
    /// Open a scope for a call whose caller's scope is `parent`
    pub(crate) fn open(parent: Option<ScopeRef>) -> Self {
        Self(Arc::new(Mutex::new(Scope {
            id: ScopeId::next(),
            contributions: Vec::new(),
            late: Vec::new(),
            parent,
            closed: false,
            drained: false,
        })))
    }

    pub(crate) fn id(&self) -> ScopeId {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).id
    }

    /// Record a contribution made to this scope.
    ///
    /// Once the scope is closed, undo actions are kept for the call's own
    /// undo to run. Other channels' values are forwarded to the parent; with
    /// no parent left they are dropped.
    pub(crate) fn contribute(&self, channel: &'static str, value: Erased) {
        let (forward, value) = {
            let mut scope = self.0.lock().unwrap_or_else(|e| e.into_inner());
            if !scope.closed {
                tracing::trace!(scope = %scope.id, channel, "contribution");
                scope.contributions.push((channel, value));
                return;
            }
            let value = if channel == UNDO {
                match value.downcast::<Undo>() {
                    Ok(undo) => {
                        if scope.drained {
                            tracing::warn!(
                                scope = %scope.id,
                                "undo arrived after the call was undone, it will not run"
                            );
                        } else {
                            tracing::trace!(scope = %scope.id, "late undo");
                        }
                        scope.late.push(*undo);
                        return;
                    }
                    Err(value) => value,
                }
            } else {
                value
            };
            match &scope.parent {
                Some(parent) => (parent.clone(), value),
                None => {
                    tracing::warn!(
                        scope = %scope.id,
                        channel,
                        "contribution arrived after the top-level call finished, dropping"
                    );
                    return;
                }
            }
        };
        forward.contribute(channel, value);
    }

    /// An undo that runs, newest first, every undo action that reaches this
    /// scope after it was closed
    pub(crate) fn late_undo(&self) -> Undo {
        let scope = self.clone();
        Undo::new(move || {
            let late = {
                let mut inner = scope.0.lock().unwrap_or_else(|e| e.into_inner());
                inner.drained = true;
                std::mem::take(&mut inner.late)
            };
            if !late.is_empty() {
                tracing::trace!(count = late.len(), "undoing late contributions");
            }
            Undo::sequence(late.into_iter().rev()).run();
        })
    }

    /// Close the scope and take everything contributed so far
    pub(crate) fn close(&self) -> Vec<(&'static str, Erased)> {
        let mut scope = self.0.lock().unwrap_or_else(|e| e.into_inner());
        scope.closed = true;
        std::mem::take(&mut scope.contributions)
    }
}

impl fmt::Debug for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("Scope")
            .field("id", &scope.id)
            .field("contributions", &scope.contributions.len())
            .field("late", &scope.late.len())
            .field("closed", &scope.closed)
            .finish()
    }
}

/// The ambient scope, or `None` outside any reversible call
pub(crate) fn current() -> Option<ScopeRef> {
    CURRENT.try_with(|current| current.clone()).ok().flatten()
}

/// Run `f` with `scope` as the current scope, restoring the caller's
/// scope afterwards
pub(crate) fn enter<T>(scope: Option<ScopeRef>, f: impl FnOnce() -> T) -> T {
    CURRENT.sync_scope(scope, f)
}

/// Make `scope` current during every poll of `future`
pub(crate) fn instrument<F: Future>(
    scope: Option<ScopeRef>,
    future: F,
) -> TaskLocalFuture<Option<ScopeRef>, F> {
    CURRENT.scope(scope, future)
}

/// Whether the caller is running inside a reversible call
pub fn is_tracking() -> bool {
    current().is_some()
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
