// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Definition wrapper
//!
//! [`define`] and [`define_async`] wrap a definition returning an
//! [`Outcome`] so that every invocation:
//!
//! 1. opens a fresh scope and makes it current,
//! 2. runs the definition, letting nested reversible calls contribute,
//! 3. folds the definition's own contributions and its children's into one
//!    combined value per channel,
//! 4. restores the caller's scope (on every exit path), and
//! 5. when nested, adds the combined values to the caller's scope.
//!
//! A definition that returns `Err` produces no outcome: its children's
//! contributions are discarded and the error is handed back unchanged.

use crate::handle::{AsyncHandle, Handle, PendingCall};
use crate::harvest::Combined;
use crate::outcome::Outcome;
use crate::scope::{self, ScopeRef};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;

const DEFAULT_NAME: &str = "reversible";

type SyncDefinition<A, R, E> = dyn Fn(A) -> Result<Outcome<R>, E> + Send + Sync;
type AsyncDefinition<A, R, E> =
    dyn Fn(A) -> BoxFuture<'static, Result<Outcome<R>, E>> + Send + Sync;

/// Wrap a synchronous definition
pub fn define<A, R, E, F>(definition: F) -> Reversible<A, R, E>
where
    F: Fn(A) -> Result<Outcome<R>, E> + Send + Sync + 'static,
{
    Reversible {
        name: DEFAULT_NAME,
        definition: Arc::new(definition),
    }
}

/// Wrap an asynchronous definition
pub fn define_async<A, R, E, F, Fut>(definition: F) -> AsyncReversible<A, R, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome<R>, E>> + Send + 'static,
{
    AsyncReversible {
        name: DEFAULT_NAME,
        definition: Arc::new(move |args| definition(args).boxed()),
    }
}

/// Fold a finished call into its combined values and hand them to the caller
fn finish<R, E>(
    name: &'static str,
    own_scope: &ScopeRef,
    parent: Option<&ScopeRef>,
    produced: Result<Outcome<R>, E>,
) -> Result<(R, Combined), E> {
    let children = own_scope.close();
    let outcome = match produced {
        Ok(outcome) => outcome,
        Err(e) => {
            if !children.is_empty() {
                tracing::debug!(
                    name,
                    discarded = children.len(),
                    "definition failed, discarding nested contributions"
                );
            }
            return Err(e);
        }
    };

    let (result, own) = outcome.into_parts();
    let combined = Combined::harvest(own, children).with_late_undo(own_scope.late_undo());
    if let Some(parent) = parent {
        tracing::trace!(name, parent = %parent.id(), "folding into caller");
        combined.propagate(parent);
    }
    Ok((result, combined))
}

/// A synchronous reversible function
pub struct Reversible<A, R, E> {
    name: &'static str,
    definition: Arc<SyncDefinition<A, R, E>>,
}

impl<A, R, E> Reversible<A, R, E> {
    /// Name used in log output
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Call like an ordinary function. Nested effects are still tracked for
    /// an enclosing reversible call, but no undo is handed back.
    pub fn call(&self, args: A) -> Result<R, E> {
        self.invoke(args).map(|(result, _)| result)
    }

    /// Call and get a [`Handle`] that can undo the call
    pub fn perform(&self, args: A) -> Result<Handle<R>, E> {
        self.invoke(args)
            .map(|(result, combined)| Handle::new(result, combined))
    }

    fn invoke(&self, args: A) -> Result<(R, Combined), E> {
        let parent = scope::current();
        let own_scope = ScopeRef::open(parent.clone());
        let span = tracing::trace_span!(
            "reversible",
            name = self.name,
            scope = %own_scope.id(),
            nested = parent.is_some()
        );
        let _guard = span.enter();

        let produced = scope::enter(Some(own_scope.clone()), || (self.definition)(args));
        finish(self.name, &own_scope, parent.as_ref(), produced)
    }
}

impl<A, R, E> Clone for Reversible<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            definition: Arc::clone(&self.definition),
        }
    }
}

impl<A, R, E> fmt::Debug for Reversible<A, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reversible")
            .field("name", &self.name)
            .finish()
    }
}

/// An asynchronous reversible function
pub struct AsyncReversible<A, R, E> {
    name: &'static str,
    definition: Arc<AsyncDefinition<A, R, E>>,
}

impl<A, R, E> AsyncReversible<A, R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    /// Name used in log output
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Call like an ordinary async function.
    ///
    /// The definition is invoked before this returns; the future drives the
    /// rest of the call.
    pub fn call(&self, args: A) -> impl Future<Output = Result<R, E>> + Send + 'static {
        self.invoke(args).map(|settled| settled.map(|(result, _)| result))
    }

    /// Call and get an [`AsyncHandle`] whose undo waits for the call to settle
    pub fn perform(&self, args: A) -> AsyncHandle<R, E> {
        AsyncHandle::new(self.invoke(args))
    }

    fn invoke(&self, args: A) -> PendingCall<R, E> {
        let name = self.name;
        let parent = scope::current();
        let own_scope = ScopeRef::open(parent.clone());
        let span = tracing::trace_span!(
            "reversible",
            name,
            scope = %own_scope.id(),
            nested = parent.is_some(),
            asynchronous = true
        );

        // Code that runs before the definition's first await is tracked too
        let pending = span.in_scope(|| {
            scope::enter(Some(own_scope.clone()), || (self.definition)(args))
        });

        async move {
            let produced = scope::instrument(Some(own_scope.clone()), pending).await;
            finish(name, &own_scope, parent.as_ref(), produced)
        }
        .instrument(span)
        .boxed()
    }
}

impl<A, R, E> Clone for AsyncReversible<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            definition: Arc::clone(&self.definition),
        }
    }
}

impl<A, R, E> fmt::Debug for AsyncReversible<A, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncReversible")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
#[path = "define_tests.rs"]
mod tests;
