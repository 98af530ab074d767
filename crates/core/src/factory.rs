// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public factory for composite reversible functions
//!
//! A composite function contributes nothing of its own: its undo is made of
//! whatever reversible calls it made while running.

use crate::define::{define, define_async, AsyncReversible, Reversible};
use crate::outcome::Outcome;
use futures::TryFutureExt;
use std::future::Future;

/// Make a reversible function out of ordinary code that calls other
/// reversible functions
///
/// ```ignore
/// let move_file = reversible(|(from, to): (PathBuf, PathBuf)| {
///     copy.call((from.clone(), to))?;
///     remove.call(from)
/// });
/// let moved = move_file.perform((a, b))?;
/// moved.undo();
/// ```
pub fn reversible<A, R, E, F>(f: F) -> Reversible<A, R, E>
where
    F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
{
    define(move |args| f(args).map(Outcome::new))
}

/// Async form of [`reversible`]
pub fn reversible_async<A, R: 'static, E, F, Fut>(f: F) -> AsyncReversible<A, R, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    define_async(move |args| f(args).map_ok(Outcome::new))
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
