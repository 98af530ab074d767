// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Awaiting without an ambient scope

use crate::scope;
use std::future::Future;

/// Await a foreign future with tracking suspended.
///
/// Reversible calls made while `future` is being polled are not attributed
/// to the enclosing call. The enclosing call's scope is current again as
/// soon as this returns.
///
/// ```ignore
/// let parent = define_async(move |_| async move {
///     step.call(1).await?;
///     until(tokio::time::sleep(PAUSE)).await;
///     Ok(Outcome::new(()))
/// });
/// ```
pub fn until<F: Future>(future: F) -> impl Future<Output = F::Output> {
    tracing::trace!(tracking = scope::is_tracking(), "suspending tracking");
    scope::instrument(None, future)
}

#[cfg(test)]
#[path = "until_tests.rs"]
mod tests;
