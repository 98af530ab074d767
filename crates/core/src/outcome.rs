// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What a definition hands back to the wrapper

use crate::registry::{Erased, RESULT};
use crate::undo::{Undo, UNDO};
use std::fmt;

/// A definition's result plus its own raw channel contributions
///
/// ```ignore
/// Outcome::new(id)
///     .undo(move || store.remove(id))
///     .with("audit", vec![format!("inserted {id}")])
/// ```
pub struct Outcome<R> {
    pub result: R,
    contributions: Vec<(&'static str, Erased)>,
}

impl<R> Outcome<R> {
    pub fn new(result: R) -> Self {
        Self {
            result,
            contributions: Vec::new(),
        }
    }

    /// Attach this call's own undo action
    pub fn undo(self, action: impl FnOnce() + Send + 'static) -> Self {
        self.with(UNDO, Undo::new(action))
    }

    /// Attach a raw contribution to `channel`.
    ///
    /// The value must be of the channel's registered `Value` type; anything
    /// else is dropped (with a warning) when the call is harvested.
    pub fn with<V: Send + 'static>(mut self, channel: &'static str, value: V) -> Self {
        if channel == RESULT {
            tracing::debug!("ignoring contribution to reserved channel name");
            return self;
        }
        self.contributions.push((channel, Box::new(value)));
        self
    }

    pub fn map<U>(self, f: impl FnOnce(R) -> U) -> Outcome<U> {
        Outcome {
            result: f(self.result),
            contributions: self.contributions,
        }
    }

    /// Channel names this outcome contributes to, in order
    pub fn channels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.contributions.iter().map(|(name, _)| *name)
    }

    pub(crate) fn into_parts(self) -> (R, Vec<(&'static str, Erased)>) {
        (self.result, self.contributions)
    }
}

impl<R> From<R> for Outcome<R> {
    fn from(result: R) -> Self {
        Self::new(result)
    }
}

impl<R: fmt::Debug> fmt::Debug for Outcome<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome")
            .field("result", &self.result)
            .field("channels", &self.channels().collect::<Vec<_>>())
            .finish()
    }
}
