// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Folding a finished call's contributions into per-channel values

use crate::registry::{self, Erased};
use crate::scope::ScopeRef;
use crate::undo::{Undo, UNDO};
use std::collections::HashMap;

/// One combined value per channel touched during a call
#[derive(Default)]
pub(crate) struct Combined {
    values: Vec<(&'static str, Erased)>,
}

impl Combined {
    /// Fold a call's own raw contributions and its children's contributions.
    ///
    /// For every registered channel the bucket receives the call's own values
    /// first and then the children's, in arrival order. Channels nobody
    /// touched are left out.
    pub(crate) fn harvest(
        own: Vec<(&'static str, Erased)>,
        children: Vec<(&'static str, Erased)>,
    ) -> Self {
        let mut grouped: HashMap<&'static str, Vec<Erased>> = HashMap::new();
        for (name, value) in own.into_iter().chain(children) {
            grouped.entry(name).or_default().push(value);
        }

        let mut values = Vec::new();
        for entry in registry::registered() {
            let Some(contributed) = grouped.remove(entry.name) else {
                continue;
            };
            let (accepted, rejected): (Vec<_>, Vec<_>) = contributed
                .into_iter()
                .partition(|value| entry.channel.accepts(value));
            if !rejected.is_empty() {
                tracing::warn!(
                    channel = entry.name,
                    expected = entry.channel.value_type(),
                    dropped = rejected.len(),
                    "dropping contributions of unexpected type"
                );
            }
            if accepted.is_empty() {
                continue;
            }
            values.push((entry.name, entry.channel.fold(accepted)));
        }

        for (name, dropped) in grouped {
            tracing::debug!(
                channel = name,
                dropped = dropped.len(),
                "ignoring contributions to unregistered channel"
            );
        }

        Self { values }
    }

    /// Put `late` in front of the combined undo, adding one if the call
    /// collected none, so actions that arrive after harvest run first
    pub(crate) fn with_late_undo(mut self, late: Undo) -> Self {
        match self.values.iter_mut().find(|(name, _)| *name == UNDO) {
            Some((_, value)) => {
                let combined = std::mem::replace(value, Box::new(Undo::noop()));
                let combined = combined
                    .downcast::<Undo>()
                    .map(|combined| *combined)
                    .unwrap_or_else(|_| Undo::noop());
                *value = Box::new(Undo::sequence([late, combined]));
            }
            None => self.values.push((UNDO, Box::new(late))),
        }
        self
    }

    /// Add a copy of every combined value to the caller's scope
    pub(crate) fn propagate(&self, parent: &ScopeRef) {
        for (name, value) in &self.values {
            let copy = registry::lookup(name).and_then(|channel| channel.duplicate(value));
            if let Some(copy) = copy {
                parent.contribute(name, copy);
            }
        }
    }

    pub(crate) fn into_values(self) -> Vec<(&'static str, Erased)> {
        self.values
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.values.iter().map(|(name, _)| *name).collect()
    }
}

#[cfg(test)]
#[path = "harvest_tests.rs"]
mod tests;
