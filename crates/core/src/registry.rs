// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side-channel registry
//!
//! A process-wide table of named channels. Each channel describes how the
//! per-call contributions made during a reversible call tree are collected
//! (`bucket`, `add`), folded into one value per call (`combine`) and exposed
//! on a handle (`transform`). Only [`UNDO`] is registered up front.
//!
//! Registration is first-wins: a second registration under an existing name,
//! or any registration under [`RESULT`], is ignored. Channels are never
//! removed.

use crate::undo::{UndoChannel, UNDO};
use std::any::{type_name, Any};
use std::sync::{Arc, LazyLock, RwLock};

/// Reserved name; channels cannot be registered under it
pub const RESULT: &str = "result";

/// Type-erased channel value as it travels between calls and scopes
pub(crate) type Erased = Box<dyn Any + Send>;

/// A named side-channel aggregated across a call tree
///
/// A call's bucket receives both the call's own raw contributions and the
/// combined values of its nested calls, so a raw contribution and a combined
/// value share the one `Value` type. A channel collecting single items
/// therefore takes one-element collections and extends its bucket:
///
/// ```ignore
/// impl Channel for Tags {
///     type Value = Vec<u64>;
///     type Bucket = Vec<u64>;
///     type Exposed = Vec<u64>;
///
///     fn bucket(&self) -> Vec<u64> { Vec::new() }
///     fn add(&self, bucket: &mut Vec<u64>, value: Vec<u64>) { bucket.extend(value) }
///     fn combine(&self, bucket: Vec<u64>) -> Vec<u64> { bucket }
///     fn transform(&self, combined: Vec<u64>) -> Vec<u64> { combined }
/// }
///
/// Outcome::new(n + 1).with("tags", vec![n])
/// ```
pub trait Channel: Send + Sync + 'static {
    /// One contribution, and also the combined value of a whole call so that
    /// it can be added into the parent's bucket
    type Value: Clone + Send + 'static;
    /// Accumulator for contributions made within one call
    type Bucket: Send + 'static;
    /// What a handle exposes for this channel
    type Exposed: Send + 'static;

    fn bucket(&self) -> Self::Bucket;
    fn add(&self, bucket: &mut Self::Bucket, value: Self::Value);
    fn combine(&self, bucket: Self::Bucket) -> Self::Value;
    fn transform(&self, combined: Self::Value) -> Self::Exposed;
}

/// Object-safe view of a [`Channel`] over erased values
pub(crate) trait ErasedChannel: Send + Sync {
    fn accepts(&self, value: &Erased) -> bool;
    fn fold(&self, values: Vec<Erased>) -> Erased;
    fn duplicate(&self, value: &Erased) -> Option<Erased>;
    fn expose(&self, combined: Erased) -> Option<Erased>;
    fn value_type(&self) -> &'static str;
}

struct Entry<C>(C);

impl<C: Channel> ErasedChannel for Entry<C> {
    fn accepts(&self, value: &Erased) -> bool {
        value.is::<C::Value>()
    }

    fn fold(&self, values: Vec<Erased>) -> Erased {
        let mut bucket = self.0.bucket();
        for value in values {
            if let Ok(value) = value.downcast::<C::Value>() {
                self.0.add(&mut bucket, *value);
            }
        }
        Box::new(self.0.combine(bucket))
    }

    fn duplicate(&self, value: &Erased) -> Option<Erased> {
        value
            .downcast_ref::<C::Value>()
            .map(|value| Box::new(value.clone()) as Erased)
    }

    fn expose(&self, combined: Erased) -> Option<Erased> {
        combined
            .downcast::<C::Value>()
            .ok()
            .map(|value| Box::new(self.0.transform(*value)) as Erased)
    }

    fn value_type(&self) -> &'static str {
        type_name::<C::Value>()
    }
}

/// A registered channel
#[derive(Clone)]
pub(crate) struct Registered {
    pub name: &'static str,
    pub channel: Arc<dyn ErasedChannel>,
}

static REGISTRY: LazyLock<RwLock<Vec<Registered>>> = LazyLock::new(|| {
    RwLock::new(vec![Registered {
        name: UNDO,
        channel: Arc::new(Entry(UndoChannel)),
    }])
});

/// Register a channel under `name`.
///
/// Returns `true` if the channel was installed. Registrations under an
/// existing name or under [`RESULT`] are ignored and return `false`.
pub fn register<C: Channel>(name: &'static str, channel: C) -> bool {
    if name == RESULT {
        tracing::debug!(channel = name, "ignoring registration under reserved name");
        return false;
    }

    let mut registry = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
    if registry.iter().any(|entry| entry.name == name) {
        tracing::debug!(channel = name, "channel already registered, keeping first");
        return false;
    }

    registry.push(Registered {
        name,
        channel: Arc::new(Entry(channel)),
    });
    tracing::debug!(
        channel = name,
        value = type_name::<C::Value>(),
        "registered channel"
    );
    true
}

/// Whether a channel is registered under `name`
pub fn is_registered(name: &str) -> bool {
    lookup(name).is_some()
}

/// Snapshot of every registered channel, in registration order
pub(crate) fn registered() -> Vec<Registered> {
    REGISTRY.read().unwrap_or_else(|e| e.into_inner()).clone()
}

pub(crate) fn lookup(name: &str) -> Option<Arc<dyn ErasedChannel>> {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| Arc::clone(&entry.channel))
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
