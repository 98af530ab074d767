// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handles returned by `perform`
//!
//! A [`Handle`] is the explicit form of a finished call: its result, an
//! idempotent `undo`, and the exposed value of every other channel the call
//! touched. An [`AsyncHandle`] wraps a call that may still be running; its
//! `undo` waits for the call to settle first.

use crate::error::ChannelError;
use crate::harvest::Combined;
use crate::registry::{self, Erased};
use crate::undo::{UndoHandle, UNDO};
use futures::future::BoxFuture;
use std::any::{type_name, Any};
use std::fmt;

/// A completed reversible call
pub struct Handle<R> {
    pub result: R,
    undo: UndoHandle,
    channels: Vec<(&'static str, Erased)>,
}

impl<R> Handle<R> {
    pub(crate) fn new(result: R, combined: Combined) -> Self {
        let mut undo = None;
        let mut channels = Vec::new();
        for (name, value) in combined.into_values() {
            let Some(exposed) = registry::lookup(name).and_then(|channel| channel.expose(value))
            else {
                continue;
            };
            if name == UNDO {
                undo = exposed.downcast::<UndoHandle>().ok().map(|handle| *handle);
            } else {
                channels.push((name, exposed));
            }
        }
        Self {
            result,
            undo: undo.unwrap_or_else(UndoHandle::noop),
            channels,
        }
    }

    /// Undo everything this call did. Later calls are no-ops.
    pub fn undo(&self) {
        self.undo.undo();
    }

    /// Whether `undo` has been called (point-in-time)
    pub fn undone(&self) -> bool {
        self.undo.undone()
    }

    pub fn undo_handle(&self) -> &UndoHandle {
        &self.undo
    }

    /// The exposed value of `channel`
    pub fn channel<T: Any>(&self, channel: &str) -> Result<&T, ChannelError> {
        let value: &dyn Any = if channel == UNDO {
            &self.undo
        } else {
            self.channels
                .iter()
                .find(|(name, _)| *name == channel)
                .map(|(_, value)| &**value as &dyn Any)
                .ok_or_else(|| ChannelError::Missing {
                    channel: channel.to_string(),
                })?
        };
        value
            .downcast_ref::<T>()
            .ok_or_else(|| ChannelError::TypeMismatch {
                channel: channel.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Names of the non-undo channels this call touched
    pub fn channels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.channels.iter().map(|(name, _)| *name)
    }

    pub fn into_result(self) -> R {
        self.result
    }
}

impl<R: fmt::Debug> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("result", &self.result)
            .field("undone", &self.undone())
            .field("channels", &self.channels().collect::<Vec<_>>())
            .finish()
    }
}

pub(crate) type PendingCall<R, E> = BoxFuture<'static, Result<(R, Combined), E>>;

enum Settlement<R, E> {
    Pending(PendingCall<R, E>),
    Settled(Result<Handle<R>, E>),
}

/// A reversible call that may still be running
///
/// The call makes progress whenever one of the async methods is awaited.
pub struct AsyncHandle<R, E> {
    settlement: Settlement<R, E>,
    undone: bool,
}

impl<R, E> AsyncHandle<R, E> {
    pub(crate) fn new(pending: PendingCall<R, E>) -> Self {
        Self {
            settlement: Settlement::Pending(pending),
            undone: false,
        }
    }

    /// Drive the call to completion and borrow its handle or error
    pub async fn settle(&mut self) -> Result<&Handle<R>, &E> {
        loop {
            match self.settlement {
                Settlement::Settled(ref settled) => return settled.as_ref(),
                Settlement::Pending(ref mut pending) => {
                    let settled = pending
                        .await
                        .map(|(result, combined)| Handle::new(result, combined));
                    self.settlement = Settlement::Settled(settled);
                }
            }
        }
    }

    /// The call's result, once it has settled
    pub async fn result(&mut self) -> Result<&R, &E> {
        self.settle().await.map(|handle| &handle.result)
    }

    /// Wait for the call to settle, then undo everything it did.
    ///
    /// Safe to call before the result was awaited, and more than once.
    pub async fn undo(&mut self) {
        if self.undone {
            tracing::trace!("already undone");
            return;
        }
        self.undone = true;
        if let Ok(handle) = self.settle().await {
            handle.undo();
        }
    }

    /// Whether `undo` has been called (point-in-time)
    pub fn undone(&self) -> bool {
        self.undone
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.settlement, Settlement::Settled(_))
    }

    /// Drive the call to completion and take its result
    pub async fn into_result(self) -> Result<R, E> {
        match self.settlement {
            Settlement::Settled(settled) => settled.map(Handle::into_result),
            Settlement::Pending(pending) => pending.await.map(|(result, _)| result),
        }
    }
}

impl<R, E> fmt::Debug for AsyncHandle<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncHandle")
            .field("settled", &self.is_settled())
            .field("undone", &self.undone)
            .finish()
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
