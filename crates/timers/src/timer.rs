// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A timeout or interval whose undo cancels it
//!
//! ```ignore
//! let pause = timer();
//! let call = pause.perform((Duration::from_secs(1), TimerOptions::default()))?;
//! call.result.then(|| println!("tick"));
//! call.undo(); // nothing fires
//! ```

use rev_core::{define, Outcome, Reversible};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timers need a running tokio runtime")]
    NoRuntime,
    #[error("a repeating timer needs a non-zero period")]
    ZeroPeriod,
}

/// How a [`Timer`] schedules its callbacks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerOptions {
    /// Fire every `duration` instead of once
    pub repeat: bool,
}

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct State {
    callbacks: Vec<Callback>,
    task: Option<JoinHandle<()>>,
}

/// A scheduled timer, returned as the result of a [`timer`] call
#[derive(Clone)]
pub struct Timer {
    duration: Duration,
    options: TimerOptions,
    runtime: Handle,
    state: Arc<Mutex<State>>,
}

impl Timer {
    /// Add a callback. The first one starts the schedule; later ones fire on
    /// the same schedule.
    pub fn then(&self, callback: impl Fn() + Send + Sync + 'static) -> &Self {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.callbacks.push(Arc::new(callback));
        if state.task.is_none() {
            state.task = Some(self.schedule());
        }
        self
    }

    /// Whether a schedule is running (point-in-time)
    pub fn is_scheduled(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn options(&self) -> TimerOptions {
        self.options
    }

    fn schedule(&self) -> JoinHandle<()> {
        let duration = self.duration;
        let repeat = self.options.repeat;
        let state = Arc::clone(&self.state);
        tracing::debug!(?duration, repeat, "scheduling timer");
        self.runtime.spawn(async move {
            if !repeat {
                time::sleep(duration).await;
                fire(&state);
                return;
            }
            let mut ticks = time::interval_at(Instant::now() + duration, duration);
            loop {
                ticks.tick().await;
                fire(&state);
            }
        })
    }

    fn cancel(&self) {
        let task = self
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .task
            .take();
        if let Some(task) = task {
            tracing::debug!(duration = ?self.duration, "cancelling timer");
            task.abort();
        }
    }
}

/// Run every callback registered so far, without holding the lock
fn fire(state: &Mutex<State>) {
    let callbacks = state
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .callbacks
        .clone();
    tracing::trace!(callbacks = callbacks.len(), "timer fired");
    for callback in callbacks {
        callback();
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("duration", &self.duration)
            .field("options", &self.options)
            .field("scheduled", &self.is_scheduled())
            .finish()
    }
}

/// A reversible timer.
///
/// Calling it captures the current tokio runtime; undoing the call cancels
/// the schedule so no callback fires afterwards.
pub fn timer() -> Reversible<(Duration, TimerOptions), Timer, TimerError> {
    define(|(duration, options): (Duration, TimerOptions)| {
        if options.repeat && duration.is_zero() {
            return Err(TimerError::ZeroPeriod);
        }
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        let timer = Timer {
            duration,
            options,
            runtime,
            state: Arc::default(),
        };
        let cancel = timer.clone();
        Ok(Outcome::new(timer).undo(move || cancel.cancel()))
    })
    .named("timer")
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
