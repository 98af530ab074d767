// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rev-core: reversible functions
//!
//! A reversible function is one whose call can later be undone. Calls made
//! from inside another reversible call are tracked automatically, so undoing
//! the outer call undoes everything it did, most recent first.
//!
//! This crate provides:
//! - [`define`] / [`define_async`] for definitions that return an [`Outcome`]
//! - [`reversible`] / [`reversible_async`] for composites built from other
//!   reversible calls
//! - a registry of named side-channels ([`register`], [`Channel`]) of which
//!   [`UNDO`] is built in
//! - [`until`] for awaiting foreign futures without tracking

mod define;
mod error;
mod factory;
mod handle;
mod harvest;
mod id;
mod outcome;
mod registry;
mod scope;
mod undo;
mod until;

pub use define::{define, define_async, AsyncReversible, Reversible};
pub use error::ChannelError;
pub use factory::{reversible, reversible_async};
pub use handle::{AsyncHandle, Handle};
pub use id::ScopeId;
pub use outcome::Outcome;
pub use registry::{is_registered, register, Channel, RESULT};
pub use scope::is_tracking;
pub use undo::{Undo, UndoChannel, UndoHandle, UNDO};
pub use until::until;
