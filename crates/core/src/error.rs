// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for channel access

use thiserror::Error;

/// Errors reading a channel value off a handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel not present on this call: {channel}")]
    Missing { channel: String },
    #[error("channel {channel} does not hold a {expected}")]
    TypeMismatch {
        channel: String,
        expected: &'static str,
    },
}
