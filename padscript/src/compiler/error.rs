/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured errors and warnings for the line compiler.
//!
//! * [`ErrorKind`] – what is wrong with a row (low-level, carries the exact
//!   field and value).
//! * [`CompileError`] – the fatal error returned from
//!   [`compile()`](super::compile): the kind plus the offending row.
//! * [`Warning`] – non-fatal findings collected alongside a successful
//!   compilation.
//!
//! **Do not** replace these with `anyhow::Error` on the compile path; callers
//! match on the variants.

use thiserror::Error;

use crate::action::Channel;
use crate::timeline::{TimelineError, ORIGIN_ID};

use super::row::Row;

// ── Channel state violations ──────────────────────────────────────────────────

/// Why a row breaks the action sequence of its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    /// The row starts before the previous action on the channel has ended.
    Overlap { previous_end_ns: u64, start_ns: u64 },

    /// The channel's last action is not a release / segment end.  Indicates
    /// an internal bug.
    UnexpectedState,
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationReason::Overlap {
                previous_end_ns,
                start_ns,
            } => write!(
                f,
                "starts at {:.3}ms but previous action ends at {:.3}ms",
                *start_ns as f64 / 1e6,
                *previous_end_ns as f64 / 1e6
            ),
            ViolationReason::UnexpectedState => {
                write!(f, "last action is not a release / segment end")
            }
        }
    }
}

// ── Error kinds ───────────────────────────────────────────────────────────────

/// What went wrong with a single row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// A required field is absent or empty.
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    /// A numeric field is not a number, is negative where it must not be, or
    /// overflows once converted to nanoseconds.
    #[error("invalid number in '{field}': '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    /// `start_after_id` does not name an earlier row.
    #[error("start_after_id '{id}' does not match any earlier row")]
    UnknownReferenceId { id: String },

    /// `id` is already in use.
    #[error("id '{id}' already in use ('{}' is reserved)", ORIGIN_ID)]
    DuplicateId { id: String },

    /// `input` is not one of the known channels.
    #[error("unknown input '{name}'")]
    UnknownChannel { name: String },

    /// A stick position component is out of bounds.
    #[error("'{field}' = {value} is outside [{min}, {max}]")]
    OutOfRangeValue {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Both angle/magnitude and x/y were supplied for one stick row.
    #[error("stick row gives both angle/magnitude and x/y")]
    ConflictingPosition,

    /// The row would break the press/release (start/end) sequence of a channel.
    #[error("input '{channel}': {reason}")]
    ChannelStateViolation {
        channel: Channel,
        reason: ViolationReason,
    },
}

impl From<TimelineError> for ErrorKind {
    fn from(e: TimelineError) -> Self {
        match e {
            TimelineError::DuplicateId { id } => ErrorKind::DuplicateId { id },
            TimelineError::UnknownReferenceId { id } => ErrorKind::UnknownReferenceId { id },
        }
    }
}

// ── CompileError ──────────────────────────────────────────────────────────────

/// Fatal compilation error: compilation stopped at `row`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {}: {kind} in row {row}", .row.line())]
pub struct CompileError {
    pub kind: ErrorKind,
    pub row: Row,
}

impl CompileError {
    pub fn new(kind: ErrorKind, row: &Row) -> Self {
        Self {
            kind,
            row: row.clone(),
        }
    }

    /// Line number of the offending row.
    pub fn line(&self) -> usize {
        self.row.line()
    }
}

// ── Warnings ──────────────────────────────────────────────────────────────────

/// Non-fatal findings.  Never change the compiled output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The action starts sooner than the configured minimum transition time
    /// and the hardware might not keep up.
    TransitionTooFast {
        line: usize,
        channel: Channel,
        /// Time between the reference point and the new start.
        gap_ns: u64,
        min_ns: u64,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::TransitionTooFast {
                line,
                channel,
                gap_ns,
                min_ns,
            } => write!(
                f,
                "line {line}: input '{channel}' transitions after {:.3}ms (minimum {:.3}ms), might not keep up",
                *gap_ns as f64 / 1e6,
                *min_ns as f64 / 1e6
            ),
        }
    }
}
