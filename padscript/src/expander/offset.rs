/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Checked offset arithmetic for repeat expansion.
//!
//! Offsets are computed from the repeat index, never accumulated across
//! repeats.

use super::ExpandError;

/// Offset of repeat `k`: `start_ns + k · duration_ns`.
pub fn repeat_offset(start_ns: u64, k: u32, duration_ns: u64) -> Result<u64, ExpandError> {
    duration_ns
        .checked_mul(u64::from(k))
        .and_then(|span| span.checked_add(start_ns))
        .ok_or(ExpandError::OffsetOverflow {
            repeat: k,
            duration_ns,
        })
}

/// End of the whole schedule: `start_ns + (repeats + 1) · duration_ns`.
pub fn schedule_end(start_ns: u64, repeats: u32, duration_ns: u64) -> Result<u64, ExpandError> {
    let copies = u64::from(repeats) + 1;
    duration_ns
        .checked_mul(copies)
        .and_then(|span| span.checked_add(start_ns))
        .ok_or(ExpandError::OffsetOverflow {
            repeat: repeats.saturating_add(1),
            duration_ns,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
