//! Schedule expansion: replay a compiled script `repeats + 1` times.
//!
//! Each repeat is an independent copy of every action with
//! `start_time + k · duration` added to its timestamp.  Inside a repeat the
//! relative spacing is exactly that of the compiled script; repeat `k + 1`
//! starts where repeat `k` ends.
//!
//! ```text
//! start_time           start + D            start + 2D        start + (R+1)D
//!     │── repeat 0 ───────│── repeat 1 ───────│── ... ──────────│
//! ```
//!
//! [`expand`] only reads the [`CompiledScript`] and allocates a fresh
//! [`Schedule`], so it can be called concurrently on a shared script with
//! different repeat counts or start times.

pub mod offset;

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::action::{Button, ButtonEdge, Stick, StickSegment};
use crate::compiler::CompiledScript;

use offset::{repeat_offset, schedule_end};

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur during expansion.
///
/// Expansion of a valid script only fails when a timestamp no longer fits in
/// `u64` nanoseconds (about 584 years).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// `start + k · duration` overflowed.
    OffsetOverflow { repeat: u32, duration_ns: u64 },

    /// An action timestamp plus its repeat offset overflowed.
    TimestampOverflow { time_ns: u64, offset_ns: u64 },
}

impl std::fmt::Display for ExpandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpandError::OffsetOverflow {
                repeat,
                duration_ns,
            } => write!(
                f,
                "offset of repeat {repeat} overflows (script duration {duration_ns}ns)"
            ),
            ExpandError::TimestampOverflow { time_ns, offset_ns } => {
                write!(f, "timestamp {time_ns}ns + offset {offset_ns}ns overflows")
            }
        }
    }
}

impl std::error::Error for ExpandError {}

// ── Schedule ──────────────────────────────────────────────────────────────────

/// Fully expanded, absolute-time schedule handed to the actuation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    buttons: BTreeMap<Button, Vec<ButtonEdge>>,
    sticks: BTreeMap<Stick, Vec<StickSegment>>,
    start_time_ns: u64,
    end_time_ns: u64,
    repeats: u32,
}

impl Schedule {
    pub fn button_edges(&self, button: Button) -> &[ButtonEdge] {
        self.buttons.get(&button).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stick_segments(&self, stick: Stick) -> &[StickSegment] {
        self.sticks.get(&stick).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn buttons(&self) -> &BTreeMap<Button, Vec<ButtonEdge>> {
        &self.buttons
    }

    pub fn sticks(&self) -> &BTreeMap<Stick, Vec<StickSegment>> {
        &self.sticks
    }

    pub fn start_time_ns(&self) -> u64 {
        self.start_time_ns
    }

    /// `start_time + (repeats + 1) · script duration`.
    pub fn end_time_ns(&self) -> u64 {
        self.end_time_ns
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    pub fn action_count(&self) -> usize {
        self.buttons.values().map(Vec::len).sum::<usize>()
            + self.sticks.values().map(Vec::len).sum::<usize>()
    }
}

// ── expand ────────────────────────────────────────────────────────────────────

/// Replay `script` `repeats + 1` times starting at `start_time_ns`.
///
/// The script's own repeat count is ignored; use
/// [`CompiledScript::expand`] to honour it.
///
/// # Errors
/// [`ExpandError`] if any offset or timestamp overflows `u64`.
pub fn expand(
    script: &CompiledScript,
    repeats: u32,
    start_time_ns: u64,
) -> Result<Schedule, ExpandError> {
    let duration_ns = script.duration_ns();
    let copies = (repeats as usize).saturating_add(1);

    let mut buttons: BTreeMap<Button, Vec<ButtonEdge>> = script
        .buttons()
        .iter()
        .map(|(&b, edges)| (b, Vec::with_capacity(edges.len().saturating_mul(copies))))
        .collect();
    let mut sticks: BTreeMap<Stick, Vec<StickSegment>> = script
        .sticks()
        .iter()
        .map(|(&s, segs)| (s, Vec::with_capacity(segs.len().saturating_mul(copies))))
        .collect();

    for k in 0..=repeats {
        let offset_ns = repeat_offset(start_time_ns, k, duration_ns)?;
        debug!(repeat = k, offset_ns, "expanding repeat");

        for (button, edges) in script.buttons() {
            let out = buttons.entry(*button).or_default();
            for edge in edges {
                let shifted = edge
                    .offset_by(offset_ns)
                    .ok_or(ExpandError::TimestampOverflow {
                        time_ns: edge.time_ns,
                        offset_ns,
                    })?;
                out.push(shifted);
            }
        }

        for (stick, segments) in script.sticks() {
            let out = sticks.entry(*stick).or_default();
            for seg in segments {
                let shifted = seg
                    .offset_by(offset_ns)
                    .ok_or(ExpandError::TimestampOverflow {
                        time_ns: seg.time_ns,
                        offset_ns,
                    })?;
                out.push(shifted);
            }
        }
    }

    let end_time_ns = schedule_end(start_time_ns, repeats, duration_ns)?;

    let schedule = Schedule {
        buttons,
        sticks,
        start_time_ns,
        end_time_ns,
        repeats,
    };

    info!(
        repeats,
        actions = schedule.action_count(),
        start_time_ns,
        end_time_ns,
        "Schedule expanded"
    );
    Ok(schedule)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
