/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Line compiler: turns script rows into per-channel action lists.
//!
//! [`LineCompiler`] consumes rows one at a time, in order.  For each row it
//!
//! 1. reads `start_delay_ms` / `duration_ms`,
//! 2. resolves the start time against the [`TimelineIndex`]
//!    (`start_after_id`, or the previous row when empty),
//! 3. checks the row's `id` is free,
//! 4. classifies `input` as a button or a stick,
//! 5. validates the new action against the previous one on that channel,
//!
//! and only then commits: the end time is registered and a press/release
//! (start/end) pair is appended.  A rejected row leaves the compiler
//! untouched.
//!
//! [`compile()`] drives a whole script and stops at the first error; no
//! partial [`CompiledScript`] is ever returned.
//!
//! # Transition warnings
//! The "too fast" check is measured differently per channel kind:
//!
//! | Channel | Measured from |
//! |---|---|
//! | Button | previous **release** |
//! | Stick | previous segment **start** |

pub mod error;
pub mod row;

pub use error::{CompileError, ErrorKind, ViolationReason, Warning};
pub use row::Row;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::action::{
    Boundary, Button, ButtonEdge, Channel, Stick, StickPosition, StickSegment, Transition,
};
use crate::config::CompilerConfig;
use crate::expander::{self, ExpandError, Schedule};
use crate::timeline::TimelineIndex;

use row::field;

// ── Constants ─────────────────────────────────────────────────────────────────

const ANGLE_RANGE: (f64, f64) = (0.0, 360.0);
const PERCENT_RANGE: (f64, f64) = (-100.0, 100.0);

// ── CompiledScript ────────────────────────────────────────────────────────────

/// Result of compiling one script: every channel's actions relative to the
/// script origin, the script duration and the repeat count.
///
/// Immutable once built; [`expander::expand`] works on copies.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledScript {
    buttons: BTreeMap<Button, Vec<ButtonEdge>>,
    sticks: BTreeMap<Stick, Vec<StickSegment>>,
    duration_ns: u64,
    repeats: u32,
}

impl CompiledScript {
    /// Edges of `button`, in time order.
    pub fn button_edges(&self, button: Button) -> &[ButtonEdge] {
        self.buttons.get(&button).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Segments of `stick`, in time order.
    pub fn stick_segments(&self, stick: Stick) -> &[StickSegment] {
        self.sticks.get(&stick).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All button lists, one entry per button (empty lists included).
    pub fn buttons(&self) -> &BTreeMap<Button, Vec<ButtonEdge>> {
        &self.buttons
    }

    /// All stick lists, one entry per stick (empty lists included).
    pub fn sticks(&self) -> &BTreeMap<Stick, Vec<StickSegment>> {
        &self.sticks
    }

    /// Latest end time of any row.
    pub fn duration_ns(&self) -> u64 {
        self.duration_ns
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    /// Total number of edges and segment markers.
    pub fn action_count(&self) -> usize {
        self.buttons.values().map(Vec::len).sum::<usize>()
            + self.sticks.values().map(Vec::len).sum::<usize>()
    }

    /// Expand into `repeats + 1` back-to-back copies starting at
    /// `start_time_ns`.
    pub fn expand(&self, start_time_ns: u64) -> Result<Schedule, ExpandError> {
        expander::expand(self, self.repeats, start_time_ns)
    }
}

/// A successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub script: CompiledScript,
    /// Non-fatal findings, in row order.
    pub warnings: Vec<Warning>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Compile `rows` in order.
///
/// # Errors
/// The first row that fails validation aborts compilation; the
/// [`CompileError`] carries that row and the reason.
///
/// # Example
/// ```rust
/// use padscript::action::Button;
/// use padscript::compiler::{compile, Row};
/// use padscript::config::CompilerConfig;
///
/// let rows = vec![
///     Row::from_fields(1, [("id", "jump"), ("input", "a"), ("start_delay_ms", "0"), ("duration_ms", "100")]),
///     Row::from_fields(2, [("start_after_id", "jump"), ("input", "b"), ("start_delay_ms", "20"), ("duration_ms", "50")]),
/// ];
///
/// let out = compile(&rows, &CompilerConfig::default()).unwrap();
/// assert_eq!(out.script.button_edges(Button::B)[0].time_ns, 120_000_000);
/// assert_eq!(out.script.duration_ns(), 170_000_000);
/// ```
pub fn compile(rows: &[Row], config: &CompilerConfig) -> Result<CompileOutput, CompileError> {
    let mut compiler = LineCompiler::new(config);
    for row in rows {
        compiler.compile_row(row)?;
    }
    let output = compiler.finish();

    info!(
        rows = rows.len(),
        actions = output.script.action_count(),
        duration_ms = output.script.duration_ns() / row::NS_PER_MS,
        repeats = output.script.repeats(),
        warnings = output.warnings.len(),
        "=== Script compiled ==="
    );
    Ok(output)
}

// ── LineCompiler ──────────────────────────────────────────────────────────────

/// Incremental, row-by-row compiler state.
#[derive(Debug)]
pub struct LineCompiler {
    timeline: TimelineIndex,
    buttons: BTreeMap<Button, Vec<ButtonEdge>>,
    sticks: BTreeMap<Stick, Vec<StickSegment>>,
    warnings: Vec<Warning>,
    min_button_transition_ns: u64,
    min_stick_transition_ns: u64,
    repeats: u32,
}

/// Everything a validated row will add once committed.
enum Pending {
    Button(Button, [ButtonEdge; 2]),
    Stick(Stick, [StickSegment; 2]),
}

impl LineCompiler {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            timeline: TimelineIndex::new(),
            buttons: Button::ALL.iter().map(|&b| (b, Vec::new())).collect(),
            sticks: Stick::ALL.iter().map(|&s| (s, Vec::new())).collect(),
            warnings: Vec::new(),
            min_button_transition_ns: config.min_button_transition_ns(),
            min_stick_transition_ns: config.min_stick_transition_ns(),
            repeats: config.repeats,
        }
    }

    /// Validate `row` and append its actions.
    ///
    /// On error nothing is changed: the timeline, the channel lists and the
    /// warnings are exactly as before the call.
    pub fn compile_row(&mut self, row: &Row) -> Result<(), CompileError> {
        self.compile_row_inner(row)
            .map_err(|kind| CompileError::new(kind, row))
    }

    fn compile_row_inner(&mut self, row: &Row) -> Result<(), ErrorKind> {
        // ── Timing ────────────────────────────────────────────────────────────
        // Both fields must be present before either is parsed.
        row.require(field::START_DELAY_MS)?;
        row.require(field::DURATION_MS)?;
        let delay_ns = row.millis_as_ns(field::START_DELAY_MS)?;
        let duration_ns = row.millis_as_ns(field::DURATION_MS)?;

        let anchor_ns = self.timeline.resolve(row.get(field::START_AFTER_ID))?;
        let start_ns = checked_sum(anchor_ns, delay_ns, field::START_DELAY_MS)?;
        let end_ns = checked_sum(start_ns, duration_ns, field::DURATION_MS)?;

        let id = row.get(field::ID);
        self.timeline.ensure_available(id)?;

        // ── Channel ───────────────────────────────────────────────────────────
        let name = row.require(field::INPUT)?;
        let channel: Channel = name.parse().map_err(|_| ErrorKind::UnknownChannel {
            name: name.to_string(),
        })?;

        let (pending, warning) = match channel {
            Channel::Button(button) => self.check_button(row, button, start_ns, end_ns)?,
            Channel::Stick(stick) => {
                let position = parse_position(row)?;
                self.check_stick(row, stick, position, start_ns, end_ns)?
            }
        };

        // ── Commit ────────────────────────────────────────────────────────────
        self.timeline.register(id, end_ns)?;

        match pending {
            Pending::Button(button, edges) => {
                self.buttons.entry(button).or_default().extend(edges);
            }
            Pending::Stick(stick, segments) => {
                self.sticks.entry(stick).or_default().extend(segments);
            }
        }

        if let Some(w) = warning {
            warn!("{w}");
            self.warnings.push(w);
        }

        debug!(
            line = row.line(),
            input = %channel,
            start_ns,
            end_ns,
            id = id.unwrap_or(""),
            "row compiled"
        );
        Ok(())
    }

    fn check_button(
        &self,
        row: &Row,
        button: Button,
        start_ns: u64,
        end_ns: u64,
    ) -> Result<(Pending, Option<Warning>), ErrorKind> {
        let channel = Channel::Button(button);
        let mut warning = None;

        if let Some(last) = self.buttons.get(&button).and_then(|v| v.last()) {
            if last.transition != Transition::Release {
                return Err(ErrorKind::ChannelStateViolation {
                    channel,
                    reason: ViolationReason::UnexpectedState,
                });
            }
            if last.time_ns > start_ns {
                return Err(ErrorKind::ChannelStateViolation {
                    channel,
                    reason: ViolationReason::Overlap {
                        previous_end_ns: last.time_ns,
                        start_ns,
                    },
                });
            }
            if last.time_ns.saturating_add(self.min_button_transition_ns) > start_ns {
                warning = Some(Warning::TransitionTooFast {
                    line: row.line(),
                    channel,
                    gap_ns: start_ns - last.time_ns,
                    min_ns: self.min_button_transition_ns,
                });
            }
        }

        let edges = [
            ButtonEdge::press(button, start_ns),
            ButtonEdge::release(button, end_ns),
        ];
        Ok((Pending::Button(button, edges), warning))
    }

    fn check_stick(
        &self,
        row: &Row,
        stick: Stick,
        position: StickPosition,
        start_ns: u64,
        end_ns: u64,
    ) -> Result<(Pending, Option<Warning>), ErrorKind> {
        let channel = Channel::Stick(stick);
        let mut warning = None;

        let previous = self.sticks.get(&stick).map(Vec::as_slice).unwrap_or(&[]);
        if let [.., prev_start, last] = previous {
            if last.boundary != Boundary::End || prev_start.boundary != Boundary::Start {
                return Err(ErrorKind::ChannelStateViolation {
                    channel,
                    reason: ViolationReason::UnexpectedState,
                });
            }
            if last.time_ns > start_ns {
                return Err(ErrorKind::ChannelStateViolation {
                    channel,
                    reason: ViolationReason::Overlap {
                        previous_end_ns: last.time_ns,
                        start_ns,
                    },
                });
            }
            if prev_start.time_ns.saturating_add(self.min_stick_transition_ns) > start_ns {
                warning = Some(Warning::TransitionTooFast {
                    line: row.line(),
                    channel,
                    gap_ns: start_ns - prev_start.time_ns,
                    min_ns: self.min_stick_transition_ns,
                });
            }
        } else if !previous.is_empty() {
            return Err(ErrorKind::ChannelStateViolation {
                channel,
                reason: ViolationReason::UnexpectedState,
            });
        }

        let segments = [
            StickSegment::start(stick, position, start_ns),
            StickSegment::end(stick, position, end_ns),
        ];
        Ok((Pending::Stick(stick, segments), warning))
    }

    /// Warnings raised so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of rows compiled so far.
    pub fn row_count(&self) -> usize {
        self.timeline.len()
    }

    /// Freeze the compiled rows into a [`CompiledScript`].
    pub fn finish(self) -> CompileOutput {
        CompileOutput {
            script: CompiledScript {
                buttons: self.buttons,
                sticks: self.sticks,
                duration_ns: self.timeline.script_duration_ns(),
                repeats: self.repeats,
            },
            warnings: self.warnings,
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn checked_sum(a: u64, b: u64, field: &'static str) -> Result<u64, ErrorKind> {
    a.checked_add(b).ok_or_else(|| ErrorKind::InvalidNumber {
        field,
        value: b.to_string(),
    })
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ErrorKind> {
    // NaN fails `contains`, so it is reported as out of range too.
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ErrorKind::OutOfRangeValue {
            field,
            value,
            min,
            max,
        })
    }
}

/// Read the stick position of `row`: angle/magnitude or x/y, never both.
fn parse_position(row: &Row) -> Result<StickPosition, ErrorKind> {
    let polar = row.has(field::ANGLE) || row.has(field::MAGNITUDE);
    let cartesian = row.has(field::X) || row.has(field::Y);

    match (polar, cartesian) {
        (true, true) => Err(ErrorKind::ConflictingPosition),
        (true, false) => {
            let angle: f64 = row.parse(field::ANGLE)?;
            let magnitude: i64 = row.parse(field::MAGNITUDE)?;
            check_range(field::ANGLE, angle, ANGLE_RANGE)?;
            check_range(field::MAGNITUDE, magnitude as f64, PERCENT_RANGE)?;
            // Within ±100 after the range check.
            let magnitude = magnitude as i32;
            Ok(StickPosition::Polar { angle, magnitude })
        }
        (false, true) => {
            let x: f64 = row.parse(field::X)?;
            let y: f64 = row.parse(field::Y)?;
            check_range(field::X, x, PERCENT_RANGE)?;
            check_range(field::Y, y, PERCENT_RANGE)?;
            Ok(StickPosition::Cartesian { x, y })
        }
        (false, false) => Err(ErrorKind::MissingField {
            field: field::ANGLE,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::ORIGIN_ID;

    const MS: u64 = row::NS_PER_MS;

    // ── Test helpers ──────────────────────────────────────────────────────────

    /// Button row with the given timing and optional ids.
    fn button(line: usize, input: &str, delay: &str, duration: &str) -> Row {
        Row::new(line)
            .with(field::INPUT, input)
            .with(field::START_DELAY_MS, delay)
            .with(field::DURATION_MS, duration)
    }

    fn stick(
        line: usize,
        input: &str,
        delay: &str,
        duration: &str,
        angle: &str,
        mag: &str,
    ) -> Row {
        button(line, input, delay, duration)
            .with(field::ANGLE, angle)
            .with(field::MAGNITUDE, mag)
    }

    fn compile_default(rows: &[Row]) -> Result<CompileOutput, CompileError> {
        compile(rows, &CompilerConfig::default())
    }

    // ── Start-time resolution ─────────────────────────────────────────────────

    #[test]
    fn empty_reference_chains_after_previous_row() {
        let rows = vec![button(1, "a", "0", "100"), button(2, "b", "50", "100")];
        let out = compile_default(&rows).unwrap();

        let b = out.script.button_edges(Button::B);
        assert_eq!(b[0].time_ns, 150 * MS);
        assert_eq!(b[1].time_ns, 250 * MS);
        assert_eq!(out.script.duration_ns(), 250 * MS);
    }

    #[test]
    fn named_reference_starts_after_that_row() {
        let rows = vec![
            button(1, "a", "0", "100").with(field::ID, "jump"),
            button(2, "b", "0", "500"),
            button(3, "x", "20", "10").with(field::START_AFTER_ID, "jump"),
        ];
        let out = compile_default(&rows).unwrap();

        let x = out.script.button_edges(Button::X);
        assert_eq!(x[0].time_ns, 120 * MS);
        assert_eq!(x[1].time_ns, 130 * MS);
    }

    #[test]
    fn origin_reference_starts_at_zero() {
        let rows = vec![
            button(1, "a", "0", "1000"),
            button(2, "b", "5", "10").with(field::START_AFTER_ID, "start"),
        ];
        let out = compile_default(&rows).unwrap();
        assert_eq!(out.script.button_edges(Button::B)[0].time_ns, 5 * MS);
    }

    #[test]
    fn duration_is_latest_end_not_last_row() {
        let rows = vec![
            button(1, "a", "0", "1000").with(field::ID, "hold"),
            button(2, "b", "0", "10").with(field::START_AFTER_ID, "start"),
        ];
        let out = compile_default(&rows).unwrap();
        assert_eq!(out.script.duration_ns(), 1000 * MS);
    }

    #[test]
    fn empty_script_compiles_to_nothing() {
        let out = compile_default(&[]).unwrap();
        assert_eq!(out.script.action_count(), 0);
        assert_eq!(out.script.duration_ns(), 0);
        assert_eq!(out.script.buttons().len(), Button::ALL.len());
        assert_eq!(out.script.sticks().len(), Stick::ALL.len());
    }

    // ── Timing field errors ───────────────────────────────────────────────────

    #[test]
    fn missing_delay_is_rejected() {
        let rows = vec![Row::new(1)
            .with(field::INPUT, "a")
            .with(field::DURATION_MS, "10")];
        let err = compile_default(&rows).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MissingField {
                field: field::START_DELAY_MS
            }
        );
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn presence_is_checked_before_numbers() {
        let rows = vec![button(1, "a", "abc", "")];
        assert_eq!(
            compile_default(&rows).unwrap_err().kind,
            ErrorKind::MissingField {
                field: field::DURATION_MS
            }
        );
    }

    #[test]
    fn empty_duration_is_missing_field() {
        let rows = vec![button(1, "a", "0", "")];
        assert_eq!(
            compile_default(&rows).unwrap_err().kind,
            ErrorKind::MissingField {
                field: field::DURATION_MS
            }
        );
    }

    #[test]
    fn negative_or_text_timing_is_invalid_number() {
        for (delay, duration) in [("-1", "10"), ("0", "abc"), ("1e3", "10")] {
            let rows = vec![button(1, "a", delay, duration)];
            assert!(
                matches!(
                    compile_default(&rows).unwrap_err().kind,
                    ErrorKind::InvalidNumber { .. }
                ),
                "delay={delay} duration={duration}"
            );
        }
    }

    #[test]
    fn error_carries_row_content() {
        let rows = vec![button(1, "a", "0", "10"), button(2, "nope", "0", "10")];
        let err = compile_default(&rows).unwrap_err();
        assert_eq!(err.row, rows[1]);
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("nope"));
    }

    // ── Identifiers ───────────────────────────────────────────────────────────

    #[test]
    fn duplicate_id_is_rejected() {
        let rows = vec![
            button(1, "a", "0", "10").with(field::ID, "dup"),
            button(2, "b", "0", "10"),
            button(3, "x", "0", "10").with(field::ID, "dup"),
        ];
        let err = compile_default(&rows).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateId { id: "dup".into() });
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn reserved_origin_id_is_rejected_even_on_first_row() {
        let rows = vec![button(1, "a", "0", "10").with(field::ID, "start")];
        assert_eq!(
            compile_default(&rows).unwrap_err().kind,
            ErrorKind::DuplicateId { id: "start".into() }
        );
    }

    #[test]
    fn duplicate_id_message_names_the_origin_id() {
        let kind = ErrorKind::DuplicateId { id: "jump".into() };
        assert_eq!(
            kind.to_string(),
            format!("id 'jump' already in use ('{ORIGIN_ID}' is reserved)")
        );
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let rows = vec![button(1, "a", "0", "10").with(field::START_AFTER_ID, "later")];
        assert_eq!(
            compile_default(&rows).unwrap_err().kind,
            ErrorKind::UnknownReferenceId { id: "later".into() }
        );
    }

    #[test]
    fn unknown_reference_leaves_compiler_untouched() {
        let mut c = LineCompiler::new(&CompilerConfig::default());
        c.compile_row(&button(1, "a", "0", "10").with(field::ID, "first"))
            .unwrap();

        let bad = button(2, "b", "0", "10")
            .with(field::ID, "second")
            .with(field::START_AFTER_ID, "ghost");
        let err = c.compile_row(&bad).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnknownReferenceId { id: "ghost".into() }
        );
        assert_eq!(c.row_count(), 1);

        c.compile_row(&button(3, "x", "0", "10").with(field::ID, "second"))
            .unwrap();
        let out = c.finish();
        assert_eq!(out.script.action_count(), 4);
        assert!(out.script.button_edges(Button::B).is_empty());
        assert_eq!(out.script.button_edges(Button::X)[0].time_ns, 10 * MS);
    }

    #[test]
    fn forward_reference_is_rejected() {
        let rows = vec![
            button(1, "a", "0", "10").with(field::START_AFTER_ID, "b_row"),
            button(2, "b", "0", "10").with(field::ID, "b_row"),
        ];
        let err = compile_default(&rows).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownReferenceId { .. }));
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn rejected_row_leaves_compiler_untouched() {
        let mut c = LineCompiler::new(&CompilerConfig::default());
        c.compile_row(&button(1, "a", "0", "10").with(field::ID, "first"))
            .unwrap();

        // Valid id and timing, but the input is unknown.
        let bad = button(2, "q", "0", "10").with(field::ID, "second");
        assert!(c.compile_row(&bad).is_err());
        assert_eq!(c.row_count(), 1);

        // "second" was not claimed by the failed row.
        c.compile_row(&button(3, "b", "0", "10").with(field::ID, "second"))
            .unwrap();
        let out = c.finish();
        assert_eq!(out.script.button_edges(Button::B)[0].time_ns, 10 * MS);
    }

    // ── Channels ──────────────────────────────────────────────────────────────

    #[test]
    fn unknown_input_is_rejected() {
        let rows = vec![button(1, "select", "0", "10")];
        assert_eq!(
            compile_default(&rows).unwrap_err().kind,
            ErrorKind::UnknownChannel {
                name: "select".into()
            }
        );
    }

    #[test]
    fn missing_input_is_missing_field() {
        let rows = vec![Row::new(1)
            .with(field::START_DELAY_MS, "0")
            .with(field::DURATION_MS, "10")];
        assert_eq!(
            compile_default(&rows).unwrap_err().kind,
            ErrorKind::MissingField {
                field: field::INPUT
            }
        );
    }

    // ── Button path ───────────────────────────────────────────────────────────

    #[test]
    fn button_row_emits_press_then_release() {
        let out = compile_default(&[button(1, "zr", "10", "40")]).unwrap();
        let edges = out.script.button_edges(Button::Zr);
        assert_eq!(
            edges,
            &[
                ButtonEdge::press(Button::Zr, 10 * MS),
                ButtonEdge::release(Button::Zr, 50 * MS)
            ]
        );
    }

    #[test]
    fn overlapping_press_is_rejected() {
        let rows = vec![
            button(1, "a", "0", "100").with(field::ID, "long"),
            button(2, "a", "50", "10").with(field::START_AFTER_ID, "start"),
        ];
        let err = compile_default(&rows).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::ChannelStateViolation {
                channel: Channel::Button(Button::A),
                reason: ViolationReason::Overlap {
                    previous_end_ns: 100 * MS,
                    start_ns: 50 * MS
                }
            }
        );
    }

    #[test]
    fn press_exactly_at_release_is_allowed() {
        let rows = vec![button(1, "a", "0", "100"), button(2, "a", "0", "100")];
        let out = compile_default(&rows).unwrap();
        assert_eq!(out.script.button_edges(Button::A).len(), 4);
    }

    #[test]
    fn fast_button_press_warns_but_compiles() {
        let cfg = CompilerConfig::new().with_transitions(50, 0);
        let rows = vec![button(1, "a", "0", "100"), button(2, "a", "30", "100")];
        let out = compile(&rows, &cfg).unwrap();

        assert_eq!(
            out.warnings,
            vec![Warning::TransitionTooFast {
                line: 2,
                channel: Channel::Button(Button::A),
                gap_ns: 30 * MS,
                min_ns: 50 * MS,
            }]
        );
        assert_eq!(out.script.button_edges(Button::A)[2].time_ns, 130 * MS);
    }

    #[test]
    fn button_press_at_minimum_gap_does_not_warn() {
        let cfg = CompilerConfig::new().with_transitions(50, 0);
        let rows = vec![button(1, "a", "0", "100"), button(2, "a", "50", "100")];
        assert!(compile(&rows, &cfg).unwrap().warnings.is_empty());
    }

    #[test]
    fn transition_minimum_is_per_channel() {
        let cfg = CompilerConfig::new().with_transitions(50, 0);
        let rows = vec![button(1, "a", "0", "100"), button(2, "b", "0", "100")];
        assert!(compile(&rows, &cfg).unwrap().warnings.is_empty());
    }

    #[test]
    fn warnings_do_not_change_output() {
        let rows = vec![button(1, "a", "0", "100"), button(2, "a", "10", "100")];
        let quiet = compile(&rows, &CompilerConfig::default()).unwrap();
        let noisy = compile(&rows, &CompilerConfig::new().with_transitions(500, 500)).unwrap();
        assert!(quiet.warnings.is_empty());
        assert_eq!(noisy.warnings.len(), 1);
        assert_eq!(quiet.script, noisy.script);
    }

    // ── Stick path ────────────────────────────────────────────────────────────

    #[test]
    fn stick_row_emits_start_and_end_with_position() {
        let out = compile_default(&[stick(1, "ls", "0", "200", "0", "100")]).unwrap();
        let pos = StickPosition::Polar {
            angle: 0.0,
            magnitude: 100,
        };
        assert_eq!(
            out.script.stick_segments(Stick::Left),
            &[
                StickSegment::start(Stick::Left, pos, 0),
                StickSegment::end(Stick::Left, pos, 200 * MS)
            ]
        );
    }

    #[test]
    fn cartesian_stick_row_is_accepted() {
        let row = button(1, "rs", "0", "10")
            .with(field::X, "-50")
            .with(field::Y, "25.5");
        let out = compile_default(&[row]).unwrap();
        assert_eq!(
            out.script.stick_segments(Stick::Right)[0].position,
            StickPosition::Cartesian { x: -50.0, y: 25.5 }
        );
    }

    #[test]
    fn out_of_range_stick_values_are_rejected_without_actions() {
        for (angle, mag, bad_field) in [
            ("361", "50", field::ANGLE),
            ("-1", "50", field::ANGLE),
            ("90", "101", field::MAGNITUDE),
            ("90", "-101", field::MAGNITUDE),
            ("90", "1000000000000", field::MAGNITUDE),
            ("NaN", "50", field::ANGLE),
        ] {
            let mut c = LineCompiler::new(&CompilerConfig::default());
            let err = c
                .compile_row(&stick(1, "ls", "0", "10", angle, mag))
                .unwrap_err();
            assert!(
                matches!(err.kind, ErrorKind::OutOfRangeValue { field: f, .. } if f == bad_field),
                "angle={angle} mag={mag}: {err}"
            );
            assert_eq!(c.finish().script.action_count(), 0);
        }
    }

    #[test]
    fn out_of_range_xy_is_rejected() {
        let row = button(1, "ls", "0", "10")
            .with(field::X, "100.5")
            .with(field::Y, "0");
        assert!(matches!(
            compile_default(&[row]).unwrap_err().kind,
            ErrorKind::OutOfRangeValue { field: "x", .. }
        ));
    }

    #[test]
    fn non_numeric_stick_values_are_invalid_number() {
        let rows = [
            stick(1, "ls", "0", "10", "north", "50"),
            stick(1, "ls", "0", "10", "90", "50.5"),
        ];
        for row in rows {
            assert!(matches!(
                compile_default(&[row]).unwrap_err().kind,
                ErrorKind::InvalidNumber { .. }
            ));
        }
    }

    #[test]
    fn stick_without_position_is_missing_field() {
        let rows = vec![button(1, "ls", "0", "10")];
        assert!(matches!(
            compile_default(&rows).unwrap_err().kind,
            ErrorKind::MissingField { .. }
        ));
    }

    #[test]
    fn half_a_position_is_missing_field() {
        let row = button(1, "ls", "0", "10").with(field::ANGLE, "90");
        assert_eq!(
            compile_default(&[row]).unwrap_err().kind,
            ErrorKind::MissingField {
                field: field::MAGNITUDE
            }
        );
    }

    #[test]
    fn both_position_forms_conflict() {
        let row = stick(1, "ls", "0", "10", "90", "50")
            .with(field::X, "10")
            .with(field::Y, "10");
        assert_eq!(
            compile_default(&[row]).unwrap_err().kind,
            ErrorKind::ConflictingPosition
        );
    }

    #[test]
    fn overlapping_stick_movement_is_rejected() {
        let rows = vec![
            stick(1, "ls", "0", "100", "0", "100"),
            stick(2, "ls", "50", "10", "90", "100").with(field::START_AFTER_ID, "start"),
        ];
        assert!(matches!(
            compile_default(&rows).unwrap_err().kind,
            ErrorKind::ChannelStateViolation {
                reason: ViolationReason::Overlap { .. },
                ..
            }
        ));
    }

    #[test]
    fn stick_warning_is_measured_from_previous_start() {
        // Previous movement: 0..100ms.  Next starts at 120ms: 20ms after the
        // previous end, but 120ms after the previous start.
        let cfg = CompilerConfig::new().with_transitions(0, 150);
        let rows = vec![
            stick(1, "ls", "0", "100", "0", "100"),
            stick(2, "ls", "20", "100", "180", "100"),
        ];
        let out = compile(&rows, &cfg).unwrap();
        assert_eq!(
            out.warnings,
            vec![Warning::TransitionTooFast {
                line: 2,
                channel: Channel::Stick(Stick::Left),
                gap_ns: 120 * MS,
                min_ns: 150 * MS,
            }]
        );

        // The same gap measured from the previous end would not warn.
        let cfg = CompilerConfig::new().with_transitions(0, 110);
        assert!(compile(&rows, &cfg).unwrap().warnings.is_empty());
    }

    #[test]
    fn sticks_and_buttons_do_not_interfere() {
        let rows = vec![
            stick(1, "ls", "0", "100", "0", "100").with(field::ID, "move"),
            button(2, "a", "0", "50").with(field::START_AFTER_ID, "start"),
            stick(3, "rs", "0", "50", "90", "-100").with(field::START_AFTER_ID, "start"),
        ];
        let out = compile_default(&rows).unwrap();
        assert_eq!(out.script.stick_segments(Stick::Left).len(), 2);
        assert_eq!(out.script.stick_segments(Stick::Right).len(), 2);
        assert_eq!(out.script.button_edges(Button::A).len(), 2);
    }

    // ── Invariants ────────────────────────────────────────────────────────────

    #[test]
    fn every_channel_alternates_and_is_time_ordered() {
        let rows = vec![
            button(1, "a", "0", "10").with(field::ID, "r1"),
            button(2, "a", "5", "10"),
            button(3, "b", "0", "30").with(field::START_AFTER_ID, "r1"),
            stick(4, "ls", "0", "40", "45", "80"),
            button(5, "a", "0", "10"),
            stick(6, "ls", "10", "40", "90", "80"),
        ];
        let out = compile_default(&rows).unwrap();

        for edges in out.script.buttons().values() {
            assert_eq!(edges.len() % 2, 0);
            for (i, e) in edges.iter().enumerate() {
                let want = if i % 2 == 0 {
                    Transition::Press
                } else {
                    Transition::Release
                };
                assert_eq!(e.transition, want);
            }
            assert!(edges.windows(2).all(|w| w[0].time_ns <= w[1].time_ns));
        }
        for segs in out.script.sticks().values() {
            assert_eq!(segs.len() % 2, 0);
            for (i, s) in segs.iter().enumerate() {
                let want = if i % 2 == 0 {
                    Boundary::Start
                } else {
                    Boundary::End
                };
                assert_eq!(s.boundary, want);
            }
            assert!(segs.windows(2).all(|w| w[0].time_ns <= w[1].time_ns));
        }
    }

    #[test]
    fn compilation_is_deterministic() {
        let rows = vec![
            button(1, "a", "0", "10").with(field::ID, "one"),
            stick(2, "rs", "3", "25", "270", "60"),
            button(3, "home", "7", "1").with(field::START_AFTER_ID, "one"),
        ];
        let cfg = CompilerConfig::new().with_repeats(4).with_transitions(20, 20);
        let reference = compile(&rows, &cfg).unwrap();
        for _ in 0..20 {
            assert_eq!(compile(&rows, &cfg).unwrap(), reference);
        }
    }

    #[test]
    fn repeat_count_is_carried_from_config() {
        let cfg = CompilerConfig::new().with_repeats(3);
        let out = compile(&[button(1, "a", "0", "10")], &cfg).unwrap();
        assert_eq!(out.script.repeats(), 3);
    }
}
