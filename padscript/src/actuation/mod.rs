/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Boundary between the compiled schedule and the hardware.
//!
//! ```text
//! Schedule ──events()──►  [ScheduledEvent; n]  ──drive()──►  impl Actuator
//!                         (time-ordered)                      (DAC / GPIO / mock)
//! ```
//!
//! [`drive`] walks events in order and calls the actuator immediately; waiting
//! until each `time_ns` is the job of a runner that wraps it.  A stick
//! segment end produces no call: the stick holds its position until the next
//! segment start.

use anyhow::Result;
use tracing::{debug, info};

use crate::action::{
    Boundary, Button, ButtonEdge, Stick, StickPosition, StickSegment, Transition,
};
use crate::expander::Schedule;

// ── Actuator ──────────────────────────────────────────────────────────────────

/// Something that can physically press buttons and move sticks.
pub trait Actuator {
    fn set_button(&mut self, button: Button, pressed: bool) -> Result<()>;

    /// Deflect `stick` to `x_pct` / `y_pct`, each in `[-100, 100]`.
    fn set_stick_position(&mut self, stick: Stick, x_pct: f64, y_pct: f64) -> Result<()>;

    /// Deflect `stick` by `magnitude` percent towards `angle` degrees.
    ///
    /// The default converts to cartesian percentages with
    /// [`StickPosition::to_cartesian`].
    fn set_stick_position_angle(&mut self, stick: Stick, angle: f64, magnitude: i32) -> Result<()> {
        let (x, y) = StickPosition::Polar { angle, magnitude }.to_cartesian();
        self.set_stick_position(stick, x, y)
    }
}

// ── Event stream ──────────────────────────────────────────────────────────────

/// One action of a schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Button(ButtonEdge),
    Stick(StickSegment),
}

/// An action at its absolute time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub time_ns: u64,
    pub action: Action,
}

impl Schedule {
    /// Every action of every channel merged into a single time-ordered list.
    ///
    /// Events at the same instant keep a fixed order: buttons before sticks,
    /// then channel order, then the order within the channel.
    pub fn events(&self) -> Vec<ScheduledEvent> {
        let buttons = self.buttons().values().flatten().map(|e| ScheduledEvent {
            time_ns: e.time_ns,
            action: Action::Button(*e),
        });
        let sticks = self.sticks().values().flatten().map(|s| ScheduledEvent {
            time_ns: s.time_ns,
            action: Action::Stick(*s),
        });

        let mut events: Vec<ScheduledEvent> = buttons.chain(sticks).collect();
        // Stable: ties keep the chain order above.
        events.sort_by_key(|e| e.time_ns);
        events
    }
}

/// Apply `events` to `actuator` in order, without waiting between them.
///
/// Returns the number of actuator calls made.
///
/// # Errors
/// Stops at, and returns, the first actuator error.
pub fn drive<A: Actuator + ?Sized>(events: &[ScheduledEvent], actuator: &mut A) -> Result<usize> {
    let mut calls = 0usize;

    for event in events {
        match event.action {
            Action::Button(edge) => {
                actuator.set_button(edge.button, edge.transition == Transition::Press)?;
                calls += 1;
            }
            Action::Stick(seg) if seg.boundary == Boundary::Start => {
                match seg.position {
                    StickPosition::Polar { angle, magnitude } => {
                        actuator.set_stick_position_angle(seg.stick, angle, magnitude)?
                    }
                    StickPosition::Cartesian { x, y } => {
                        actuator.set_stick_position(seg.stick, x, y)?
                    }
                }
                calls += 1;
            }
            Action::Stick(seg) => {
                debug!(stick = %seg.stick, time_ns = seg.time_ns, "segment end");
            }
        }
    }

    Ok(calls)
}

// ── TracingActuator ───────────────────────────────────────────────────────────

/// Actuator that only logs what it would do.  Used for dry runs.
#[derive(Debug, Default)]
pub struct TracingActuator;

impl Actuator for TracingActuator {
    fn set_button(&mut self, button: Button, pressed: bool) -> Result<()> {
        info!(button = %button, pressed, "set_button");
        Ok(())
    }

    fn set_stick_position(&mut self, stick: Stick, x_pct: f64, y_pct: f64) -> Result<()> {
        info!(stick = %stick, x_pct, y_pct, "set_stick_position");
        Ok(())
    }

    fn set_stick_position_angle(&mut self, stick: Stick, angle: f64, magnitude: i32) -> Result<()> {
        info!(stick = %stick, angle, magnitude, "set_stick_position_angle");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
