/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Action Model: the value types a compiled script is made of.
//!
//! ```text
//! Row ──(compiler)──►  ButtonEdge  (press / release pairs)
//!                  └─►  StickSegment (start / end pairs carrying a position)
//! ```
//!
//! Channels form a closed set.  A script names them by string (`"a"`, `"zl"`,
//! `"ls"`...), but past the parser everything is keyed by the [`Button`] and
//! [`Stick`] enums, so a typo can never silently introduce a new channel.

use std::fmt;
use std::str::FromStr;

// ── Buttons ───────────────────────────────────────────────────────────────────

/// One of the 15 digital buttons of the emulated controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Plus,
    Minus,
    Up,
    Down,
    Left,
    Right,
    Lb,
    Zl,
    Rb,
    Zr,
    Home,
}

impl Button {
    /// Every button, in declaration order.
    pub const ALL: [Button; 15] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Plus,
        Button::Minus,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::Lb,
        Button::Zl,
        Button::Rb,
        Button::Zr,
        Button::Home,
    ];

    /// Script name of the button.
    pub fn name(self) -> &'static str {
        match self {
            Button::A => "a",
            Button::B => "b",
            Button::X => "x",
            Button::Y => "y",
            Button::Plus => "+",
            Button::Minus => "-",
            Button::Up => "up",
            Button::Down => "down",
            Button::Left => "left",
            Button::Right => "right",
            Button::Lb => "lb",
            Button::Zl => "zl",
            Button::Rb => "rb",
            Button::Zr => "zr",
            Button::Home => "home",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Sticks ────────────────────────────────────────────────────────────────────

/// One of the two analog sticks.
///
/// Scripts call them `ls` / `rs`: `left` and `right` already name D-pad
/// buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stick {
    Left,
    Right,
}

impl Stick {
    pub const ALL: [Stick; 2] = [Stick::Left, Stick::Right];

    pub fn name(self) -> &'static str {
        match self {
            Stick::Left => "ls",
            Stick::Right => "rs",
        }
    }
}

impl fmt::Display for Stick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Channel ───────────────────────────────────────────────────────────────────

/// Any addressable input: a button or a stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Button(Button),
    Stick(Stick),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Button(b) => b.fmt(f),
            Channel::Stick(s) => s.fmt(f),
        }
    }
}

/// Returned by [`Channel::from_str`] for a name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannelName(pub String);

impl fmt::Display for UnknownChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown input '{}'", self.0)
    }
}

impl std::error::Error for UnknownChannelName {}

impl FromStr for Channel {
    type Err = UnknownChannelName;

    /// Exact, case-sensitive match against the script names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(b) = Button::ALL.iter().find(|b| b.name() == s) {
            return Ok(Channel::Button(*b));
        }
        if let Some(st) = Stick::ALL.iter().find(|st| st.name() == s) {
            return Ok(Channel::Stick(*st));
        }
        Err(UnknownChannelName(s.to_string()))
    }
}

// ── ButtonEdge ────────────────────────────────────────────────────────────────

/// Direction of a button edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Press,
    Release,
}

/// A button press or release at an absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdge {
    pub button: Button,
    pub transition: Transition,
    /// Absolute timestamp in nanoseconds.
    pub time_ns: u64,
}

impl ButtonEdge {
    pub fn press(button: Button, time_ns: u64) -> Self {
        Self {
            button,
            transition: Transition::Press,
            time_ns,
        }
    }

    pub fn release(button: Button, time_ns: u64) -> Self {
        Self {
            button,
            transition: Transition::Release,
            time_ns,
        }
    }

    /// Same edge shifted later by `offset_ns`, or `None` on overflow.
    pub fn offset_by(&self, offset_ns: u64) -> Option<Self> {
        Some(Self {
            time_ns: self.time_ns.checked_add(offset_ns)?,
            ..*self
        })
    }
}

// ── StickSegment ──────────────────────────────────────────────────────────────

/// Position a stick holds for the duration of a segment.
///
/// Exactly one representation is populated per segment; the consumer decides
/// how to apply it (see [`crate::actuation::Actuator`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StickPosition {
    /// `angle` in degrees `[0, 360]` (0 = up, clockwise), `magnitude` in
    /// percent `[-100, 100]`.
    Polar { angle: f64, magnitude: i32 },
    /// Independent axis deflections in percent, each `[-100, 100]`.
    Cartesian { x: f64, y: f64 },
}

impl StickPosition {
    /// Axis percentages for this position.
    ///
    /// Polar positions use `x = sin(angle) · magnitude`,
    /// `y = cos(angle) · magnitude`.
    pub fn to_cartesian(&self) -> (f64, f64) {
        match *self {
            StickPosition::Cartesian { x, y } => (x, y),
            StickPosition::Polar { angle, magnitude } => {
                let rad = angle.to_radians();
                let mag = f64::from(magnitude);
                (rad.sin() * mag, rad.cos() * mag)
            }
        }
    }
}

/// Which end of a stick segment a marker represents.
///
/// `End` only says when the next movement may start; the stick is not
/// re-centred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

/// One boundary of a stick movement at an absolute time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickSegment {
    pub stick: Stick,
    pub boundary: Boundary,
    pub position: StickPosition,
    /// Absolute timestamp in nanoseconds.
    pub time_ns: u64,
}

impl StickSegment {
    pub fn start(stick: Stick, position: StickPosition, time_ns: u64) -> Self {
        Self {
            stick,
            boundary: Boundary::Start,
            position,
            time_ns,
        }
    }

    pub fn end(stick: Stick, position: StickPosition, time_ns: u64) -> Self {
        Self {
            stick,
            boundary: Boundary::End,
            position,
            time_ns,
        }
    }

    /// Same marker shifted later by `offset_ns`, or `None` on overflow.
    pub fn offset_by(&self, offset_ns: u64) -> Option<Self> {
        Some(Self {
            time_ns: self.time_ns.checked_add(offset_ns)?,
            ..*self
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
