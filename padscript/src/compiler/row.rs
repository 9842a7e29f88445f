/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! A single script row as an ordered field map, plus typed field accessors.
//!
//! Absent and empty fields are the same thing: a tabular source has every
//! column on every row, so "not given" shows up as an empty cell.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::ErrorKind;

/// Recognised field names.
pub mod field {
    pub const START_DELAY_MS: &str = "start_delay_ms";
    pub const DURATION_MS: &str = "duration_ms";
    pub const START_AFTER_ID: &str = "start_after_id";
    pub const ID: &str = "id";
    pub const INPUT: &str = "input";
    pub const ANGLE: &str = "angle";
    pub const MAGNITUDE: &str = "magnitude";
    pub const X: &str = "x";
    pub const Y: &str = "y";
}

/// One row of a macro script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    /// 1-based position in the source, used in diagnostics.
    line: usize,
    fields: BTreeMap<String, String>,
}

impl Row {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: BTreeMap::new(),
        }
    }

    /// Build a row from `(name, value)` pairs.
    pub fn from_fields<K, V>(line: usize, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            line,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Trimmed value of `name`, or `None` when absent or blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns `true` if `name` has a non-blank value.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn require(&self, name: &'static str) -> Result<&str, ErrorKind> {
        self.get(name).ok_or(ErrorKind::MissingField { field: name })
    }

    /// Parse a required field.  Blank → `MissingField`, unparsable →
    /// `InvalidNumber`.
    pub fn parse<T: FromStr>(&self, name: &'static str) -> Result<T, ErrorKind> {
        let raw = self.require(name)?;
        raw.parse().map_err(|_| ErrorKind::InvalidNumber {
            field: name,
            value: raw.to_string(),
        })
    }

    /// Parse a required millisecond field and convert it to nanoseconds.
    ///
    /// Any integer sign is accepted (`-0` and `+5` are fine); negative
    /// values and values that overflow in nanoseconds are `InvalidNumber`.
    pub fn millis_as_ns(&self, name: &'static str) -> Result<u64, ErrorKind> {
        let ms: i128 = self.parse(name)?;
        u64::try_from(ms)
            .ok()
            .and_then(|ms| ms.checked_mul(NS_PER_MS))
            .ok_or_else(|| ErrorKind::InvalidNumber {
                field: name,
                value: ms.to_string(),
            })
    }
}

/// Milliseconds → nanoseconds.
pub const NS_PER_MS: u64 = 1_000_000;

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: '{v}'")?;
        }
        f.write_str("}")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
