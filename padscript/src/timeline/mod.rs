//! Timeline Index: symbolic row ids → absolute end times.
//!
//! Every compiled row appends its end time to an append-only log.  Rows that
//! carry an `id` additionally map that id to their log entry, so later rows
//! can start relative to them (`start_after_id`).  A row without a
//! `start_after_id` starts after the most recent entry in the log.
//!
//! The log is seeded with the script origin: [`ORIGIN_ID`] → `0 ns`.  That id
//! is therefore claimed before the first row is read and can never be reused.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Reserved id naming the start of the script (time zero).
pub const ORIGIN_ID: &str = "start";

// ── Error type ────────────────────────────────────────────────────────────────

/// Failures when registering or resolving an id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// The id is already taken (possibly by the reserved [`ORIGIN_ID`]).
    #[error("id '{id}' already in use ('{}' is reserved)", ORIGIN_ID)]
    DuplicateId { id: String },

    /// `start_after_id` names a row that has not been registered.
    #[error("no earlier row with id '{id}'")]
    UnknownReferenceId { id: String },
}

// ── TimelineIndex ─────────────────────────────────────────────────────────────

/// Append-only index of row end times, built during a single compile pass.
///
/// # Example
/// ```rust
/// use padscript::timeline::TimelineIndex;
///
/// let mut idx = TimelineIndex::new();
/// idx.register(Some("jump"), 100).unwrap();
/// idx.register(None, 40).unwrap();
///
/// assert_eq!(idx.resolve(Some("jump")).unwrap(), 100);
/// assert_eq!(idx.resolve(None).unwrap(), 40);
/// assert_eq!(idx.script_duration_ns(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct TimelineIndex {
    /// End time of every row in registration order; entry 0 is the origin.
    end_times_ns: Vec<u64>,

    /// id → position in `end_times_ns`.
    ids: HashMap<String, usize>,
}

impl TimelineIndex {
    /// Index containing only the script origin.
    pub fn new() -> Self {
        let mut ids = HashMap::new();
        ids.insert(ORIGIN_ID.to_string(), 0);
        Self {
            end_times_ns: vec![0],
            ids,
        }
    }

    /// Record the end time of the next row.
    ///
    /// An empty id is the same as no id.  The end time is appended either
    /// way; nothing is appended when the id is rejected.
    ///
    /// # Errors
    /// [`TimelineError::DuplicateId`] if `id` is already registered.
    pub fn register(&mut self, id: Option<&str>, end_ns: u64) -> Result<(), TimelineError> {
        self.ensure_available(id)?;
        let id = id.filter(|s| !s.is_empty());

        self.end_times_ns.push(end_ns);
        let slot = self.end_times_ns.len() - 1;

        if let Some(id) = id {
            self.ids.insert(id.to_string(), slot);
        }

        debug!(id = id.unwrap_or(""), slot, end_ns, "registered row end time");
        Ok(())
    }

    /// Check that [`register`](Self::register) would accept `id`, without
    /// registering anything.
    pub fn ensure_available(&self, id: Option<&str>) -> Result<(), TimelineError> {
        match id.filter(|s| !s.is_empty()) {
            Some(id) if self.ids.contains_key(id) => {
                Err(TimelineError::DuplicateId { id: id.to_string() })
            }
            _ => Ok(()),
        }
    }

    /// Time a row referencing `id` is measured from.
    ///
    /// * empty / `None` → end of the most recently registered row (`0` before
    ///   any row).
    /// * otherwise → end of the row registered under `id`.
    ///
    /// # Errors
    /// [`TimelineError::UnknownReferenceId`] if `id` was never registered.
    pub fn resolve(&self, id: Option<&str>) -> Result<u64, TimelineError> {
        match id.filter(|s| !s.is_empty()) {
            None => Ok(self.last_end_ns()),
            Some(id) => self
                .ids
                .get(id)
                .map(|&slot| self.end_times_ns[slot])
                .ok_or_else(|| TimelineError::UnknownReferenceId { id: id.to_string() }),
        }
    }

    /// End time of the most recent row, or `0` if none was registered.
    pub fn last_end_ns(&self) -> u64 {
        self.end_times_ns.last().copied().unwrap_or(0)
    }

    /// Total script duration: the latest end time of any row.
    ///
    /// This is not necessarily the last row's end: a row anchored on an early
    /// id can finish before an earlier, longer row.
    pub fn script_duration_ns(&self) -> u64 {
        self.end_times_ns.iter().copied().max().unwrap_or(0)
    }

    /// Returns `true` if `id` is registered (the origin included).
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Number of registered rows, excluding the origin.
    pub fn len(&self) -> usize {
        self.end_times_ns.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TimelineIndex {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
