//! Compiler configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! repeats: 2
//! transitions:
//!   button_ms: 50
//!   stick_ms: 100
//! ```
//!
//! Every key is optional; absent keys keep the [`CompilerConfig::default`]
//! value (no repeats, no minimum transition time).

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::compiler::row::NS_PER_MS;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    repeats: Option<u32>,
    #[serde(default)]
    transitions: TransitionsEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransitionsEntry {
    button_ms: Option<u64>,
    stick_ms: Option<u64>,
}

// ── CompilerConfig ────────────────────────────────────────────────────────────

/// Tunables for one compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Extra playbacks after the first one (`0` = play once).
    pub repeats: u32,

    /// Minimum time between a button release and its next press before a
    /// `TransitionTooFast` warning is raised.
    pub min_button_transition_ms: u64,

    /// Minimum time between the start of a stick movement and the start of
    /// the next one on the same stick before a warning is raised.
    pub min_stick_transition_ms: u64,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repeats(mut self, repeats: u32) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn with_transitions(mut self, button_ms: u64, stick_ms: u64) -> Self {
        self.min_button_transition_ms = button_ms;
        self.min_stick_transition_ms = stick_ms;
        self
    }

    pub fn min_button_transition_ns(&self) -> u64 {
        self.min_button_transition_ms.saturating_mul(NS_PER_MS)
    }

    pub fn min_stick_transition_ns(&self) -> u64 {
        self.min_stick_transition_ms.saturating_mul(NS_PER_MS)
    }

    /// Parse `path` as YAML.  Absent keys take their default value.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// contains unknown keys or negative numbers.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading compiler configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
    }

    /// Parse configuration from a YAML document.  An empty document yields the
    /// defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(content)?
        };

        let defaults = Self::default();
        let cfg = Self {
            repeats: file.repeats.unwrap_or(defaults.repeats),
            min_button_transition_ms: file
                .transitions
                .button_ms
                .unwrap_or(defaults.min_button_transition_ms),
            min_stick_transition_ms: file
                .transitions
                .stick_ms
                .unwrap_or(defaults.min_stick_transition_ms),
        };

        debug!(
            repeats = cfg.repeats,
            button_ms = cfg.min_button_transition_ms,
            stick_ms = cfg.min_stick_transition_ms,
            "compiler configuration"
        );
        Ok(cfg)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
