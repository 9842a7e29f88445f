/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! padscript – controller macro compiler
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── action        – buttons, sticks, edges and segments
//! ├── timeline/     – row id → end time index
//! ├── compiler/     – row-by-row compilation and validation
//! ├── expander/     – repeat expansion into an absolute schedule
//! ├── config/       – YAML compiler configuration
//! ├── script/       – CSV and YAML script loading
//! └── actuation/    – actuator interface and event stream
//! ```

pub mod action;
pub mod actuation;
pub mod compiler;
pub mod config;
pub mod expander;
pub mod script;
pub mod timeline;
