// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// Presentation settings for the line report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Prefix each timed line with `@<ns> `. Off by default so golden files
    /// stay valid when only the bus clock changes.
    #[serde(default)]
    pub timestamps: bool,
}

impl ReportOptions {
    pub fn with_timestamps(timestamps: bool) -> Self {
        Self { timestamps }
    }
}
