// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::io::{self, Write};

/// Forwards every write to `inner` and keeps a copy of what was accepted.
/// The report goes to stdout as it is produced and the copy feeds the golden
/// comparison and `report.log`.
pub struct TeeWriter<W: Write> {
    inner: W,
    captured: Vec<u8>,
}

impl<W: Write> TeeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            captured: Vec::new(),
        }
    }

    /// Returns the number of bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.captured.len() as u64
    }

    pub fn captured(&self) -> &[u8] {
        &self.captured
    }
}

impl<W: Write> Write for TeeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.captured.extend_from_slice(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
