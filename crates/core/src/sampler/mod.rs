// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Turns raw pin transitions into protocol symbols with correct edge alignment.
//!
//! Samplers are push-based: each transition yields at most one symbol, and
//! nothing is held beyond the one pending bit needed to tell an I2C data bit
//! from a start or stop condition.

pub mod i2c;
pub mod spi;

pub use i2c::{I2cSampler, I2cSymbol};
pub use spi::{SpiSampler, SpiSymbol};
