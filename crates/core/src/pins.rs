// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_probe_config::{ConfigError, Protocol};
use std::collections::HashMap;
use std::fmt;

/// Logical role of a monitored pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Scl,
    Sda,
    Sclk,
    Mosi,
    Miso,
    ChipSelect(usize),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Scl => write!(f, "scl"),
            Role::Sda => write!(f, "sda"),
            Role::Sclk => write!(f, "sclk"),
            Role::Mosi => write!(f, "mosi"),
            Role::Miso => write!(f, "miso"),
            Role::ChipSelect(index) => write!(f, "cs{}", index),
        }
    }
}

/// Immutable mapping from physical pin ids to logical roles, fixed at checker setup.
#[derive(Debug, Clone, Default)]
pub struct PinBinding {
    roles: HashMap<String, Role>,
}

impl PinBinding {
    pub fn from_protocol(protocol: Protocol<'_>) -> Result<Self, ConfigError> {
        let mut binding = Self::default();
        match protocol {
            Protocol::I2c(i2c) => {
                binding.bind(&i2c.scl, Role::Scl)?;
                binding.bind(&i2c.sda, Role::Sda)?;
            }
            Protocol::Spi(spi) => {
                binding.bind(&spi.sclk, Role::Sclk)?;
                if let Some(mosi) = &spi.mosi {
                    binding.bind(mosi, Role::Mosi)?;
                }
                if let Some(miso) = &spi.miso {
                    binding.bind(miso, Role::Miso)?;
                }
                for (index, cs) in spi.chip_selects.iter().enumerate() {
                    binding.bind(cs, Role::ChipSelect(index))?;
                }
            }
        }
        Ok(binding)
    }

    fn bind(&mut self, pin: &str, role: Role) -> Result<(), ConfigError> {
        if pin.trim().is_empty() {
            return Err(ConfigError::EmptyPin(role.to_string()));
        }
        if let Some(first) = self.roles.get(pin) {
            return Err(ConfigError::DuplicatePin {
                pin: pin.to_string(),
                first: first.to_string(),
                second: role.to_string(),
            });
        }
        self.roles.insert(pin.to_string(), role);
        Ok(())
    }

    pub fn role_of(&self, pin: &str) -> Option<Role> {
        self.roles.get(pin).copied()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
