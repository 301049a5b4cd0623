// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";

/// Highest I2C speed the checker accepts (high-speed mode).
pub const MAX_I2C_SPEED_KHZ: u32 = 3400;

/// Highest SPI reference clock the checker accepts (100 GHz).
pub const MAX_REFERENCE_CLOCK_HZ: u64 = 100_000_000_000;

fn default_true() -> bool {
    true
}

fn default_clock_divider() -> u32 {
    1
}

fn default_reference_clock_hz() -> u64 {
    100_000_000
}

fn default_word_width() -> u8 {
    8
}

fn default_tolerance_percent() -> u32 {
    10
}

fn default_stall_timeout_ns() -> u64 {
    10_000_000
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported schema_version '{0}'. Supported versions: '1.0'")]
    UnsupportedSchema(String),
    #[error("exactly one of 'i2c' or 'spi' must be configured")]
    ProtocolSection,
    #[error("pin for role '{0}' cannot be empty")]
    EmptyPin(String),
    #[error("pin '{pin}' is bound to both '{first}' and '{second}'")]
    DuplicatePin {
        pin: String,
        first: String,
        second: String,
    },
    #[error("i2c speed_khz {0} is outside 1..=3400")]
    I2cSpeed(u32),
    #[error("spi mode {0} is invalid; supported modes: 0, 1, 2, 3")]
    SpiMode(u8),
    #[error("spi clock_divider must be at least 1")]
    ZeroDivider,
    #[error("spi reference_clock_hz {0} exceeds the 100 GHz limit")]
    ReferenceClock(u64),
    #[error("spi reference clock {reference_clock_hz} Hz with divider {divider} gives no usable clock")]
    UnreachableClock { reference_clock_hz: u64, divider: u32 },
    #[error("spi speed_hz {requested} is not achievable with divider {divider} (generator produces {achieved} Hz)")]
    SpeedMismatch {
        requested: u64,
        achieved: u64,
        divider: u32,
    },
    #[error("spi requires at least one of mosi_enabled or miso_enabled")]
    NoDirection,
    #[error("spi {0} is enabled but no pin is bound to it")]
    MissingPin(&'static str),
    #[error("spi requires at least one chip select pin")]
    NoChipSelect,
    #[error("spi word_width {0} is outside 1..=32")]
    WordWidth(u8),
    #[error("expect.{0} is required for this probe")]
    MissingExpectation(&'static str),
    #[error("expect.{0} does not apply to {1} probes")]
    ForeignExpectation(&'static str, &'static str),
    #[error("expect.{left} has {left_len} entries but expect.{right} has {right_len}")]
    ScriptLengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },
    #[error("expect.{field}[{index}] = {value:#x} does not fit in {width} bits")]
    WordOverflow {
        field: &'static str,
        index: usize,
        value: u32,
        width: u8,
    },
    #[error("timing tolerance_percent {0} must be below 100")]
    Tolerance(u32),
    #[error("timing stall_timeout_ns must be greater than zero")]
    ZeroStallTimeout,
    #[error("override '{0}' is not of the form KEY=VALUE")]
    MalformedOverride(String),
    #[error("unknown override key '{0}'")]
    UnknownOverride(String),
    #[error("invalid value '{value}' for override {key}")]
    InvalidOverride { key: String, value: String },
    #[error("override {key} requires an {protocol} probe")]
    OverrideNotApplicable { key: String, protocol: &'static str },
}

/// SPI clock mode. Bit 1 is the idle polarity (CPOL), bit 0 the phase (CPHA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SpiMode {
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

impl SpiMode {
    /// Clock level while idle: `true` for high.
    pub fn cpol(self) -> bool {
        matches!(self, SpiMode::Mode2 | SpiMode::Mode3)
    }

    pub fn cpha(self) -> bool {
        matches!(self, SpiMode::Mode1 | SpiMode::Mode3)
    }

    /// Data is sampled on the rising clock edge when CPOL == CPHA, on the falling one otherwise.
    pub fn samples_on_rising(self) -> bool {
        self.cpol() == self.cpha()
    }
}

impl TryFrom<u8> for SpiMode {
    type Error = ConfigError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            other => Err(ConfigError::SpiMode(other)),
        }
    }
}

impl From<SpiMode> for u8 {
    fn from(mode: SpiMode) -> Self {
        match mode {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct I2cConfig {
    pub scl: String,
    pub sda: String,
    /// Target bus speed in kbit/s. The master must not clock faster than this.
    pub speed_khz: u32,
}

impl I2cConfig {
    pub fn target_hz(&self) -> u64 {
        self.speed_khz as u64 * 1000
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SpiConfig {
    pub sclk: String,
    #[serde(default)]
    pub mosi: Option<String>,
    #[serde(default)]
    pub miso: Option<String>,
    pub chip_selects: Vec<String>,
    pub mode: SpiMode,
    #[serde(default = "default_clock_divider")]
    pub clock_divider: u32,
    #[serde(default = "default_reference_clock_hz")]
    pub reference_clock_hz: u64,
    /// Explicit bus speed; must agree with the divider-derived clock.
    #[serde(default)]
    pub speed_hz: Option<u64>,
    #[serde(default = "default_true")]
    pub mosi_enabled: bool,
    #[serde(default = "default_true")]
    pub miso_enabled: bool,
    #[serde(default = "default_word_width")]
    pub word_width: u8,
    #[serde(default = "default_true")]
    pub cs_active_low: bool,
    #[serde(default = "default_true")]
    pub msb_first: bool,
    #[serde(default)]
    pub min_cs_to_clock_ns: Option<u64>,
    #[serde(default)]
    pub min_inter_word_ns: Option<u64>,
}

impl SpiConfig {
    /// SCLK frequency produced by the clock generator: reference / (2 * divider).
    pub fn target_hz(&self) -> u64 {
        if self.clock_divider == 0 {
            return 0;
        }
        self.reference_clock_hz / (2 * self.clock_divider as u64)
    }

    pub fn word_mask(&self) -> u32 {
        if self.word_width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.word_width) - 1
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExpectedScript {
    /// Expected bus bytes in order, address bytes included with their R/W bit.
    #[serde(default)]
    pub bytes: Option<Vec<u8>>,
    /// Expected handshake outcome per byte: `true` for ACK, `false` for NACK.
    #[serde(default)]
    pub acks: Option<Vec<bool>>,
    /// Bytes the slave hands out on master reads, in order. Checked against
    /// read-direction data only, independently of the handshake sequence.
    #[serde(default)]
    pub read_data: Option<Vec<u8>>,
    #[serde(default)]
    pub mosi: Option<Vec<u32>>,
    #[serde(default)]
    pub miso: Option<Vec<u32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TimingLimits {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tolerance_percent")]
    pub tolerance_percent: u32,
    /// Longest silence allowed while a transaction is in progress.
    #[serde(default = "default_stall_timeout_ns")]
    pub stall_timeout_ns: u64,
}

impl Default for TimingLimits {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance_percent: default_tolerance_percent(),
            stall_timeout_ns: default_stall_timeout_ns(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProbeScript {
    pub schema_version: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub i2c: Option<I2cConfig>,
    #[serde(default)]
    pub spi: Option<SpiConfig>,
    pub expect: ExpectedScript,
    #[serde(default)]
    pub timing: TimingLimits,
    /// Set when the firmware runs with background load; recorded, not interpreted.
    #[serde(default)]
    pub full_load: bool,
}

/// Borrowed view of the configured protocol section.
#[derive(Debug, Clone, Copy)]
pub enum Protocol<'a> {
    I2c(&'a I2cConfig),
    Spi(&'a SpiConfig),
}

impl Protocol<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::I2c(_) => "i2c",
            Protocol::Spi(_) => "spi",
        }
    }
}

impl ProbeScript {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse Probe Script YAML")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open probe script at {:?}", path.as_ref()))?;
        let script: Self =
            serde_yaml::from_reader(f).context("Failed to parse Probe Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn protocol(&self) -> std::result::Result<Protocol<'_>, ConfigError> {
        match (&self.i2c, &self.spi) {
            (Some(i2c), None) => Ok(Protocol::I2c(i2c)),
            (None, Some(spi)) => Ok(Protocol::Spi(spi)),
            _ => Err(ConfigError::ProtocolSection),
        }
    }

    /// Physical pin ids paired with the role they are bound to, in declaration order.
    pub fn pin_roles(&self) -> Vec<(&str, String)> {
        let mut roles = Vec::new();
        if let Some(i2c) = &self.i2c {
            roles.push((i2c.scl.as_str(), "scl".to_string()));
            roles.push((i2c.sda.as_str(), "sda".to_string()));
        }
        if let Some(spi) = &self.spi {
            roles.push((spi.sclk.as_str(), "sclk".to_string()));
            if let Some(mosi) = &spi.mosi {
                roles.push((mosi.as_str(), "mosi".to_string()));
            }
            if let Some(miso) = &spi.miso {
                roles.push((miso.as_str(), "miso".to_string()));
            }
            for (index, cs) in spi.chip_selects.iter().enumerate() {
                roles.push((cs.as_str(), format!("cs{}", index)));
            }
        }
        roles
    }

    /// Number of script entries the checker expects to consume.
    pub fn expected_entries(&self) -> usize {
        match self.protocol() {
            Ok(Protocol::I2c(_)) => self
                .expect
                .bytes
                .as_ref()
                .map(Vec::len)
                .or_else(|| self.expect.acks.as_ref().map(Vec::len))
                .unwrap_or(0),
            Ok(Protocol::Spi(spi)) => {
                let mosi = spi
                    .mosi_enabled
                    .then(|| self.expect.mosi.as_ref().map(Vec::len))
                    .flatten();
                let miso = spi
                    .miso_enabled
                    .then(|| self.expect.miso.as_ref().map(Vec::len))
                    .flatten();
                mosi.or(miso).unwrap_or(0)
            }
            Err(_) => 0,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema(self.schema_version.clone()));
        }

        let mut seen: Vec<(&str, String)> = Vec::new();
        for (pin, role) in self.pin_roles() {
            if pin.trim().is_empty() {
                return Err(ConfigError::EmptyPin(role));
            }
            if let Some((_, first)) = seen.iter().find(|(p, _)| *p == pin) {
                return Err(ConfigError::DuplicatePin {
                    pin: pin.to_string(),
                    first: first.clone(),
                    second: role,
                });
            }
            seen.push((pin, role));
        }

        match self.protocol()? {
            Protocol::I2c(i2c) => self.validate_i2c(i2c)?,
            Protocol::Spi(spi) => self.validate_spi(spi)?,
        }

        if self.timing.tolerance_percent >= 100 {
            return Err(ConfigError::Tolerance(self.timing.tolerance_percent));
        }
        if self.timing.stall_timeout_ns == 0 {
            return Err(ConfigError::ZeroStallTimeout);
        }

        Ok(())
    }

    fn validate_i2c(&self, i2c: &I2cConfig) -> std::result::Result<(), ConfigError> {
        if i2c.speed_khz == 0 || i2c.speed_khz > MAX_I2C_SPEED_KHZ {
            return Err(ConfigError::I2cSpeed(i2c.speed_khz));
        }
        if self.expect.mosi.is_some() {
            return Err(ConfigError::ForeignExpectation("mosi", "i2c"));
        }
        if self.expect.miso.is_some() {
            return Err(ConfigError::ForeignExpectation("miso", "i2c"));
        }
        match (&self.expect.bytes, &self.expect.acks) {
            (None, None) => Err(ConfigError::MissingExpectation("bytes")),
            (Some(bytes), Some(acks)) if bytes.len() != acks.len() => {
                Err(ConfigError::ScriptLengthMismatch {
                    left: "bytes",
                    left_len: bytes.len(),
                    right: "acks",
                    right_len: acks.len(),
                })
            }
            _ => Ok(()),
        }
    }

    fn validate_spi(&self, spi: &SpiConfig) -> std::result::Result<(), ConfigError> {
        if self.expect.bytes.is_some() {
            return Err(ConfigError::ForeignExpectation("bytes", "spi"));
        }
        if self.expect.acks.is_some() {
            return Err(ConfigError::ForeignExpectation("acks", "spi"));
        }
        if self.expect.read_data.is_some() {
            return Err(ConfigError::ForeignExpectation("read_data", "spi"));
        }
        if spi.chip_selects.is_empty() {
            return Err(ConfigError::NoChipSelect);
        }
        if spi.word_width == 0 || spi.word_width > 32 {
            return Err(ConfigError::WordWidth(spi.word_width));
        }
        if !spi.mosi_enabled && !spi.miso_enabled {
            return Err(ConfigError::NoDirection);
        }
        if spi.clock_divider == 0 {
            return Err(ConfigError::ZeroDivider);
        }

        if spi.reference_clock_hz > MAX_REFERENCE_CLOCK_HZ {
            return Err(ConfigError::ReferenceClock(spi.reference_clock_hz));
        }

        let achieved = spi.target_hz();
        if achieved == 0 {
            return Err(ConfigError::UnreachableClock {
                reference_clock_hz: spi.reference_clock_hz,
                divider: spi.clock_divider,
            });
        }
        if let Some(requested) = spi.speed_hz {
            let slack = achieved.saturating_mul(self.timing.tolerance_percent as u64) / 100;
            if requested.abs_diff(achieved) > slack {
                return Err(ConfigError::SpeedMismatch {
                    requested,
                    achieved,
                    divider: spi.clock_divider,
                });
            }
        }

        let mut lengths: Vec<(&'static str, usize)> = Vec::new();
        for (field, enabled, pin, words) in [
            ("mosi", spi.mosi_enabled, &spi.mosi, &self.expect.mosi),
            ("miso", spi.miso_enabled, &spi.miso, &self.expect.miso),
        ] {
            if !enabled {
                continue;
            }
            if pin.is_none() {
                return Err(ConfigError::MissingPin(field));
            }
            let words = words
                .as_ref()
                .ok_or(ConfigError::MissingExpectation(field))?;
            if let Some((index, &value)) = words
                .iter()
                .enumerate()
                .find(|&(_, &w)| w & !spi.word_mask() != 0)
            {
                return Err(ConfigError::WordOverflow {
                    field,
                    index,
                    value,
                    width: spi.word_width,
                });
            }
            lengths.push((field, words.len()));
        }
        if let [(left, left_len), (right, right_len)] = lengths.as_slice() {
            if left_len != right_len {
                return Err(ConfigError::ScriptLengthMismatch {
                    left: *left,
                    left_len: *left_len,
                    right: *right,
                    right_len: *right_len,
                });
            }
        }

        Ok(())
    }

    /// Apply environment-style build parameters (`SPI_MODE=3`, `DIVS=8`, ...) on top of
    /// the script, the way the build/orchestration layer parametrizes a run.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> std::result::Result<(), ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in overrides {
            let invalid = || ConfigError::InvalidOverride {
                key: key.to_string(),
                value: value.to_string(),
            };
            match key {
                "FULL_LOAD" => self.full_load = parse_flag(value).ok_or_else(invalid)?,
                "MOSI_ENABLED" => {
                    self.spi_mut(key)?.mosi_enabled = parse_flag(value).ok_or_else(invalid)?
                }
                "MISO_ENABLED" => {
                    self.spi_mut(key)?.miso_enabled = parse_flag(value).ok_or_else(invalid)?
                }
                "SPI_MODE" => {
                    let raw: u8 = value.trim().parse().map_err(|_| invalid())?;
                    self.spi_mut(key)?.mode = SpiMode::try_from(raw).map_err(|_| invalid())?;
                }
                "DIVS" => {
                    self.spi_mut(key)?.clock_divider =
                        value.trim().parse().map_err(|_| invalid())?
                }
                "SPEED_KHZ" => {
                    let speed = value.trim().parse().map_err(|_| invalid())?;
                    match self.i2c.as_mut() {
                        Some(i2c) => i2c.speed_khz = speed,
                        None => {
                            return Err(ConfigError::OverrideNotApplicable {
                                key: key.to_string(),
                                protocol: "i2c",
                            })
                        }
                    }
                }
                other => return Err(ConfigError::UnknownOverride(other.to_string())),
            }
            tracing::debug!("Applied override {}={}", key, value);
        }
        Ok(())
    }

    fn spi_mut(&mut self, key: &str) -> std::result::Result<&mut SpiConfig, ConfigError> {
        self.spi
            .as_mut()
            .ok_or_else(|| ConfigError::OverrideNotApplicable {
                key: key.to_string(),
                protocol: "spi",
            })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Split a `KEY=VALUE` override.
pub fn parse_override(raw: &str) -> std::result::Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::MalformedOverride(raw.to_string())),
    }
}

/// Load a probe script, apply build overrides and validate the result.
pub fn load_probe_script<P: AsRef<Path>>(
    path: P,
    overrides: &[(String, String)],
) -> Result<ProbeScript> {
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read probe script at {:?}", path.as_ref()))?;
    let mut script = ProbeScript::from_yaml(&contents)?;
    script
        .apply_overrides(overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .context("Failed to apply overrides")?;
    script.validate().context("Invalid probe script")?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPI_SCRIPT: &str = r#"
schema_version: "1.0"
spi:
  sclk: "tile[0]:XS1_PORT_1C"
  mosi: "tile[0]:XS1_PORT_1D"
  miso: "tile[0]:XS1_PORT_1A"
  chip_selects: ["tile[0]:XS1_PORT_1B"]
  mode: 0
  clock_divider: 8
expect:
  mosi: [0x01, 0x02]
  miso: [0xA0, 0xB0]
"#;

    #[test]
    fn test_spi_modes() {
        assert!(SpiMode::Mode0.samples_on_rising());
        assert!(!SpiMode::Mode1.samples_on_rising());
        assert!(!SpiMode::Mode2.samples_on_rising());
        assert!(SpiMode::Mode3.samples_on_rising());
        assert!(SpiMode::Mode2.cpol());
        assert!(!SpiMode::Mode2.cpha());
        assert_eq!(SpiMode::try_from(4), Err(ConfigError::SpiMode(4)));
    }

    #[test]
    fn test_spi_defaults_and_target() {
        let script = ProbeScript::from_yaml(SPI_SCRIPT).unwrap();
        script.validate().unwrap();
        let spi = script.spi.as_ref().unwrap();
        assert_eq!(spi.word_width, 8);
        assert!(spi.cs_active_low);
        assert_eq!(spi.target_hz(), 6_250_000);
        assert_eq!(script.timing, TimingLimits::default());
        assert_eq!(script.expected_entries(), 2);
    }

    #[test]
    fn test_length_mismatch_is_config_error() {
        let mut script = ProbeScript::from_yaml(SPI_SCRIPT).unwrap();
        script.expect.miso = Some(vec![0xA0]);
        assert_eq!(
            script.validate(),
            Err(ConfigError::ScriptLengthMismatch {
                left: "mosi",
                left_len: 2,
                right: "miso",
                right_len: 1,
            })
        );

        // A disabled direction's list no longer has to line up.
        script.spi.as_mut().unwrap().miso_enabled = false;
        assert!(script.validate().is_ok());
    }

    #[test]
    fn test_no_direction() {
        let mut script = ProbeScript::from_yaml(SPI_SCRIPT).unwrap();
        script
            .apply_overrides([("MOSI_ENABLED", "0"), ("MISO_ENABLED", "0")])
            .unwrap();
        assert_eq!(script.validate(), Err(ConfigError::NoDirection));
    }

    #[test]
    fn test_overrides() {
        let mut script = ProbeScript::from_yaml(SPI_SCRIPT).unwrap();
        script
            .apply_overrides([("SPI_MODE", "3"), ("DIVS", "80"), ("FULL_LOAD", "1")])
            .unwrap();
        let spi = script.spi.as_ref().unwrap();
        assert_eq!(spi.mode, SpiMode::Mode3);
        assert_eq!(spi.clock_divider, 80);
        assert!(script.full_load);

        let err = script.apply_overrides([("SPEED_KHZ", "100")]).unwrap_err();
        assert!(matches!(err, ConfigError::OverrideNotApplicable { .. }));
        let err = script.apply_overrides([("SPI_MODE", "7")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
        let err = script.apply_overrides([("BOGUS", "1")]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownOverride("BOGUS".to_string()));
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("DIVS=8").unwrap(),
            ("DIVS".to_string(), "8".to_string())
        );
        assert!(parse_override("DIVS").is_err());
        assert!(parse_override("=8").is_err());
    }

    #[test]
    fn test_speed_must_match_divider() {
        let mut script = ProbeScript::from_yaml(SPI_SCRIPT).unwrap();
        script.spi.as_mut().unwrap().speed_hz = Some(6_000_000);
        assert!(script.validate().is_ok());
        script.spi.as_mut().unwrap().speed_hz = Some(25_000_000);
        assert!(matches!(
            script.validate(),
            Err(ConfigError::SpeedMismatch { achieved: 6_250_000, .. })
        ));
    }

    #[test]
    fn test_word_overflow() {
        let mut script = ProbeScript::from_yaml(SPI_SCRIPT).unwrap();
        script.expect.mosi = Some(vec![0x01, 0x100]);
        assert!(matches!(
            script.validate(),
            Err(ConfigError::WordOverflow { index: 1, .. })
        ));
    }
}
