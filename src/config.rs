//! Bus description file (TOML format)
//!
//! ```toml
//! [gpio]
//! device = "/dev/gpiochip0"
//! consumer = "signman"
//!
//! [[gpio.line]]
//! line = 17
//! direction = "out"
//! initial = "active"
//! active_low = true
//!
//! [[gpio.line]]
//! line = 24
//! direction = "in"
//!
//! [spi]
//! device = "/dev/spidev0.0"
//! speed_hz = 6000000
//! mode = 0
//! half_duplex = true
//! ```

use linbus_core::{ClockMode, LineConfig, Offset, PinState, SpiConfig};
use linbus_linux_gpio::config::DEFAULT_CONSUMER;
use linbus_linux_gpio::LinuxGpioConfig;
use linbus_linux_spi::{LinuxSpiConfig, DEFAULT_SPEED_HZ};

use std::fs;
use std::path::{Path, PathBuf};

/// Errors loading a bus description file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("Invalid bus configuration: {0}")]
    Invalid(String),
}

/// Top-level file structure
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusFile {
    pub gpio: Option<GpioSection>,
    pub spi: Option<SpiSection>,
}

/// `[gpio]` section
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpioSection {
    pub device: String,
    pub consumer: Option<String>,
    #[serde(default, rename = "line")]
    pub lines: Vec<LineEntry>,
}

/// `[[gpio.line]]` entry
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineEntry {
    pub line: Offset,
    pub direction: DirectionName,
    #[serde(default)]
    pub initial: StateName,
    #[serde(default)]
    pub active_low: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionName {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateName {
    #[default]
    Inactive,
    Active,
}

/// `[spi]` section
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpiSection {
    pub device: String,
    #[serde(default = "default_speed")]
    pub speed_hz: u32,
    #[serde(default)]
    pub mode: u8,
    #[serde(default)]
    pub lsb_first: bool,
    #[serde(default)]
    pub half_duplex: bool,
}

fn default_speed() -> u32 {
    DEFAULT_SPEED_HZ
}

impl BusFile {
    /// Load and parse a bus description file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// GPIO configuration, if the file has a `[gpio]` section
    pub fn gpio_config(&self) -> Option<LinuxGpioConfig> {
        let section = self.gpio.as_ref()?;
        let mut config = LinuxGpioConfig::new(section.device.as_str())
            .with_consumer(section.consumer.as_deref().unwrap_or(DEFAULT_CONSUMER));
        for entry in &section.lines {
            config = config.with_line(entry.line, entry.to_line_config());
        }
        Some(config)
    }

    /// SPI configuration, if the file has a `[spi]` section
    pub fn spi_config(&self) -> Result<Option<LinuxSpiConfig>, ConfigError> {
        let Some(section) = self.spi.as_ref() else {
            return Ok(None);
        };
        let clock_mode = ClockMode::try_from(section.mode)
            .map_err(|m| ConfigError::Invalid(format!("SPI mode {} (must be 0-3)", m)))?;

        let mut mode = SpiConfig::new(clock_mode);
        if section.lsb_first {
            mode = mode.lsb_first();
        }
        if section.half_duplex {
            mode = mode.half_duplex();
        }
        Ok(Some(
            LinuxSpiConfig::new(section.device.as_str())
                .with_speed(section.speed_hz)
                .with_mode(mode),
        ))
    }
}

impl LineEntry {
    fn to_line_config(&self) -> LineConfig {
        let initial = match self.initial {
            StateName::Active => PinState::Active,
            StateName::Inactive => PinState::Inactive,
        };
        let config = match self.direction {
            DirectionName::Out => LineConfig::output(initial),
            DirectionName::In => LineConfig::input(),
        };
        if self.active_low {
            config.active_low()
        } else {
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linbus_core::{BitOrder, Direction, Duplex};

    const SAMPLE: &str = r#"
[gpio]
device = "/dev/gpiochip0"
consumer = "signman"

[[gpio.line]]
line = 17
direction = "out"
initial = "active"
active_low = true

[[gpio.line]]
line = 24
direction = "in"

[spi]
device = "/dev/spidev0.0"
speed_hz = 6000000
mode = 3
half_duplex = true
"#;

    #[test]
    fn test_parse_sample() {
        let file: BusFile = toml::from_str(SAMPLE).unwrap();

        let gpio = file.gpio_config().unwrap();
        assert_eq!(gpio.device, "/dev/gpiochip0");
        assert_eq!(gpio.consumer, "signman");
        assert_eq!(gpio.lines.len(), 2);
        assert_eq!(
            gpio.lines[0],
            (17, LineConfig::output(PinState::Active).active_low())
        );
        assert_eq!(gpio.lines[1].1.direction, Direction::Input);

        let spi = file.spi_config().unwrap().unwrap();
        assert_eq!(spi.speed_hz, 6_000_000);
        assert_eq!(spi.mode.clock_mode, ClockMode::Mode3);
        assert_eq!(spi.mode.bit_order, BitOrder::MsbFirst);
        assert_eq!(spi.mode.duplex, Duplex::Half);
    }

    #[test]
    fn test_defaults() {
        let file: BusFile = toml::from_str("[spi]\ndevice = \"/dev/spidev1.0\"\n").unwrap();
        assert!(file.gpio_config().is_none());
        let spi = file.spi_config().unwrap().unwrap();
        assert_eq!(spi.speed_hz, DEFAULT_SPEED_HZ);
        assert_eq!(spi.mode, SpiConfig::default());

        let file: BusFile = toml::from_str("[gpio]\ndevice = \"/dev/gpiochip2\"\n").unwrap();
        assert_eq!(file.gpio_config().unwrap().consumer, DEFAULT_CONSUMER);
    }

    #[test]
    fn test_invalid() {
        let file: BusFile = toml::from_str("[spi]\ndevice = \"x\"\nmode = 7\n").unwrap();
        assert!(matches!(file.spi_config(), Err(ConfigError::Invalid(_))));

        assert!(toml::from_str::<BusFile>("[gpio]\ndevice = \"x\"\nbogus = 1\n").is_err());
        assert!(toml::from_str::<BusFile>(
            "[gpio]\ndevice = \"x\"\n[[gpio.line]]\nline = 1\ndirection = \"sideways\"\n"
        )
        .is_err());
    }
}
