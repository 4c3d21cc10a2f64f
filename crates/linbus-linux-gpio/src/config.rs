//! Configuration for opening a set of GPIO lines

use crate::error::{LinuxGpioError, Result};

use linbus_core::{LineConfig, Offset, PinState};

/// Consumer name reported to the kernel when none is given
pub const DEFAULT_CONSUMER: &str = "linbus";

/// Configuration for requesting GPIO lines from one chip
#[derive(Debug, Clone)]
pub struct LinuxGpioConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Consumer label shown by tools such as `gpioinfo`
    pub consumer: String,
    /// Lines to request with their configuration
    pub lines: Vec<(Offset, LineConfig)>,
}

impl Default for LinuxGpioConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            consumer: DEFAULT_CONSUMER.to_string(),
            lines: Vec::new(),
        }
    }
}

impl LinuxGpioConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the consumer label
    pub fn with_consumer(mut self, consumer: impl Into<String>) -> Self {
        self.consumer = consumer.into();
        self
    }

    /// Add a line
    pub fn with_line(mut self, line: Offset, config: LineConfig) -> Self {
        self.lines.push((line, config));
        self
    }
}

/// Parse a line spec of the form `N[:low][:active|:inactive]`
fn parse_line(key: &str, value: &str, output: bool) -> Result<(Offset, LineConfig)> {
    let mut parts = value.split(':');
    let line: Offset = parts
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|_| LinuxGpioError::InvalidParameter(format!("Invalid {} value: {}", key, value)))?;

    let mut config = if output {
        LineConfig::output(PinState::Inactive)
    } else {
        LineConfig::input()
    };
    for flag in parts {
        match flag {
            "low" => config = config.active_low(),
            "high" => config = config.active_high(),
            "active" | "inactive" | "1" | "0" if output => {
                config.initial = flag.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("Invalid {} value: {}", key, value))
                })?;
            }
            _ => {
                return Err(LinuxGpioError::InvalidParameter(format!(
                    "Unknown flag '{}' in {}={}",
                    flag, key, value
                )))
            }
        }
    }
    Ok((line, config))
}

/// Parse `key=value` bus options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/gpiochipN` - GPIO chip device path (required, or use gpiochip)
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `consumer=NAME` - consumer label (default: `linbus`)
/// - `out=N[:low][:active]` - request line N as an output (repeatable)
/// - `in=N[:low]` - request line N as an input (repeatable)
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxGpioConfig> {
    let mut config = LinuxGpioConfig::default();
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "gpiochip" => {
                gpiochip = Some(value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("Invalid gpiochip value: {}", value))
                })?);
            }
            "consumer" => {
                config.consumer = value.to_string();
            }
            "out" => config.lines.push(parse_line(key, value, true)?),
            "in" => config.lines.push(parse_line(key, value, false)?),
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        match gpiochip {
            Some(n) => config.device = format!("/dev/gpiochip{}", n),
            None => return Err(LinuxGpioError::NoDevice),
        }
    } else if gpiochip.is_some() {
        return Err(LinuxGpioError::InvalidParameter(
            "Only one of 'dev' or 'gpiochip' can be specified".to_string(),
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linbus_core::{Direction, Polarity};

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("gpiochip", "1"),
            ("consumer", "sign"),
            ("out", "17:low:active"),
            ("out", "27"),
            ("in", "22:low"),
        ])
        .unwrap();

        assert_eq!(config.device, "/dev/gpiochip1");
        assert_eq!(config.consumer, "sign");
        assert_eq!(config.lines.len(), 3);

        let (line, cfg) = config.lines[0];
        assert_eq!(line, 17);
        assert_eq!(cfg.direction, Direction::Output);
        assert_eq!(cfg.polarity, Polarity::ActiveLow);
        assert_eq!(cfg.initial, PinState::Active);

        assert_eq!(config.lines[1], (27, LineConfig::output(PinState::Inactive)));
        assert_eq!(config.lines[2], (22, LineConfig::input().active_low()));
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(parse_options(&[("in", "3")]), Err(LinuxGpioError::NoDevice)));
        assert!(parse_options(&[("dev", "/dev/gpiochip0"), ("gpiochip", "0")]).is_err());
        assert!(parse_options(&[("dev", "/dev/gpiochip0"), ("out", "x")]).is_err());
        // Inputs have no initial value
        assert!(parse_options(&[("dev", "/dev/gpiochip0"), ("in", "3:active")]).is_err());
    }
}
