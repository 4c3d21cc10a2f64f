//! Opening buses from the command line
//!
//! A bus is described either by an inline option string
//! (`key=value,key=value`, see each crate's `parse_options`) or by the
//! matching section of the `--config` file. The option string wins when
//! both are given.

use crate::config::BusFile;

use linbus_linux_gpio::LinuxGpioBus;
use linbus_linux_spi::LinuxSpiBus;

/// Parse an option string into key-value pairs
///
/// Format: "option1=value1,option2=value2"; items without `=` are ignored.
pub fn parse_option_string(s: &str) -> Vec<(&str, &str)> {
    s.split(',')
        .filter_map(|opt| opt.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect()
}

/// Open the GPIO bus
pub fn open_gpio(
    file: Option<&BusFile>,
    options: Option<&str>,
) -> Result<LinuxGpioBus, Box<dyn std::error::Error>> {
    let bus = match (options, file.and_then(BusFile::gpio_config)) {
        (Some(opts), _) => linbus_linux_gpio::open_linux_gpio(&parse_option_string(opts))?,
        (None, Some(config)) => LinuxGpioBus::setup(&config)?,
        (None, None) => {
            return Err("No GPIO bus configured. Use --dev dev=/dev/gpiochipN,out=N,... \
                 or a [gpio] section in --config"
                .into())
        }
    };
    Ok(bus)
}

/// Open the SPI bus
pub fn open_spi(
    file: Option<&BusFile>,
    options: Option<&str>,
) -> Result<LinuxSpiBus, Box<dyn std::error::Error>> {
    let from_file = match file {
        Some(f) => f.spi_config()?,
        None => None,
    };
    let bus = match (options, from_file) {
        (Some(opts), _) => linbus_linux_spi::open_linux_spi(&parse_option_string(opts))?,
        (None, Some(config)) => LinuxSpiBus::setup(&config)?,
        (None, None) => {
            return Err("No SPI bus configured. Use --dev dev=/dev/spidevX.Y,... \
                 or a [spi] section in --config"
                .into())
        }
    };
    Ok(bus)
}
