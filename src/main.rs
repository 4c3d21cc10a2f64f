//! linbus - Linux GPIO line and SPI bus access
//!
//! Thin command-line front end over the `linbus-linux-gpio` and
//! `linbus-linux-spi` crates. Buses are described by an inline option
//! string (`--dev`) or by a TOML file (`--config`).

mod buses;
mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::{Cli, Commands, GpioCommands, SpiCommands};
use config::BusFile;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG, when set, overrides the verbosity flags
    let level = log_level(cli.verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.to_string()))
        .init();

    let file = match &cli.config {
        Some(path) => Some(BusFile::load(path)?),
        None => None,
    };

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Gpio(cmd) => match cmd {
            GpioCommands::Get { dev, lines } => {
                let mut bus = buses::open_gpio(file.as_ref(), dev.as_deref())?;
                commands::gpio::run_get(&mut bus, &lines, &mut stdout)?;
                bus.close();
            }
            GpioCommands::Set { dev, assignments } => {
                let mut bus = buses::open_gpio(file.as_ref(), dev.as_deref())?;
                commands::gpio::run_set(&mut bus, &assignments)?;
                bus.close();
            }
        },
        Commands::Spi(cmd) => match cmd {
            SpiCommands::Read { dev, count } => {
                let mut bus = buses::open_spi(file.as_ref(), dev.as_deref())?;
                commands::spi::run_read(&mut bus, count, &mut stdout)?;
                bus.close()?;
            }
            SpiCommands::Write {
                dev,
                data,
                file: input,
                chunked,
            } => {
                let data = match (data, input) {
                    (_, Some(path)) => std::fs::read(&path)
                        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
                    (Some(hex), None) => commands::spi::parse_hex(&hex)?,
                    (None, None) => return Err("No data to write".into()),
                };
                let mut bus = buses::open_spi(file.as_ref(), dev.as_deref())?;
                commands::spi::run_write(&mut bus, &data, chunked)?;
                bus.close()?;
            }
            SpiCommands::Xfer {
                dev,
                data,
                read,
                chunked,
            } => {
                let data = commands::spi::parse_hex(&data)?;
                let mut bus = buses::open_spi(file.as_ref(), dev.as_deref())?;
                commands::spi::run_xfer(&mut bus, &data, read, chunked, &mut stdout)?;
                bus.close()?;
            }
        },
    }

    Ok(())
}

/// Default log filter for the given number of `-v` flags
fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), log::LevelFilter::Info);
        assert_eq!(log_level(1), log::LevelFilter::Debug);
        assert_eq!(log_level(2), log::LevelFilter::Trace);
        assert_eq!(log_level(5), log::LevelFilter::Trace);
    }

    #[test]
    fn test_log_level_enables_debug() {
        let logger = env_logger::Builder::new()
            .parse_filters(&log_level(1).to_string())
            .build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);

        let logger = env_logger::Builder::new()
            .parse_filters(&log_level(2).to_string())
            .build();
        assert_eq!(logger.filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_cli_verbosity() {
        let cli = Cli::try_parse_from(["linbus", "-vv", "gpio", "get", "17"]).unwrap();
        assert_eq!(log_level(cli.verbose), log::LevelFilter::Trace);

        let cli = Cli::try_parse_from(["linbus", "spi", "read", "4", "-v"]).unwrap();
        assert_eq!(log_level(cli.verbose), log::LevelFilter::Debug);
    }
}
