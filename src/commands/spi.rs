//! SPI read/write/transfer commands

use super::CmdResult;

use linbus_core::SpiBus;

use std::io::Write;

/// Parse a hex string such as `"9f 00 FF"` or `"0x9f00ff"`
pub fn parse_hex(s: &str) -> CmdResult<Vec<u8>> {
    let digits: String = s
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '_')
        .collect();
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("Invalid hex digit '{}' in '{}'", bad, s).into());
    }
    if digits.len() % 2 != 0 {
        return Err(format!("Odd number of hex digits in '{}'", s).into());
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| -> CmdResult<u8> {
            let text = std::str::from_utf8(pair)?;
            Ok(u8::from_str_radix(text, 16)?)
        })
        .collect()
}

/// Format bytes as space-separated hex, 16 per line
pub fn format_hex(data: &[u8]) -> String {
    data.chunks(16)
        .map(|row| {
            row.iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Receive `count` bytes and print them
pub fn run_read<B: SpiBus>(bus: &mut B, count: usize, out: &mut impl Write) -> CmdResult {
    let data = bus.spi_read(count)?;
    writeln!(out, "{}", format_hex(&data))?;
    Ok(())
}

/// Transmit `data`
pub fn run_write<B: SpiBus>(bus: &mut B, data: &[u8], chunked: bool) -> CmdResult {
    bus.spi_write(data, chunked)?;
    log::info!("spi: wrote {} bytes", data.len());
    Ok(())
}

/// Transmit `data` while receiving `read` bytes, printing what was received
pub fn run_xfer<B: SpiBus>(
    bus: &mut B,
    data: &[u8],
    read: usize,
    chunked: bool,
    out: &mut impl Write,
) -> CmdResult {
    let received = bus.spi_transaction(Some(data), read, chunked)?;
    if !received.is_empty() {
        writeln!(out, "{}", format_hex(&received))?;
    }
    Ok(())
}
