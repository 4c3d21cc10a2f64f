//! GPIO get/set commands

use super::CmdResult;

use linbus_core::{GpioBus, Offset, PinState};

use std::collections::BTreeMap;
use std::io::Write;

/// Parse `LINE=VALUE` assignments
pub fn parse_assignments(items: &[String]) -> CmdResult<BTreeMap<Offset, PinState>> {
    let mut state = BTreeMap::new();
    for item in items {
        let (line, value) = item
            .split_once('=')
            .ok_or_else(|| format!("Expected LINE=VALUE, got '{}'", item))?;
        let line: Offset = line
            .trim()
            .parse()
            .map_err(|_| format!("Invalid line number in '{}'", item))?;
        let value: PinState = value.trim().parse()?;
        if state.insert(line, value).is_some() {
            return Err(format!("Line {} assigned more than once", line).into());
        }
    }
    Ok(state)
}

/// Read `lines` and print one `LINE=STATE` per line
pub fn run_get<B: GpioBus>(bus: &mut B, lines: &[Offset], out: &mut impl Write) -> CmdResult {
    let states = bus.gpio_get(lines)?;
    for (line, state) in lines.iter().zip(states) {
        writeln!(out, "{}={}", line, state)?;
    }
    Ok(())
}

/// Apply `assignments` with one batched update
pub fn run_set<B: GpioBus>(bus: &mut B, assignments: &[String]) -> CmdResult {
    let state = parse_assignments(assignments)?;
    log::debug!("gpio: setting {:?}", state);
    bus.gpio_set(&state)?;
    Ok(())
}
