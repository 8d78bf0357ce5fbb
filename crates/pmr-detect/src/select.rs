//! Interactive serial port selection

use std::io::{BufRead, Write};

use crate::error::DetectError;
use crate::scanner::SerialPortInfo;

/// Parse a 1-based menu answer into an index into a list of `count` ports
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

/// List `ports` on `output` and read a choice from `input`
///
/// Re-prompts until a valid number is entered. Generic over the console
/// streams so callers can pass stdin/stdout or an in-memory buffer.
pub fn prompt_for_port<R, W>(
    ports: &[SerialPortInfo],
    mut input: R,
    mut output: W,
) -> Result<SerialPortInfo, DetectError>
where
    R: BufRead,
    W: Write,
{
    if ports.is_empty() {
        return Err(DetectError::NoPorts);
    }

    writeln!(output, "Detected serial ports:")?;
    for (i, port) in ports.iter().enumerate() {
        writeln!(output, "{}: {}", i + 1, port.describe())?;
    }

    let mut line = String::new();
    loop {
        write!(output, "Select serial port number: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(DetectError::NoSelection);
        }

        match parse_selection(&line, ports.len()) {
            Some(index) => return Ok(ports[index].clone()),
            None if line.trim().parse::<usize>().is_ok() => {
                writeln!(output, "Invalid number, try again.")?;
            }
            None => writeln!(output, "Please enter a port number.")?,
        }
    }
}
