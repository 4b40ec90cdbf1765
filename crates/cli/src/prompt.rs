//! Terminal interaction: operator prompts and the run confirmation.
//!
//! Prompts are written to stderr so stdout carries only the JSON result.

use std::io::{self, BufRead, Write};

use apiplan_engine::InteractiveInput;

/// Reads `Interactive` parameter values from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalInput;

impl InteractiveInput for TerminalInput {
    fn prompt(&self, label: &str) -> io::Result<String> {
        read_answer(&mut io::stdin().lock(), &mut io::stderr(), label)
    }
}

/// Asks `Execute this plan? [y/N]` on the terminal.
pub fn confirm_execution() -> io::Result<bool> {
    confirm(&mut io::stdin().lock(), &mut io::stderr(), "Execute this plan? [y/N] ")
}

/// Writes `label`, then reads one line. End of input is an error so a closed
/// stdin never silently becomes an empty value.
pub fn read_answer(reader: &mut impl BufRead, writer: &mut impl Write, label: &str) -> io::Result<String> {
    write!(writer, "{label}")?;
    writer.flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before an answer was given"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Only `y` or `yes` (any case) counts as agreement; end of input declines.
pub fn confirm(reader: &mut impl BufRead, writer: &mut impl Write, question: &str) -> io::Result<bool> {
    match read_answer(reader, writer, question) {
        Ok(answer) => Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(error) => Err(error),
    }
}
