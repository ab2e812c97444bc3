//! Interactive prompts on stdin/stdout.

use std::io::{self, BufRead, Write};

/// Ask a question and read one trimmed line. `None` on end of input.
pub(super) fn ask(question: &str) -> Result<Option<String>, String> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    ask_with(&mut stdin.lock(), &mut stdout, question)
        .map_err(|e| format!("failed to read from terminal: {e}"))
}

/// Ask a yes/no question. End of input or an unreadable terminal gives `default`.
pub(super) fn confirm(question: &str, default: bool) -> bool {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    match ask(&format!("{question} {hint}")) {
        Ok(Some(answer)) => parse_yes_no(&answer, default),
        Ok(None) | Err(_) => default,
    }
}

fn ask_with(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
) -> io::Result<Option<String>> {
    write!(output, "{question}: ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn parse_yes_no(answer: &str, default: bool) -> bool {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}
