//! Interactive [`Prompt`] backed by stdin/stdout.

use colored::*;
use std::io::{self, BufRead, Write};

use enumperm_core::error::{EnumPermError, ErrorCode, Result};
use enumperm_core::prompt::Prompt;

/// Asks questions on the terminal.
///
/// When stdin is closed, confirmations fall back to their default and
/// selections are treated as cancelled.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }

    /// Print `label` and read one trimmed line. `None` on end of input.
    fn ask(&self, label: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{} ", label).map_err(prompt_failed)?;
        stdout.flush().map_err(prompt_failed)?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line).map_err(prompt_failed)?;
        if read == 0 {
            println!();
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn show_options(&self, label: &str, options: &[String]) {
        println!("{}", label.bold());
        for (i, option) in options.iter().enumerate() {
            println!("  [{}] {}", (i + 1).to_string().cyan(), option);
        }
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "yes" } else { "no" };
        let label = format!("{} (yes/no) [{}]:", question.bold(), hint.yellow());
        loop {
            match self.ask(&label)? {
                None => return Ok(default),
                Some(input) => match parse_confirm(&input, default) {
                    Some(answer) => return Ok(answer),
                    None => println!("{}", "Please answer yes or no.".dimmed()),
                },
            }
        }
    }

    fn select(&mut self, label: &str, options: &[String]) -> Result<String> {
        self.show_options(label, options);
        loop {
            let Some(input) = self.ask(">")? else {
                return Err(cancelled(label));
            };
            match parse_selection(&input, options).as_deref() {
                Some([one]) => return Ok(one.clone()),
                _ => println!("{}", "Pick one option by number or name.".dimmed()),
            }
        }
    }

    fn multi_select(&mut self, label: &str, options: &[String]) -> Result<Vec<String>> {
        self.show_options(label, options);
        println!("{}", "Separate several choices with commas.".dimmed());
        loop {
            let Some(input) = self.ask(">")? else {
                return Err(cancelled(label));
            };
            match parse_selection(&input, options) {
                Some(chosen) if !chosen.is_empty() => return Ok(chosen),
                _ => println!("{}", "Pick at least one option by number or name.".dimmed()),
            }
        }
    }
}

fn prompt_failed(err: io::Error) -> EnumPermError {
    EnumPermError::new(ErrorCode::PromptFailed, "Failed to read from the terminal")
        .with_source(err)
}

fn cancelled(label: &str) -> EnumPermError {
    EnumPermError::new(
        ErrorCode::PromptCancelled,
        format!("No selection made for '{}'", label),
    )
}

/// Interpret a yes/no answer. Empty input takes the default.
fn parse_confirm(input: &str, default: bool) -> Option<bool> {
    match input.to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Resolve comma-separated numbers (1-based) or option names.
///
/// Returns `None` when any token matches nothing. Duplicates are dropped and
/// the result keeps the order the options were offered in.
fn parse_selection(input: &str, options: &[String]) -> Option<Vec<String>> {
    let mut picked = vec![false; options.len()];
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let index = match token.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => n - 1,
            Ok(_) => return None,
            Err(_) => options.iter().position(|o| o.eq_ignore_ascii_case(token))?,
        };
        picked[index] = true;
    }
    Some(
        options
            .iter()
            .zip(picked)
            .filter_map(|(option, chosen)| chosen.then(|| option.clone()))
            .collect(),
    )
}
