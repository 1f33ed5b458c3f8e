//! Line-oriented prompts and numbered menus.
//!
//! Every prompt loops until the answer is usable. End of input is not an
//! error: it surfaces as `Ok(None)` so the caller can wind down cleanly.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Reads answers from `input` and writes prompts to `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Creates a prompter over the given streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// The output stream.
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Writes a full line to the output.
    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    /// Prints `prompt` and reads one trimmed line. `None` at end of input.
    ///
    /// A line that is not valid UTF-8 is discarded and the prompt repeated.
    pub fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            write!(self.output, "{} ", prompt)?;
            self.output.flush()?;

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    writeln!(self.output)?;
                    return Ok(None);
                }
                Ok(_) => return Ok(Some(line.trim().to_string())),
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    self.say("Input is not valid text, try again.")?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Like [`Prompter::prompt`], but asks again while the answer is empty.
    pub fn prompt_nonempty(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            match self.prompt(prompt)? {
                None => return Ok(None),
                Some(answer) if answer.is_empty() => {
                    self.say("A value is required.")?;
                }
                Some(answer) => return Ok(Some(answer)),
            }
        }
    }

    /// Reads a value of type `T`; an empty answer gives `default`.
    pub fn prompt_parsed<T>(&mut self, prompt: &str, default: T) -> io::Result<Option<T>>
    where
        T: FromStr + Display,
    {
        let prompt = format!("{} [{}]:", prompt, default);
        loop {
            let answer = match self.prompt(&prompt)? {
                None => return Ok(None),
                Some(answer) => answer,
            };
            if answer.is_empty() {
                return Ok(Some(default));
            }
            match answer.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => self.say(&format!("'{}' is not a valid value, try again.", answer))?,
            }
        }
    }

    /// Shows `options` as a numbered menu under `title` and returns the index
    /// of the chosen entry.
    ///
    /// Non-numeric and out-of-range answers re-display the menu. An empty
    /// option list returns `None` without reading input.
    pub fn select<T: Display>(&mut self, title: &str, options: &[T]) -> io::Result<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "{}", title)?;
            for (i, option) in options.iter().enumerate() {
                writeln!(self.output, "  {}. {}", i + 1, option)?;
            }

            let prompt = format!("Enter your choice (1-{}):", options.len());
            let answer = match self.prompt(&prompt)? {
                None => return Ok(None),
                Some(answer) => answer,
            };

            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => self.say(&format!(
                    "Invalid choice '{}'. Please enter a number between 1 and {}.",
                    answer,
                    options.len()
                ))?,
            }
        }
    }
}
