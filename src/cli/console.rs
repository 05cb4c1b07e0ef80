//! Line-oriented prompts on stdin.

use anyhow::{bail, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one trimmed line. Fails at end of input.
    pub async fn ask(&mut self, label: &str) -> Result<String> {
        print!("{}: ", label);
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => bail!("input closed"),
        }
    }

    /// Like `ask`, but an empty answer becomes `None`.
    pub async fn ask_optional(&mut self, label: &str) -> Result<Option<String>> {
        let answer = self.ask(label).await?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    /// Ask for a value, falling back to `default` on an empty answer.
    pub async fn ask_or(&mut self, label: &str, default: &str) -> Result<String> {
        let answer = self.ask(&format!("{} [{}]", label, default)).await?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    /// Parse a number, re-asking until the input parses.
    pub async fn ask_parsed<T: std::str::FromStr>(&mut self, label: &str, default: T) -> Result<T> {
        loop {
            let answer = self.ask(label).await?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(_) => println!("Invalid number: {}", answer),
            }
        }
    }
}
