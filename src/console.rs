// console.rs
//! The input boundary of the human strategy.
//!
//! The engine only ever asks for a legal choice or a refusal. Re-asking after
//! bad input is the decider's business, not the engine's.

use std::io::{BufRead, Write};

/// Source of decisions for a human-controlled player. `None` means the player
/// declines.
pub trait Decider {
    /// Picks one of `options` by index.
    fn choose(&mut self, prompt: &str, options: &[String]) -> Option<usize>;

    /// Picks a number in `min..=max`.
    fn choose_count(&mut self, prompt: &str, min: u32, max: u32) -> Option<u32>;

    /// Shows a message that needs no answer.
    fn inform(&mut self, _message: &str) {}
}

const PASS_WORDS: [&str; 4] = ["", "pass", "skip", "done"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply<T> {
    Value(T),
    Pass,
    Invalid,
}

fn parse_choice(text: &str, options: &[String]) -> Reply<usize> {
    let text = text.trim();
    if PASS_WORDS.iter().any(|word| text.eq_ignore_ascii_case(word)) {
        return Reply::Pass;
    }
    if let Ok(number) = text.parse::<usize>() {
        return match number {
            n if (1..=options.len()).contains(&n) => Reply::Value(n - 1),
            _ => Reply::Invalid,
        };
    }
    options
        .iter()
        .position(|option| option.eq_ignore_ascii_case(text))
        .map_or(Reply::Invalid, Reply::Value)
}

fn parse_count(text: &str, min: u32, max: u32) -> Reply<u32> {
    let text = text.trim();
    if PASS_WORDS.iter().any(|word| text.eq_ignore_ascii_case(word)) {
        return Reply::Pass;
    }
    match text.parse::<u32>() {
        Ok(n) if (min..=max).contains(&n) => Reply::Value(n),
        _ => Reply::Invalid,
    }
}

/// Line-oriented decider: writes numbered prompts to `output` and reads one
/// answer per line from `input`, asking again until the answer is usable.
/// End of input, or output that can no longer be written, counts as declining.
#[derive(Debug)]
pub struct LineDecider<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineDecider<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Option<String> {
        self.output.flush().ok()?;
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn ask<T>(&mut self, mut parse: impl FnMut(&str) -> Reply<T>) -> Option<T> {
        loop {
            write!(self.output, "Enter choice: ").ok()?;
            let line = self.read_line()?;
            match parse(&line) {
                Reply::Value(value) => return Some(value),
                Reply::Pass => return None,
                Reply::Invalid => {
                    writeln!(self.output, "Invalid input, try again.").ok()?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> Decider for LineDecider<R, W> {
    fn choose(&mut self, prompt: &str, options: &[String]) -> Option<usize> {
        if options.is_empty() {
            return None;
        }
        writeln!(self.output, "\n{prompt}").ok()?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, option).ok()?;
        }
        self.ask(|line| parse_choice(line, options))
    }

    fn choose_count(&mut self, prompt: &str, min: u32, max: u32) -> Option<u32> {
        if min > max {
            return None;
        }
        writeln!(self.output, "\n{prompt} ({min}-{max})").ok()?;
        self.ask(|line| parse_count(line, min, max))
    }

    fn inform(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }
}

/// Decider reading from the process's stdin and printing to stdout.
pub fn stdio_decider() -> LineDecider<std::io::StdinLock<'static>, std::io::Stdout> {
    LineDecider::new(std::io::stdin().lock(), std::io::stdout())
}
