// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line-oriented console prompts.

use std::io::{self, BufRead, BufReader, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Line source shared by the menu and the download consent question.
///
/// Clones read from the same stream. The underlying reader is locked for
/// one line at a time, never across questions.
#[derive(Clone)]
pub struct ConsoleInput {
    reader: Arc<Mutex<Box<dyn BufRead + Send>>>,
}

impl ConsoleInput {
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            reader: Arc::new(Mutex::new(Box::new(reader))),
        }
    }

    /// Standard input. `Stdin` takes its own lock per read.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }

    /// Append one line to `line`; `Ok(0)` at end of input.
    pub fn read_line(&self, line: &mut String) -> io::Result<usize> {
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| io::Error::other("console input poisoned"))?;
        reader.read_line(line)
    }
}

/// Reads answers from `input` and writes questions to `output`.
///
/// End of input reads as an empty answer, so every question falls back to
/// its default and menus see an exit request.
pub struct Prompter<W> {
    input: ConsoleInput,
    output: W,
    closed: bool,
}

impl<W: Write> Prompter<W> {
    pub fn new(input: ConsoleInput, output: W) -> Self {
        Self {
            input,
            output,
            closed: false,
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// True once the input has reached end of file.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn say(&mut self, text: impl AsRef<str>) {
        // Console output failures are not actionable here.
        let _ = writeln!(self.output, "{}", text.as_ref());
    }

    /// Trimmed answer; empty on end of input.
    pub fn ask(&mut self, question: &str) -> String {
        let _ = write!(self.output, "{question}");
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.closed = true;
                String::new()
            }
            Ok(_) => line.trim().to_string(),
        }
    }

    /// `None` when the answer is empty.
    pub fn ask_optional(&mut self, question: &str) -> Option<String> {
        let answer = self.ask(question);
        (!answer.is_empty()).then_some(answer)
    }

    /// Parse the answer, re-asking on invalid input and taking `default` on
    /// an empty one.
    pub fn ask_parsed<T>(&mut self, question: &str, default: T) -> T
    where
        T: FromStr,
    {
        loop {
            let answer = self.ask(question);
            if answer.is_empty() {
                return default;
            }
            match answer.parse() {
                Ok(value) => return value,
                Err(_) => self.say(format!("  '{answer}' is not valid here, try again.")),
            }
        }
    }

    pub fn confirm(&mut self, question: &str, default: bool) -> bool {
        loop {
            let answer = self.ask(question).to_ascii_lowercase();
            match answer.as_str() {
                "" => return default,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => self.say("  Please answer y or n."),
            }
        }
    }

    /// 1-based choice from `items`; `None` on an empty answer.
    pub fn choose<'a, T>(
        &mut self,
        question: &str,
        items: &'a [T],
        label: impl Fn(&T) -> String,
    ) -> Option<&'a T> {
        for (i, item) in items.iter().enumerate() {
            self.say(format!("  {}. {}", i + 1, label(item)));
        }
        loop {
            let answer = self.ask(question);
            if answer.is_empty() {
                return None;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Some(&items[n - 1]),
                _ => self.say(format!("  Enter a number from 1 to {}.", items.len())),
            }
        }
    }
}
