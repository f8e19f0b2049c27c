use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::corpus::TextProvider;
use crate::error::WpmError;
use crate::typing_policy::{apply_keystroke, CompletionPolicy, BACKSPACE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("the text to type is empty")]
    EmptyTarget,
}

/// Which buffer the word count is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordBasis {
    /// words typed so far; used by the live readout
    Typed,
    /// words in the target text; used by the final summary
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub elapsed_seconds: f64,
    pub word_count: usize,
    pub wpm: f64,
}

impl Stats {
    fn new(elapsed_seconds: f64, word_count: usize) -> Self {
        let wpm = if elapsed_seconds > 0.0 {
            word_count as f64 / (elapsed_seconds / 60.0)
        } else {
            0.0
        };
        Self {
            elapsed_seconds,
            word_count,
            wpm,
        }
    }

    /// Single-line readout shown under the text while typing
    pub fn live_line(&self) -> String {
        let noun = if self.word_count == 1 { "word" } else { "words" };
        format!(
            "{:.1}s  {} {}  {:.0} wpm",
            self.elapsed_seconds, self.word_count, noun, self.wpm
        )
    }

    pub fn summary(&self) -> Summary<'_> {
        Summary(self)
    }
}

/// Final report printed once the terminal is back in cooked mode
pub struct Summary<'a>(&'a Stats);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Words typed: {}", self.0.word_count)?;
        writeln!(f, "Time elapsed: {:.2} seconds", self.0.elapsed_seconds)?;
        write!(f, "Words per minute: {:.0}", self.0.wpm)
    }
}

/// One attempt at typing a target text
#[derive(Debug, Clone)]
pub struct TypingSession {
    target: Vec<char>,
    typed: Vec<char>,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
}

impl TypingSession {
    pub fn new(text: impl Into<String>) -> Result<Self, SessionError> {
        let target: Vec<char> = text.into().chars().collect();
        if target.is_empty() {
            return Err(SessionError::EmptyTarget);
        }

        Ok(Self {
            target,
            typed: Vec::new(),
            started_at: None,
            ended_at: None,
        })
    }

    /// Start a session on the next text the provider hands out.
    pub fn from_provider(provider: &dyn TextProvider) -> Result<Self, WpmError> {
        let text = provider.next_text()?;
        Ok(Self::new(text)?)
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn apply_char(&mut self, c: char) {
        self.apply_char_at(c, Instant::now());
    }

    /// Same as [`apply_char`](Self::apply_char) with an explicit clock reading.
    pub fn apply_char_at(&mut self, c: char, now: Instant) {
        if self.has_finished() {
            debug!(?c, "keystroke after session finished");
        }
        if self.started_at.is_none() {
            info!(target_len = self.target.len(), "session started");
            self.started_at = Some(now);
        }
        if c == BACKSPACE && self.typed.is_empty() {
            return;
        }
        apply_keystroke(&mut self.typed, c);
    }

    pub fn is_complete(&self, policy: CompletionPolicy) -> bool {
        policy.is_satisfied(&self.target, &self.typed)
    }

    pub fn finish(&mut self) {
        self.finish_at(Instant::now());
    }

    pub fn finish_at(&mut self, now: Instant) {
        if self.ended_at.is_none() {
            self.ended_at = Some(now);
            info!(elapsed = ?self.elapsed_at(now), "session finished");
        }
    }

    /// Time between the first keystroke and `finish`, or `now` while running.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => self.ended_at.unwrap_or(now).saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    pub fn stats(&self, basis: WordBasis) -> Stats {
        self.stats_at(basis, Instant::now())
    }

    pub fn stats_at(&self, basis: WordBasis, now: Instant) -> Stats {
        let words = match basis {
            WordBasis::Typed => count_words(&self.typed),
            WordBasis::Target => count_words(&self.target),
        };
        Stats::new(self.elapsed_at(now).as_secs_f64(), words)
    }
}

fn count_words(chars: &[char]) -> usize {
    chars
        .split(|c| c.is_whitespace())
        .filter(|word| !word.is_empty())
        .count()
}
