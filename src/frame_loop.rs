use std::io::{self, Write};

use crossterm::{
    cursor::{MoveRight, MoveToNextLine, MoveToPreviousLine, MoveUp},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use tracing::{debug, info};

use crate::cursor::CursorDelta;
use crate::error::WpmError;
use crate::render::{render, write_styled};
use crate::runtime::{InputSource, KeyInput, Ticker};
use crate::session::{TypingSession, WordBasis};
use crate::terminal::{RawModeGuard, TerminalMode, Viewport};
use crate::typing_policy::CompletionPolicy;

/// Default pause between ticks
pub const TICK_RATE_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    pub policy: CompletionPolicy,
    pub live_stats: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            policy: CompletionPolicy::Exact,
            live_stats: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Running,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    Completed,
    Interrupted,
}

/// Drives one typing session: poll, apply, redraw, sleep.
///
/// The region it draws starts on the cursor line at construction time and
/// spans the wrapped text plus, with live stats on, a blank line and the
/// stats line. All movement inside it is relative.
pub struct FrameLoop<I, V, W, T> {
    session: TypingSession,
    input: I,
    viewport: V,
    out: W,
    ticker: T,
    options: LoopOptions,
    state: LoopState,
    outcome: LoopOutcome,
    // cursor geometry of the last full frame; None once back at the top
    drawn: Option<CursorDelta>,
}

impl<I, V, W, T> FrameLoop<I, V, W, T>
where
    I: InputSource,
    V: Viewport,
    W: Write,
    T: Ticker,
{
    pub fn new(
        session: TypingSession,
        input: I,
        viewport: V,
        out: W,
        ticker: T,
        options: LoopOptions,
    ) -> Self {
        Self {
            session,
            input,
            viewport,
            out,
            ticker,
            options,
            state: LoopState::Init,
            outcome: LoopOutcome::Completed,
            drawn: None,
        }
    }

    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    pub fn into_session(self) -> TypingSession {
        self.session
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn out(&self) -> &W {
        &self.out
    }

    /// Run the session to completion or interrupt.
    ///
    /// Raw mode is held for the whole run and released before returning,
    /// on the error path too.
    pub fn run<M: TerminalMode>(&mut self, mode: M) -> Result<LoopOutcome, WpmError> {
        let mut guard = RawModeGuard::acquire(mode);
        info!(policy = %self.options.policy, live_stats = self.options.live_stats, "frame loop starting");

        while self.step()? != LoopState::Done {}

        self.leave_region()?;
        guard.release()?;
        Ok(self.outcome)
    }

    /// Advance one tick.
    pub fn step(&mut self) -> io::Result<LoopState> {
        match self.state {
            LoopState::Done => return Ok(LoopState::Done),
            LoopState::Init => self.state = LoopState::Running,
            LoopState::Running => {}
        }

        let width = usize::from(self.viewport.width());
        let geometry =
            CursorDelta::compute(self.session.target().len(), self.session.typed().len(), width);

        match self.drawn {
            Some(drawn) if drawn.width == geometry.width => {
                if self.options.live_stats {
                    self.draw_stats(&drawn)?;
                }
            }
            _ => {
                self.return_to_top()?;
                self.draw_frame(&geometry)?;
                self.drawn = Some(geometry);
            }
        }
        self.out.flush()?;

        if self.session.is_complete(self.options.policy) {
            self.session.finish();
            self.state = LoopState::Done;
            return Ok(self.state);
        }

        let mut changed = false;
        match self.input.poll_input()? {
            Some(KeyInput::Interrupt) => {
                info!("interrupted");
                self.session.finish();
                self.outcome = LoopOutcome::Interrupted;
                self.state = LoopState::Done;
                return Ok(self.state);
            }
            Some(KeyInput::Resize) => changed = true,
            Some(other) => {
                if let Some(c) = other.as_keystroke() {
                    self.session.apply_char(c);
                    changed = true;
                }
            }
            None => {}
        }

        self.ticker.wait();

        if changed {
            self.return_to_top()?;
        }
        Ok(self.state)
    }

    // row the cursor is left on after a full frame, counted from the region top
    fn bottom_row(&self, geometry: &CursorDelta) -> usize {
        geometry.lines_up + usize::from(self.options.live_stats)
    }

    // kept under the width: a wrapped stats line would throw off every row count
    fn stats_line(&self, width: usize) -> String {
        let line = self.session.stats(WordBasis::Typed).live_line();
        line.chars().take(width.saturating_sub(1)).collect()
    }

    fn draw_frame(&mut self, geometry: &CursorDelta) -> io::Result<()> {
        let styled = render(self.session.target(), self.session.typed());

        queue!(self.out, Print('\r'), Clear(ClearType::FromCursorDown))?;
        write_styled(&mut self.out, &styled, self.session.typed().len())?;
        queue!(self.out, Print("\r\n"))?;

        if self.options.live_stats {
            let line = self.stats_line(geometry.width);
            queue!(self.out, Print("\r\n"), Print(line))?;
        }

        let up = self.bottom_row(geometry) - geometry.lines_down;
        if up > 0 {
            queue!(self.out, MoveToPreviousLine(cells(up)))?;
        } else {
            queue!(self.out, Print('\r'))?;
        }
        if geometry.cols_over > 0 {
            queue!(self.out, MoveRight(cells(geometry.cols_over)))?;
        }
        Ok(())
    }

    /// Refresh only the stats line, leaving the cursor where it was.
    fn draw_stats(&mut self, geometry: &CursorDelta) -> io::Result<()> {
        let down = cells(self.bottom_row(geometry) - geometry.lines_down);
        let line = self.stats_line(geometry.width);

        queue!(
            self.out,
            MoveToNextLine(down),
            Clear(ClearType::CurrentLine),
            Print(line),
            MoveToPreviousLine(down)
        )?;
        if geometry.cols_over > 0 {
            queue!(self.out, MoveRight(cells(geometry.cols_over)))?;
        }
        Ok(())
    }

    fn return_to_top(&mut self) -> io::Result<()> {
        if let Some(drawn) = self.drawn.take() {
            if drawn.lines_down > 0 {
                queue!(self.out, MoveUp(cells(drawn.lines_down)))?;
            }
        }
        Ok(())
    }

    /// Park the cursor on a fresh line below the region.
    fn leave_region(&mut self) -> io::Result<()> {
        if let Some(drawn) = self.drawn {
            let down = self.bottom_row(&drawn) - drawn.lines_down;
            if down > 0 {
                queue!(self.out, MoveToNextLine(cells(down)))?;
            }
        }
        debug!("leaving render region");
        queue!(self.out, Print("\r\n"))?;
        self.out.flush()
    }
}

fn cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}
