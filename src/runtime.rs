use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::tty::IsTty;
use tracing::{debug, info, warn};

use crate::terminal::take_termination_request;
use crate::typing_policy::BACKSPACE;

const READ_BUF_SIZE: usize = 4096;

/// Input consumed by the frame loop, one per tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Interrupt,
    Resize,
}

impl KeyInput {
    /// Character handed to the session, if this input edits the buffer
    pub fn as_keystroke(&self) -> Option<char> {
        match self {
            KeyInput::Char(c) => Some(*c),
            KeyInput::Backspace => Some(BACKSPACE),
            KeyInput::Interrupt | KeyInput::Resize => None,
        }
    }
}

/// Source of terminal input that never blocks
pub trait InputSource {
    /// Returns the next pending input, or `None` if nothing is ready right now.
    fn poll_input(&mut self) -> io::Result<Option<KeyInput>>;
}

/// Translate a crossterm key event; unmapped keys are dropped.
pub fn map_key(key: KeyEvent) -> Option<KeyInput> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(KeyInput::Interrupt),
            KeyCode::Char('h') => Some(KeyInput::Backspace),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Enter => Some(KeyInput::Char('\n')),
        KeyCode::Tab => Some(KeyInput::Char('\t')),
        KeyCode::Esc => Some(KeyInput::Interrupt),
        _ => None,
    }
}

/// Production input source using crossterm's zero-timeout poll
#[derive(Debug, Default)]
pub struct CrosstermInputSource;

impl InputSource for CrosstermInputSource {
    fn poll_input(&mut self) -> io::Result<Option<KeyInput>> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                CtEvent::Key(key) => {
                    if let Some(input) = map_key(key) {
                        return Ok(Some(input));
                    }
                }
                CtEvent::Resize(_, _) => return Ok(Some(KeyInput::Resize)),
                _ => {}
            }
        }
        Ok(None)
    }
}

/// Map one decoded stdin character; other control characters are dropped.
pub fn map_char(c: char) -> Option<KeyInput> {
    match c {
        '\x03' | '\x04' | '\x1b' => Some(KeyInput::Interrupt),
        '\x7f' | '\x08' => Some(KeyInput::Backspace),
        '\r' | '\n' => Some(KeyInput::Char('\n')),
        '\t' => Some(KeyInput::Char('\t')),
        c if c.is_control() => None,
        c => Some(KeyInput::Char(c)),
    }
}

/// Raw stdin bytes, for when crossterm cannot read terminal events
/// (stdin redirected, no controlling terminal).
///
/// A reader thread forwards byte chunks over a channel so polling never
/// blocks. End of input reads as an interrupt.
pub struct StdinInputSource {
    rx: Receiver<Vec<u8>>,
    // undecoded tail of a multi-byte character split across chunks
    partial: Vec<u8>,
    pending: VecDeque<KeyInput>,
    closed: bool,
}

impl StdinInputSource {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                let mut stdin = io::stdin();
                let mut buf = [0u8; READ_BUF_SIZE];
                loop {
                    match stdin.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                        Err(err) => {
                            warn!(%err, "stdin read failed");
                            break;
                        }
                    }
                }
                debug!("stdin reader finished");
            });
        if let Err(err) = spawned {
            // the sender went down with the closure, so the source reads as closed
            warn!(%err, "could not start stdin reader");
        }
        Self::from_receiver(rx)
    }

    /// Decode chunks from any byte channel; used by `spawn` and tests.
    pub fn from_receiver(rx: Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            partial: Vec::new(),
            pending: VecDeque::new(),
            closed: false,
        }
    }

    fn decode(&mut self, chunk: &[u8]) {
        self.partial.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.partial);
        let mut rest = &bytes[..];

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.pending.extend(text.chars().filter_map(map_char));
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    let text = String::from_utf8_lossy(valid);
                    self.pending.extend(text.chars().filter_map(map_char));
                    match err.error_len() {
                        Some(bad) => rest = &tail[bad..],
                        None => {
                            self.partial.extend_from_slice(tail);
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl InputSource for StdinInputSource {
    fn poll_input(&mut self) -> io::Result<Option<KeyInput>> {
        while self.pending.is_empty() && !self.closed {
            match self.rx.try_recv() {
                Ok(chunk) => self.decode(&chunk),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => {
                    info!("stdin closed");
                    self.closed = true;
                }
            }
        }
        match self.pending.pop_front() {
            Some(input) => Ok(Some(input)),
            None => Ok(Some(KeyInput::Interrupt)),
        }
    }
}

/// Input for the real binary: crossterm events on a terminal, raw stdin
/// bytes otherwise. A termination signal is reported as an interrupt.
pub enum TerminalInput {
    Events(CrosstermInputSource),
    Bytes(StdinInputSource),
}

impl TerminalInput {
    pub fn detect() -> Self {
        if io::stdin().is_tty() {
            TerminalInput::Events(CrosstermInputSource)
        } else {
            info!("stdin is not a tty, reading raw bytes");
            TerminalInput::Bytes(StdinInputSource::spawn())
        }
    }
}

impl InputSource for TerminalInput {
    fn poll_input(&mut self) -> io::Result<Option<KeyInput>> {
        if take_termination_request() {
            info!("termination signal received");
            return Ok(Some(KeyInput::Interrupt));
        }

        let polled = match self {
            TerminalInput::Bytes(source) => return source.poll_input(),
            TerminalInput::Events(source) => source.poll_input(),
        };
        match polled {
            Ok(input) => Ok(input),
            Err(err) => {
                warn!(%err, "terminal events unavailable, reading stdin bytes");
                *self = TerminalInput::Bytes(StdinInputSource::spawn());
                Ok(None)
            }
        }
    }
}

/// Test input source fed through a channel
pub struct TestInputSource {
    rx: Receiver<KeyInput>,
}

impl TestInputSource {
    pub fn new(rx: Receiver<KeyInput>) -> Self {
        Self { rx }
    }
}

impl InputSource for TestInputSource {
    fn poll_input(&mut self) -> io::Result<Option<KeyInput>> {
        match self.rx.try_recv() {
            Ok(input) => Ok(Some(input)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }
}

/// Configurable ticker interface
pub trait Ticker {
    fn interval(&self) -> Duration;

    /// Pause between two ticks of the frame loop
    fn wait(&self) {
        let interval = self.interval();
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}
