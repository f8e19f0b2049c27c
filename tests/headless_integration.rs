use std::io;
use std::sync::mpsc;
use std::time::Duration;

use wpm::runtime::{FixedTicker, KeyInput, TestInputSource};
use wpm::terminal::{FixedViewport, TerminalMode};
use wpm::{CompletionPolicy, FrameLoop, LoopOptions, LoopOutcome, TypingSession, WordBasis};

// Headless integration using the frame loop without a TTY
struct NoopMode;

impl TerminalMode for NoopMode {
    fn enter_raw(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn restore_cooked(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_with(
    text: &str,
    width: u16,
    options: LoopOptions,
    inputs: Vec<KeyInput>,
) -> (LoopOutcome, TypingSession, String) {
    let (tx, rx) = mpsc::channel();
    for input in inputs {
        tx.send(input).unwrap();
    }

    let mut frame_loop = FrameLoop::new(
        TypingSession::new(text).unwrap(),
        TestInputSource::new(rx),
        FixedViewport(width),
        Vec::new(),
        FixedTicker::new(Duration::from_millis(1)),
        options,
    );
    let outcome = frame_loop.run(NoopMode).unwrap();
    let out = String::from_utf8_lossy(frame_loop.out()).into_owned();
    (outcome, frame_loop.into_session(), out)
}

#[test]
fn headless_typing_flow_completes() {
    let inputs = "cat dog".chars().map(KeyInput::Char).collect();
    let (outcome, session, out) = run_with("cat dog", 80, LoopOptions::default(), inputs);

    assert_eq!(outcome, LoopOutcome::Completed);
    assert!(session.is_complete(CompletionPolicy::Exact));

    let stats = session.stats(WordBasis::Target);
    assert_eq!(stats.word_count, 2);
    assert!(stats.elapsed_seconds > 0.0);
    assert!(stats.wpm > 0.0);
    assert!(out.contains("wpm"));
}

#[test]
fn headless_ignore_errors_flow() {
    let options = LoopOptions {
        policy: CompletionPolicy::IgnoreErrors,
        live_stats: false,
    };
    let inputs = "cxt".chars().map(KeyInput::Char).collect();
    let (outcome, session, _out) = run_with("cat", 80, options, inputs);

    assert_eq!(outcome, LoopOutcome::Completed);
    assert_eq!(session.typed(), &['c', 'x', 't']);
}

#[test]
fn headless_errors_must_be_fixed_in_exact_mode() {
    let inputs = vec![
        KeyInput::Char('c'),
        KeyInput::Char('x'),
        KeyInput::Char('t'),
        KeyInput::Backspace,
        KeyInput::Backspace,
        KeyInput::Char('a'),
        KeyInput::Char('t'),
    ];
    let (outcome, session, out) = run_with("cat", 80, LoopOptions::default(), inputs);

    assert_eq!(outcome, LoopOutcome::Completed);
    assert_eq!(session.typed(), session.target());
    // typed characters are drawn bold
    assert!(out.contains("\x1b[1m"));
}

#[test]
fn headless_interrupt_skips_completion() {
    let inputs = vec![KeyInput::Char('c'), KeyInput::Interrupt, KeyInput::Char('a')];
    let (outcome, session, _out) = run_with("cat", 80, LoopOptions::default(), inputs);

    assert_eq!(outcome, LoopOutcome::Interrupted);
    assert_eq!(session.typed(), &['c']);
    assert!(!session.is_complete(CompletionPolicy::Exact));
}

/// Just enough of a VT100 to follow the frame loop: printable cells with
/// deferred autowrap, CR/LF and the CSI moves and clears it emits.
struct Screen {
    width: usize,
    cells: Vec<Vec<char>>,
    row: usize,
    col: usize,
    wrap_pending: bool,
}

impl Screen {
    fn new(width: usize) -> Self {
        Self {
            width,
            cells: vec![Vec::new()],
            row: 0,
            col: 0,
            wrap_pending: false,
        }
    }

    fn feed(&mut self, bytes: &str) {
        let mut chars = bytes.chars();
        while let Some(c) = chars.next() {
            match c {
                '\x1b' => {
                    assert_eq!(chars.next(), Some('['));
                    let mut params = String::new();
                    let mut last = ' ';
                    for p in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&p) {
                            last = p;
                            break;
                        }
                        params.push(p);
                    }
                    let n = params.parse::<usize>().unwrap_or(1);
                    self.csi(last, n, &params);
                }
                '\r' => {
                    self.col = 0;
                    self.wrap_pending = false;
                }
                '\n' => self.move_to(self.row + 1, self.col),
                c => self.put(c),
            }
        }
    }

    fn csi(&mut self, op: char, n: usize, params: &str) {
        match op {
            'F' => self.move_to(self.row.saturating_sub(n), 0),
            'E' => self.move_to(self.row + n, 0),
            'A' => self.move_to(self.row.saturating_sub(n), self.col),
            'C' => self.move_to(self.row, (self.col + n).min(self.width - 1)),
            'J' => {
                self.cells[self.row].truncate(self.col);
                self.cells.truncate(self.row + 1);
            }
            'K' if params == "2" => self.cells[self.row].clear(),
            'm' => {}
            other => panic!("unexpected CSI {params}{other}"),
        }
    }

    fn move_to(&mut self, row: usize, col: usize) {
        while self.cells.len() <= row {
            self.cells.push(Vec::new());
        }
        self.row = row;
        self.col = col;
        self.wrap_pending = false;
    }

    fn put(&mut self, c: char) {
        if self.wrap_pending {
            self.move_to(self.row + 1, 0);
        }
        let line = &mut self.cells[self.row];
        if line.len() <= self.col {
            line.resize(self.col + 1, ' ');
        }
        line[self.col] = c;
        if self.col + 1 == self.width {
            self.wrap_pending = true;
        } else {
            self.col += 1;
        }
    }

    fn line(&self, row: usize) -> String {
        self.cells[row].iter().collect()
    }

    fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}

fn step_until_typed(
    frame_loop: &mut FrameLoop<TestInputSource, FixedViewport, Vec<u8>, FixedTicker>,
    typed: usize,
) {
    while frame_loop.session().typed().len() < typed {
        frame_loop.step().unwrap();
    }
    // the frame showing the last keystroke
    frame_loop.step().unwrap();
}

#[test]
fn headless_cursor_lands_on_next_char_in_narrow_terminal() {
    let text = "the quick brown fox jumps";
    let (tx, rx) = mpsc::channel();
    let mut frame_loop = FrameLoop::new(
        TypingSession::new(text).unwrap(),
        TestInputSource::new(rx),
        FixedViewport(8),
        Vec::new(),
        FixedTicker::new(Duration::ZERO),
        LoopOptions::default(),
    );

    for c in "the quick br".chars() {
        tx.send(KeyInput::Char(c)).unwrap();
    }
    step_until_typed(&mut frame_loop, 12);
    // a few idle ticks only touch the stats line
    for _ in 0..3 {
        frame_loop.step().unwrap();
    }

    let mut screen = Screen::new(8);
    screen.feed(&String::from_utf8_lossy(frame_loop.out()));

    assert_eq!(screen.cursor(), (1, 4));
    assert_eq!(screen.line(0), "the quic");
    assert_eq!(screen.line(3), "s");
    assert!(screen.line(5).chars().count() < 8);
    assert_eq!(screen.cells.len(), 6);
}

#[test]
fn headless_region_stays_put_across_frames() {
    let text = "abcdef";
    let (tx, rx) = mpsc::channel();
    let mut frame_loop = FrameLoop::new(
        TypingSession::new(text).unwrap(),
        TestInputSource::new(rx),
        FixedViewport(4),
        Vec::new(),
        FixedTicker::new(Duration::ZERO),
        LoopOptions::default(),
    );

    for (typed, c) in "abcde".chars().enumerate() {
        tx.send(KeyInput::Char(c)).unwrap();
        step_until_typed(&mut frame_loop, typed + 1);

        let mut screen = Screen::new(4);
        screen.feed(&String::from_utf8_lossy(frame_loop.out()));
        let expected = typed + 1;
        assert_eq!(screen.cursor(), (expected / 4, expected % 4));
        assert_eq!(screen.line(0), "abcd");
        assert_eq!(screen.cells.len(), 4);
    }
}

#[test]
fn headless_narrow_terminal_wraps() {
    let text = "the quick brown fox";
    let inputs = text.chars().map(KeyInput::Char).collect();
    let (outcome, session, out) = run_with(text, 5, LoopOptions::default(), inputs);

    assert_eq!(outcome, LoopOutcome::Completed);
    assert_eq!(session.typed(), session.target());
    // 19 chars over 5 columns: four lines plus the two stats rows
    assert!(out.contains("\x1b[5F"));
    // the stats line never reaches the last column
    assert!(!out.contains("words"));
}
