use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Column count assumed when the terminal size cannot be read
pub const FALLBACK_WIDTH: u16 = 80;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("raw terminal input is not supported here: {0}")]
    Unsupported(#[source] io::Error),
}

/// Process-wide switch between raw and cooked input
pub trait TerminalMode {
    fn enter_raw(&mut self) -> io::Result<()>;
    fn restore_cooked(&mut self) -> io::Result<()>;
}

/// Raw mode through crossterm (termios on Unix)
#[derive(Debug, Default)]
pub struct CrosstermMode;

impl TerminalMode for CrosstermMode {
    fn enter_raw(&mut self) -> io::Result<()> {
        // crossterm would fall back to /dev/tty, but keystrokes come from stdin
        if !io::stdin().is_tty() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stdin is not a terminal",
            ));
        }
        install_panic_hook();
        install_termination_handler();
        enable_raw_mode()
    }

    fn restore_cooked(&mut self) -> io::Result<()> {
        disable_raw_mode()
    }
}

/// Restores cooked mode exactly once: on [`release`](Self::release) or on drop,
/// whichever comes first.
pub struct RawModeGuard<M: TerminalMode> {
    mode: M,
    active: bool,
}

impl<M: TerminalMode> RawModeGuard<M> {
    /// Enter raw mode.
    ///
    /// A terminal that refuses raw mode is not fatal: the warning is reported
    /// and the returned guard holds nothing to restore.
    pub fn acquire(mut mode: M) -> Self {
        match mode.enter_raw() {
            Ok(()) => {
                debug!("raw mode entered");
                Self { mode, active: true }
            }
            Err(err) => {
                let err = TerminalError::Unsupported(err);
                warn!(%err, "continuing without raw mode");
                eprintln!("warning: {err}");
                Self {
                    mode,
                    active: false,
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn release(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        debug!("raw mode released");
        self.mode.restore_cooked()
    }
}

impl<M: TerminalMode> Drop for RawModeGuard<M> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            error!(%err, "failed to restore cooked mode");
        }
    }
}

/// Source of the current terminal width
pub trait Viewport {
    fn width(&self) -> u16;
}

#[derive(Debug, Default)]
pub struct CrosstermViewport;

impl Viewport for CrosstermViewport {
    fn width(&self) -> u16 {
        match terminal::size() {
            Ok((cols, _)) if cols > 0 => cols,
            _ => FALLBACK_WIDTH,
        }
    }
}

/// Fixed width, for headless runs
#[derive(Debug, Clone, Copy)]
pub struct FixedViewport(pub u16);

impl Viewport for FixedViewport {
    fn width(&self) -> u16 {
        self.0
    }
}

/// A panic while raw mode is on would leave the shell without echo; put the
/// terminal back before the default hook prints the message.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Set by SIGINT/SIGTERM/SIGHUP while the handler is installed.
static TERMINATION_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Whether a termination signal arrived since the last call. Clears the flag.
pub fn take_termination_request() -> bool {
    TERMINATION_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Raw mode makes Ctrl+C a key, but `kill` still delivers signals; they only
/// set a flag, which the input source reports as an interrupt.
#[cfg(unix)]
pub fn install_termination_handler() {
    static HANDLER: Once = Once::new();
    HANDLER.call_once(|| unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = termination_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);
        for signal in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP] {
            if libc::sigaction(signal, &sa, std::ptr::null_mut()) != 0 {
                warn!(signal, "could not install termination handler");
            }
        }
    });
}

#[cfg(unix)]
extern "C" fn termination_handler(_signal: libc::c_int) {
    TERMINATION_REQUESTED.store(true, Ordering::SeqCst);
}

#[cfg(not(unix))]
pub fn install_termination_handler() {}
