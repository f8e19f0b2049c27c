use std::{error::Error, io, path::PathBuf};

use clap::Parser;
use tracing::info;
use wpm::{
    config::{Config, ConfigStore, FileConfigStore},
    corpus,
    runtime::{FixedTicker, TerminalInput},
    terminal::{CrosstermMode, CrosstermViewport},
    FrameLoop, LoopOutcome, TypingSession, WordBasis, WpmError,
};

/// terminal typing speed test
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type the text shown on screen. Mistakes are highlighted as you go, and time, word count and words per minute are reported when you finish."
)]
pub struct Cli {
    /// finish once as many characters as the text has are typed, even with mistakes
    #[clap(short = 'e', long)]
    ignore_errors: bool,

    /// hide the live time / wpm line under the text
    #[clap(long)]
    no_stats: bool,

    /// JSON corpus to pick a random text from
    #[clap(short = 't', long, value_name = "FILE")]
    texts: Option<PathBuf>,

    /// milliseconds to sleep between frames
    #[clap(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,

    /// words to type instead of a corpus text
    words: Vec<String>,
}

impl Cli {
    /// Flags override whatever the config file says.
    fn apply_to(&self, cfg: &mut Config) {
        if self.ignore_errors {
            cfg.ignore_errors = true;
        }
        if self.no_stats {
            cfg.live_stats = false;
        }
        if let Some(ref texts) = self.texts {
            cfg.texts = Some(texts.clone());
        }
        if let Some(tick_ms) = self.tick_ms {
            cfg.tick_ms = tick_ms;
        }
    }
}

/// Literal words, else the configured corpus file, else the embedded corpus.
fn prepare_session(words: &[String], config: &Config) -> Result<TypingSession, WpmError> {
    let provider = corpus::provider_for(words, config.texts.as_deref())?;
    TypingSession::from_provider(&*provider)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = wpm::logging::init();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply_to(&mut config);
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "config saved");
    }

    let session = prepare_session(&cli.words, &config)?;

    let mut frame_loop = FrameLoop::new(
        session,
        TerminalInput::detect(),
        CrosstermViewport,
        io::stdout(),
        FixedTicker::new(config.tick_interval()),
        config.loop_options(),
    );

    match frame_loop.run(CrosstermMode)? {
        LoopOutcome::Completed => {
            let stats = frame_loop.session().stats(WordBasis::Target);
            println!();
            println!("{}", stats.summary());
        }
        LoopOutcome::Interrupted => info!("exiting without summary"),
    }

    Ok(())
}
