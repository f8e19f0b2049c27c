use std::io;

use thiserror::Error;

use crate::corpus::CorpusError;
use crate::session::SessionError;

/// Everything that can stop a typing test before or while it runs
#[derive(Debug, Error)]
pub enum WpmError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}
