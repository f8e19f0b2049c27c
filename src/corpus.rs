use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

static TEXTS_DIR: Dir = include_dir!("src/texts");

const EMBEDDED_FILE: &str = "texts.json";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot read corpus {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("embedded corpus {0} is missing")]
    MissingEmbedded(&'static str),

    #[error("corpus has no entries")]
    NoEntries,

    #[error("corpus entry {0} does not start with a text string")]
    MalformedEntry(usize),

    #[error("corpus entry {0} has empty text")]
    EmptyText(usize),
}

/// Supplies the text for one typing test
pub trait TextProvider {
    fn next_text(&self) -> Result<String, CorpusError>;
}

/// A fixed text, e.g. words given on the command line
#[derive(Debug, Clone)]
pub struct StaticText(String);

impl StaticText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Join words with single spaces.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let joined = words
            .iter()
            .map(|word| word.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");
        Self(joined)
    }
}

impl TextProvider for StaticText {
    fn next_text(&self) -> Result<String, CorpusError> {
        if self.0.is_empty() {
            return Err(CorpusError::EmptyText(0));
        }
        Ok(self.0.clone())
    }
}

/// A set of candidate texts, one chosen uniformly at random per test.
///
/// The JSON form is an array of entries, each an array whose first element
/// is the text; anything after it (source, author) is ignored.
#[derive(Debug, Clone)]
pub struct Corpus {
    texts: Vec<String>,
}

impl Corpus {
    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let entries: Vec<Vec<Value>> = serde_json::from_str(json)?;
        if entries.is_empty() {
            return Err(CorpusError::NoEntries);
        }

        let texts = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| match entry.into_iter().next() {
                Some(Value::String(text)) if text.is_empty() => Err(CorpusError::EmptyText(idx)),
                Some(Value::String(text)) => Ok(text),
                _ => Err(CorpusError::MalformedEntry(idx)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { texts })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CorpusError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Self::from_json(&json)?;
        debug!(path = %path.display(), texts = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    /// The corpus compiled into the binary
    pub fn embedded() -> Result<Self, CorpusError> {
        let file = TEXTS_DIR
            .get_file(EMBEDDED_FILE)
            .ok_or(CorpusError::MissingEmbedded(EMBEDDED_FILE))?;
        let json = file
            .contents_utf8()
            .ok_or(CorpusError::MissingEmbedded(EMBEDDED_FILE))?;
        Self::from_json(json)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }
}

impl TextProvider for Corpus {
    fn next_text(&self) -> Result<String, CorpusError> {
        self.texts
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(CorpusError::NoEntries)
    }
}

/// Pick the provider: literal words win over a corpus file, which wins over
/// the embedded corpus.
pub fn provider_for(
    words: &[String],
    texts: Option<&Path>,
) -> Result<Box<dyn TextProvider>, CorpusError> {
    if !words.is_empty() {
        return Ok(Box::new(StaticText::from_words(words)));
    }
    match texts {
        Some(path) => Ok(Box::new(Corpus::from_path(path)?)),
        None => Ok(Box::new(Corpus::embedded()?)),
    }
}
