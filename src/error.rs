use std::path::PathBuf;

use thiserror::Error;

use crate::player::PlayerError;
use crate::timestamp::TimestampError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] TimestampError),

    #[error("word list is not valid: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not encode the filtered word list: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("word list is empty")]
    EmptyWordList,

    #[error("word #{index} ({term}): {source}")]
    BadCue {
        index: usize,
        term: String,
        #[source]
        source: TimestampError,
    },

    #[error("word #{index} ({term}): cue ends at {end} before it begins at {begin}")]
    InvertedCue {
        index: usize,
        term: String,
        begin: String,
        end: String,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error("session already finished")]
    SessionFinished,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
