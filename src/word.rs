use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timestamp::{parse_timestamp, playback_window, PlaybackWindow};

/// One vocabulary entry tied to a subtitle cue.
/// Field order is the JSON key order used when the list is written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Word {
    pub term: String,
    pub begin_timestamp: String,
    pub end_timestamp: String,
    pub english_meaning: String,
    pub turkish_meaning: String,
    pub sample_sentence_in_english: String,
    pub sample_sentence_in_turkish: String,
}

/// Reads and validates a JSON word list
pub fn load_words<P: AsRef<Path>>(path: P) -> Result<Vec<Word>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let words = parse_words(&text)?;
    tracing::info!(path = %path.display(), count = words.len(), "loaded word list");
    Ok(words)
}

pub fn parse_words(text: &str) -> Result<Vec<Word>> {
    let words: Vec<Word> = serde_json::from_str(text)?;
    check_words(&words)?;
    Ok(words)
}

/// Validates every cue and returns the playback windows in word order.
///
/// An empty list, a malformed timestamp, or a cue ending before it begins
/// is rejected. Equal begin and end is fine.
pub fn check_words(words: &[Word]) -> Result<Vec<PlaybackWindow>> {
    if words.is_empty() {
        return Err(Error::EmptyWordList);
    }

    words
        .iter()
        .enumerate()
        .map(|(index, word)| {
            let bad_cue = |source| Error::BadCue {
                index,
                term: word.term.clone(),
                source,
            };
            let begin = parse_timestamp(&word.begin_timestamp).map_err(bad_cue)?;
            let end = parse_timestamp(&word.end_timestamp).map_err(bad_cue)?;
            if end < begin {
                return Err(Error::InvertedCue {
                    index,
                    term: word.term.clone(),
                    begin: word.begin_timestamp.clone(),
                    end: word.end_timestamp.clone(),
                });
            }
            playback_window(word).map_err(bad_cue)
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn sample_word(term: &str, begin: &str, end: &str) -> Word {
    Word {
        term: term.to_string(),
        begin_timestamp: begin.to_string(),
        end_timestamp: end.to_string(),
        english_meaning: format!("meaning of {term}"),
        turkish_meaning: format!("{term} anlamı"),
        sample_sentence_in_english: format!("A sentence with {term}."),
        sample_sentence_in_turkish: format!("{term} içeren bir cümle."),
    }
}
