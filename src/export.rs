use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{Error, Result};
use crate::session::Response;
use crate::word::Word;

const FILTERED_SUFFIX: &str = "_filtered.json";
const INDENT: &[u8] = b"    ";

/// Where the filtered list of `input` is written: `words.json` becomes
/// `words_filtered.json` in the same directory.
pub fn filtered_path(input: &Path) -> PathBuf {
    let mut name: OsString = input.with_extension("").into_os_string();
    name.push(FILTERED_SUFFIX);
    PathBuf::from(name)
}

/// Words still to study: everything not explicitly marked known
pub fn filtered_words<'a>(words: &'a [Word], responses: &[Response]) -> Vec<&'a Word> {
    words
        .iter()
        .zip(responses)
        .filter(|(_, response)| response.keeps_word())
        .map(|(word, _)| word)
        .collect()
}

pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser).map_err(Error::Encode)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Outcome of a finished session's export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub kept: usize,
    pub total: usize,
}

/// Writes the filtered list next to `words_path`. Single attempt, no retry.
pub fn write_filtered(
    words: &[Word],
    responses: &[Response],
    words_path: &Path,
) -> Result<ExportSummary> {
    let kept = filtered_words(words, responses);
    let path = filtered_path(words_path);
    let json = to_pretty_json(&kept)?;
    fs::write(&path, json).map_err(|e| Error::io(&path, e))?;

    tracing::info!(
        path = %path.display(),
        kept = kept.len(),
        total = words.len(),
        "wrote filtered word list"
    );

    Ok(ExportSummary {
        path,
        kept: kept.len(),
        total: words.len(),
    })
}
