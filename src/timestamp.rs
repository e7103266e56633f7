use thiserror::Error;

use crate::word::Word;

/// Context played before and after every subtitle cue
pub const CLIP_PADDING_MS: u64 = 1_000;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timestamp {input:?}: expected HH:MM:SS,mmm")]
pub struct TimestampError {
    pub input: String,
}

impl TimestampError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Millisecond interval played for one word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackWindow {
    pub start_ms: u64,
    pub stop_ms: u64,
}

impl PlaybackWindow {
    pub fn duration_ms(&self) -> u64 {
        self.stop_ms.saturating_sub(self.start_ms)
    }
}

/// Parses an SRT style `HH:MM:SS,mmm` timestamp into milliseconds.
///
/// Only the canonical shape is accepted: minutes and seconds are two digits
/// below 60, milliseconds are three digits, hours are at least two digits
/// without extra leading zeros.
pub fn parse_timestamp(s: &str) -> Result<u64, TimestampError> {
    let err = || TimestampError::new(s);

    let (clock, millis) = s.split_once(',').ok_or_else(err)?;
    let mut fields = clock.split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(err());
    };

    if hours.len() < 2 || (hours.len() > 2 && hours.starts_with('0')) {
        return Err(err());
    }
    let hours = digits(hours).ok_or_else(err)?;
    let minutes = fixed_digits(minutes, 2).filter(|m| *m < 60).ok_or_else(err)?;
    let seconds = fixed_digits(seconds, 2).filter(|s| *s < 60).ok_or_else(err)?;
    let millis = fixed_digits(millis, 3).ok_or_else(err)?;

    hours
        .checked_mul(MS_PER_HOUR)
        .and_then(|ms| ms.checked_add(minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis))
        .ok_or_else(err)
}

/// Formats milliseconds as `HH:MM:SS,mmm`
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = ms % MS_PER_SECOND;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Clip bounds for a word: its cue widened by [`CLIP_PADDING_MS`] on both sides.
/// The start never goes below zero; the stop is not clamped to the media length.
pub fn playback_window(word: &Word) -> Result<PlaybackWindow, TimestampError> {
    let begin = parse_timestamp(&word.begin_timestamp)?;
    let end = parse_timestamp(&word.end_timestamp)?;
    Ok(PlaybackWindow {
        start_ms: begin.saturating_sub(CLIP_PADDING_MS),
        stop_ms: end.saturating_add(CLIP_PADDING_MS),
    })
}

fn digits(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn fixed_digits(field: &str, width: usize) -> Option<u64> {
    if field.len() != width {
        return None;
    }
    digits(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(begin: &str, end: &str) -> Word {
        Word {
            term: "cat".into(),
            begin_timestamp: begin.into(),
            end_timestamp: end.into(),
            english_meaning: "a small feline".into(),
            turkish_meaning: "kedi".into(),
            sample_sentence_in_english: "The cat sleeps.".into(),
            sample_sentence_in_turkish: "Kedi uyuyor.".into(),
        }
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:00,000"), Ok(0));
        assert_eq!(parse_timestamp("00:00:05,000"), Ok(5_000));
        assert_eq!(parse_timestamp("00:01:02,003"), Ok(62_003));
        assert_eq!(parse_timestamp("01:00:00,001"), Ok(3_600_001));
        assert_eq!(parse_timestamp("123:59:59,999"), Ok(446_399_999));
    }

    #[test]
    fn test_parse_timestamp_rejects_malformed() {
        for bad in [
            "",
            "00:00:05",
            "00:00:05.000",
            "00:05,000",
            "00:00:00:05,000",
            "aa:00:05,000",
            "00:0x:05,000",
            "0:00:05,000",
            "000:00:05,000",
            "00:60:00,000",
            "00:00:60,000",
            "00:00:05,00",
            "00:00:05,0000",
            "00:00:05,+00",
            " 00:00:05,000",
            "00:00:05,000 ",
            "-1:00:05,000",
        ] {
            assert_eq!(
                parse_timestamp(bad),
                Err(TimestampError { input: bad.into() }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_timestamp_error_message() {
        let err = parse_timestamp("5 seconds").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid timestamp \"5 seconds\": expected HH:MM:SS,mmm"
        );
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00:00,000");
        assert_eq!(format_timestamp(4_000), "00:00:04,000");
        assert_eq!(format_timestamp(62_003), "00:01:02,003");
        assert_eq!(format_timestamp(3_599_999), "00:59:59,999");
        assert_eq!(format_timestamp(446_399_999), "123:59:59,999");
    }

    #[test]
    fn test_canonical_strings_survive_parse_and_format() {
        for s in [
            "00:00:00,000",
            "00:00:05,000",
            "00:10:59,090",
            "09:09:09,009",
            "99:59:59,999",
            "100:00:00,000",
        ] {
            assert_eq!(format_timestamp(parse_timestamp(s).unwrap()), s);
        }
    }

    #[test]
    fn test_milliseconds_survive_format_and_parse() {
        for ms in [0, 1, 999, 1_000, 59_999, 60_000, 3_599_999, 3_600_000, 360_000_000] {
            assert_eq!(parse_timestamp(&format_timestamp(ms)), Ok(ms));
        }
    }

    #[test]
    fn test_parse_preserves_ordering() {
        let ordered = [
            "00:00:00,999",
            "00:00:01,000",
            "00:00:59,999",
            "00:01:00,000",
            "00:59:59,999",
            "01:00:00,000",
        ];
        let values: Vec<u64> = ordered.iter().map(|s| parse_timestamp(s).unwrap()).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_playback_window_pads_cue() {
        let window = playback_window(&word("00:00:05,000", "00:00:06,000")).unwrap();
        assert_eq!(
            window,
            PlaybackWindow {
                start_ms: 4_000,
                stop_ms: 7_000
            }
        );
        assert_eq!(window.duration_ms(), 3_000);
    }

    #[test]
    fn test_playback_window_start_clamped_at_zero() {
        let window = playback_window(&word("00:00:00,400", "00:00:01,000")).unwrap();
        assert_eq!(window.start_ms, 0);
        assert_eq!(window.stop_ms, 2_000);
    }

    #[test]
    fn test_playback_window_zero_length_cue() {
        let window = playback_window(&word("00:00:10,000", "00:00:10,000")).unwrap();
        assert_eq!(window.start_ms, 9_000);
        assert_eq!(window.stop_ms, 11_000);
    }

    #[test]
    fn test_playback_window_bad_timestamp() {
        assert_eq!(
            playback_window(&word("00:00:05,000", "later")),
            Err(TimestampError {
                input: "later".into()
            })
        );
    }
}
