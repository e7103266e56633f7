use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use assert_matches::assert_matches;
use vocaclip::player::{PlayerCall, ScriptedPlayer};
use vocaclip::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use vocaclip::session::{Advance, Session, SessionState};
use vocaclip::word::{load_words, Word};
use vocaclip::Error;

const THREE_WORDS: &str = r#"[
    {
        "term": "cat",
        "beginTimestamp": "00:00:05,000",
        "endTimestamp": "00:00:06,000",
        "englishMeaning": "a small domesticated feline",
        "turkishMeaning": "kedi",
        "sampleSentenceInEnglish": "The cat is asleep.",
        "sampleSentenceInTurkish": "Kedi uyuyor."
    },
    {
        "term": "dog",
        "beginTimestamp": "00:00:12,500",
        "endTimestamp": "00:00:13,250",
        "englishMeaning": "a domesticated canine",
        "turkishMeaning": "köpek",
        "sampleSentenceInEnglish": "The dog barks.",
        "sampleSentenceInTurkish": "Köpek havlıyor."
    },
    {
        "term": "bird",
        "beginTimestamp": "00:01:00,000",
        "endTimestamp": "00:01:02,000",
        "englishMeaning": "a feathered animal",
        "turkishMeaning": "kuş",
        "sampleSentenceInEnglish": "A bird sings.",
        "sampleSentenceInTurkish": "Bir kuş ötüyor."
    }
]"#;

fn write_list(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("words.json");
    fs::write(&path, text).unwrap();
    path
}

fn read_list(path: &Path) -> Vec<Word> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// The single-word walkthrough: the clip is (4000, 7000) and finishing right
// away keeps the unanswered word.
#[test]
fn single_word_finishes_on_first_next() {
    let dir = tempfile::tempdir().unwrap();
    let first = THREE_WORDS.find('{').unwrap()..THREE_WORDS.find('}').unwrap() + 1;
    let text = format!("[{}]", &THREE_WORDS[first]);
    let path = write_list(dir.path(), &text);
    let words = load_words(&path).unwrap();

    let mut session =
        Session::start(words.clone(), &path, "movie.mp4", ScriptedPlayer::new()).unwrap();
    let window = session.current_window().unwrap();
    assert_eq!((window.start_ms, window.stop_ms), (4_000, 7_000));

    let summary = assert_matches!(session.next(), Ok(Advance::Finished(s)) => s);
    assert_eq!(summary.path, dir.path().join("words_filtered.json"));
    assert_eq!(read_list(&summary.path), words);
    assert_eq!(session.state(), SessionState::Finished);
}

#[test]
fn known_word_is_dropped_from_three() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_list(dir.path(), THREE_WORDS);
    let words = load_words(&path).unwrap();
    let mut session =
        Session::start(words.clone(), &path, "movie.mp4", ScriptedPlayer::new()).unwrap();

    assert_eq!(session.next().unwrap(), Advance::Moved(1));
    session.mark(true).unwrap();
    assert_eq!(session.next().unwrap(), Advance::Moved(2));
    let summary = assert_matches!(session.next(), Ok(Advance::Finished(s)) => s);

    assert_eq!(read_list(&summary.path), vec![words[0].clone(), words[2].clone()]);
    assert_eq!((summary.kept, summary.total), (2, 3));

    // a second attempt is refused and nothing is rewritten
    fs::remove_file(&summary.path).unwrap();
    assert_matches!(session.next(), Err(Error::SessionFinished));
    assert!(!summary.path.exists());
}

#[test]
fn output_keeps_non_ascii_and_four_space_indent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_list(dir.path(), THREE_WORDS);
    let words = load_words(&path).unwrap();
    let mut session = Session::start(words, &path, "movie.mp4", ScriptedPlayer::new()).unwrap();
    session.next().unwrap();
    session.next().unwrap();
    let summary = assert_matches!(session.next(), Ok(Advance::Finished(s)) => s);

    let text = fs::read_to_string(summary.path).unwrap();
    assert!(text.starts_with("[\n    {\n        \"term\": \"cat\",\n"));
    assert!(text.contains("\"turkishMeaning\": \"köpek\""));
    assert!(text.contains("Bir kuş ötüyor."));
    assert!(!text.contains("\\u"));
}

// Drives a session the way the binary does: keys and ticks from the runner,
// the scripted player advancing 100ms of media per tick.
#[test]
fn runner_driven_session_pauses_each_clip_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_list(dir.path(), THREE_WORDS);
    let words = load_words(&path).unwrap();
    let mut session = Session::start(words, &path, "movie.mp4", ScriptedPlayer::new()).unwrap();

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    // first clip is 4_000..7_000, the second 11_500..14_250
    let mut ticks = 0;
    while session.is_clip_playing() && ticks < 1_000 {
        if let AppEvent::Tick = runner.step() {
            session.player_mut().advance(100);
            session.tick().unwrap();
            ticks += 1;
        }
    }
    assert_eq!(ticks, 30);
    assert_eq!(session.player().pause_count(), 1);

    tx.send(AppEvent::Resize).unwrap();
    for _ in 0..50 {
        if let AppEvent::Tick = runner.step() {
            session.player_mut().advance(100);
            session.tick().unwrap();
        }
    }
    // paused players do not move, so nothing else fires
    assert_eq!(session.player().pause_count(), 1);
    assert_eq!(session.player().position_ms, 7_000);

    session.next().unwrap();
    let calls = &session.player().calls;
    assert_eq!(calls[calls.len() - 2..], [PlayerCall::SetPosition(11_500), PlayerCall::Play]);
    while session.is_clip_playing() {
        session.player_mut().advance(100);
        session.tick().unwrap();
    }
    assert_eq!(session.player().pause_count(), 2);
    assert!(session.player().position_ms >= 14_250);
    assert!(session.player().position_ms < 14_350);
}

#[test]
fn invalid_lists_never_start() {
    let dir = tempfile::tempdir().unwrap();

    let path = write_list(dir.path(), "[]");
    assert_matches!(load_words(&path), Err(Error::EmptyWordList));

    let path = write_list(dir.path(), &THREE_WORDS.replace("00:00:13,250", "00:00:10,000"));
    assert_matches!(load_words(&path), Err(Error::InvertedCue { index: 1, .. }));

    let path = write_list(
        dir.path(),
        &THREE_WORDS.replace("\"englishMeaning\": \"a feathered animal\",", ""),
    );
    assert_matches!(load_words(&path), Err(Error::Parse(_)));

    let path = write_list(dir.path(), &THREE_WORDS.replace("00:01:02,000", "00:01:02"));
    assert_matches!(load_words(&path), Err(Error::BadCue { index: 2, .. }));
}
