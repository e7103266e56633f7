// Drives the compiled binary through the failure paths that happen before
// the terminal is taken over, so no TTY or mpv is needed.

use std::fs;
use std::path::Path;
use std::process::Output;

use assert_cmd::Command;

fn run(dir: &Path, args: &[&str]) -> Output {
    let config = dir.join("config.json");
    Command::cargo_bin("vocaclip")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .unwrap()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

const CAT: &str = r#"[{
    "term": "cat",
    "beginTimestamp": "00:00:05,000",
    "endTimestamp": "00:00:06,000",
    "englishMeaning": "a small domesticated feline",
    "turkishMeaning": "kedi",
    "sampleSentenceInEnglish": "The cat is asleep.",
    "sampleSentenceInTurkish": "Kedi uyuyor."
}]"#;

#[test]
fn missing_inputs_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &[]);
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("--video"), "{err}");
    assert!(err.contains("--words"), "{err}");
}

#[test]
fn missing_word_list_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let words = dir.path().join("nope.json");
    let out = run(
        dir.path(),
        &["--video", "movie.mp4", "--words", words.to_str().unwrap()],
    );
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("could not load word list"), "{err}");
    assert!(err.contains("nope.json"), "{err}");
}

#[test]
fn empty_word_list_fails() {
    let dir = tempfile::tempdir().unwrap();
    let words = dir.path().join("words.json");
    fs::write(&words, "[]").unwrap();
    let out = run(
        dir.path(),
        &["--video", "movie.mp4", "--words", words.to_str().unwrap()],
    );
    assert!(!out.status.success());
    assert!(stderr(&out).contains("word list is empty"));
}

#[test]
fn malformed_timestamp_names_the_word() {
    let dir = tempfile::tempdir().unwrap();
    let words = dir.path().join("words.json");
    fs::write(&words, CAT.replace("00:00:06,000", "6s")).unwrap();
    let out = run(
        dir.path(),
        &["--video", "movie.mp4", "--words", words.to_str().unwrap()],
    );
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("word #0 (cat)"), "{err}");
    assert!(err.contains("\"6s\""), "{err}");
}

#[test]
fn valid_list_without_tty_is_refused_and_not_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let words = dir.path().join("words.json");
    fs::write(&words, CAT).unwrap();
    let out = run(
        dir.path(),
        &["--video", "movie.mp4", "--words", words.to_str().unwrap()],
    );
    assert!(!out.status.success());
    assert!(stderr(&out).contains("stdin must be a tty"));
    assert!(!dir.path().join("config.json").exists());
    assert!(!dir.path().join("words_filtered.json").exists());
}

#[test]
fn remembered_inputs_are_used_when_flags_are_missing() {
    let dir = tempfile::tempdir().unwrap();
    let words = dir.path().join("remembered.json");
    fs::write(&words, "[]").unwrap();
    let config = serde_json::json!({
        "last_video": "movie.mp4",
        "last_words": words,
    });
    fs::write(dir.path().join("config.json"), config.to_string()).unwrap();

    let out = run(dir.path(), &[]);
    assert!(!out.status.success());
    let err = stderr(&out);
    // got past argument resolution and failed on the remembered list itself
    assert!(err.contains("remembered.json"), "{err}");
    assert!(err.contains("word list is empty"), "{err}");
}
