use std::path::{Path, PathBuf};

use crate::clip::ClipWatch;
use crate::error::{Error, Result};
use crate::export::{write_filtered, ExportSummary};
use crate::player::MediaPlayer;
use crate::timestamp::PlaybackWindow;
use crate::word::{check_words, Word};

/// The learner's answer for one word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Response {
    #[default]
    #[strum(serialize = "unanswered")]
    Unset,
    #[strum(serialize = "knew it")]
    Known,
    #[strum(serialize = "didn't know")]
    Unknown,
}

impl Response {
    /// Only an explicit "known" drops a word from the filtered list
    pub fn keeps_word(&self) -> bool {
        !matches!(self, Response::Known)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Browsing(usize),
    Finished,
}

/// Result of moving forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    Finished(ExportSummary),
}

/// One pass over a word list, playing each word's clip as it becomes current
#[derive(Debug)]
pub struct Session<P: MediaPlayer> {
    words: Vec<Word>,
    windows: Vec<PlaybackWindow>,
    responses: Vec<Response>,
    state: SessionState,
    words_path: PathBuf,
    video_path: PathBuf,
    player: P,
    watch: ClipWatch,
}

impl<P: MediaPlayer> Session<P> {
    /// Validates the words, loads the video and starts the first clip
    pub fn start(
        words: Vec<Word>,
        words_path: impl Into<PathBuf>,
        video_path: impl Into<PathBuf>,
        mut player: P,
    ) -> Result<Self> {
        let windows = check_words(&words)?;
        let video_path = video_path.into();
        player.set_source(&video_path)?;

        let mut session = Self {
            responses: vec![Response::Unset; words.len()],
            words,
            windows,
            state: SessionState::Browsing(0),
            words_path: words_path.into(),
            video_path,
            player,
            watch: ClipWatch::new(),
        };
        tracing::info!(
            words = session.words.len(),
            video = %session.video_path.display(),
            "session started"
        );
        session.enter(0)?;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            SessionState::Browsing(i) => Some(i),
            SessionState::Finished => None,
        }
    }

    pub fn current_word(&self) -> Option<&Word> {
        self.current_index().map(|i| &self.words[i])
    }

    pub fn current_window(&self) -> Option<PlaybackWindow> {
        self.current_index().map(|i| self.windows[i])
    }

    pub fn current_response(&self) -> Option<Response> {
        self.current_index().map(|i| self.responses[i])
    }

    pub fn is_last(&self) -> bool {
        self.current_index() == Some(self.words.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn words_path(&self) -> &Path {
        &self.words_path
    }

    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn is_clip_playing(&self) -> bool {
        self.watch.is_armed()
    }

    /// Records the answer for the current word, replacing any earlier one
    pub fn mark(&mut self, known: bool) -> Result<()> {
        let index = self.browsing()?;
        self.responses[index] = if known {
            Response::Known
        } else {
            Response::Unknown
        };
        tracing::debug!(index, response = %self.responses[index], "marked word");
        Ok(())
    }

    /// Steps back one word. Returns `false` on the first word, where it does nothing.
    pub fn prev(&mut self) -> Result<bool> {
        let index = self.browsing()?;
        if index == 0 {
            return Ok(false);
        }
        self.enter(index - 1)?;
        Ok(true)
    }

    /// Steps forward, or exports and finishes when on the last word.
    ///
    /// A failed export leaves the session on the last word.
    pub fn next(&mut self) -> Result<Advance> {
        let index = self.browsing()?;
        if index + 1 < self.words.len() {
            self.enter(index + 1)?;
            return Ok(Advance::Moved(index + 1));
        }

        let summary = write_filtered(&self.words, &self.responses, &self.words_path)?;
        self.state = SessionState::Finished;
        self.watch.disarm();
        if let Err(e) = self.player.pause() {
            tracing::warn!(error = %e, "could not pause player after finishing");
        }
        tracing::info!(kept = summary.kept, total = summary.total, "session finished");
        Ok(Advance::Finished(summary))
    }

    /// Plays the current clip again from its start
    pub fn replay(&mut self) -> Result<()> {
        let index = self.browsing()?;
        self.enter(index)
    }

    /// One poll of the clip watch. Returns `true` when the clip was paused.
    pub fn tick(&mut self) -> Result<bool> {
        if self.is_finished() {
            return Ok(false);
        }
        Ok(self.watch.poll(&mut self.player)?)
    }

    fn browsing(&self) -> Result<usize> {
        self.current_index().ok_or(Error::SessionFinished)
    }

    fn enter(&mut self, index: usize) -> Result<()> {
        let window = self.windows[index];
        self.state = SessionState::Browsing(index);
        // the previous clip's threshold must not outlive the switch
        self.watch.disarm();

        tracing::debug!(
            index,
            term = %self.words[index].term,
            start_ms = window.start_ms,
            stop_ms = window.stop_ms,
            "playing clip"
        );
        self.player.set_position(window.start_ms)?;
        self.player.play()?;
        self.watch.arm(window.stop_ms);
        Ok(())
    }
}
