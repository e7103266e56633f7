use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("could not connect to player at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("player i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected reply from player: {0}")]
    Protocol(String),
    #[error("player rejected {command}: {reason}")]
    Rejected { command: String, reason: String },
    #[error("player did not respond to {0} in time")]
    Timeout(String),
}

/// The playback engine as seen by a session. Positions are milliseconds
/// from the start of the media.
pub trait MediaPlayer {
    fn set_source(&mut self, path: &Path) -> Result<(), PlayerError>;
    fn set_position(&mut self, ms: u64) -> Result<(), PlayerError>;
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    fn position(&mut self) -> Result<u64, PlayerError>;
}

impl<P: MediaPlayer + ?Sized> MediaPlayer for Box<P> {
    fn set_source(&mut self, path: &Path) -> Result<(), PlayerError> {
        (**self).set_source(path)
    }

    fn set_position(&mut self, ms: u64) -> Result<(), PlayerError> {
        (**self).set_position(ms)
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        (**self).play()
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        (**self).pause()
    }

    fn position(&mut self) -> Result<u64, PlayerError> {
        (**self).position()
    }
}

/// Commands received by a [`ScriptedPlayer`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCall {
    SetSource(PathBuf),
    SetPosition(u64),
    Play,
    Pause,
}

/// In-memory player for tests and headless runs.
/// Position only moves when [`ScriptedPlayer::advance`] is called while playing.
#[derive(Debug, Default)]
pub struct ScriptedPlayer {
    pub calls: Vec<PlayerCall>,
    pub position_ms: u64,
    pub playing: bool,
    pub broken: bool,
}

impl ScriptedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: u64) {
        if self.playing {
            self.position_ms += ms;
        }
    }

    pub fn pause_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == PlayerCall::Pause).count()
    }

    fn record(&mut self, call: PlayerCall) -> Result<(), PlayerError> {
        if self.broken {
            return Err(PlayerError::Protocol(format!("scripted failure on {call:?}")));
        }
        self.calls.push(call);
        Ok(())
    }
}

impl MediaPlayer for ScriptedPlayer {
    fn set_source(&mut self, path: &Path) -> Result<(), PlayerError> {
        self.record(PlayerCall::SetSource(path.to_path_buf()))?;
        self.position_ms = 0;
        self.playing = false;
        Ok(())
    }

    fn set_position(&mut self, ms: u64) -> Result<(), PlayerError> {
        self.record(PlayerCall::SetPosition(ms))?;
        self.position_ms = ms;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.record(PlayerCall::Play)?;
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.record(PlayerCall::Pause)?;
        self.playing = false;
        Ok(())
    }

    fn position(&mut self) -> Result<u64, PlayerError> {
        if self.broken {
            return Err(PlayerError::Protocol("scripted failure on position".into()));
        }
        Ok(self.position_ms)
    }
}
