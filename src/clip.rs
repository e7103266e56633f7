use crate::player::{MediaPlayer, PlayerError};

/// Stops playback once the player position reaches the armed threshold.
///
/// The check is level triggered: every [`ClipWatch::poll`] compares the
/// current position against the threshold, so a clip may overshoot by up to
/// one poll interval. Pausing disarms the watch, so it fires at most once per
/// arming.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClipWatch {
    stop_ms: Option<u64>,
}

impl ClipWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous threshold
    pub fn arm(&mut self, stop_ms: u64) {
        self.stop_ms = Some(stop_ms);
    }

    pub fn disarm(&mut self) {
        self.stop_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.stop_ms.is_some()
    }

    pub fn stop_ms(&self) -> Option<u64> {
        self.stop_ms
    }

    /// Returns `true` when this poll paused the player
    pub fn poll<P: MediaPlayer + ?Sized>(&mut self, player: &mut P) -> Result<bool, PlayerError> {
        let Some(stop_ms) = self.stop_ms else {
            return Ok(false);
        };

        let position = player.position()?;
        if position < stop_ms {
            return Ok(false);
        }

        player.pause()?;
        self.stop_ms = None;
        tracing::debug!(position, stop_ms, "clip reached its stop threshold");
        Ok(true)
    }
}
