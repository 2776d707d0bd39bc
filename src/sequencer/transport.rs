// Transport - Play/pause/skip bookkeeping over the sequence list
// Position and duration come from whatever backend plays the locator

use std::time::Duration;

use crate::catalog::Sequence;
use crate::sequencer::metronome::clamp_volume;

/// Transport state (play/pause/stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped | TransportState::Paused)
    }
}

/// Transport controller
/// Owns the queue of sequences and which one is current
#[derive(Debug, Clone)]
pub struct Transport {
    queue: Vec<Sequence>,
    current: Option<usize>,
    state: TransportState,
    volume: f32,
    position: Duration,
    duration: Option<Duration>,
}

impl Transport {
    pub fn new(volume: f32) -> Self {
        Self {
            queue: Vec::new(),
            current: None,
            state: TransportState::Stopped,
            volume: clamp_volume(volume),
            position: Duration::ZERO,
            duration: None,
        }
    }

    /// Replace the queue; the first sequence becomes current but does not play
    pub fn load_queue(&mut self, sequences: Vec<Sequence>) {
        self.current = if sequences.is_empty() { None } else { Some(0) };
        self.queue = sequences;
        self.state = TransportState::Stopped;
        self.reset_position();
    }

    pub fn queue(&self) -> &[Sequence] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Sequence> {
        self.current.and_then(|i| self.queue.get(i))
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// True if `sequence` is the current one and is playing
    pub fn is_playing_sequence(&self, sequence: &Sequence) -> bool {
        self.state.is_playing()
            && self
                .current()
                .map(|c| c.locator == sequence.locator)
                .unwrap_or(false)
    }

    /// Make the sequence at `index` current and play it
    /// Returns false if the index is out of range
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.queue.len() {
            return false;
        }
        if self.current != Some(index) {
            self.reset_position();
        }
        self.current = Some(index);
        self.state = TransportState::Playing;
        true
    }

    /// Select by locator or raw title
    pub fn select_by_key(&mut self, key: &str) -> bool {
        match self.queue.iter().position(|s| s.matches_key(key)) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn play(&mut self) {
        if self.current.is_some() {
            self.state = TransportState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.state.is_playing() {
            self.state = TransportState::Paused;
        }
    }

    /// Toggle play/pause; does nothing without a current sequence
    pub fn toggle_play(&mut self) {
        if self.state.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Skip forward, wrapping to the first sequence
    pub fn next(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let next = match self.current {
            Some(i) => (i + 1) % self.queue.len(),
            None => 0,
        };
        self.select(next);
    }

    /// Skip backward, wrapping to the last sequence
    pub fn previous(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let previous = match self.current {
            Some(0) | None => self.queue.len() - 1,
            Some(i) => i - 1,
        };
        self.select(previous);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Backend reports the length of the current sequence
    pub fn set_duration(&mut self, duration: Option<Duration>) {
        self.duration = duration;
        if let Some(d) = duration {
            self.position = self.position.min(d);
        }
    }

    /// Backend reports the playhead
    pub fn set_position(&mut self, position: Duration) {
        self.position = match self.duration {
            Some(d) => position.min(d),
            None => position,
        };
    }

    /// Seek to a fraction [0, 1] of the duration
    /// Ignored while the duration is unknown
    pub fn seek_fraction(&mut self, fraction: f32) {
        if let Some(d) = self.duration {
            let fraction = fraction.clamp(0.0, 1.0) as f64;
            self.position = d.mul_f64(fraction);
        }
    }

    /// Progress in [0, 1]; 0 while the duration is unknown
    pub fn progress(&self) -> f32 {
        match self.duration {
            Some(d) if !d.is_zero() => (self.position.as_secs_f64() / d.as_secs_f64()) as f32,
            _ => 0.0,
        }
    }

    fn reset_position(&mut self) {
        self.position = Duration::ZERO;
        self.duration = None;
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(0.8)
    }
}

/// Format as `m:ss`
pub fn format_time(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
