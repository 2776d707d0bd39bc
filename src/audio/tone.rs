// Tone emission - the capability the metronome uses to make a sound
//
// The scheduler only knows this trait. The cpal-backed implementation lives
// in `audio::engine`; the silent and recording emitters here are used for
// headless runs and tests.

use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Errors raised while acquiring or feeding the audio output
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("Audio configuration error: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Audio output is not open")]
    NotOpen,

    #[error("Tone queue is full")]
    QueueFull,
}

/// One short pulse to be synthesized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneRequest {
    pub frequency_hz: f32,
    /// Starting gain; decays exponentially toward `DECAY_FLOOR`
    pub gain: f32,
    pub duration_secs: f32,
}

impl ToneRequest {
    /// Gain the exponential decay ramps toward
    pub const DECAY_FLOOR: f32 = 0.01;

    pub fn new(frequency_hz: f32, gain: f32, duration_secs: f32) -> Self {
        Self {
            frequency_hz,
            gain,
            duration_secs,
        }
    }
}

/// Something that can play a short tone
pub trait ToneEmitter {
    /// Acquire the underlying output, if not done yet
    fn activate(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    /// Schedule a tone and return immediately
    fn emit(&mut self, tone: ToneRequest) -> Result<(), AudioError>;

    /// Release the underlying output for good
    fn close(&mut self) {}
}

impl<T: ToneEmitter + ?Sized> ToneEmitter for Box<T> {
    fn activate(&mut self) -> Result<(), AudioError> {
        (**self).activate()
    }

    fn emit(&mut self, tone: ToneRequest) -> Result<(), AudioError> {
        (**self).emit(tone)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Emitter that accepts every tone and plays nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentEmitter;

impl ToneEmitter for SilentEmitter {
    fn emit(&mut self, _tone: ToneRequest) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Emitter that records every tone it is given
///
/// Clones share the same log, so one clone can be handed to a scheduler
/// and the other inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    tones: Arc<Mutex<Vec<ToneRequest>>>,
    closed: Arc<Mutex<bool>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every tone emitted so far
    pub fn tones(&self) -> Vec<ToneRequest> {
        self.tones.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tones.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.lock().map(|c| *c).unwrap_or(false)
    }
}

impl ToneEmitter for RecordingEmitter {
    fn emit(&mut self, tone: ToneRequest) -> Result<(), AudioError> {
        if let Ok(mut tones) = self.tones.lock() {
            tones.push(tone);
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Ok(mut closed) = self.closed.lock() {
            *closed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_emitter_shares_log() {
        let recorder = RecordingEmitter::new();
        let mut handle = recorder.clone();

        handle.emit(ToneRequest::new(800.0, 0.24, 0.1)).unwrap();
        handle.emit(ToneRequest::new(600.0, 0.24, 0.1)).unwrap();

        let tones = recorder.tones();
        assert_eq!(tones.len(), 2);
        assert_eq!(tones[0].frequency_hz, 800.0);
        assert_eq!(tones[1].frequency_hz, 600.0);

        assert!(!recorder.is_closed());
        handle.close();
        assert!(recorder.is_closed());
    }

    #[test]
    fn test_boxed_emitter_forwards() {
        let recorder = RecordingEmitter::new();
        let mut boxed: Box<dyn ToneEmitter> = Box::new(recorder.clone());

        assert!(boxed.activate().is_ok());
        boxed.emit(ToneRequest::new(600.0, 0.1, 0.1)).unwrap();
        boxed.close();

        assert_eq!(recorder.len(), 1);
        assert!(recorder.is_closed());
    }

    #[test]
    fn test_silent_emitter_accepts_everything() {
        let mut silent = SilentEmitter;
        assert!(silent.activate().is_ok());
        assert!(silent.emit(ToneRequest::new(800.0, 0.3, 0.1)).is_ok());
    }
}
