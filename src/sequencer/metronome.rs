// Metronome - Beat scheduler driving short synthesized clicks
// Polled from the host event loop; one click per beat, accented on the downbeat

use super::timeline::{Tempo, TimeSignature};
use super::timer::{Clock, IntervalTimer, MonotonicClock};
use crate::audio::tone::{ToneEmitter, ToneRequest};

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on first beat of bar (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

impl ClickType {
    /// Click type for a 1-indexed beat within the bar
    pub fn for_beat(beat: u8) -> Self {
        if beat == 1 {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }

    pub fn frequency_hz(&self) -> f32 {
        match self {
            ClickType::Accent => 800.0,
            ClickType::Regular => 600.0,
        }
    }
}

/// Scale applied to the user volume to get the starting click gain
pub const CLICK_GAIN_SCALE: f32 = 0.3;
/// Length of one click in seconds
pub const CLICK_DURATION_SECS: f32 = 0.1;

/// Build the tone for one click at the given volume
pub fn click_tone(click_type: ClickType, volume: f32) -> ToneRequest {
    ToneRequest::new(
        click_type.frequency_hz(),
        volume * CLICK_GAIN_SCALE,
        CLICK_DURATION_SECS,
    )
}

/// User-facing metronome settings
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TempoConfig {
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    pub volume: f32,
}

impl TempoConfig {
    pub fn new(tempo: Tempo, time_signature: TimeSignature, volume: f32) -> Self {
        Self {
            tempo,
            time_signature,
            volume: clamp_volume(volume),
        }
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self::new(Tempo::default(), TimeSignature::default(), 0.8)
    }
}

/// Clamp to [0, 1]; NaN and infinities become 0
pub fn clamp_volume(volume: f32) -> f32 {
    if !volume.is_finite() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// What happened on one beat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatTick {
    /// Beat that sounded (1-indexed)
    pub beat: u8,
    pub click_type: ClickType,
    /// False when the output was unavailable and the click was skipped
    pub click_emitted: bool,
}

/// Beat scheduler
///
/// Owns the tempo settings, the beat counter, the repeating timer and the
/// tone emitter. The host calls [`BeatScheduler::poll`] from its event loop
/// (UI frame, CLI loop); each due fire runs one [`BeatScheduler::tick`].
pub struct BeatScheduler<E: ToneEmitter, C: Clock = MonotonicClock> {
    config: TempoConfig,
    current_beat: u8,
    timer: Option<IntervalTimer>,
    emitter: E,
    clock: C,
}

impl<E: ToneEmitter> BeatScheduler<E, MonotonicClock> {
    /// Create a stopped scheduler on the wall clock
    pub fn new(emitter: E, config: TempoConfig) -> Self {
        Self::with_clock(emitter, config, MonotonicClock::new())
    }
}

impl<E: ToneEmitter, C: Clock> BeatScheduler<E, C> {
    /// Create a stopped scheduler reading time from `clock`
    pub fn with_clock(emitter: E, config: TempoConfig, clock: C) -> Self {
        Self {
            config: TempoConfig::new(config.tempo, config.time_signature, config.volume),
            current_beat: 1,
            timer: None,
            emitter,
            clock,
        }
    }

    pub fn config(&self) -> &TempoConfig {
        &self.config
    }

    pub fn bpm(&self) -> u16 {
        self.config.tempo.bpm()
    }

    pub fn volume(&self) -> f32 {
        self.config.volume
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.config.time_signature
    }

    /// Beat that the next tick will sound (1-indexed)
    pub fn current_beat(&self) -> u8 {
        self.current_beat
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Start the beat loop; no-op if already running
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        self.current_beat = 1;

        // Output failures never stop the beat loop
        if let Err(e) = self.emitter.activate() {
            log::warn!("Metronome audio unavailable, clicks will be skipped: {}", e);
        }

        self.timer = Some(IntervalTimer::start(
            self.clock.now(),
            self.config.tempo.beat_interval(),
        ));
        log::debug!(
            "Metronome started at {} in {}",
            self.config.tempo,
            self.config.time_signature
        );
    }

    /// Stop the beat loop; no-op if already stopped
    /// A click already handed to the output is left to finish.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            let fired = timer.cancel();
            log::debug!("Metronome stopped after {} beats", fired);
        }
    }

    pub fn toggle(&mut self) {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Set tempo (clamped); a running loop restarts with the new interval
    pub fn set_bpm(&mut self, bpm: i32) {
        self.config.tempo = Tempo::new(bpm);
        self.restart_timer();
    }

    fn restart_timer(&mut self) {
        if self.timer.is_some() {
            self.timer = Some(IntervalTimer::start(
                self.clock.now(),
                self.config.tempo.beat_interval(),
            ));
        }
    }

    pub fn adjust_bpm(&mut self, delta: i32) {
        self.config.tempo = self.config.tempo.adjusted(delta);
        self.restart_timer();
    }

    /// Set click volume (0.0 to 1.0); applies from the next click on
    pub fn set_volume(&mut self, volume: f32) {
        self.config.volume = clamp_volume(volume);
    }

    /// Change the bar structure
    /// If the current beat no longer fits in the bar, counting restarts at 1.
    pub fn set_time_signature(&mut self, beats_per_bar: u8, note_value: u8) {
        self.config.time_signature = TimeSignature::new(beats_per_bar, note_value);

        if self.current_beat > self.config.time_signature.beats_per_bar {
            self.current_beat = 1;
        }
    }

    /// Run one beat: emit the click, then advance the counter.
    /// Returns `None` while stopped.
    pub fn tick(&mut self) -> Option<BeatTick> {
        if !self.is_running() {
            return None;
        }

        let beat = self.current_beat;
        let click_type = ClickType::for_beat(beat);
        let tone = click_tone(click_type, self.config.volume);

        let click_emitted = match self.emitter.emit(tone) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Skipped click on beat {}: {}", beat, e);
                false
            }
        };

        self.current_beat = (beat % self.config.time_signature.beats_per_bar) + 1;

        Some(BeatTick {
            beat,
            click_type,
            click_emitted,
        })
    }

    /// Fire the timer if it is due. At most one tick per call.
    pub fn poll(&mut self) -> Option<BeatTick> {
        let now = self.clock.now();
        let timer = self.timer.as_mut()?;

        if !timer.is_due(now) {
            return None;
        }

        let dropped = timer.advance(now);
        if dropped > 0 {
            log::debug!("Host fell behind, dropped {} beats", dropped);
        }

        self.tick()
    }

    /// Time left before the next beat, `None` while stopped
    pub fn time_until_next_tick(&self) -> Option<std::time::Duration> {
        let now = self.clock.now();
        self.timer.as_ref().map(|t| t.time_until_due(now))
    }

    /// Stop and release the audio output for good
    pub fn shutdown(mut self) {
        self.stop();
        // Drop closes the emitter
    }
}

impl<E: ToneEmitter, C: Clock> Drop for BeatScheduler<E, C> {
    fn drop(&mut self) {
        self.timer = None;
        self.emitter.close();
    }
}

impl<E: ToneEmitter + std::fmt::Debug, C: Clock> std::fmt::Debug for BeatScheduler<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeatScheduler")
            .field("config", &self.config)
            .field("current_beat", &self.current_beat)
            .field("timer", &self.timer)
            .field("emitter", &self.emitter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tone::{AudioError, RecordingEmitter};
    use crate::sequencer::timer::ManualClock;
    use std::time::Duration;

    fn scheduler() -> (BeatScheduler<RecordingEmitter, ManualClock>, RecordingEmitter, ManualClock) {
        let recorder = RecordingEmitter::new();
        let clock = ManualClock::new();
        let scheduler =
            BeatScheduler::with_clock(recorder.clone(), TempoConfig::default(), clock.clone());
        (scheduler, recorder, clock)
    }

    struct BrokenOutput;

    impl ToneEmitter for BrokenOutput {
        fn activate(&mut self) -> Result<(), AudioError> {
            Err(AudioError::NoDevice)
        }

        fn emit(&mut self, _tone: ToneRequest) -> Result<(), AudioError> {
            Err(AudioError::NotOpen)
        }
    }

    #[test]
    fn test_click_type_for_beat() {
        assert_eq!(ClickType::for_beat(1), ClickType::Accent);
        assert_eq!(ClickType::for_beat(2), ClickType::Regular);
        assert_eq!(ClickType::Accent.frequency_hz(), 800.0);
        assert_eq!(ClickType::Regular.frequency_hz(), 600.0);
    }

    #[test]
    fn test_click_tone_gain() {
        let tone = click_tone(ClickType::Accent, 0.8);
        assert!((tone.gain - 0.24).abs() < 1e-6);
        assert_eq!(tone.duration_secs, 0.1);
    }

    #[test]
    fn test_initially_stopped() {
        let (mut scheduler, recorder, _) = scheduler();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.current_beat(), 1);
        assert!(scheduler.tick().is_none());
        assert!(scheduler.poll().is_none());
        assert!(scheduler.time_until_next_tick().is_none());
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_start_stop_idempotent() {
        let (mut scheduler, _, _) = scheduler();

        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());

        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());

        scheduler.toggle();
        assert!(scheduler.is_running());
        scheduler.toggle();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_start_resets_beat() {
        let (mut scheduler, _, _) = scheduler();
        scheduler.start();
        scheduler.tick();
        scheduler.tick();
        assert_eq!(scheduler.current_beat(), 3);

        scheduler.stop();
        scheduler.start();
        assert_eq!(scheduler.current_beat(), 1);
    }

    #[test]
    fn test_second_start_keeps_counting() {
        let (mut scheduler, _, _) = scheduler();
        scheduler.start();
        scheduler.tick();
        scheduler.start();
        assert_eq!(scheduler.current_beat(), 2);
    }

    #[test]
    fn test_poll_follows_beat_interval() {
        let (mut scheduler, recorder, clock) = scheduler();
        scheduler.start();

        clock.advance(Duration::from_millis(499));
        assert!(scheduler.poll().is_none());
        assert_eq!(
            scheduler.time_until_next_tick(),
            Some(Duration::from_millis(1))
        );

        clock.advance(Duration::from_millis(1));
        let tick = scheduler.poll().unwrap();
        assert_eq!(tick.beat, 1);
        assert_eq!(tick.click_type, ClickType::Accent);

        // Same instant again: nothing more is due
        assert!(scheduler.poll().is_none());
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_time_signature_shrink_resets_beat() {
        let (mut scheduler, _, _) = scheduler();
        scheduler.start();
        scheduler.tick();
        scheduler.tick();
        scheduler.tick();
        assert_eq!(scheduler.current_beat(), 4);

        scheduler.set_time_signature(3, 4);
        assert_eq!(scheduler.current_beat(), 1);
        assert_eq!(scheduler.time_signature().to_string(), "3/4");
    }

    #[test]
    fn test_time_signature_grow_keeps_beat() {
        let (mut scheduler, _, _) = scheduler();
        scheduler.start();
        scheduler.tick();
        assert_eq!(scheduler.current_beat(), 2);

        scheduler.set_time_signature(7, 8);
        assert_eq!(scheduler.current_beat(), 2);
    }

    #[test]
    fn test_volume_clamped() {
        let (mut scheduler, _, _) = scheduler();
        scheduler.set_volume(1.5);
        assert_eq!(scheduler.volume(), 1.0);
        scheduler.set_volume(-0.2);
        assert_eq!(scheduler.volume(), 0.0);
        scheduler.set_volume(f32::NAN);
        assert_eq!(scheduler.volume(), 0.0);
    }

    #[test]
    fn test_infinite_volume_is_silent() {
        let (mut scheduler, recorder, _) = scheduler();
        scheduler.set_volume(f32::INFINITY);
        assert_eq!(scheduler.volume(), 0.0);
        scheduler.set_volume(f32::NEG_INFINITY);
        assert_eq!(scheduler.volume(), 0.0);

        scheduler.start();
        scheduler.tick();
        assert_eq!(recorder.tones()[0].gain, 0.0);
    }

    #[test]
    fn test_broken_output_keeps_counting() {
        let clock = ManualClock::new();
        let mut scheduler =
            BeatScheduler::with_clock(BrokenOutput, TempoConfig::default(), clock.clone());

        scheduler.toggle();
        assert!(scheduler.is_running());

        let tick = scheduler.tick().unwrap();
        assert!(!tick.click_emitted);
        assert_eq!(scheduler.current_beat(), 2);
    }

    #[test]
    fn test_drop_closes_output() {
        let (scheduler, recorder, _) = scheduler();
        scheduler.shutdown();
        assert!(recorder.is_closed());
    }

    #[test]
    fn test_stop_does_not_close_output() {
        let (mut scheduler, recorder, _) = scheduler();
        scheduler.start();
        scheduler.stop();
        assert!(!recorder.is_closed());
    }
}
