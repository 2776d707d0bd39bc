// Click synthesis - sine pulses with an exponential gain ramp
// Everything here runs inside the audio callback: no allocation after construction

use std::f32::consts::TAU;

use crate::audio::tone::ToneRequest;

/// One playing pulse
#[derive(Debug, Clone, Copy)]
pub struct ClickVoice {
    sample_rate: f32,
    phase: f32,
    phase_increment: f32,
    gain: f32,
    decay: f32,
    remaining: usize,
}

impl ClickVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            phase_increment: 0.0,
            gain: 0.0,
            decay: 1.0,
            remaining: 0,
        }
    }

    /// Start playing `tone` from its first sample
    pub fn trigger(&mut self, tone: &ToneRequest) {
        let num_samples = (tone.duration_secs.max(0.0) * self.sample_rate) as usize;

        self.phase = 0.0;
        self.phase_increment = TAU * tone.frequency_hz / self.sample_rate;
        self.gain = tone.gain.max(0.0);
        self.remaining = num_samples;

        // Per-sample factor so that gain reaches the floor at the last sample:
        // gain * decay^n == DECAY_FLOOR when n == num_samples
        self.decay = if self.gain > 0.0 && num_samples > 0 {
            (ToneRequest::DECAY_FLOOR / self.gain).powf(1.0 / num_samples as f32)
        } else {
            1.0
        };
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Samples left before the voice goes idle
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.remaining == 0 {
            return 0.0;
        }

        let sample = self.phase.sin() * self.gain;

        self.phase += self.phase_increment;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        self.gain *= self.decay;
        self.remaining -= 1;

        sample
    }
}

/// Fixed pool of click voices mixed together
///
/// At fast tempos a click can still be ringing when the next one starts;
/// overlapping clicks get their own voice. When every voice is busy the one
/// closest to finishing is reused.
#[derive(Debug, Clone)]
pub struct ClickMixer {
    voices: Vec<ClickVoice>,
}

impl ClickMixer {
    pub const DEFAULT_VOICES: usize = 8;

    pub fn new(sample_rate: f32, voice_count: usize) -> Self {
        Self {
            voices: vec![ClickVoice::new(sample_rate); voice_count.max(1)],
        }
    }

    pub fn trigger(&mut self, tone: &ToneRequest) {
        let slot = self
            .voices
            .iter()
            .position(|v| !v.is_active())
            .or_else(|| {
                self.voices
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, v)| v.remaining())
                    .map(|(i, _)| i)
            })
            .unwrap_or(0);

        self.voices[slot].trigger(tone);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn next_sample(&mut self) -> f32 {
        self.voices.iter_mut().map(|v| v.next_sample()).sum()
    }

    /// Fill a mono buffer
    pub fn process_buffer(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

/// Render a whole tone offline
pub fn render_tone(tone: &ToneRequest, sample_rate: f32) -> Vec<f32> {
    let mut voice = ClickVoice::new(sample_rate);
    voice.trigger(tone);

    let mut samples = Vec::with_capacity(voice.remaining());
    while voice.is_active() {
        samples.push(voice.next_sample());
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    #[test]
    fn test_click_length() {
        // 100ms at 48kHz = 4800 samples
        let samples = render_tone(&ToneRequest::new(800.0, 0.3, 0.1), 48000.0);
        assert_eq!(samples.len(), 4800);
    }

    #[test]
    fn test_click_decays() {
        let samples = render_tone(&ToneRequest::new(600.0, 0.3, 0.1), 48000.0);

        let head = peak(&samples[..480]);
        let tail = peak(&samples[samples.len() - 480..]);

        assert!(head > 0.25);
        assert!(tail < 0.02);
        assert!(head <= 0.3 + 1e-6);
    }

    #[test]
    fn test_zero_gain_is_silent() {
        let samples = render_tone(&ToneRequest::new(800.0, 0.0, 0.1), 48000.0);
        assert_eq!(samples.len(), 4800);
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_gain_scales_peak() {
        let loud = render_tone(&ToneRequest::new(800.0, 0.3, 0.1), 48000.0);
        let quiet = render_tone(&ToneRequest::new(800.0, 0.15, 0.1), 48000.0);

        // First quarter of the click is dominated by the starting gain
        let loud_peak = peak(&loud[..1200]);
        let quiet_peak = peak(&quiet[..1200]);
        assert!(loud_peak > quiet_peak * 1.8);
        assert!(loud_peak < quiet_peak * 2.2);
    }

    #[test]
    fn test_mixer_overlapping_clicks() {
        let mut mixer = ClickMixer::new(48000.0, 2);
        let tone = ToneRequest::new(800.0, 0.3, 0.1);

        mixer.trigger(&tone);
        for _ in 0..100 {
            mixer.next_sample();
        }
        mixer.trigger(&tone);
        assert_eq!(mixer.active_voices(), 2);

        // Pool is full: the older voice is reused
        mixer.trigger(&tone);
        assert_eq!(mixer.active_voices(), 2);
    }

    #[test]
    fn test_mixer_goes_silent() {
        let mut mixer = ClickMixer::new(48000.0, ClickMixer::DEFAULT_VOICES);
        let mut buffer = vec![0.0f32; 6000];

        mixer.trigger(&ToneRequest::new(600.0, 0.3, 0.1));
        mixer.process_buffer(&mut buffer);

        let non_zero = buffer[..4800].iter().filter(|s| s.abs() > 0.0001).count();
        assert!(non_zero > 4000);
        assert!(buffer[4800..].iter().all(|s| *s == 0.0));
        assert_eq!(mixer.active_voices(), 0);
    }
}
