// Timeline - Tempo and time signature for the metronome
// Both types clamp their inputs instead of rejecting them

use std::fmt;
use std::time::Duration;

/// Time signature (beats per bar / note value)
/// Example: 4/4 time = TimeSignature { beats_per_bar: 4, note_value: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub beats_per_bar: u8, // Beat slots per bar (typically 2, 3, 4, 6)
    pub note_value: u8,    // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Creates a new time signature
    /// Zero values are raised to 1
    pub fn new(beats_per_bar: u8, note_value: u8) -> Self {
        Self {
            beats_per_bar: beats_per_bar.max(1),
            note_value: note_value.max(1),
        }
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::new(4, 4)
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::new(3, 4)
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self::new(6, 8)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_bar, self.note_value)
    }
}

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(from = "i32", into = "u16")]
pub struct Tempo {
    bpm: u16,
}

impl Tempo {
    pub const MIN_BPM: u16 = 40;
    pub const MAX_BPM: u16 = 208;

    /// Creates a new tempo, clamped to [MIN_BPM, MAX_BPM]
    pub fn new(bpm: i32) -> Self {
        let clamped = bpm.clamp(Self::MIN_BPM as i32, Self::MAX_BPM as i32);
        Self { bpm: clamped as u16 }
    }

    /// Get BPM value
    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Tempo shifted by `delta` BPM, clamped
    pub fn adjusted(&self, delta: i32) -> Self {
        Self::new((self.bpm as i32).saturating_add(delta))
    }

    /// Time between two beats (60000 / bpm milliseconds)
    pub fn beat_interval(&self) -> Duration {
        Duration::from_nanos(60_000_000_000 / self.bpm as u64)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120)
    }
}

impl From<i32> for Tempo {
    fn from(bpm: i32) -> Self {
        Self::new(bpm)
    }
}

impl From<Tempo> for u16 {
    fn from(tempo: Tempo) -> Self {
        tempo.bpm
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_signature() {
        let ts = TimeSignature::four_four();
        assert_eq!(ts.beats_per_bar, 4);
        assert_eq!(ts.note_value, 4);
        assert_eq!(ts.to_string(), "4/4");
        assert_eq!(TimeSignature::six_eight().to_string(), "6/8");
    }

    #[test]
    fn test_time_signature_zero_is_raised() {
        let ts = TimeSignature::new(0, 0);
        assert_eq!(ts.beats_per_bar, 1);
        assert_eq!(ts.note_value, 1);
    }

    #[test]
    fn test_tempo_clamping() {
        assert_eq!(Tempo::new(120).bpm(), 120);
        assert_eq!(Tempo::new(10).bpm(), 40);
        assert_eq!(Tempo::new(-500).bpm(), 40);
        assert_eq!(Tempo::new(300).bpm(), 208);
        assert_eq!(Tempo::new(208).bpm(), 208);
        assert_eq!(Tempo::new(40).bpm(), 40);
    }

    #[test]
    fn test_tempo_adjusted() {
        let tempo = Tempo::new(200);
        assert_eq!(tempo.adjusted(10).bpm(), 208);
        assert_eq!(tempo.adjusted(-1).bpm(), 199);
        assert_eq!(Tempo::new(45).adjusted(-10).bpm(), 40);
    }

    #[test]
    fn test_tempo_adjusted_extreme_deltas() {
        let tempo = Tempo::new(120);
        assert_eq!(tempo.adjusted(i32::MAX).bpm(), 208);
        assert_eq!(tempo.adjusted(i32::MIN).bpm(), 40);
        assert_eq!(Tempo::new(208).adjusted(i32::MAX).bpm(), 208);
    }

    #[test]
    fn test_beat_interval() {
        // At 120 BPM one beat = 500ms
        assert_eq!(Tempo::new(120).beat_interval(), Duration::from_millis(500));
        assert_eq!(Tempo::new(60).beat_interval(), Duration::from_secs(1));
        assert_eq!(Tempo::new(40).beat_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_tempo_deserialize_clamps() {
        let tempo: Tempo = serde_json::from_str("500").unwrap();
        assert_eq!(tempo.bpm(), 208);
        assert_eq!(serde_json::to_string(&Tempo::new(90)).unwrap(), "90");
    }
}
