// DSP helpers for the output callback
// Denormal flushing, output limiting and mono-to-interleaved writing

use cpal::{FromSample, Sample};

/// Flush denormals to zero
///
/// The tail of an exponential decay produces very small values that can
/// slow some CPUs down. Threshold: 1e-15.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Hard limit to [-1, 1]
///
/// Several overlapping clicks at full volume can sum above 1.0.
#[inline]
pub fn hard_clip(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

/// Write one mono sample to every channel of an interleaved frame,
/// converting to the device sample type
#[inline]
pub fn write_mono_frame<T>(sample: f32, frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    let converted: T = T::from_sample(sample);
    for channel_sample in frame.iter_mut() {
        *channel_sample = converted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormals() {
        assert_eq!(flush_denormals_to_zero(1e-20), 0.0);
        assert_eq!(flush_denormals_to_zero(0.1), 0.1);
        assert_eq!(flush_denormals_to_zero(-0.1), -0.1);
    }

    #[test]
    fn test_hard_clip() {
        assert_eq!(hard_clip(0.4), 0.4);
        assert_eq!(hard_clip(1.7), 1.0);
        assert_eq!(hard_clip(-3.0), -1.0);
    }

    #[test]
    fn test_write_mono_frame_f32() {
        let mut frame = [0.0f32; 2];
        write_mono_frame(0.25, &mut frame);
        assert_eq!(frame, [0.25, 0.25]);
    }

    #[test]
    fn test_write_mono_frame_i16() {
        let mut frame = [0i16; 3];
        write_mono_frame(0.0, &mut frame);
        assert_eq!(frame, [0, 0, 0]);

        write_mono_frame(0.5, &mut frame);
        assert!(frame.iter().all(|s| *s > 16000 && *s < 16500));
    }
}
