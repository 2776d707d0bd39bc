// Audio output - CPAL stream playing metronome clicks
//
// # Format Support
//
// The device's preferred sample format is detected via `sample_format()`
// and the matching stream type is built (F32, I16 or U16). Clicks are mixed
// in f32 and converted when written to the output frame.
//
// # Lifecycle
//
// The stream is opened lazily on `activate()` (first metronome start) and
// kept open across stop/start. `close()` or drop releases it.
//
// Note: on macOS (CoreAudio) the Stream is neither Send nor Sync, so the
// emitter must stay on the thread that created it.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

use crate::audio::click::ClickMixer;
use crate::audio::device::AudioDeviceManager;
use crate::audio::dsp_utils::{flush_denormals_to_zero, hard_clip, write_mono_frame};
use crate::audio::tone::{AudioError, ToneEmitter, ToneRequest};
use crate::connection::status::{AtomicDeviceStatus, DeviceStatus};
use crate::messaging::channels::{
    NotificationProducer, ToneConsumer, ToneProducer, create_tone_channel,
};
use crate::messaging::notification::{Notification, NotificationCategory};

// A click lasts 100ms and the fastest tempo fires one every ~290ms,
// so a handful of slots is plenty even if the callback stalls.
const TONE_QUEUE_CAPACITY: usize = 32;

struct OpenOutput {
    _device: Device,
    _stream: Stream,
    tone_tx: ToneProducer,
    sample_rate: f32,
}

/// Tone emitter playing through the system audio output
pub struct CpalToneEmitter {
    device_name: Option<String>,
    output: Option<OpenOutput>,
    status: AtomicDeviceStatus,
    notification_tx: Option<Arc<Mutex<NotificationProducer>>>,
}

impl CpalToneEmitter {
    /// Create an emitter for the named device (or the default one).
    /// Nothing is opened until `activate()`.
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            output: None,
            status: AtomicDeviceStatus::new(DeviceStatus::Disconnected),
            notification_tx: None,
        }
    }

    /// Report stream events to the UI
    pub fn with_notifications(mut self, notification_tx: Arc<Mutex<NotificationProducer>>) -> Self {
        self.notification_tx = Some(notification_tx);
        self
    }

    /// Connection status, shared with the stream error callback
    pub fn status(&self) -> AtomicDeviceStatus {
        self.status.clone()
    }

    pub fn sample_rate(&self) -> Option<f32> {
        self.output.as_ref().map(|o| o.sample_rate)
    }

    fn notify(&self, notification: Notification) {
        if let Some(tx) = &self.notification_tx {
            if let Ok(mut tx) = tx.try_lock() {
                let _ = ringbuf::traits::Producer::try_push(&mut *tx, notification);
            }
        }
    }

    fn open(&self) -> Result<OpenOutput, AudioError> {
        let device = AudioDeviceManager::new().resolve_output_device(self.device_name.as_deref())?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioError::Config(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        log::info!("Audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let (tone_tx, tone_rx) = create_tone_channel(TONE_QUEUE_CAPACITY);
        let mixer = ClickMixer::new(sample_rate, ClickMixer::DEFAULT_VOICES);

        let stream = match sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config, channels, tone_rx, mixer),
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config, channels, tone_rx, mixer),
            SampleFormat::U16 => self.build_stream::<u16>(&device, &config, channels, tone_rx, mixer),
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        log::info!("Audio output started: {} Hz, {} channels", sample_rate, channels);

        Ok(OpenOutput {
            _device: device,
            _stream: stream,
            tone_tx,
            sample_rate,
        })
    }

    /// Build an output stream for sample type `T`
    /// Clicks are mixed in f32 and converted per frame.
    fn build_stream<T>(
        &self,
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut tone_rx: ToneConsumer,
        mut mixer: ClickMixer,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let status = self.status.clone();
        let notification_tx = self.notification_tx.clone();

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocations, no I/O, no blocking locks below

                    while let Some(tone) = ringbuf::traits::Consumer::try_pop(&mut tone_rx) {
                        mixer.trigger(&tone);
                    }

                    for frame in data.chunks_mut(channels) {
                        let sample = hard_clip(flush_denormals_to_zero(mixer.next_sample()));
                        write_mono_frame(sample, frame);
                    }
                },
                move |err| {
                    // Runs outside the realtime callback
                    log::error!("Audio stream error: {}", err);
                    status.set(DeviceStatus::Error);

                    if let Some(tx) = &notification_tx {
                        if let Ok(mut tx) = tx.try_lock() {
                            let notif = Notification::error(
                                NotificationCategory::Audio,
                                format!("Audio stream error: {}", err),
                            );
                            let _ = ringbuf::traits::Producer::try_push(&mut *tx, notif);
                        }
                    }
                },
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))
    }
}

impl ToneEmitter for CpalToneEmitter {
    fn activate(&mut self) -> Result<(), AudioError> {
        if self.output.is_some() {
            return Ok(());
        }

        self.status.set(DeviceStatus::Connecting);

        match self.open() {
            Ok(output) => {
                self.notify(Notification::info(
                    NotificationCategory::Audio,
                    format!("Audio connected: {} Hz", output.sample_rate),
                ));
                self.output = Some(output);
                self.status.set(DeviceStatus::Connected);
                Ok(())
            }
            Err(e) => {
                self.status.set(DeviceStatus::Error);
                self.notify(Notification::error(
                    NotificationCategory::Audio,
                    format!("Audio unavailable: {}", e),
                ));
                Err(e)
            }
        }
    }

    fn emit(&mut self, tone: ToneRequest) -> Result<(), AudioError> {
        let output = self.output.as_mut().ok_or(AudioError::NotOpen)?;

        if self.status.get() == DeviceStatus::Error {
            return Err(AudioError::Stream("output stream reported an error".to_string()));
        }

        ringbuf::traits::Producer::try_push(&mut output.tone_tx, tone)
            .map_err(|_| AudioError::QueueFull)
    }

    fn close(&mut self) {
        if self.output.take().is_some() {
            log::info!("Audio output closed");
        }
        self.status.set(DeviceStatus::Disconnected);
    }
}

impl Drop for CpalToneEmitter {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CpalToneEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalToneEmitter")
            .field("device_name", &self.device_name)
            .field("open", &self.output.is_some())
            .field("status", &self.status.get())
            .finish()
    }
}
