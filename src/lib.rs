// Practice Metronome - Library exports for the app, the CLI and tests

pub mod audio;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod messaging;
pub mod schedule;
pub mod sequencer;
pub mod ui;

// Re-export commonly used types for convenience
pub use audio::engine::CpalToneEmitter;
pub use audio::tone::{AudioError, RecordingEmitter, SilentEmitter, ToneEmitter, ToneRequest};
pub use catalog::{CatalogLoader, CatalogState, Sequence, SequenceProvider};
pub use config::AppConfig;
pub use messaging::channels::create_notification_channel;
pub use schedule::{EventKind, WeeklyEvent, WeeklySchedule};
pub use sequencer::{
    BeatScheduler, BeatTick, ClickType, ManualClock, MonotonicClock, Tempo, TempoConfig,
    TimeSignature, Transport, TransportState,
};
