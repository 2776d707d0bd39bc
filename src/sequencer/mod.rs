// Sequencer module
// Beat scheduling for the metronome and transport bookkeeping for sequences

pub mod metronome;
pub mod timeline;
pub mod timer;
pub mod transport;

pub use metronome::{BeatScheduler, BeatTick, ClickType, TempoConfig};
pub use timeline::{Tempo, TimeSignature};
pub use timer::{Clock, IntervalTimer, ManualClock, MonotonicClock};
pub use transport::{Transport, TransportState};
