pub mod app;
pub mod beat_indicator;
