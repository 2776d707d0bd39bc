// Audio - click synthesis and the CPAL output the metronome plays through

pub mod click;
pub mod device;
pub mod dsp_utils;
pub mod engine;
pub mod tone;
