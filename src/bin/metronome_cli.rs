// Headless metronome - clicks on the default output and prints the beat

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use practice_metronome::audio::device::AudioDeviceManager;
use practice_metronome::config::AppConfig;
use practice_metronome::{
    BeatScheduler, ClickType, CpalToneEmitter, SilentEmitter, TempoConfig, ToneEmitter,
};

/// Longest the loop sleeps before polling again
const MAX_SLEEP: Duration = Duration::from_millis(20);

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the metronome in a terminal", long_about = None)]
struct Args {
    /// Tempo in beats per minute (40 to 208)
    #[arg(long)]
    bpm: Option<i32>,

    /// Beats per bar
    #[arg(long)]
    beats: Option<u8>,

    /// Note value of one beat
    #[arg(long)]
    note_value: Option<u8>,

    /// Click volume (0.0 to 1.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Stop after this many bars (at least 1); runs until interrupted otherwise
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    bars: Option<u32>,

    /// RON config file providing the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output device name (see --list-devices)
    #[arg(long)]
    device: Option<String>,

    /// Print the available output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Print beats without opening an audio output
    #[arg(long)]
    silent: bool,
}

impl Args {
    fn tempo_config(&self, config: &AppConfig) -> TempoConfig {
        let mut defaults = config.metronome.clone();
        if let Some(bpm) = self.bpm {
            defaults.bpm = bpm;
        }
        if let Some(beats) = self.beats {
            defaults.beats_per_bar = beats;
        }
        if let Some(note_value) = self.note_value {
            defaults.note_value = note_value;
        }
        if let Some(volume) = self.volume {
            defaults.volume = volume;
        }
        defaults.tempo_config()
    }
}

fn bar_limit_reached(bars_done: u32, limit: Option<u32>) -> bool {
    limit.is_some_and(|limit| bars_done >= limit)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if args.list_devices {
        for device in AudioDeviceManager::new().list_output_devices() {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("{}{}", device.name, marker);
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load_default().unwrap_or_else(|e| {
            log::warn!("Invalid config, using defaults: {}", e);
            AppConfig::default()
        }),
    };

    let emitter: Box<dyn ToneEmitter> = if args.silent {
        Box::new(SilentEmitter)
    } else {
        let device = args.device.clone().or_else(|| config.audio_device.clone());
        Box::new(CpalToneEmitter::new(device))
    };

    let mut scheduler = BeatScheduler::new(emitter, args.tempo_config(&config));
    let beats_per_bar = scheduler.time_signature().beats_per_bar;

    println!(
        "{} BPM in {}{}",
        scheduler.bpm(),
        scheduler.time_signature(),
        args.bars
            .map(|b| format!(", {} bars", b))
            .unwrap_or_default()
    );

    scheduler.start();
    let mut bars_done = 0u32;
    let mut stdout = std::io::stdout();

    while scheduler.is_running() {
        let wait = scheduler.time_until_next_tick().unwrap_or(MAX_SLEEP);
        std::thread::sleep(wait.min(MAX_SLEEP));

        let Some(tick) = scheduler.poll() else {
            continue;
        };

        if tick.click_type == ClickType::Accent {
            print!("\n| ");
        }
        let mark = match tick.click_type {
            ClickType::Accent => "X",
            ClickType::Regular => "x",
        };
        print!("{}{} ", mark, if tick.click_emitted { "" } else { "?" });
        stdout.flush()?;

        if tick.beat == beats_per_bar {
            bars_done += 1;
            if bar_limit_reached(bars_done, args.bars) {
                scheduler.stop();
            }
        }
    }

    println!();
    scheduler.shutdown();
    Ok(())
}
