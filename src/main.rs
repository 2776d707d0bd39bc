use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use ringbuf::traits::Producer;

use practice_metronome::config::AppConfig;
use practice_metronome::messaging::notification::{Notification, NotificationCategory};
use practice_metronome::ui::app::PracticeApp;
use practice_metronome::{CpalToneEmitter, WeeklySchedule, create_notification_channel};

// Audio errors, catalog failures and schedule warnings all share this queue;
// the UI drains it every frame so a few dozen slots are plenty.
const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "practice_metronome", about = "Practice companion with metronome")]
struct Args {
    /// RON config file (defaults to the per-user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load_default(),
    };
    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Invalid config, using defaults: {}", e);
        AppConfig::default()
    });

    let (notification_tx, notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    let today = chrono::Local::now().date_naive();
    let schedule = match &config.schedule_path {
        Some(path) => WeeklySchedule::load(path).unwrap_or_else(|e| {
            log::warn!("Could not load schedule {}: {}", path.display(), e);
            if let Ok(mut tx) = notification_tx.lock() {
                let _ = tx.try_push(Notification::warning(
                    NotificationCategory::Schedule,
                    format!("Schedule unavailable: {}", e),
                ));
            }
            WeeklySchedule::sample_week(today)
        }),
        None => WeeklySchedule::sample_week(today),
    };

    // The stream opens lazily when the metronome first starts
    let emitter = CpalToneEmitter::new(config.audio_device.clone()).with_notifications(notification_tx);

    log::info!("Practice metronome starting");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 720.0])
            .with_title("Practice Metronome"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Practice Metronome",
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(PracticeApp::new(
                &config,
                emitter,
                schedule,
                notification_rx,
            )))
        }),
    );

    if let Err(e) = result {
        log::error!("UI exited with error: {}", e);
    }
}
