//! Catalog loading, transport selection and schedule lookup working together

use std::io::Write;

use chrono::NaiveDate;
use practice_metronome::catalog::{CatalogError, JsonFileProvider, StaticProvider};
use practice_metronome::config::AppConfig;
use practice_metronome::{
    CatalogLoader, CatalogState, Sequence, SequenceProvider, Transport, TransportState,
    WeeklySchedule,
};

const CATALOG: &str = r#"[
    {"title": "Way_Maker_G", "url": "https://cdn/way.mp3", "format": "mp3"},
    {"title": "Oceans_D", "url": "https://cdn/oceans.wav", "format": "wav"},
    {"title": "Goodness_Of_God_A", "url": "https://cdn/goodness.mp3", "format": "mp3"}
]"#;

const SCHEDULE: &str = r#"[
    {"id": "1", "title": "Sunday set", "description": "Full run", "date": "2026-10-18",
     "time": "10:00", "duration": 90, "type": "live", "trackId": "https://cdn/oceans.wav"},
    {"id": "2", "title": "Lost track", "description": "Not in the catalog", "date": "2026-10-18",
     "time": "09:00", "duration": 30, "type": "sequence", "trackId": "https://cdn/gone.mp3"},
    {"id": "3", "title": "Workshop", "description": "Click tracks", "date": "2026-10-20",
     "time": "18:30", "duration": 120, "type": "workshop"}
]"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_loader_feeds_transport() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();

    let state = CatalogLoader::spawn(JsonFileProvider::new(file.path())).wait();
    let sequences = state.sequences().to_vec();
    assert_eq!(sequences.len(), 3);
    assert_eq!(sequences[2].display_title(), "Goodness Of God");

    let mut transport = Transport::default();
    transport.load_queue(sequences);
    assert_eq!(transport.state(), TransportState::Stopped);
    assert_eq!(transport.current().map(|s| s.format.as_str()), Some("mp3"));
}

#[test]
fn test_loader_reports_failure_as_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = CatalogLoader::spawn(JsonFileProvider::new(dir.path().join("missing.json"))).wait();

    assert!(matches!(state, CatalogState::Failed(_)));
    assert!(state.sequences().is_empty());
    assert!(state.error().is_some());
}

#[test]
fn test_loader_poll_yields_once() {
    let provider = StaticProvider::from_json(CATALOG).unwrap();
    let mut loader = CatalogLoader::spawn(provider);

    let state = loop {
        if let Some(state) = loader.poll() {
            break state;
        }
        std::thread::yield_now();
    };
    assert_eq!(state.sequences().len(), 3);
    assert!(loader.poll().is_none());
}

#[test]
fn test_search_is_case_insensitive() {
    let provider = StaticProvider::from_json(CATALOG).unwrap();
    assert_eq!(
        provider.search("  GOODNESS ").unwrap(),
        Sequence::new("Goodness_Of_God_A", "https://cdn/goodness.mp3", "mp3")
    );
    assert!(matches!(provider.search("hymn"), Err(CatalogError::NotFound(_))));
}

#[test]
fn test_schedule_event_opens_sequence() {
    let schedule = WeeklySchedule::from_json(SCHEDULE).unwrap();
    let mut transport = Transport::default();
    transport.load_queue(StaticProvider::from_json(CATALOG).unwrap().fetch_all().unwrap());

    let today = schedule.events_on(date(2026, 10, 18));
    assert_eq!(today[0].id, "2");
    assert_eq!(today[1].id, "1");

    let lost = today[0].track_id.as_deref().unwrap();
    assert!(!transport.select_by_key(lost));
    assert_eq!(transport.state(), TransportState::Stopped);

    let found = today[1].track_id.as_deref().unwrap();
    assert!(transport.select_by_key(found));
    assert!(transport.state().is_playing());
    assert_eq!(transport.current().unwrap().display_title(), "Oceans");
}

#[test]
fn test_schedule_upcoming_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCHEDULE.as_bytes()).unwrap();

    let schedule = WeeklySchedule::load(file.path()).unwrap();
    let upcoming = schedule.upcoming(date(2026, 10, 18));
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].formatted_duration(), "2h 0m");
}

#[test]
fn test_config_drives_scheduler_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "(metronome: (bpm: 72, beats_per_bar: 3, note_value: 4, volume: 0.5), bpm_presets: [72, 72, 96])"
    )
    .unwrap();

    let config = AppConfig::load_from(file.path()).unwrap();
    assert_eq!(config.bpm_presets, vec![72, 96]);

    let scheduler = practice_metronome::BeatScheduler::with_clock(
        practice_metronome::SilentEmitter,
        config.metronome.tempo_config(),
        practice_metronome::ManualClock::new(),
    );
    assert_eq!(scheduler.bpm(), 72);
    assert_eq!(scheduler.time_signature().to_string(), "3/4");
    assert_eq!(scheduler.volume(), 0.5);
}
