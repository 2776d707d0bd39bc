// Weekly schedule - static calendar of practice events

use std::fs;
use std::path::Path;

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Sequence,
    Live,
    Workshop,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Sequence => "Sequence",
            EventKind::Live => "Live",
            EventKind::Workshop => "Workshop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WeeklyEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Sequence to select when the event is opened (locator or title)
    #[serde(rename = "trackId", default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl WeeklyEvent {
    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_minutes)
    }

    pub fn formatted_time(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

/// `HH:MM` on the wire
mod hour_minute {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// `"2h 0m"` for an hour or more, `"45m"` otherwise
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Sunday-first week containing `day`
pub fn week_days(day: NaiveDate) -> [NaiveDate; 7] {
    let offset = day.weekday().num_days_from_sunday() as u64;
    let start = day.checked_sub_days(Days::new(offset)).unwrap_or(day);
    std::array::from_fn(|i| {
        start
            .checked_add_days(Days::new(i as u64))
            .unwrap_or(start)
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    events: Vec<WeeklyEvent>,
}

impl WeeklySchedule {
    /// Maximum number of entries in the upcoming list
    pub const UPCOMING_LIMIT: usize = 5;

    pub fn new(events: Vec<WeeklyEvent>) -> Self {
        Self { events }
    }

    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load(path: &Path) -> Result<Self, ScheduleError> {
        let json = fs::read_to_string(path)?;
        let schedule = Self::from_json(&json)?;
        log::debug!(
            "Loaded {} events from {}",
            schedule.events.len(),
            path.display()
        );
        Ok(schedule)
    }

    pub fn events(&self) -> &[WeeklyEvent] {
        &self.events
    }

    /// Events on `day`, earliest first
    pub fn events_on(&self, day: NaiveDate) -> Vec<&WeeklyEvent> {
        let mut events: Vec<&WeeklyEvent> = self.events.iter().filter(|e| e.date == day).collect();
        events.sort_by_key(|e| e.time);
        events
    }

    pub fn has_events_on(&self, day: NaiveDate) -> bool {
        self.events.iter().any(|e| e.date == day)
    }

    /// Events after `today`, soonest first, at most `UPCOMING_LIMIT`
    pub fn upcoming(&self, today: NaiveDate) -> Vec<&WeeklyEvent> {
        let mut events: Vec<&WeeklyEvent> = self.events.iter().filter(|e| e.date > today).collect();
        events.sort_by_key(|e| (e.date, e.time));
        events.truncate(Self::UPCOMING_LIMIT);
        events
    }

    /// Built-in week used when no schedule file is configured
    pub fn sample_week(today: NaiveDate) -> Self {
        let day = |offset: u64| today.checked_add_days(Days::new(offset)).unwrap_or(today);
        let at = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);

        let event = |id: &str,
                     title: &str,
                     description: &str,
                     date: NaiveDate,
                     time: NaiveTime,
                     duration_minutes: u32,
                     kind: EventKind,
                     track_id: Option<&str>| WeeklyEvent {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            date,
            time,
            duration_minutes,
            kind,
            track_id: track_id.map(str::to_string),
        };

        Self::new(vec![
            event(
                "1",
                "Morning warm-up",
                "Slow scales and long tones with the metronome",
                day(0),
                at(8, 0),
                60,
                EventKind::Sequence,
                None,
            ),
            event(
                "2",
                "Production workshop",
                "Arranging backing sequences for the band",
                day(0),
                at(15, 0),
                120,
                EventKind::Workshop,
                None,
            ),
            event(
                "3",
                "Live rehearsal",
                "Full band run-through of the weekend set",
                day(0),
                at(20, 0),
                90,
                EventKind::Live,
                None,
            ),
            event(
                "4",
                "Ambient night",
                "Pads and slow tempos",
                day(1),
                at(22, 0),
                180,
                EventKind::Sequence,
                None,
            ),
            event(
                "5",
                "Rhythm session",
                "Subdivision drills at 60 to 100 BPM",
                day(2),
                at(7, 30),
                45,
                EventKind::Sequence,
                None,
            ),
        ])
    }
}
