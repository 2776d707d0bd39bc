// Main UI - sequences, weekly schedule and metronome sections

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use eframe::egui;
use ringbuf::traits::Consumer;

use crate::audio::engine::CpalToneEmitter;
use crate::audio::tone::ToneEmitter;
use crate::catalog::{CatalogLoader, CatalogState, JsonFileProvider, StaticProvider};
use crate::config::AppConfig;
use crate::connection::status::{AtomicDeviceStatus, DeviceStatus};
use crate::messaging::channels::NotificationConsumer;
use crate::messaging::notification::{Notification, NotificationCategory, NotificationLevel};
use crate::schedule::{EventKind, WeeklyEvent, WeeklySchedule, week_days};
use crate::sequencer::metronome::BeatScheduler;
use crate::sequencer::timer::Clock;
use crate::sequencer::transport::{Transport, format_time};
use crate::ui::beat_indicator::BeatIndicator;

/// How long a beat dot stays lit
const BEAT_FLASH: Duration = Duration::from_millis(150);
/// Repaint cadence while waiting on background work
const IDLE_REPAINT: Duration = Duration::from_millis(100);

const PRACTICE_TIPS: [&str; 3] = [
    "Start slow and raise the tempo gradually",
    "Use the accented first beat as your anchor",
    "Play scales and exercises locked to the click",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Sequences,
    Schedule,
    Metronome,
}

pub struct PracticeApp {
    section: Section,
    // Metronome
    scheduler: BeatScheduler<CpalToneEmitter>,
    audio_status: AtomicDeviceStatus,
    last_beat: Option<(u8, Instant)>,
    bpm_presets: Vec<u16>,
    // Sequences
    transport: Transport,
    catalog: CatalogState,
    catalog_loader: Option<CatalogLoader>,
    catalog_path: Option<PathBuf>,
    // Schedule
    schedule: WeeklySchedule,
    // Notification system
    notification_rx: NotificationConsumer,
    notification_queue: VecDeque<Notification>,
    max_notifications: usize,
}

impl PracticeApp {
    pub fn new(
        config: &AppConfig,
        emitter: CpalToneEmitter,
        schedule: WeeklySchedule,
        notification_rx: NotificationConsumer,
    ) -> Self {
        let audio_status = emitter.status();
        let scheduler = BeatScheduler::new(emitter, config.metronome.tempo_config());

        Self {
            section: Section::Sequences,
            scheduler,
            audio_status,
            last_beat: None,
            bpm_presets: config.bpm_presets.clone(),
            transport: Transport::new(config.player_volume),
            catalog: CatalogState::Loading,
            catalog_loader: Some(spawn_catalog_loader(config.catalog_path.clone())),
            catalog_path: config.catalog_path.clone(),
            schedule,
            notification_rx,
            notification_queue: VecDeque::new(),
            max_notifications: 10,
        }
    }

    fn push_notification(&mut self, notification: Notification) {
        self.notification_queue.push_back(notification);
        if self.notification_queue.len() > self.max_notifications {
            self.notification_queue.pop_front();
        }
    }

    /// Drain notifications posted by the audio output and workers
    fn update_notifications(&mut self) {
        while let Some(notification) = self.notification_rx.try_pop() {
            self.push_notification(notification);
        }
    }

    fn recent_notifications(&self) -> Vec<&Notification> {
        self.notification_queue
            .iter()
            .rev()
            .filter(|n| n.is_recent(5000))
            .take(3)
            .collect()
    }

    fn update_catalog(&mut self) {
        let Some(loader) = self.catalog_loader.as_mut() else {
            return;
        };
        let Some(state) = loader.poll() else {
            return;
        };
        self.catalog_loader = None;

        match &state {
            CatalogState::Ready(sequences) => {
                log::info!("Catalog loaded: {} sequences", sequences.len());
                self.transport.load_queue(sequences.clone());
            }
            CatalogState::Failed(message) => {
                log::warn!("Catalog unavailable: {}", message);
                self.push_notification(Notification::error(
                    NotificationCategory::Catalog,
                    format!("Could not load sequences: {}", message),
                ));
            }
            CatalogState::Loading => {}
        }
        self.catalog = state;
    }

    fn retry_catalog(&mut self) {
        self.catalog = CatalogState::Loading;
        self.catalog_loader = Some(spawn_catalog_loader(self.catalog_path.clone()));
    }

    fn update_metronome(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) && self.section == Section::Metronome {
            self.scheduler.toggle();
        }

        if let Some(tick) = self.scheduler.poll() {
            self.last_beat = Some((tick.beat, Instant::now()));
        }
        if !self.scheduler.is_running() {
            self.last_beat = None;
        }

        // Wake up exactly for the next beat, and again to clear the flash
        let mut wait = self.scheduler.time_until_next_tick();
        if let Some((_, at)) = self.last_beat {
            let flash_left = BEAT_FLASH.saturating_sub(at.elapsed());
            if !flash_left.is_zero() {
                wait = Some(wait.map_or(flash_left, |w| w.min(flash_left)));
            }
        }
        if self.catalog_loader.is_some() {
            wait = Some(wait.map_or(IDLE_REPAINT, |w| w.min(IDLE_REPAINT)));
        }
        if let Some(wait) = wait {
            ctx.request_repaint_after(wait);
        }
    }

    fn lit_beat(&self) -> Option<u8> {
        self.last_beat
            .filter(|(_, at)| at.elapsed() < BEAT_FLASH)
            .map(|(beat, _)| beat)
    }

    fn draw_navigation(&mut self, ui: &mut egui::Ui) {
        let mut section = self.section;
        ui.horizontal(|ui| {
            ui.selectable_value(&mut section, Section::Sequences, "🎵 Sequences");
            ui.selectable_value(&mut section, Section::Schedule, "📅 Schedule");
            ui.selectable_value(&mut section, Section::Metronome, "⏱ Metronome");
        });
        self.switch_section(section);
    }

    fn switch_section(&mut self, section: Section) {
        self.section = section_change(&mut self.scheduler, self.section, section);
    }

    fn draw_sequences(&mut self, ui: &mut egui::Ui) {
        ui.heading("Sequences");
        ui.label("Backing tracks for your practice");
        ui.add_space(10.0);

        if self.catalog.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading sequences...");
            });
            return;
        }

        if let Some(message) = self.catalog.error().map(str::to_string) {
            ui.colored_label(egui::Color32::RED, format!("Could not load sequences: {}", message));
            if ui.button("Retry").clicked() {
                self.retry_catalog();
            }
            return;
        }

        if self.catalog.sequences().is_empty() {
            ui.label("No sequences available");
            return;
        }

        let mut clicked = None;
        for (index, sequence) in self.transport.queue().iter().enumerate() {
            let playing = self.transport.is_playing_sequence(sequence);
            let selected = self.transport.current_index() == Some(index);

            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("🎵");
                    let title = egui::RichText::new(sequence.display_title()).strong();
                    if ui.selectable_label(selected, title).clicked() {
                        clicked = Some(index);
                    }
                    ui.label(egui::RichText::new(&sequence.format).weak());
                    if playing {
                        ui.colored_label(egui::Color32::from_rgb(120, 170, 255), "▶ playing");
                    } else if ui.small_button("▶").clicked() {
                        clicked = Some(index);
                    }
                });
            });
        }

        if let Some(index) = clicked {
            self.transport.select(index);
        }
    }

    fn draw_event(&self, ui: &mut egui::Ui, event: &WeeklyEvent, show_date: bool) -> bool {
        let mut open = false;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                let (icon, color) = match event.kind {
                    EventKind::Sequence => ("🎵", egui::Color32::from_rgb(120, 170, 255)),
                    EventKind::Live => ("⚡", egui::Color32::RED),
                    EventKind::Workshop => ("👥", egui::Color32::from_rgb(255, 165, 0)),
                };
                ui.colored_label(color, icon);

                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(&event.title).strong());
                    ui.label(egui::RichText::new(&event.description).weak());
                    let when = if show_date {
                        format!("{} • {}", event.date.format("%d/%m/%Y"), event.formatted_time())
                    } else {
                        format!("{} • {}", event.formatted_time(), event.formatted_duration())
                    };
                    ui.label(format!("{} • {}", event.kind.label(), when));
                });

                if ui.button("Open").clicked() {
                    open = true;
                }
            });
        });
        open
    }

    fn draw_schedule(&mut self, ui: &mut egui::Ui) {
        let today = Local::now().date_naive();

        ui.heading("Weekly schedule");
        ui.label("Upcoming events and sequences");
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            for day in week_days(today) {
                self.draw_day(ui, day, day == today);
            }
        });

        ui.add_space(10.0);
        ui.strong("Today");

        let mut opened: Option<WeeklyEvent> = None;
        let todays = self.schedule.events_on(today);
        if todays.is_empty() {
            ui.label("No events scheduled for today");
        }
        for event in todays {
            if self.draw_event(ui, event, false) {
                opened = Some(event.clone());
            }
        }

        ui.add_space(10.0);
        ui.strong("Coming up");
        for event in self.schedule.upcoming(today) {
            if self.draw_event(ui, event, true) {
                opened = Some(event.clone());
            }
        }

        if let Some(event) = opened {
            self.open_event(&event);
        }
    }

    fn draw_day(&self, ui: &mut egui::Ui, day: NaiveDate, is_today: bool) {
        let frame = if is_today {
            egui::Frame::group(ui.style()).fill(egui::Color32::from_rgb(60, 80, 140))
        } else {
            egui::Frame::group(ui.style())
        };

        frame.show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(day.format("%a").to_string());
                ui.strong(day.format("%d").to_string());
                if self.schedule.has_events_on(day) {
                    ui.label("•");
                } else {
                    ui.label(" ");
                }
            });
        });
    }

    /// Events tied to a sequence select it in the player
    fn open_event(&mut self, event: &WeeklyEvent) {
        let Some(key) = event.track_id.as_deref() else {
            return;
        };

        if self.transport.select_by_key(key) {
            self.switch_section(Section::Sequences);
        } else {
            self.push_notification(Notification::warning(
                NotificationCategory::Schedule,
                format!("Sequence for \"{}\" is not in the catalog", event.title),
            ));
        }
    }

    fn draw_metronome(&mut self, ui: &mut egui::Ui) {
        let running = self.scheduler.is_running();
        let time_signature = self.scheduler.time_signature();

        ui.vertical_centered(|ui| {
            ui.heading("Metronome");
            ui.label("Keep steady time while you practice");
            ui.add_space(10.0);

            ui.label(egui::RichText::new(self.scheduler.bpm().to_string()).size(40.0).strong());
            ui.label("BPM");
            ui.add_space(6.0);

            ui.add(BeatIndicator::new(time_signature.beats_per_bar, self.lit_beat()));
            ui.label(egui::RichText::new(time_signature.to_string()).size(18.0));
            ui.add_space(6.0);

            let label = if running { "⏸ Pause" } else { "▶ Play" };
            if ui
                .add(egui::Button::new(egui::RichText::new(label).size(22.0)).min_size(egui::vec2(120.0, 44.0)))
                .clicked()
            {
                self.scheduler.toggle();
            }
        });

        ui.add_space(12.0);
        ui.separator();
        ui.strong("Tempo");

        let mut bpm = self.scheduler.bpm();
        if ui
            .add(egui::Slider::new(&mut bpm, 40..=208).text("BPM"))
            .changed()
        {
            self.scheduler.set_bpm(bpm as i32);
        }

        ui.horizontal(|ui| {
            for delta in [-10, -1, 1, 10] {
                let label = if delta > 0 {
                    format!("+{}", delta)
                } else {
                    delta.to_string()
                };
                if ui.button(label).clicked() {
                    self.scheduler.adjust_bpm(delta);
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Beats per bar:");
            let mut beats = time_signature.beats_per_bar;
            let previous = beats;
            egui::ComboBox::from_id_salt("beats_per_bar")
                .selected_text(beats.to_string())
                .show_ui(ui, |ui| {
                    for b in 1..=12u8 {
                        ui.selectable_value(&mut beats, b, b.to_string());
                    }
                });
            if beats != previous {
                self.scheduler.set_time_signature(beats, time_signature.note_value);
            }
        });

        ui.add_space(8.0);
        ui.strong("Presets");
        let current = self.scheduler.bpm();
        let mut chosen = None;
        egui::Grid::new("bpm_presets").show(ui, |ui| {
            for (i, preset) in self.bpm_presets.iter().enumerate() {
                if ui.selectable_label(*preset == current, preset.to_string()).clicked() {
                    chosen = Some(*preset);
                }
                if i % 4 == 3 {
                    ui.end_row();
                }
            }
        });
        if let Some(preset) = chosen {
            self.scheduler.set_bpm(preset as i32);
        }

        ui.add_space(8.0);
        ui.strong("🔊 Volume");
        let mut volume = self.scheduler.volume();
        if ui
            .add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false))
            .changed()
        {
            self.scheduler.set_volume(volume);
        }

        ui.add_space(12.0);
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.strong("💡 Practice tips");
            for tip in PRACTICE_TIPS {
                ui.label(format!("• {}", tip));
            }
        });
    }

    fn draw_player(&mut self, ui: &mut egui::Ui) {
        let Some(current) = self.transport.current() else {
            return;
        };
        let title = current.display_title();

        ui.horizontal(|ui| {
            ui.label("🎵");
            ui.strong(title);

            if ui.button("⏮").clicked() {
                self.transport.previous();
            }
            let play_label = if self.transport.state().is_playing() { "⏸" } else { "▶" };
            if ui.button(play_label).clicked() {
                self.transport.toggle_play();
            }
            if ui.button("⏭").clicked() {
                self.transport.next();
            }

            ui.label(format_time(self.transport.position()));
            let mut fraction = self.transport.progress();
            let seek = ui.add_enabled(
                self.transport.duration().is_some(),
                egui::Slider::new(&mut fraction, 0.0..=1.0).show_value(false),
            );
            if seek.changed() {
                self.transport.seek_fraction(fraction);
            }
            ui.label(
                self.transport
                    .duration()
                    .map(format_time)
                    .unwrap_or_else(|| "--:--".to_string()),
            );

            let mut volume = self.transport.volume();
            if ui
                .add(egui::Slider::new(&mut volume, 0.0..=1.0).text("🔊").show_value(false))
                .changed()
            {
                self.transport.set_volume(volume);
            }
        });
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (dot, color) = match self.audio_status.get() {
                DeviceStatus::Connected => ("●", egui::Color32::GREEN),
                DeviceStatus::Connecting => ("●", egui::Color32::YELLOW),
                DeviceStatus::Disconnected => ("○", egui::Color32::GRAY),
                DeviceStatus::Error => ("●", egui::Color32::RED),
            };
            ui.colored_label(color, dot).on_hover_text("Audio output");

            let recent = self.recent_notifications();
            if recent.is_empty() {
                ui.label("Ready");
            }
            for notification in recent {
                let (icon, color) = match notification.level {
                    NotificationLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 150, 255)),
                    NotificationLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 165, 0)),
                    NotificationLevel::Error => ("✖", egui::Color32::RED),
                };
                ui.colored_label(color, icon);
                ui.colored_label(color, &notification.message);
                ui.add_space(10.0);
            }
        });
    }
}

/// The metronome only runs while its section is shown
fn section_change<E: ToneEmitter, C: Clock>(
    scheduler: &mut BeatScheduler<E, C>,
    from: Section,
    to: Section,
) -> Section {
    if from == Section::Metronome && to != Section::Metronome {
        scheduler.stop();
    }
    to
}

fn spawn_catalog_loader(path: Option<PathBuf>) -> CatalogLoader {
    match path {
        Some(path) => CatalogLoader::spawn(JsonFileProvider::new(path)),
        None => CatalogLoader::spawn(StaticProvider::default()),
    }
}

impl eframe::App for PracticeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_notifications();
        self.update_catalog();
        self.update_metronome(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        egui::TopBottomPanel::bottom("navigation").show(ctx, |ui| {
            self.draw_navigation(ui);
        });

        if self.transport.current().is_some() {
            egui::TopBottomPanel::bottom("player").show(ctx, |ui| {
                self.draw_player(ui);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.section {
                Section::Sequences => self.draw_sequences(ui),
                Section::Schedule => self.draw_schedule(ui),
                Section::Metronome => self.draw_metronome(ui),
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tone::RecordingEmitter;
    use crate::sequencer::metronome::TempoConfig;
    use crate::sequencer::timer::ManualClock;

    fn running_scheduler() -> BeatScheduler<RecordingEmitter, ManualClock> {
        let mut scheduler = BeatScheduler::with_clock(
            RecordingEmitter::new(),
            TempoConfig::default(),
            ManualClock::new(),
        );
        scheduler.start();
        scheduler
    }

    #[test]
    fn test_leaving_metronome_stops_it() {
        for to in [Section::Sequences, Section::Schedule] {
            let mut scheduler = running_scheduler();
            let section = section_change(&mut scheduler, Section::Metronome, to);
            assert_eq!(section, to);
            assert!(!scheduler.is_running());
        }
    }

    #[test]
    fn test_staying_on_metronome_keeps_running() {
        let mut scheduler = running_scheduler();
        section_change(&mut scheduler, Section::Metronome, Section::Metronome);
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_other_switches_leave_metronome_alone() {
        let mut scheduler = running_scheduler();
        section_change(&mut scheduler, Section::Sequences, Section::Schedule);
        assert!(scheduler.is_running());
    }
}
