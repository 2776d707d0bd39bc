// Beat indicator - one dot per beat slot in the bar

use egui::{Color32, Response, Sense, Ui, Vec2, Widget};

const DOT_RADIUS: f32 = 8.0;
const DOT_SPACING: f32 = 28.0;

/// Row of dots, the sounding beat lit (downbeat in the accent color)
pub struct BeatIndicator {
    beats_per_bar: u8,
    lit_beat: Option<u8>,
}

impl BeatIndicator {
    pub fn new(beats_per_bar: u8, lit_beat: Option<u8>) -> Self {
        Self {
            beats_per_bar,
            lit_beat,
        }
    }
}

impl Widget for BeatIndicator {
    fn ui(self, ui: &mut Ui) -> Response {
        let beats = self.beats_per_bar.max(1);
        let size = Vec2::new(beats as f32 * DOT_SPACING, DOT_RADIUS * 3.0);
        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());

        let painter = ui.painter();
        for i in 0..beats {
            let beat = i + 1;
            let center = egui::pos2(
                rect.left() + DOT_SPACING * (i as f32 + 0.5),
                rect.center().y,
            );

            let color = match self.lit_beat {
                Some(lit) if lit == beat && beat == 1 => Color32::from_rgb(255, 140, 60),
                Some(lit) if lit == beat => Color32::from_rgb(120, 170, 255),
                _ => Color32::from_gray(70),
            };

            let radius = if self.lit_beat == Some(beat) {
                DOT_RADIUS * 1.25
            } else {
                DOT_RADIUS
            };

            painter.circle_filled(center, radius, color);
        }

        response
    }
}
