// Reusable UI pieces: stat cards and column cell painting

use eframe::egui;

/// A small card with a caption and a large value.
///
/// # Arguments
/// * `ui` - parent ui
/// * `width`, `height` - card size
/// * `label` - caption shown above the value
/// * `value` - formatted value
/// * `fill` - card background
/// * `color` - value colour
pub fn stat_card(
    ui: &mut egui::Ui,
    width: f32,
    height: f32,
    label: &str,
    value: &str,
    fill: egui::Color32,
    color: egui::Color32,
) {
    egui::Frame::none()
        .fill(fill)
        .rounding(10.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_width(width);
            ui.set_height(height);
            ui.vertical(|ui| {
                ui.label(
                    egui::RichText::new(label)
                        .size(11.0)
                        .color(egui::Color32::from_gray(170)),
                );
                ui.add_space(8.0);
                ui.label(egui::RichText::new(value).size(22.0).color(color).strong());
            });
        });
}

/// One column of a list page: relative width and text alignment.
#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub weight: f32,
    pub right_aligned: bool,
}

impl Column {
    pub const fn left(weight: f32) -> Self {
        Self {
            weight,
            right_aligned: false,
        }
    }

    pub const fn right(weight: f32) -> Self {
        Self {
            weight,
            right_aligned: true,
        }
    }
}

/// Horizontal extents of each column inside `rect`.
pub fn column_rects(rect: egui::Rect, columns: &[Column]) -> Vec<egui::Rect> {
    let total: f32 = columns.iter().map(|c| c.weight).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut x = rect.left();
    columns
        .iter()
        .map(|c| {
            let w = rect.width() * c.weight / total;
            let r = egui::Rect::from_min_max(egui::pos2(x, rect.top()), egui::pos2(x + w, rect.bottom()));
            x += w;
            r
        })
        .collect()
}

/// Paints one line of cells, clipped to their columns.
pub fn paint_cells(
    painter: &egui::Painter,
    rect: egui::Rect,
    columns: &[Column],
    cells: &[(&str, egui::Color32)],
    font: &egui::FontId,
) {
    const CELL_PADDING: f32 = 8.0;
    for ((column, cell), (text, color)) in columns.iter().zip(column_rects(rect, columns)).zip(cells) {
        let clip = cell.shrink2(egui::vec2(CELL_PADDING / 2.0, 0.0));
        let (pos, align) = if column.right_aligned {
            (clip.right_center(), egui::Align2::RIGHT_CENTER)
        } else {
            (clip.left_center(), egui::Align2::LEFT_CENTER)
        };
        painter
            .with_clip_rect(clip.intersect(painter.clip_rect()))
            .text(pos, align, *text, font.clone(), *color);
    }
}
