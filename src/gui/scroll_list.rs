// Custom-painted scrollable list with a thin manual scrollbar

use crate::gui::theme::{
    PAGE_BOTTOM_SLACK, PAGE_MARGIN, Palette, SCROLLBAR_INSET, SCROLLBAR_WIDTH, THUMB_MIN_HEIGHT,
};
use eframe::egui;
use std::ops::Range;

/// Rows moved per wheel notch
pub const WHEEL_STEP_ROWS: f32 = 3.0;

/// Wheel distance in points treated as one line on touchpads
const POINTS_PER_LINE: f32 = 50.0;

/// Vertical metrics of a list page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ListLayout {
    pub row_height: f32,
    pub header_height: f32,
    pub margin: f32,
}

impl ListLayout {
    /// Layout for a font whose line height is `font_height`.
    pub fn for_font_height(font_height: f32) -> Self {
        let row_height = (font_height + crate::gui::theme::ROW_PADDING).round();
        Self {
            row_height,
            header_height: row_height + 8.0,
            margin: PAGE_MARGIN,
        }
    }

    /// Total scrollable height for `rows` rows.
    pub fn content_height(&self, rows: usize) -> f32 {
        self.margin * 2.0 + self.header_height + rows as f32 * self.row_height + PAGE_BOTTOM_SLACK
    }

    /// Top of row `index` in content coordinates.
    pub fn row_top(&self, index: usize) -> f32 {
        self.margin + self.header_height + index as f32 * self.row_height
    }
}

/// Position and size of the scrollbar thumb, relative to the track top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thumb {
    pub top: f32,
    pub height: f32,
}

impl Thumb {
    pub fn contains(&self, y: f32) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum DragState {
    #[default]
    Idle,
    Dragging {
        anchor_pointer: f32,
        anchor_thumb_top: f32,
    },
}

/// Rounds an egui length to whole pixels for [`ScrollState`].
pub fn pixels(points: f32) -> i32 {
    points.round() as i32
}

/// Scroll position of one list page, in whole pixels.
///
/// Invariant: `0 <= offset <= max_scroll()` after every operation.
/// Pointer positions passed to the drag and track operations are relative
/// to the top of the scrollbar track.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollState {
    offset: i32,
    content_height: i32,
    viewport_height: i32,
    row_height: i32,
    drag: DragState,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollState {
    pub fn new() -> Self {
        Self {
            offset: 0,
            content_height: 0,
            viewport_height: 0,
            row_height: 20,
            drag: DragState::Idle,
        }
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn max_scroll(&self) -> i32 {
        (self.content_height - self.viewport_height).max(0)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    fn clamp(&mut self) {
        self.offset = self.offset.clamp(0, self.max_scroll());
    }

    /// New viewport size; keeps the offset inside the new range.
    pub fn on_resize(&mut self, viewport_height: i32) {
        self.viewport_height = viewport_height.max(0);
        self.clamp();
    }

    /// New content size (rows added or removed).
    pub fn set_content_height(&mut self, content_height: i32) {
        self.content_height = content_height.max(0);
        self.clamp();
    }

    pub fn set_row_height(&mut self, row_height: i32) {
        if row_height > 0 {
            self.row_height = row_height;
        }
    }

    /// Moves the view by `delta` pixels, positive scrolls down.
    pub fn scroll_by(&mut self, delta: i32) {
        self.offset = self.offset.saturating_add(delta);
        self.clamp();
    }

    /// Wheel input. Positive `delta_lines` means the wheel moved up,
    /// which reveals earlier rows.
    pub fn on_wheel(&mut self, delta_lines: f32) {
        let delta = -delta_lines * WHEEL_STEP_ROWS * self.row_height as f32;
        self.scroll_by(delta.round() as i32);
    }

    pub fn line_up(&mut self) {
        self.scroll_by(-self.row_height);
    }

    pub fn line_down(&mut self) {
        self.scroll_by(self.row_height);
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-self.viewport_height);
    }

    pub fn page_down(&mut self) {
        self.scroll_by(self.viewport_height);
    }

    pub fn home(&mut self) {
        self.offset = 0;
    }

    pub fn end(&mut self) {
        self.offset = self.max_scroll();
    }

    /// Rows that intersect the viewport. Everything outside is not painted.
    pub fn visible_rows(&self, layout: &ListLayout, row_count: usize) -> Range<usize> {
        if row_count == 0 || layout.row_height <= 0.0 {
            return 0..0;
        }
        let first_top = layout.row_top(0);
        let offset = self.offset as f32;
        let start = ((offset - first_top) / layout.row_height).floor().max(0.0) as usize;
        let end = ((offset + self.viewport_height as f32 - first_top) / layout.row_height)
            .ceil()
            .max(0.0) as usize;
        start.min(row_count)..end.min(row_count)
    }

    /// Length of the scrollbar track.
    pub fn track_length(&self) -> f32 {
        (self.viewport_height as f32 - SCROLLBAR_INSET * 2.0).max(0.0)
    }

    /// Thumb geometry, `None` when there is nothing to scroll.
    pub fn thumb(&self) -> Option<Thumb> {
        let max = self.max_scroll();
        let track = self.track_length();
        if max <= 0 || track <= 0.0 {
            return None;
        }
        let proportional = self.viewport_height as f32 / self.content_height as f32 * track;
        let height = proportional.max(THUMB_MIN_HEIGHT).min(track);
        let top = self.offset as f32 / max as f32 * (track - height);
        Some(Thumb { top, height })
    }

    /// Pointer pressed on the track. Starts a drag only when it hits the thumb.
    pub fn on_drag_start(&mut self, pointer_y: f32) -> bool {
        match self.thumb() {
            Some(thumb) if thumb.contains(pointer_y) => {
                self.drag = DragState::Dragging {
                    anchor_pointer: pointer_y,
                    anchor_thumb_top: thumb.top,
                };
                true
            }
            _ => false,
        }
    }

    /// Moves the thumb with the pointer and maps its position back to an
    /// offset.
    pub fn on_drag_move(&mut self, pointer_y: f32) {
        let DragState::Dragging {
            anchor_pointer,
            anchor_thumb_top,
        } = self.drag
        else {
            return;
        };
        let Some(thumb) = self.thumb() else {
            return;
        };
        let free = self.track_length() - thumb.height;
        if free <= 0.0 {
            return;
        }
        let top = (anchor_thumb_top + pointer_y - anchor_pointer).clamp(0.0, free);
        self.offset = (top / free * self.max_scroll() as f32).round() as i32;
        self.clamp();
    }

    pub fn on_drag_end(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Click on the track outside the thumb pages towards the pointer.
    pub fn on_track_click(&mut self, pointer_y: f32) {
        let Some(thumb) = self.thumb() else {
            return;
        };
        if pointer_y < thumb.top {
            self.page_up();
        } else if pointer_y >= thumb.top + thumb.height {
            self.page_down();
        }
    }
}

/// Paints a list page and feeds pointer, wheel and key input into its
/// [`ScrollState`].
pub struct ScrollableList<'a> {
    id: egui::Id,
    state: &'a mut ScrollState,
    palette: &'a Palette,
    keyboard: bool,
}

impl<'a> ScrollableList<'a> {
    pub fn new(id_source: impl std::hash::Hash, state: &'a mut ScrollState, palette: &'a Palette) -> Self {
        Self {
            id: egui::Id::new(id_source),
            state,
            palette,
            keyboard: true,
        }
    }

    /// Whether arrow/page/Home/End keys scroll this list.
    pub fn keyboard(mut self, enabled: bool) -> Self {
        self.keyboard = enabled;
        self
    }

    /// Fills the available space with the list.
    ///
    /// # Arguments
    /// * `ui` - parent ui
    /// * `layout` - row and header metrics
    /// * `row_count` - number of data rows
    /// * `paint_header` - paints the column header into the given rect
    /// * `paint_row` - paints row `index` into the given rect; only called for visible rows
    pub fn show(
        self,
        ui: &mut egui::Ui,
        layout: ListLayout,
        row_count: usize,
        paint_header: impl FnOnce(&egui::Painter, egui::Rect),
        mut paint_row: impl FnMut(&egui::Painter, usize, egui::Rect),
    ) -> egui::Response {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let state = self.state;
        let palette = self.palette;

        state.set_row_height(pixels(layout.row_height));
        state.on_resize(pixels(rect.height()));
        state.set_content_height(pixels(layout.content_height(row_count)));

        let track = egui::Rect::from_min_max(
            egui::pos2(
                rect.right() - SCROLLBAR_INSET - SCROLLBAR_WIDTH,
                rect.top() + SCROLLBAR_INSET,
            ),
            egui::pos2(rect.right() - SCROLLBAR_INSET, rect.bottom() - SCROLLBAR_INSET),
        );

        handle_pointer(ui, state, rect, track);
        if response.hovered() {
            handle_wheel(ui, state, self.id);
        }
        if self.keyboard {
            handle_keys(ui, state);
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, palette.page_bg);

        let content_right = track.left() - SCROLLBAR_INSET;
        let left = rect.left() + layout.margin;
        let origin = rect.top() - state.offset() as f32;

        let header = egui::Rect::from_min_max(
            egui::pos2(left, origin + layout.margin),
            egui::pos2(content_right, origin + layout.margin + layout.header_height),
        );
        if header.bottom() > rect.top() {
            painter.rect_filled(header, 4.0, palette.header_bg);
            paint_header(&painter, header);
        }

        for index in state.visible_rows(&layout, row_count) {
            let top = origin + layout.row_top(index);
            let row = egui::Rect::from_min_max(
                egui::pos2(left, top),
                egui::pos2(content_right, top + layout.row_height),
            );
            if index % 2 == 1 {
                painter.rect_filled(row, 0.0, palette.row_alt_bg);
            }
            painter.hline(
                row.x_range(),
                row.bottom() - 0.5,
                egui::Stroke::new(1.0, palette.grid),
            );
            paint_row(&painter, index, row);
        }

        if let Some(thumb) = state.thumb() {
            painter.rect_filled(track, SCROLLBAR_WIDTH / 2.0, palette.scroll_track);
            let thumb_rect = egui::Rect::from_min_size(
                egui::pos2(track.left(), track.top() + thumb.top),
                egui::vec2(track.width(), thumb.height),
            );
            painter.rect_filled(thumb_rect, SCROLLBAR_WIDTH / 2.0, palette.scroll_thumb);
        }

        response
    }
}

fn handle_pointer(ui: &egui::Ui, state: &mut ScrollState, rect: egui::Rect, track: egui::Rect) {
    let (pressed, down, pos) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_down(),
            i.pointer.interact_pos(),
        )
    });

    if state.is_dragging() {
        match (down, pos) {
            (true, Some(p)) => state.on_drag_move(p.y - track.top()),
            _ => state.on_drag_end(),
        }
        return;
    }

    let Some(p) = pos else { return };
    if !pressed || !rect.contains(p) || !ui.rect_contains_pointer(rect) {
        return;
    }
    // A slightly wider hit box than the painted bar
    if track.expand2(egui::vec2(SCROLLBAR_INSET, 0.0)).contains(p) {
        let y = p.y - track.top();
        if !state.on_drag_start(y) {
            state.on_track_click(y);
        }
    }
}

fn handle_wheel(ui: &egui::Ui, state: &mut ScrollState, id: egui::Id) {
    let residual_id = id.with("wheel_residual");
    let mut residual: f32 = ui.ctx().data(|d| d.get_temp(residual_id).unwrap_or(0.0));
    let mut lines = 0.0;
    let mut pages = 0.0;
    ui.input(|i| {
        for event in &i.events {
            if let egui::Event::MouseWheel { unit, delta, .. } = event {
                match unit {
                    egui::MouseWheelUnit::Line => lines += delta.y,
                    egui::MouseWheelUnit::Point => residual += delta.y / POINTS_PER_LINE,
                    egui::MouseWheelUnit::Page => pages += delta.y,
                }
            }
        }
    });
    let whole = residual.trunc();
    residual -= whole;
    lines += whole;
    ui.ctx().data_mut(|d| d.insert_temp(residual_id, residual));

    if lines != 0.0 {
        state.on_wheel(lines);
    }
    if pages > 0.0 {
        state.page_up();
    } else if pages < 0.0 {
        state.page_down();
    }
}

fn handle_keys(ui: &egui::Ui, state: &mut ScrollState) {
    use egui::Key;
    ui.input(|i| {
        if i.key_pressed(Key::ArrowUp) {
            state.line_up();
        }
        if i.key_pressed(Key::ArrowDown) {
            state.line_down();
        }
        if i.key_pressed(Key::PageUp) {
            state.page_up();
        }
        if i.key_pressed(Key::PageDown) {
            state.page_down();
        }
        if i.key_pressed(Key::Home) {
            state.home();
        }
        if i.key_pressed(Key::End) {
            state.end();
        }
    });
}
