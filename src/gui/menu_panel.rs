// Custom-drawn popup menu panel returning a command to the shell

use crate::gui::theme::{Palette, Strings};
use eframe::egui;

pub const ITEM_HEIGHT: f32 = 56.0;
pub const PANEL_WIDTH: f32 = 300.0;
pub const PANEL_PADDING: f32 = 8.0;
pub const PANEL_MAX_HEIGHT: f32 = 520.0;

/// Pages the shell can display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Summary,
    CpuInfo,
    Storage,
    About,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Summary, Page::CpuInfo, Page::Storage, Page::About];

    pub fn title(&self, strings: &Strings) -> &'static str {
        match self {
            Page::Summary => strings.page_summary,
            Page::CpuInfo => strings.page_cpu,
            Page::Storage => strings.page_storage,
            Page::About => strings.page_about,
        }
    }
}

/// Action chosen in the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Show(Page),
    Exit,
}

impl ShellCommand {
    fn label(&self, strings: &Strings) -> &'static str {
        match self {
            ShellCommand::Show(page) => page.title(strings),
            ShellCommand::Exit => strings.menu_exit,
        }
    }
}

/// Items in display order.
pub const ITEMS: [ShellCommand; 5] = [
    ShellCommand::Show(Page::Summary),
    ShellCommand::Show(Page::CpuInfo),
    ShellCommand::Show(Page::Storage),
    ShellCommand::Show(Page::About),
    ShellCommand::Exit,
];

/// Identifies one opening of the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuPanelHandle(u64);

#[derive(Debug)]
struct OpenPanel {
    handle: MenuPanelHandle,
    anchor: egui::Pos2,
    hovered: Option<usize>,
    opened_pass: Option<u64>,
    last_pointer: Option<egui::Pos2>,
}

/// Single-instance popup menu.
#[derive(Debug, Default)]
pub struct MenuPanel {
    open: Option<OpenPanel>,
    opened_count: u64,
}

/// Panel size for `items` entries.
pub fn panel_size(items: usize) -> egui::Vec2 {
    let height = (items as f32 * ITEM_HEIGHT + PANEL_PADDING * 2.0).min(PANEL_MAX_HEIGHT);
    egui::vec2(PANEL_WIDTH, height)
}

impl MenuPanel {
    /// Opens the panel at `anchor`. If it is already open the existing
    /// handle is returned and nothing changes.
    pub fn open(&mut self, anchor: egui::Pos2) -> MenuPanelHandle {
        if let Some(open) = &self.open {
            return open.handle;
        }
        self.opened_count += 1;
        let handle = MenuPanelHandle(self.opened_count);
        tracing::debug!(?anchor, "menu panel opened");
        self.open = Some(OpenPanel {
            handle,
            anchor,
            hovered: None,
            opened_pass: None,
            last_pointer: None,
        });
        handle
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Closes without producing a command.
    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn hovered(&self) -> Option<usize> {
        self.open.as_ref().and_then(|o| o.hovered)
    }

    pub fn set_hovered(&mut self, index: Option<usize>) {
        if let Some(open) = &mut self.open {
            open.hovered = index.filter(|&i| i < ITEMS.len());
        }
    }

    pub fn hover_next(&mut self) {
        if let Some(open) = &mut self.open {
            open.hovered = Some(match open.hovered {
                Some(i) => (i + 1) % ITEMS.len(),
                None => 0,
            });
        }
    }

    pub fn hover_previous(&mut self) {
        if let Some(open) = &mut self.open {
            open.hovered = Some(match open.hovered {
                Some(0) | None => ITEMS.len() - 1,
                Some(i) => i - 1,
            });
        }
    }

    /// Chooses item `index`, closing the panel.
    pub fn select(&mut self, index: usize) -> Option<ShellCommand> {
        self.open.as_ref()?;
        let command = ITEMS.get(index).copied()?;
        self.close();
        Some(command)
    }

    /// Chooses the highlighted item (Enter).
    pub fn activate_hovered(&mut self) -> Option<ShellCommand> {
        let index = self.hovered()?;
        self.select(index)
    }

    /// Draws the panel if open and handles its input.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        strings: &Strings,
        palette: &Palette,
    ) -> Option<ShellCommand> {
        let pass_nr = ctx.cumulative_pass_nr();
        let (anchor, handle) = {
            let open = self.open.as_mut()?;
            let first_pass = *open.opened_pass.get_or_insert(pass_nr) == pass_nr;
            if !first_pass && !ctx.input(|i| i.focused) {
                self.close();
                return None;
            }
            (open.anchor, open.handle)
        };

        let (escape, enter, up, down) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowDown),
            )
        });
        if escape {
            self.close();
            return None;
        }
        if down {
            self.hover_next();
        }
        if up {
            self.hover_previous();
        }
        if enter {
            return self.activate_hovered();
        }

        let size = panel_size(ITEMS.len());
        let hovered = self.hovered();
        let pointer = ctx.input(|i| i.pointer.hover_pos());
        let mut pointer_hover = None;
        let mut clicked = None;

        let area = egui::Area::new(egui::Id::new(("menu_panel", handle.0)))
            .order(egui::Order::Foreground)
            .fixed_pos(anchor)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(palette.menu_bg)
                    .rounding(10.0)
                    .inner_margin(PANEL_PADDING)
                    .show(ui, |ui| {
                        ui.set_width(size.x - PANEL_PADDING * 2.0);
                        egui::ScrollArea::vertical()
                            .max_height(size.y - PANEL_PADDING * 2.0)
                            .show(ui, |ui| {
                                for (index, command) in ITEMS.iter().enumerate() {
                                    let (rect, response) = ui.allocate_exact_size(
                                        egui::vec2(ui.available_width(), ITEM_HEIGHT),
                                        egui::Sense::click(),
                                    );
                                    let under_pointer = pointer.is_some_and(|p| {
                                        rect.contains(p) && ui.clip_rect().contains(p)
                                    });
                                    if under_pointer {
                                        pointer_hover = Some(index);
                                    }
                                    if response.clicked() {
                                        clicked = Some(index);
                                    }
                                    let fill = if under_pointer || hovered == Some(index) {
                                        palette.menu_hover
                                    } else {
                                        palette.menu_pill
                                    };
                                    let pill = rect.shrink2(egui::vec2(0.0, 4.0));
                                    ui.painter().rect_filled(pill, pill.height() / 2.0, fill);
                                    ui.painter().text(
                                        pill.left_center() + egui::vec2(20.0, 0.0),
                                        egui::Align2::LEFT_CENTER,
                                        command.label(strings),
                                        egui::FontId::proportional(16.0),
                                        palette.text,
                                    );
                                }
                            });
                    });
            });

        if let Some(index) = clicked {
            return self.select(index);
        }
        // Pointer movement owns the highlight; arrow keys own it while the pointer rests
        if let Some(open) = &mut self.open {
            if open.last_pointer != pointer {
                open.last_pointer = pointer;
                open.hovered = pointer_hover;
            }
        }

        let clicked_outside = ctx.input(|i| {
            i.pointer.any_pressed()
                && i.pointer
                    .interact_pos()
                    .is_some_and(|p| !area.response.rect.contains(p))
        });
        if clicked_outside && self.open.as_ref().and_then(|o| o.opened_pass) != Some(pass_nr) {
            self.close();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_open_returns_existing_handle() {
        let mut panel = MenuPanel::default();
        let first = panel.open(egui::pos2(10.0, 20.0));
        let second = panel.open(egui::pos2(300.0, 300.0));
        assert_eq!(first, second);
        assert_eq!(panel.open.as_ref().unwrap().anchor, egui::pos2(10.0, 20.0));

        panel.close();
        let third = panel.open(egui::pos2(0.0, 0.0));
        assert_ne!(first, third);
    }

    #[test]
    fn select_returns_one_command_and_closes() {
        let mut panel = MenuPanel::default();
        panel.open(egui::Pos2::ZERO);
        assert_eq!(panel.select(1), Some(ShellCommand::Show(Page::CpuInfo)));
        assert!(!panel.is_open());
        assert_eq!(panel.select(1), None);
    }

    #[test]
    fn out_of_range_selection_keeps_panel_open() {
        let mut panel = MenuPanel::default();
        panel.open(egui::Pos2::ZERO);
        assert_eq!(panel.select(ITEMS.len()), None);
        assert!(panel.is_open());
    }

    #[test]
    fn enter_without_highlight_does_nothing() {
        let mut panel = MenuPanel::default();
        panel.open(egui::Pos2::ZERO);
        assert_eq!(panel.activate_hovered(), None);
        assert!(panel.is_open());
    }

    #[test]
    fn arrow_keys_wrap_around() {
        let mut panel = MenuPanel::default();
        panel.open(egui::Pos2::ZERO);
        panel.hover_previous();
        assert_eq!(panel.hovered(), Some(ITEMS.len() - 1));
        panel.hover_next();
        assert_eq!(panel.hovered(), Some(0));
        panel.hover_next();
        assert_eq!(panel.activate_hovered(), Some(ShellCommand::Show(Page::CpuInfo)));
    }

    #[test]
    fn last_item_is_exit() {
        let mut panel = MenuPanel::default();
        panel.open(egui::Pos2::ZERO);
        panel.set_hovered(Some(4));
        assert_eq!(panel.activate_hovered(), Some(ShellCommand::Exit));
    }

    #[test]
    fn hover_is_ignored_when_closed() {
        let mut panel = MenuPanel::default();
        panel.set_hovered(Some(0));
        panel.hover_next();
        assert_eq!(panel.hovered(), None);
    }

    const ANCHOR: egui::Pos2 = egui::pos2(100.0, 40.0);

    fn key(key: egui::Key) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }
    }

    /// Runs one egui pass with `events` and returns the command produced.
    fn run_pass(
        ctx: &egui::Context,
        panel: &mut MenuPanel,
        events: Vec<egui::Event>,
    ) -> Option<ShellCommand> {
        let input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(800.0, 600.0),
            )),
            focused: true,
            events,
            ..Default::default()
        };
        let strings = crate::gui::theme::strings(crate::config::Language::EnglishGb);
        let palette = Palette::default();
        let mut command = None;
        let _ = ctx.run(input, |ctx| {
            if let Some(c) = panel.show(ctx, strings, &palette) {
                command = Some(c);
            }
        });
        command
    }

    /// Centre of item `index` on screen.
    fn item_center(index: usize) -> egui::Pos2 {
        ANCHOR + egui::vec2(PANEL_WIDTH / 2.0, PANEL_PADDING + (index as f32 + 0.5) * ITEM_HEIGHT)
    }

    fn opened_panel(ctx: &egui::Context) -> MenuPanel {
        let mut panel = MenuPanel::default();
        panel.open(ANCHOR);
        for _ in 0..3 {
            run_pass(ctx, &mut panel, Vec::new());
        }
        panel
    }

    #[test]
    fn highlight_follows_pointer_and_clears_when_it_leaves() {
        let ctx = egui::Context::default();
        let mut panel = opened_panel(&ctx);

        run_pass(&ctx, &mut panel, vec![egui::Event::PointerMoved(item_center(2))]);
        assert_eq!(panel.hovered(), Some(2));

        run_pass(&ctx, &mut panel, vec![egui::Event::PointerMoved(egui::pos2(700.0, 550.0))]);
        assert_eq!(panel.hovered(), None);

        let command = run_pass(&ctx, &mut panel, vec![key(egui::Key::Enter)]);
        assert_eq!(command, None);
        assert!(panel.is_open());
    }

    #[test]
    fn arrow_highlight_survives_a_resting_pointer() {
        let ctx = egui::Context::default();
        let mut panel = opened_panel(&ctx);

        run_pass(&ctx, &mut panel, vec![egui::Event::PointerMoved(egui::pos2(700.0, 550.0))]);
        run_pass(&ctx, &mut panel, vec![key(egui::Key::ArrowDown)]);
        run_pass(&ctx, &mut panel, vec![key(egui::Key::ArrowDown)]);
        assert_eq!(panel.hovered(), Some(1));

        let command = run_pass(&ctx, &mut panel, vec![key(egui::Key::Enter)]);
        assert_eq!(command, Some(ShellCommand::Show(Page::CpuInfo)));
        assert!(!panel.is_open());
    }

    #[test]
    fn escape_closes_without_command() {
        let ctx = egui::Context::default();
        let mut panel = opened_panel(&ctx);
        panel.set_hovered(Some(0));

        let command = run_pass(&ctx, &mut panel, vec![key(egui::Key::Escape)]);
        assert_eq!(command, None);
        assert!(!panel.is_open());
    }

    #[test]
    fn click_outside_closes_without_command() {
        let ctx = egui::Context::default();
        let mut panel = opened_panel(&ctx);
        let outside = egui::pos2(700.0, 550.0);

        let command = run_pass(
            &ctx,
            &mut panel,
            vec![
                egui::Event::PointerMoved(outside),
                egui::Event::PointerButton {
                    pos: outside,
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    modifiers: egui::Modifiers::NONE,
                },
            ],
        );
        assert_eq!(command, None);
        assert!(!panel.is_open());
    }

    #[test]
    fn focus_loss_closes() {
        let ctx = egui::Context::default();
        let mut panel = opened_panel(&ctx);
        let input = egui::RawInput {
            focused: false,
            ..Default::default()
        };
        let strings = crate::gui::theme::strings(crate::config::Language::EnglishGb);
        let palette = Palette::default();
        let _ = ctx.run(input, |ctx| {
            panel.show(ctx, strings, &palette);
        });
        assert!(!panel.is_open());
    }

    #[test]
    fn panel_height_is_capped() {
        assert_eq!(panel_size(5), egui::vec2(300.0, 296.0));
        assert_eq!(panel_size(20).y, PANEL_MAX_HEIGHT);
    }
}
