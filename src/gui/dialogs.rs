// Modal About and Confirm Exit dialogs

use crate::gui::theme::{Palette, Strings};
use eframe::egui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COPYRIGHT: &str = "Copyleft 2025 Nalle Berg";
pub const LICENSE_URL: &str = "https://www.gnu.org/licenses/old-licenses/gpl-2.0.html";
pub const SOURCE_URL: &str = "https://github.com/NalleBerg/WinInfoApp";
pub const CONTACT_URL: &str = "mailto:?subject=WinInfoApp";

/// Opens a link with the desktop's default handler.
pub fn open_link(url: &str) {
    tracing::info!("opening {}", url);
    if let Err(e) = open::that_detached(url) {
        tracing::warn!("failed to open {}: {}", url, e);
    }
}

/// Button with a solid fill and white text, used by all dialogs.
pub fn colored_button(ui: &mut egui::Ui, text: &str, fill: egui::Color32) -> egui::Response {
    ui.add(
        egui::Button::new(egui::RichText::new(text).color(egui::Color32::WHITE).strong())
            .fill(fill)
            .rounding(6.0)
            .min_size(egui::vec2(88.0, 30.0)),
    )
}

fn dialog_window(title: &str) -> egui::Window<'_> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
}

/// Answer of the exit confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuitChoice {
    Quit,
    Stay,
}

/// Yes/No confirmation shown before the program exits.
#[derive(Debug, Default)]
pub struct ConfirmQuitDialog {
    open: bool,
}

impl ConfirmQuitDialog {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Draws the dialog. Returns the answer once, on the frame it is given.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        strings: &Strings,
        palette: &Palette,
    ) -> Option<QuitChoice> {
        if !self.open {
            return None;
        }
        let mut choice = None;
        dialog_window(strings.quit_title).show(ctx, |ui| {
            ui.add_space(6.0);
            ui.label(egui::RichText::new(strings.quit_question).size(15.0));
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if colored_button(ui, strings.yes, palette.button_yes).clicked() {
                    choice = Some(QuitChoice::Quit);
                }
                ui.add_space(8.0);
                if colored_button(ui, strings.no, palette.button_no).clicked() {
                    choice = Some(QuitChoice::Stay);
                }
            });
        });

        if choice.is_none() && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            choice = Some(QuitChoice::Stay);
        }
        if choice.is_some() {
            self.open = false;
        }
        choice
    }
}

/// Version, copyright and links.
#[derive(Debug, Default)]
pub struct AboutDialog {
    open: bool,
}

impl AboutDialog {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn show(&mut self, ctx: &egui::Context, strings: &Strings, palette: &Palette) {
        if !self.open {
            return;
        }
        let mut close = false;
        dialog_window(strings.about_title).show(ctx, |ui| {
            about_body(ui, strings);
            ui.add_space(12.0);
            ui.vertical_centered(|ui| {
                if colored_button(ui, strings.ok, palette.button_ok).clicked() {
                    close = true;
                }
            });
        });
        if close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.open = false;
        }
    }
}

/// Shared text of the About dialog and the About page.
pub fn about_body(ui: &mut egui::Ui, strings: &Strings) {
    ui.vertical_centered(|ui| {
        ui.heading(egui::RichText::new(strings.app_title).size(22.0).strong());
        ui.label(format!("{} {}", strings.about_version, VERSION));
        ui.add_space(6.0);
        ui.label(COPYRIGHT);
        ui.add_space(6.0);
        for (text, url) in [
            (strings.about_license, LICENSE_URL),
            (strings.about_source, SOURCE_URL),
            (strings.about_contact, CONTACT_URL),
        ] {
            if ui.link(text).on_hover_text(url).clicked() {
                open_link(url);
            }
        }
    });
}
