// Main application state and UI rendering logic for the WinInfoApp shell

// Import settings persistence
use crate::config::{Language, Settings};
// Import byte formatting for the storage columns and summary cards
use crate::format::{format_bytes, format_uptime};
// Import widgets, dialogs and theme
use crate::gui::components::{Column, paint_cells, stat_card};
use crate::gui::dialogs::{AboutDialog, ConfirmQuitDialog, QuitChoice, about_body};
use crate::gui::menu_panel::{MenuPanel, PANEL_WIDTH, Page, ShellCommand};
use crate::gui::scroll_list::{ListLayout, ScrollState, ScrollableList};
use crate::gui::theme::{Palette, Strings, strings};
// Import row and drive models
use crate::models::{DriveInfo, InfoRow};
// Import OS probes
use crate::probe::system_info::{SummarySnapshot, summary_rows};
use crate::probe::{DriveEnumerator, StorageRefresher, SystemInfoProvider};
// Import egui for UI rendering
use eframe::egui;
// PathBuf for the settings location
use std::path::PathBuf;
// Arc for sharing the drive enumerator with worker threads
use std::sync::Arc;
// Duration and Instant for the polling timer
use std::time::{Duration, Instant};

/// Font used for list rows
const LIST_FONT_SIZE: f32 = 14.0;

const INFO_COLUMNS: [Column; 2] = [Column::left(1.0), Column::left(2.0)];
const STORAGE_COLUMNS: [Column; 6] = [
    Column::left(2.2),
    Column::left(1.3),
    Column::left(0.8),
    Column::left(1.4),
    Column::right(1.0),
    Column::right(1.0),
];

/// Everything the shell shares between pages: settings, probes and theme.
pub struct AppContext {
    settings: Settings,
    settings_path: PathBuf,
    strings: &'static Strings,
    palette: Palette,
    provider: SystemInfoProvider,
    scanner: Arc<dyn DriveEnumerator>,
    refresher: StorageRefresher,
}

impl AppContext {
    /// # Arguments
    /// * `settings` - settings loaded at startup; the language is fixed for this run
    /// * `settings_path` - where language changes are written
    /// * `provider` - CPU/summary queries
    /// * `scanner` - storage enumerator run on worker threads
    pub fn new(
        settings: Settings,
        settings_path: PathBuf,
        provider: SystemInfoProvider,
        scanner: Arc<dyn DriveEnumerator>,
    ) -> Self {
        Self {
            strings: strings(settings.language),
            settings,
            settings_path,
            palette: Palette::default(),
            provider,
            scanner,
            refresher: StorageRefresher::new(),
        }
    }
}

/// Main application state for the eframe app.
/// Owns the pages, the popup menu, the dialogs and the polling timer.
pub struct AppState {
    app: AppContext,

    /// Currently displayed page
    page: Page,

    summary: SummarySnapshot,
    summary_rows: Vec<InfoRow>,
    cpu_rows: Vec<InfoRow>,
    drives: Vec<DriveInfo>,

    summary_scroll: ScrollState,
    cpu_scroll: ScrollState,
    storage_scroll: ScrollState,
    cpu_window_scroll: ScrollState,

    menu: MenuPanel,
    quit_dialog: ConfirmQuitDialog,
    about_dialog: AboutDialog,

    always_on_top: bool,
    /// Detached CPU window requested with `--cpuinfo`
    cpu_window_open: bool,
    /// Set once the user confirmed the exit
    allow_close: bool,
    /// Status bar notice (language change)
    notice: Option<&'static str>,

    /// Timestamp of the last poll
    last_refresh: Instant,

    /// How often dynamic rows are refreshed
    refresh_interval: Duration,
}

impl AppState {
    /// Creates the shell and performs the first poll.
    ///
    /// # Arguments
    /// * `cc` - eframe creation context containing egui context
    /// * `app` - shared context
    /// * `open_cpu_window` - open the detached CPU window at startup
    pub fn new(cc: &eframe::CreationContext<'_>, app: AppContext, open_cpu_window: bool) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut s = Self {
            app,
            page: Page::Summary,
            summary: SummarySnapshot::default(),
            summary_rows: Vec::new(),
            cpu_rows: Vec::new(),
            drives: Vec::new(),
            summary_scroll: ScrollState::new(),
            cpu_scroll: ScrollState::new(),
            storage_scroll: ScrollState::new(),
            cpu_window_scroll: ScrollState::new(),
            menu: MenuPanel::default(),
            quit_dialog: ConfirmQuitDialog::default(),
            about_dialog: AboutDialog::default(),
            always_on_top: false,
            cpu_window_open: open_cpu_window,
            allow_close: false,
            notice: None,
            last_refresh: Instant::now(),
            refresh_interval: Duration::from_secs(1),
        };

        s.refresh_rows();
        s
    }

    /// Re-queries the CPU and summary rows.
    fn refresh_rows(&mut self) {
        self.summary = self.app.provider.summary_snapshot();
        self.summary_rows = summary_rows(&self.summary);
        self.cpu_rows = self.app.provider.cpu_info_rows();
        self.last_refresh = Instant::now();
    }

    /// Starts a background storage enumeration that repaints when done.
    fn request_storage(&mut self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        self.app
            .refresher
            .request(self.app.scanner.clone(), move || ctx.request_repaint());
    }

    /// Timer tick: dynamic rows always, storage only while its page is shown.
    fn tick(&mut self, ctx: &egui::Context) {
        self.refresh_rows();
        if self.page == Page::Storage {
            self.request_storage(ctx);
        }
    }

    fn show_page(&mut self, page: Page, ctx: &egui::Context) {
        tracing::debug!(?page, "page activated");
        self.page = page;
        match page {
            Page::Storage => self.request_storage(ctx),
            Page::Summary | Page::CpuInfo => self.refresh_rows(),
            Page::About => {}
        }
    }

    fn run_command(&mut self, command: ShellCommand, ctx: &egui::Context) {
        match command {
            ShellCommand::Show(page) => self.show_page(page, ctx),
            ShellCommand::Exit => self.quit_dialog.open(),
        }
    }

    fn set_always_on_top(&mut self, on: bool, ctx: &egui::Context) {
        self.always_on_top = on;
        let level = if on {
            egui::WindowLevel::AlwaysOnTop
        } else {
            egui::WindowLevel::Normal
        };
        ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(level));
    }

    /// Stores the chosen language. The running instance keeps its strings.
    fn set_language(&mut self, language: Language) {
        if self.app.settings.language == language {
            return;
        }
        self.app.settings.language = language;
        match self.app.settings.save(&self.app.settings_path) {
            Ok(()) => {
                tracing::info!(language = language.code(), "language saved");
                self.notice = Some(self.app.strings.language_restart);
            }
            Err(e) => tracing::warn!("failed to save settings: {}", e),
        }
    }

    fn modal_open(&self) -> bool {
        self.menu.is_open() || self.quit_dialog.is_open() || self.about_dialog.is_open()
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        let strings = self.app.strings;
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button(strings.menu_information, |ui| {
                    let mut on_top = self.always_on_top;
                    if ui.checkbox(&mut on_top, strings.menu_always_on_top).changed() {
                        self.set_always_on_top(on_top, ctx);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui
                        .add(egui::Button::new(strings.menu_exit).shortcut_text("Ctrl+W"))
                        .clicked()
                    {
                        self.quit_dialog.open();
                        ui.close_menu();
                    }
                });
                ui.menu_button(strings.menu_view, |ui| {
                    for page in Page::ALL {
                        if ui
                            .selectable_label(self.page == page, page.title(strings))
                            .clicked()
                        {
                            self.show_page(page, ctx);
                            ui.close_menu();
                        }
                    }
                });
                ui.menu_button(strings.menu_language, |ui| {
                    for language in Language::ALL {
                        if ui
                            .radio(self.app.settings.language == language, language.native_name())
                            .clicked()
                        {
                            self.set_language(language);
                            ui.close_menu();
                        }
                    }
                });
                ui.menu_button(strings.menu_help, |ui| {
                    if ui.button(strings.menu_about).clicked() {
                        self.about_dialog.open();
                        ui.close_menu();
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let button = ui.button(strings.menu_button);
                    if button.clicked() {
                        self.menu.open(egui::pos2(
                            button.rect.right() - PANEL_WIDTH,
                            button.rect.bottom() + 4.0,
                        ));
                    }
                });
            });
        });
    }

    fn status_bar(&self, ctx: &egui::Context) {
        let strings = self.app.strings;
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(self.page.title(strings))
                        .size(11.0)
                        .color(egui::Color32::from_gray(160)),
                );
                if self.page == Page::Storage && self.app.refresher.is_busy() {
                    ui.spinner();
                    ui.label(egui::RichText::new(strings.storage_loading).size(11.0));
                }
                if let Some(notice) = self.notice {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(egui::RichText::new(notice).size(11.0));
                    });
                }
            });
        });
    }

    fn summary_page(&mut self, ui: &mut egui::Ui) {
        let palette = self.app.palette;
        let strings = self.app.strings;
        let s = &self.summary;

        // Cards above the list
        let card_height = 50.0;
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            ui.add_space(12.0);
            let card_width = ((ui.available_width() - 12.0) / 3.0 - 36.0).max(80.0);
            stat_card(
                ui,
                card_width,
                card_height,
                "Memory in use",
                &format!("{} / {}", format_bytes(s.used_memory), format_bytes(s.total_memory)),
                palette.header_bg,
                palette.scroll_thumb,
            );
            stat_card(
                ui,
                card_width,
                card_height,
                "Uptime",
                &format_uptime(s.uptime_secs),
                palette.header_bg,
                palette.text,
            );
            stat_card(
                ui,
                card_width,
                card_height,
                "Logical processors",
                &s.logical_cores.to_string(),
                palette.header_bg,
                palette.text,
            );
        });
        ui.add_space(4.0);

        let keyboard = !self.modal_open();
        info_list(
            ui,
            "summary_list",
            &mut self.summary_scroll,
            &palette,
            strings,
            &self.summary_rows,
            keyboard,
        );
    }

    fn storage_page(&mut self, ui: &mut egui::Ui) {
        let palette = self.app.palette;
        let strings = self.app.strings;
        let font = egui::FontId::proportional(LIST_FONT_SIZE);
        let layout = ListLayout::for_font_height(ui.fonts(|f| f.row_height(&font)));
        let keyboard = !self.modal_open();
        let drives = &self.drives;

        ScrollableList::new("storage_list", &mut self.storage_scroll, &palette)
            .keyboard(keyboard)
            .show(
                ui,
                layout,
                drives.len(),
                |painter, rect| {
                    let headers = [
                        strings.column_drive,
                        strings.column_type,
                        strings.column_fs,
                        strings.column_label,
                        strings.column_total,
                        strings.column_free,
                    ]
                    .map(|h| (h, palette.text));
                    paint_cells(painter, rect, &STORAGE_COLUMNS, &headers, &font);
                },
                |painter, index, rect| {
                    let d = &drives[index];
                    let total = format_bytes(d.total_bytes);
                    let free = format_bytes(d.free_bytes);
                    let cells = [
                        (d.name.as_str(), palette.text),
                        (d.kind.as_str(), palette.value_text),
                        (d.filesystem.as_str(), palette.value_text),
                        (d.label.as_str(), palette.value_text),
                        (total.as_str(), palette.value_text),
                        (free.as_str(), palette.value_text),
                    ];
                    paint_cells(painter, rect, &STORAGE_COLUMNS, &cells, &font);
                },
            );
    }

    fn cpu_window(&mut self, ctx: &egui::Context) {
        let palette = self.app.palette;
        let strings = self.app.strings;
        let rows = &self.cpu_rows;
        let scroll = &mut self.cpu_window_scroll;
        let mut still_open = true;

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("cpu_info_window"),
            egui::ViewportBuilder::default()
                .with_title(strings.cpu_window_title)
                .with_inner_size([480.0, 360.0]),
            |ctx, _class| {
                egui::CentralPanel::default()
                    .frame(egui::Frame::none().fill(palette.page_bg))
                    .show(ctx, |ui| {
                        info_list(ui, "cpu_window_list", scroll, &palette, strings, rows, true);
                    });
                if ctx.input(|i| i.viewport().close_requested()) {
                    still_open = false;
                }
            },
        );

        if !still_open {
            tracing::debug!("cpu window closed");
            self.cpu_window_open = false;
        }
    }
}

/// Two-column Property/Value list.
fn info_list(
    ui: &mut egui::Ui,
    id: &str,
    scroll: &mut ScrollState,
    palette: &Palette,
    strings: &Strings,
    rows: &[InfoRow],
    keyboard: bool,
) {
    let font = egui::FontId::proportional(LIST_FONT_SIZE);
    let layout = ListLayout::for_font_height(ui.fonts(|f| f.row_height(&font)));
    ScrollableList::new(id, scroll, palette).keyboard(keyboard).show(
        ui,
        layout,
        rows.len(),
        |painter, rect| {
            let headers = [
                (strings.column_property, palette.text),
                (strings.column_value, palette.text),
            ];
            paint_cells(painter, rect, &INFO_COLUMNS, &headers, &font);
        },
        |painter, index, rect| {
            let row = &rows[index];
            let value_color = if row.is_dynamic {
                palette.scroll_thumb
            } else {
                palette.value_text
            };
            let cells = [
                (row.label.as_str(), palette.text),
                (row.value.as_str(), value_color),
            ];
            paint_cells(painter, rect, &INFO_COLUMNS, &cells, &font);
        },
    );
}

impl eframe::App for AppState {
    /// Main UI update function called every frame.
    /// Handles the polling timer, shortcuts, close requests and draws the active page.
    ///
    /// # Arguments
    /// * `ctx` - egui context for rendering
    /// * `_frame` - eframe frame (unused)
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Request repaint every second to keep the dynamic rows moving
        ctx.request_repaint_after(self.refresh_interval);

        if self.last_refresh.elapsed() >= self.refresh_interval {
            self.tick(ctx);
        }
        if let Some(drives) = self.app.refresher.poll() {
            tracing::debug!(rows = drives.len(), "storage rows updated");
            self.drives = drives;
        }

        // Window close button goes through the same confirmation as Exit
        if ctx.input(|i| i.viewport().close_requested()) && !self.allow_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.quit_dialog.open();
        }
        let ctrl_w = egui::KeyboardShortcut::new(egui::Modifiers::CTRL, egui::Key::W);
        if ctx.input_mut(|i| i.consume_shortcut(&ctrl_w)) {
            self.quit_dialog.open();
        }

        self.menu_bar(ctx);
        self.status_bar(ctx);

        let palette = self.app.palette;
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(palette.page_bg))
            .show(ctx, |ui| match self.page {
                Page::Summary => self.summary_page(ui),
                Page::CpuInfo => {
                    let keyboard = !self.modal_open();
                    info_list(
                        ui,
                        "cpu_list",
                        &mut self.cpu_scroll,
                        &palette,
                        self.app.strings,
                        &self.cpu_rows,
                        keyboard,
                    );
                }
                Page::Storage => self.storage_page(ui),
                Page::About => {
                    ui.add_space(40.0);
                    about_body(ui, self.app.strings);
                }
            });

        let strings = self.app.strings;
        if let Some(command) = self.menu.show(ctx, strings, &palette) {
            tracing::debug!(?command, "menu command");
            self.run_command(command, ctx);
        }

        self.about_dialog.show(ctx, strings, &palette);
        match self.quit_dialog.show(ctx, strings, &palette) {
            Some(QuitChoice::Quit) => {
                tracing::info!("exit confirmed");
                self.allow_close = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Some(QuitChoice::Stay) | None => {}
        }

        if self.cpu_window_open {
            self.cpu_window(ctx);
        }
    }
}
