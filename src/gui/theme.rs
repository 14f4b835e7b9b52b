// Colours, metrics and the interface string table

use crate::config::Language;
use eframe::egui::Color32;

/// Colours used by the custom-painted pages, menu panel and dialogs.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub page_bg: Color32,
    pub row_alt_bg: Color32,
    pub header_bg: Color32,
    pub text: Color32,
    pub value_text: Color32,
    pub grid: Color32,
    pub scroll_track: Color32,
    pub scroll_thumb: Color32,
    pub menu_bg: Color32,
    pub menu_pill: Color32,
    pub menu_hover: Color32,
    pub button_ok: Color32,
    pub button_yes: Color32,
    pub button_no: Color32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            page_bg: Color32::from_rgb(44, 62, 80),
            row_alt_bg: Color32::from_rgb(38, 52, 68),
            header_bg: Color32::from_rgb(34, 48, 60),
            text: Color32::from_rgb(236, 240, 241),
            value_text: Color32::from_rgb(160, 170, 180),
            grid: Color32::from_rgb(28, 40, 52),
            scroll_track: Color32::from_rgb(34, 48, 60),
            scroll_thumb: Color32::from_rgb(110, 170, 90),
            menu_bg: Color32::from_rgb(34, 48, 60),
            menu_pill: Color32::from_rgb(44, 62, 80),
            menu_hover: Color32::from_rgb(60, 84, 106),
            button_ok: Color32::from_rgb(39, 174, 96),
            button_yes: Color32::from_rgb(128, 128, 0),
            button_no: Color32::from_rgb(52, 73, 94),
        }
    }
}

/// Inner padding of list pages
pub const PAGE_MARGIN: f32 = 12.0;
/// Extra space added below the last row
pub const PAGE_BOTTOM_SLACK: f32 = 28.0;
/// Padding added to the font height to get the row height
pub const ROW_PADDING: f32 = 8.0;
pub const SCROLLBAR_WIDTH: f32 = 8.0;
pub const SCROLLBAR_INSET: f32 = 6.0;
pub const THUMB_MIN_HEIGHT: f32 = 20.0;

/// Translated interface text. Info row labels come from the probes and
/// are not translated.
#[derive(Clone, Copy, Debug)]
pub struct Strings {
    pub app_title: &'static str,
    pub menu_information: &'static str,
    pub menu_always_on_top: &'static str,
    pub menu_exit: &'static str,
    pub menu_view: &'static str,
    pub menu_language: &'static str,
    pub menu_help: &'static str,
    pub menu_about: &'static str,
    pub menu_button: &'static str,
    pub page_summary: &'static str,
    pub page_cpu: &'static str,
    pub page_storage: &'static str,
    pub page_about: &'static str,
    pub column_drive: &'static str,
    pub column_type: &'static str,
    pub column_fs: &'static str,
    pub column_label: &'static str,
    pub column_total: &'static str,
    pub column_free: &'static str,
    pub column_property: &'static str,
    pub column_value: &'static str,
    pub storage_loading: &'static str,
    pub language_restart: &'static str,
    pub quit_title: &'static str,
    pub quit_question: &'static str,
    pub yes: &'static str,
    pub no: &'static str,
    pub ok: &'static str,
    pub about_title: &'static str,
    pub about_version: &'static str,
    pub about_license: &'static str,
    pub about_source: &'static str,
    pub about_contact: &'static str,
    pub cpu_window_title: &'static str,
}

const ENGLISH: Strings = Strings {
    app_title: "WinInfoApp",
    menu_information: "Information",
    menu_always_on_top: "Always on top",
    menu_exit: "Exit",
    menu_view: "View",
    menu_language: "Language",
    menu_help: "Help",
    menu_about: "About",
    menu_button: "☰ Menu",
    page_summary: "Summary",
    page_cpu: "CPU Info",
    page_storage: "Storage",
    page_about: "About",
    column_drive: "Drive",
    column_type: "Type",
    column_fs: "FS",
    column_label: "Label",
    column_total: "Total",
    column_free: "Free",
    column_property: "Property",
    column_value: "Value",
    storage_loading: "Reading drives…",
    language_restart: "The new language is used after a restart.",
    quit_title: "Confirm Exit",
    quit_question: "Do you really want to quit?",
    yes: "Yes",
    no: "No",
    ok: "OK",
    about_title: "About WinInfoApp",
    about_version: "Version",
    about_license: "License: GPL v2",
    about_source: "Source code",
    about_contact: "Contact",
    cpu_window_title: "CPU Information",
};

const NORWEGIAN: Strings = Strings {
    app_title: "WinInfoApp",
    menu_information: "Informasjon",
    menu_always_on_top: "Alltid øverst",
    menu_exit: "Avslutt",
    menu_view: "Vis",
    menu_language: "Språk",
    menu_help: "Hjelp",
    menu_about: "Om",
    menu_button: "☰ Meny",
    page_summary: "Sammendrag",
    page_cpu: "Prosessor",
    page_storage: "Lagring",
    page_about: "Om",
    column_drive: "Stasjon",
    column_type: "Type",
    column_fs: "FS",
    column_label: "Etikett",
    column_total: "Totalt",
    column_free: "Ledig",
    column_property: "Egenskap",
    column_value: "Verdi",
    storage_loading: "Leser stasjoner…",
    language_restart: "Det nye språket brukes etter omstart.",
    quit_title: "Bekreft avslutning",
    quit_question: "Vil du virkelig avslutte?",
    yes: "Ja",
    no: "Nei",
    ok: "OK",
    about_title: "Om WinInfoApp",
    about_version: "Versjon",
    about_license: "Lisens: GPL v2",
    about_source: "Kildekode",
    about_contact: "Kontakt",
    cpu_window_title: "Prosessorinformasjon",
};

/// String table for the given language.
pub fn strings(language: Language) -> &'static Strings {
    match language {
        Language::EnglishGb => &ENGLISH,
        Language::NorwegianBokmal => &NORWEGIAN,
    }
}
