// GUI module organization and public exports

// Main application state and UI logic
mod app;
// Reusable UI components (stat cards, column cells)
pub mod components;
// About and Confirm Exit dialogs
pub mod dialogs;
// Popup menu panel and shell commands
pub mod menu_panel;
// Scroll state and the custom-painted list widget
pub mod scroll_list;
// Colours and translated strings
pub mod theme;

// Export the shell for use in main.rs
pub use app::{AppContext, AppState};
