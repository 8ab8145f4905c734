//! Ratatui front end: the menu, list screens, and input popups.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
