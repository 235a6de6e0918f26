//! Interactive terminal UI over the active watch list.

pub mod app;
pub mod events;
pub mod models;
pub mod rendering;
pub mod utils;

pub use events::run_tui;
