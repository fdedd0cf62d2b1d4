mod feeders;
mod input;
mod status_log;
mod styles;
mod tui;
mod view;

pub use tui::{run_tui, Action, ScoutTui, TuiMsg, TuiState};
