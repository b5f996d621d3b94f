//! Command-line interface: command handlers and terminal output.

pub mod commands;
pub mod ui;

pub use ui::Output;
