//! Terminal surface for the console.
//!
//! `AppState` holds everything the renderer needs; input mutates it and
//! hands long-running work to the console runtime as [`app::Action`]s.

pub(crate) mod app;
pub(crate) mod terminal;
pub(crate) mod theme;
mod format;
mod input;
mod render;

pub(crate) use app::AppState;
pub(crate) use input::handle_key_event;
pub(crate) use render::draw_ui;
pub(crate) use terminal::{restore_terminal, setup_terminal};
