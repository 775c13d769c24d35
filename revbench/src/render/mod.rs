//! Syntax highlighting and diff styling, off the UI thread.
//!
//! The main loop posts a [`types::RenderRequest`] whenever the content behind
//! the editor panel changes; a dedicated `std::thread` running
//! [`worker::render_worker_loop`] answers with owned, `'static` lines.
pub mod types;
pub mod worker;
