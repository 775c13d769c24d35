//! Event bus for revbench.
//!
//! Terminal input, timer ticks, and background results (assistant replies,
//! imports, rendered views) are normalised into one `AppEvent` enum and sent
//! over a tokio unbounded MPSC channel that the main loop drains.
//!
//! Two independent intervals drive the render and logic cycles:
//! - **Render interval** (33 ms ≈ 30 FPS) triggers a `terminal.draw()` call.
//! - **Tick interval** (250 ms) expires notices and flushes pending saves.

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use revbench_core::types::Project;
use revbench_core::Action;
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::render::types::RenderedView;

/// All events the application can receive from any source.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press (`KeyEventKind::Press` only).
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    Tick,
    Render,
    /// A workbench transition produced off the main loop, typically an
    /// assistant `*Resolved` / `*Failed` action.
    Apply(Box<Action>),
    /// A repository or folder import finished.
    Imported(Result<Box<Project>, String>),
    /// Highlighted lines from the render thread.
    Rendered(Box<RenderedView>),
}

/// Holds the sender and receiver ends of the unified event channel.
pub struct EventHandler {
    /// Cloned into every background task that produces events.
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the task that feeds terminal input and timer ticks into `tx`.
///
/// The crossterm stream is fused so a terminated stream is never polled again
/// inside `select!`. Only key presses are forwarded; release and repeat
/// events would double-fire on Windows. Send errors mean the receiver is gone
/// and are ignored.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = tick_tick => {
                    if tx.send(AppEvent::Tick).is_err() {
                        break;
                    }
                }
                _ = render_tick => {
                    let _ = tx.send(AppEvent::Render);
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            let _ = tx.send(AppEvent::Key(key));
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Ok(Event::Mouse(mouse))) => {
                            let _ = tx.send(AppEvent::Mouse(mouse));
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}
