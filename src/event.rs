use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh while requests are in flight
  Tick,
  /// A background session operation finished
  Data(DataEvent),
}

/// Outcome of a background session operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataEvent {
  /// Employees or transactions changed
  Loaded,
  /// The remote confirmed an approval change
  ApprovalSaved { transaction_id: String, value: bool },
  /// The operation failed; the message is shown in the status bar
  Failed(String),
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Terminal polling blocks, keep it off the async workers
    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
      let sent = if event::poll(tick_rate).unwrap_or(false) {
        match event::read() {
          Ok(CrosstermEvent::Key(key)) => input_tx.send(Event::Key(key)),
          _ => Ok(()),
        }
      } else {
        input_tx.send(Event::Tick)
      };

      if sent.is_err() {
        break;
      }
    });

    Self { tx, rx }
  }

  /// Sender for background tasks to report back on
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
