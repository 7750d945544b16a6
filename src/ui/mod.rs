pub mod components;
mod renderfns;
mod views;

pub use renderfns::clamp_selection;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let session = app.session();
  let filter = session.selected_employee();
  renderfns::draw_header(
    frame,
    chunks[0],
    app.title(),
    app.source_label(),
    filter.as_ref(),
    session.busy(),
  );

  views::draw_transaction_list(frame, chunks[1], app);

  let hints = if app.picker().is_active() {
    vec![("j/k", "nav"), ("Enter", "select"), ("Esc", "cancel")]
  } else {
    let mut hints = vec![("j/k", "nav"), ("space", "approve"), ("f", "filter")];
    if session.has_more() {
      hints.push(("m", "more"));
    }
    hints.push(("r", "reload"));
    hints.push(("q", "quit"));
    hints
  };
  renderfns::draw_footer(frame, chunks[2], app.status(), &hints);

  app.picker().render_overlay(frame, chunks[1]);
}
