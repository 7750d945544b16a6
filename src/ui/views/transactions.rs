use crate::app::App;
use crate::data::FeedStatus;
use crate::ui::renderfns::{approval_color, approval_marker, format_amount, truncate};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Draw the transaction list with its "View More" row
pub fn draw_transaction_list(frame: &mut Frame, area: Rect, app: &App) {
  let session = app.session();
  let views = app.views();
  let loading = session.transactions_loading();
  let more_row = match session.feed_status() {
    _ if session.selected_employee().is_some() => None,
    FeedStatus::LoadingNextPage => Some((" Loading...", Style::default().fg(Color::DarkGray))),
    FeedStatus::HasMore if !views.is_empty() => {
      Some((" <m> View More", Style::default().fg(Color::Cyan)))
    }
    _ => None,
  };
  let show_more = more_row.is_some();

  let (list_area, more_area) = if show_more {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(area);
    (chunks[0], Some(chunks[1]))
  } else {
    (area, None)
  };

  let scope = session
    .selected_employee()
    .map(|e| format!(" [{}]", e.full_name()))
    .unwrap_or_default();
  let title = if loading {
    format!(" Transactions{} (loading...) ", scope)
  } else {
    format!(" Transactions{} ({}) ", scope, views.len())
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if views.is_empty() {
    let content = if loading || session.employees_loading() {
      "Loading..."
    } else {
      "No transactions."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, list_area);
    return;
  }

  let items: Vec<ListItem> = views
    .iter()
    .map(|view| {
      let t = &view.transaction;
      let pending = session.approval_pending(&t.id);

      let line = Line::from(vec![
        Span::styled(
          approval_marker(view.approved, pending),
          Style::default().fg(approval_color(view.approved)),
        ),
        Span::raw(" "),
        Span::styled(
          format!("{:<20}", truncate(&t.employee.full_name(), 20)),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::raw(format!("{:<28}", truncate(&t.merchant, 28))),
        Span::raw(" "),
        Span::styled(
          format!("{:>12}", format_amount(t.amount)),
          Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(t.date.to_string(), Style::default().fg(Color::DarkGray)),
      ]);
      ListItem::new(line)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(app.selected()));
  frame.render_stateful_widget(list, list_area, &mut state);

  if let (Some(more_area), Some((label, style))) = (more_area, more_row) {
    frame.render_widget(Paragraph::new(label).style(style), more_area);
  }
}
