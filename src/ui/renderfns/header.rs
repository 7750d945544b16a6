use crate::api::Employee;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar: title, activity marker, source, active filter, shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  source: &str,
  filter: Option<&Employee>,
  busy: bool,
) {
  let filter_label = filter
    .map(Employee::full_name)
    .unwrap_or_else(|| "All Employees".to_string());

  let activity = if busy { "● " } else { "  " };

  let header = Line::from(vec![
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Cyan).bold()),
    Span::styled(activity, Style::default().fg(Color::Yellow)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", source), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", filter_label),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::raw("  "),
    Span::styled("<f>", Style::default().fg(Color::Cyan)),
    Span::styled(" filter", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(Color::Cyan)),
    Span::styled(" quit", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
