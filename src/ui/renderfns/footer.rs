use crate::app::StatusLine;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the status bar: the last message if there is one, key hints otherwise
pub fn draw_footer(frame: &mut Frame, area: Rect, status: Option<&StatusLine>, hints: &[(&str, &str)]) {
  let line = match status {
    Some(StatusLine::Error(msg)) => Line::from(Span::styled(
      format!(" {}", msg),
      Style::default().fg(Color::Red),
    )),
    Some(StatusLine::Info(msg)) => Line::from(Span::styled(
      format!(" {}", msg),
      Style::default().fg(Color::Green),
    )),
    None => {
      let mut spans = vec![Span::raw(" ")];
      for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
          spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
          format!(":{}", action),
          Style::default().fg(Color::DarkGray),
        ));
      }
      Line::from(spans)
    }
  };

  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
