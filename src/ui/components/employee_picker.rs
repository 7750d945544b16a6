use super::KeyResult;
use crate::api::Employee;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by the employee picker that the app needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeePickerEvent {
  /// An entry was chosen; the empty employee means "All Employees"
  Selected(Employee),
  /// Picker cancelled
  Cancelled,
}

/// Overlay for choosing the employee filter
#[derive(Debug, Clone, Default)]
pub struct EmployeePicker {
  active: bool,
  options: Vec<Employee>,
  selected: usize,
}

impl EmployeePicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker with `options`, highlighting `current` if present.
  pub fn show(&mut self, options: Vec<Employee>, current: Option<&Employee>) {
    self.selected = current
      .and_then(|c| options.iter().position(|o| o.id == c.id))
      .unwrap_or(0);
    self.options = options;
    self.active = true;
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.options.clear();
    self.selected = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<EmployeePickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(EmployeePickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let event = match self.options.get(self.selected) {
          Some(employee) => EmployeePickerEvent::Selected(employee.clone()),
          None => EmployeePickerEvent::Cancelled,
        };
        self.hide();
        KeyResult::Event(event)
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.options.is_empty() {
          self.selected = (self.selected + 1) % self.options.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.options.is_empty() {
          self.selected = if self.selected == 0 {
            self.options.len() - 1
          } else {
            self.selected - 1
          };
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the picker overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active || self.options.is_empty() {
      return;
    }

    let names: Vec<String> = self.options.iter().map(Employee::full_name).collect();
    let max_name_len = names.iter().map(|n| n.chars().count()).max().unwrap_or(10);
    let width = (max_name_len as u16 + 6)
      .max(24)
      .min(area.width.saturating_sub(4));
    let height = (names.len() as u16 + 2)
      .max(3)
      .min(area.height.saturating_sub(2));

    // Center the overlay
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Filter by employee ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = self
      .options
      .iter()
      .zip(names)
      .map(|(employee, name)| {
        let style = if employee.is_empty() {
          Style::default().fg(Color::White).italic()
        } else {
          Style::default().fg(Color::Cyan)
        };
        ListItem::new(Line::from(Span::styled(name, style)))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn options() -> Vec<Employee> {
    vec![
      Employee::empty(),
      Employee {
        id: "e1".to_string(),
        first_name: "James".to_string(),
        last_name: "Smith".to_string(),
      },
      Employee {
        id: "e2".to_string(),
        first_name: "Mary".to_string(),
        last_name: "Johnson".to_string(),
      },
    ]
  }

  #[test]
  fn test_inactive_picker_ignores_keys() {
    let mut picker = EmployeePicker::new();
    assert_eq!(picker.handle_key(key(KeyCode::Enter)), KeyResult::NotHandled);
  }

  #[test]
  fn test_select_wraps_and_emits_employee() {
    let mut picker = EmployeePicker::new();
    picker.show(options(), None);

    assert_eq!(picker.handle_key(key(KeyCode::Char('k'))), KeyResult::Handled);
    match picker.handle_key(key(KeyCode::Enter)) {
      KeyResult::Event(EmployeePickerEvent::Selected(e)) => assert_eq!(e.id, "e2"),
      other => panic!("unexpected result: {:?}", other),
    }
    assert!(!picker.is_active());
  }

  #[test]
  fn test_show_highlights_current_filter() {
    let mut picker = EmployeePicker::new();
    let all = options();
    picker.show(all.clone(), Some(&all[1]));

    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(EmployeePickerEvent::Selected(all[1].clone()))
    );
  }

  #[test]
  fn test_escape_cancels() {
    let mut picker = EmployeePicker::new();
    picker.show(options(), None);

    assert_eq!(
      picker.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(EmployeePickerEvent::Cancelled)
    );
    assert!(!picker.is_active());
  }
}
