use crate::api::FetchResult;
use crate::config::Config;
use crate::data::{ReviewSession, TransactionView};
use crate::event::{DataEvent, Event, EventHandler};
use crate::ui;
use crate::ui::components::{EmployeePicker, EmployeePickerEvent, KeyResult};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::future::Future;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Message shown in the status bar in place of the key hints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
  Info(String),
  Error(String),
}

/// Main application state
pub struct App {
  session: ReviewSession,

  /// Transactions as last drawn, refreshed after every event
  views: Vec<TransactionView>,

  /// Index into `views`
  selected: usize,

  picker: EmployeePicker,

  status: Option<StatusLine>,

  title: String,

  source_label: String,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let source = config.build_source()?;
    let title = config.title.clone().unwrap_or_else(|| "txreview".to_string());

    Ok(Self::with_session(
      ReviewSession::new(source),
      title,
      config.source_label(),
    ))
  }

  fn with_session(session: ReviewSession, title: String, source_label: String) -> Self {
    // Replaced by the event handler's sender in `run`
    let (tx, _rx) = mpsc::unbounded_channel();

    Self {
      session,
      views: Vec::new(),
      selected: 0,
      picker: EmployeePicker::new(),
      status: None,
      title,
      source_label,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    self.load_initial_data();

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Restore the terminal even if drawing failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn load_initial_data(&self) {
    info!(source = %self.source_label, "loading transactions");
    self.spawn_session_task(|session| async move {
      session.load_all_transactions().await?;
      Ok(DataEvent::Loaded)
    });
  }

  /// Run a session operation in the background and report its outcome as
  /// an event.
  fn spawn_session_task<F, Fut>(&self, task: F)
  where
    F: FnOnce(ReviewSession) -> Fut,
    Fut: Future<Output = FetchResult<DataEvent>> + Send + 'static,
  {
    let operation = task(self.session.clone());
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let event = operation
        .await
        .unwrap_or_else(|e| DataEvent::Failed(e.to_string()));
      let _ = tx.send(Event::Data(event));
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {}
      Event::Data(data_event) => self.handle_data_event(data_event),
    }
    self.refresh_views();
  }

  fn handle_data_event(&mut self, event: DataEvent) {
    match event {
      DataEvent::Loaded => {
        if matches!(self.status, Some(StatusLine::Error(_))) {
          self.status = None;
        }
      }
      DataEvent::ApprovalSaved {
        transaction_id,
        value,
      } => {
        let verb = if value { "approved" } else { "unapproved" };
        self.status = Some(StatusLine::Info(format!(
          "Transaction {} {}",
          transaction_id, verb
        )));
      }
      DataEvent::Failed(msg) => {
        error!(error = %msg, "session operation failed");
        self.status = Some(StatusLine::Error(msg));
      }
    }
  }

  fn refresh_views(&mut self) {
    self.views = self.session.transactions();
    self.selected = ui::clamp_selection(self.selected, self.views.len());
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.picker.handle_key(key) {
      KeyResult::Event(EmployeePickerEvent::Selected(employee)) => {
        self.select_employee(employee);
        return;
      }
      KeyResult::Event(EmployeePickerEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    // Any key dismisses the last message
    self.status = None;

    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('a') => self.toggle_selected_approval(),
      KeyCode::Char('f') | KeyCode::Char('/') => self.open_employee_picker(),
      KeyCode::Char('m') => self.view_more(),
      KeyCode::Char('r') => self.reload(),
      _ => {}
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.views.len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  fn open_employee_picker(&mut self) {
    let options = self.session.filter_options();
    if options.is_empty() {
      self.status = Some(StatusLine::Info("Employees are still loading".to_string()));
      return;
    }
    self
      .picker
      .show(options, self.session.selected_employee().as_ref());
  }

  fn select_employee(&mut self, employee: crate::api::Employee) {
    let current = self.session.selected_employee();
    let unchanged = match &current {
      Some(c) => c.id == employee.id,
      None => employee.is_empty(),
    };
    if unchanged {
      return;
    }

    self.selected = 0;
    self.spawn_session_task(move |session| async move {
      session.select_employee(&employee).await?;
      Ok(DataEvent::Loaded)
    });
  }

  fn view_more(&mut self) {
    if !self.session.has_more() || self.session.transactions_loading() {
      return;
    }
    self.spawn_session_task(|session| async move {
      session.view_more().await?;
      Ok(DataEvent::Loaded)
    });
  }

  fn reload(&mut self) {
    self.spawn_session_task(|session| async move {
      session.reload().await?;
      Ok(DataEvent::Loaded)
    });
  }

  fn toggle_selected_approval(&mut self) {
    let Some(view) = self.views.get(self.selected) else {
      return;
    };
    let transaction_id = view.transaction.id.clone();
    if self.session.approval_pending(&transaction_id) {
      return;
    }
    let value = !view.approved;

    self.spawn_session_task(move |session| async move {
      session.set_approval(&transaction_id, value).await?;
      Ok(DataEvent::ApprovalSaved {
        transaction_id,
        value,
      })
    });
  }

  // Accessors for UI rendering
  pub fn session(&self) -> &ReviewSession {
    &self.session
  }

  pub fn views(&self) -> &[TransactionView] {
    &self.views
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn picker(&self) -> &EmployeePicker {
    &self.picker
  }

  pub fn status(&self) -> Option<&StatusLine> {
    self.status.as_ref()
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn source_label(&self) -> &str {
    &self.source_label
  }
}
