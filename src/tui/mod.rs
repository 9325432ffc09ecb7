//! Ratatui-based terminal UI.
//!
//! The TUI renders the variant's form on the left and the latest prediction on
//! the right. Mushroom re-predicts after every change; house prices wait for `p`.

use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::pipeline::{Outcome, Session};
use crate::domain::{FieldKind, FieldSpec, FieldValue};
use crate::error::AppError;
use crate::report::{describe_kind, headline};
use crate::schema::{RawInputs, check_field};

/// Start the TUI.
pub fn run(session: Session, now: NaiveDate) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session, now);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    session: Session,
    now: NaiveDate,
    values: RawInputs,
    selected_field: usize,
    /// Text being typed into the selected field, if any.
    edit_buffer: Option<String>,
    status: String,
    outcome: Option<Outcome>,
    /// Message of the last failed request.
    failure: Option<String>,
}

impl App {
    fn new(session: Session, now: NaiveDate) -> Self {
        let values = session.schema().defaults();
        let mut app = Self {
            session,
            now,
            values,
            selected_field: 0,
            edit_buffer: None,
            status: String::new(),
            outcome: None,
            failure: None,
        };
        if app.session.variant().predicts_on_change() {
            app.predict();
        } else {
            app.status = "Fill in the form and press p to predict.".to_string();
        }
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.edit_buffer.is_some() {
            self.handle_edit(code);
            return false;
        }

        let field_count = self.session.schema().fields().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < field_count {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => {
                let field = self.selected();
                let current = self.values.get(&field.name).map(|v| v.to_string()).unwrap_or_default();
                self.status = format!("Editing {} ({}). Enter to apply, Esc to cancel.", field.label, describe_kind(field));
                self.edit_buffer = Some(current);
            }
            KeyCode::Char('p') => self.predict(),
            KeyCode::Char('r') => {
                self.values = self.session.schema().defaults();
                self.outcome = None;
                self.failure = None;
                self.status = "Form reset to defaults.".to_string();
                self.after_change();
            }
            _ => {}
        }
        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let Some(buffer) = self.edit_buffer.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.edit_buffer = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let text = std::mem::take(buffer);
                self.edit_buffer = None;
                self.apply_text(text);
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
    }

    /// Store typed text; numeric kinds are coerced when the text is valid.
    fn apply_text(&mut self, text: String) {
        let field = self.selected().clone();
        let raw = FieldValue::Text(text);
        match check_field(&field, &raw) {
            Ok(value) => {
                self.status = format!("{}: {value}", field.label);
                self.values.insert(field.name, value);
            }
            Err(err) => {
                // Keep what was typed so the next request reports it.
                self.status = err.to_string();
                self.values.insert(field.name, raw);
            }
        }
        self.after_change();
    }

    fn adjust_field(&mut self, delta: i64) {
        let field = self.selected().clone();
        let current = self.values.get(&field.name).cloned().unwrap_or_else(|| field.default.clone());
        let next = match &field.kind {
            FieldKind::Choice { options } => {
                let idx = current
                    .as_str()
                    .and_then(|s| options.iter().position(|o| o == s))
                    .unwrap_or(0) as i64;
                let len = options.len() as i64;
                FieldValue::Text(options[(idx + delta).rem_euclid(len) as usize].clone())
            }
            FieldKind::Integer { min, max } => {
                let base = current.as_f64().or_else(|| field.default.as_f64()).unwrap_or(0.0) as i64;
                let mut v = base.saturating_add(delta);
                if let Some(lo) = min {
                    v = v.max(*lo);
                }
                if let Some(hi) = max {
                    v = v.min(*hi);
                }
                FieldValue::Integer(v)
            }
            FieldKind::Real { min, max } => {
                let mut v = current.as_f64().or_else(|| field.default.as_f64()).unwrap_or(0.0) + delta as f64;
                if let Some(lo) = min {
                    v = v.max(*lo);
                }
                if let Some(hi) = max {
                    v = v.min(*hi);
                }
                FieldValue::Real(v)
            }
            FieldKind::Text => {
                self.status = "Press Enter to edit text.".to_string();
                return;
            }
        };
        self.status = format!("{}: {next}", field.label);
        self.values.insert(field.name, next);
        self.after_change();
    }

    fn after_change(&mut self) {
        if self.session.variant().predicts_on_change() {
            self.predict();
        } else if self.outcome.is_some() || self.failure.is_some() {
            // A shown result must describe the inputs on screen.
            self.outcome = None;
            self.failure = None;
            self.status = "Inputs changed, press p to predict.".to_string();
        }
    }

    fn predict(&mut self) {
        match self.session.predict(&self.values, self.now) {
            Ok(outcome) => {
                self.status = headline(self.session.variant(), &outcome.result);
                self.outcome = Some(outcome);
                self.failure = None;
            }
            Err(err) => {
                log::warn!("prediction failed at {} stage", err.stage());
                self.status = err.to_string();
                self.outcome = None;
                self.failure = Some(err.to_string());
            }
        }
    }

    fn selected(&self) -> &FieldSpec {
        &self.session.schema().fields()[self.selected_field]
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let variant = self.session.variant();
        let lines = vec![
            Line::from(Span::styled(
                variant.title(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::raw(variant.intro())),
            Line::from(Span::styled(
                format!(
                    "as of: {} | model: {} | anomalies: {:?}",
                    self.now,
                    self.session.model().describe(),
                    self.session.policy()
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        self.draw_form(frame, chunks[0]);
        self.draw_result(frame, chunks[1]);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let fields = self.session.schema().fields();
        let width = fields.iter().map(|f| f.label.len()).max().unwrap_or(0);

        let items: Vec<ListItem> = fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let value = match (&self.edit_buffer, idx == self.selected_field) {
                    (Some(buffer), true) => format!("{buffer}_"),
                    _ => self.values.get(&field.name).map(|v| v.to_string()).unwrap_or_default(),
                };
                ListItem::new(format!("{:<width$}  {value}", field.label))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Inputs").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Prediction").borders(Borders::ALL);

        let mut lines: Vec<Line> = Vec::new();
        match (&self.outcome, &self.failure) {
            (Some(outcome), _) => {
                lines.push(Line::from(Span::styled(
                    headline(self.session.variant(), &outcome.result),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::raw(""));
                let width = outcome.record.names().map(str::len).max().unwrap_or(0);
                for (name, value) in outcome.record.iter() {
                    lines.push(Line::from(Span::styled(
                        format!("{name:<width$}  {value}"),
                        Style::default().fg(Color::Gray),
                    )));
                }
                for anomaly in outcome.record.anomalies() {
                    lines.push(Line::from(Span::styled(
                        format!("warning: {anomaly}"),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            (None, Some(message)) => {
                lines.push(Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Red))));
            }
            (None, None) => {
                lines.push(Line::from(Span::styled(
                    "No prediction yet.",
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        let p = Paragraph::new(Text::from(lines)).block(block).wrap(Wrap { trim: false });
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = if self.edit_buffer.is_some() {
            "type value  Enter apply  Esc cancel"
        } else {
            "↑/↓ select  ←/→ adjust  Enter edit  p predict  r reset  q quit"
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}
