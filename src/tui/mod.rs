//! TUI module - terminal workout editor with ratatui

use std::cell::RefCell;
use std::io::{Stdout, stdout};

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use serde_json::Value;

use crate::edit::{Confirm, ConfirmPrompt, EditSession, SaveOutcome, WorkoutStore};
use crate::plan::format_duration;
use crate::workout::reps::{Reps, Thumb, reps_label};
use crate::workout::{CircuitField, Document, ExerciseField, Key, Payload, SectionKind};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// How the editor was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorExit {
    Saved,
    Cancelled,
}

/// One selectable line of the editor
#[derive(Debug, Clone, PartialEq)]
enum Row {
    Lines(Key),
    CircuitHeader(Key, usize),
    Field(Key, CircuitField),
    ExerciseName(Key, usize),
    ExerciseReps(Key, usize),
    Equipment(Key, usize),
    AddExercise(Key),
    Cardio(Key),
    AddCircuit,
}

#[derive(Debug, Clone)]
enum Mode {
    Normal,
    /// Typing into a text field. Warmup/cooldown are multi-line.
    Input { row: Row, buffer: String, multiline: bool },
    Reps { circuit: Key, index: usize, reps: Reps, thumb: Thumb },
}

/// Build the row list in editor order. The add-circuit button sits after
/// the last circuit, ahead of cardio and cooldown.
fn build_rows(doc: &Document) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut circuit_no = 0;
    let mut add_button_placed = false;

    for section in doc.display_order() {
        let Some(key) = section.key.clone() else {
            continue;
        };
        let past_circuits = matches!(section.kind, SectionKind::Cardio | SectionKind::Cooldown);
        if past_circuits && !add_button_placed {
            rows.push(Row::AddCircuit);
            add_button_placed = true;
        }

        match (&section.kind, &section.payload) {
            (SectionKind::Warmup | SectionKind::Cooldown, _) => rows.push(Row::Lines(key)),
            (SectionKind::Circuit, Payload::Circuit(circuit)) => {
                circuit_no += 1;
                rows.push(Row::CircuitHeader(key.clone(), circuit_no));
                for field in CircuitField::all() {
                    rows.push(Row::Field(key.clone(), *field));
                }
                for index in 0..circuit.exercises.len() {
                    rows.push(Row::ExerciseName(key.clone(), index));
                    rows.push(Row::ExerciseReps(key.clone(), index));
                    rows.push(Row::Equipment(key.clone(), index));
                }
                rows.push(Row::AddExercise(key));
            }
            (SectionKind::Circuit, _) => {
                circuit_no += 1;
                rows.push(Row::CircuitHeader(key, circuit_no));
            }
            (SectionKind::Cardio, _) => rows.push(Row::Cardio(key)),
            _ => {}
        }
    }

    if !add_button_placed {
        rows.push(Row::AddCircuit);
    }
    rows
}

fn lines_text(payload: &Payload) -> String {
    match payload {
        Payload::Lines(lines) => lines.join("\n"),
        Payload::Opaque(Value::String(s)) => s.clone(),
        Payload::Opaque(v) | Payload::Cardio(v) => v.to_string(),
        Payload::Circuit(_) => String::new(),
    }
}

fn row_label(doc: &Document, row: &Row) -> String {
    let section = |key: &Key| doc.section(key);
    let exercise = |key: &Key, index: usize| {
        section(key)
            .and_then(|s| s.payload.as_circuit())
            .and_then(|c| c.exercises.get(index))
    };

    match row {
        Row::Lines(key) => match section(key) {
            Some(s) => {
                let text = lines_text(&s.payload);
                let text = if text.is_empty() { "(empty)".to_string() } else { text.replace('\n', " | ") };
                format!("{}: {}", s.kind.title().to_uppercase(), text)
            }
            None => String::new(),
        },
        Row::CircuitHeader(key, number) => {
            let editable = section(key).is_some_and(|s| s.payload.as_circuit().is_some());
            if editable {
                format!("CIRCUIT {}", number)
            } else {
                format!("CIRCUIT {} (not editable)", number)
            }
        }
        Row::Field(key, field) => {
            let value = section(key)
                .and_then(|s| s.payload.as_circuit())
                .map(|c| field.get(c))
                .unwrap_or(0);
            let shown = match field {
                CircuitField::Rounds => value.to_string(),
                _ => format!("{} ({})", value, format_duration(value)),
            };
            format!("    {:<15} {}", field.label(), shown)
        }
        Row::ExerciseName(key, index) => match exercise(key, *index) {
            Some(ex) => format!("    {}. {}", index + 1, ex.name),
            None => String::new(),
        },
        Row::ExerciseReps(key, index) => match exercise(key, *index) {
            Some(ex) => format!("         {}", reps_label(ex.reps())),
            None => String::new(),
        },
        Row::Equipment(key, index) => match exercise(key, *index) {
            Some(ex) if ex.equipment().is_empty() => "         + Add Eq".to_string(),
            Some(ex) => {
                let chips: Vec<String> = ex.equipment().iter().map(|e| format!("[{}]", e)).collect();
                format!("         {} + Add Eq", chips.join(" "))
            }
            None => String::new(),
        },
        Row::AddExercise(_) => "    + ADD WORKOUT".to_string(),
        Row::Cardio(key) => match section(key).map(|s| s.payload.encode()) {
            Some(data) => {
                let kind = data.get("type").and_then(Value::as_str).unwrap_or("Cardio Session");
                match data.get("duration_minutes").and_then(Value::as_f64) {
                    Some(minutes) => format!("CARDIO: {} - {} min", kind, minutes),
                    None => format!("CARDIO: {}", kind),
                }
            }
            None => String::new(),
        },
        Row::AddCircuit => "+ ADD CIRCUIT".to_string(),
    }
}

/// Yes/no dialog drawn over the whole screen, blocking until answered
struct Dialog<'a> {
    terminal: RefCell<&'a mut Tui>,
}

impl Confirm for Dialog<'_> {
    fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let mut terminal = self.terminal.borrow_mut();
        loop {
            if terminal.draw(|frame| render_prompt(frame, prompt)).is_err() {
                return false;
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => return true,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return false,
                    _ => {}
                },
                Ok(_) => {}
                Err(_) => return false,
            }
        }
    }
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_prompt(frame: &mut Frame, prompt: &ConfirmPrompt) {
    let area = popup_area(frame.area(), 60, 7);
    let color = if prompt.destructive { Color::Red } else { Color::Yellow };
    let text = vec![
        Line::from(prompt.message.clone()),
        Line::from(""),
        Line::from("y: yes | n: no").style(Style::default().fg(Color::DarkGray)),
    ];
    let dialog = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(prompt.title.clone())
                .border_style(Style::default().fg(color)),
        );
    frame.render_widget(Clear, area);
    frame.render_widget(dialog, area);
}

/// App state for the workout editor
pub struct App<S> {
    title: String,
    session: EditSession<S>,
    selected: usize,
    mode: Mode,
    status: Option<String>,
    exit: Option<EditorExit>,
}

impl<S: WorkoutStore> App<S> {
    pub fn new(title: String, session: EditSession<S>) -> Self {
        Self {
            title,
            session,
            selected: 0,
            mode: Mode::Normal,
            status: None,
            exit: None,
        }
    }

    /// Run the editor until saved or cancelled
    pub async fn run(&mut self) -> Result<EditorExit> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal).await;

        restore_terminal()?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<EditorExit> {
        loop {
            if let Some(exit) = self.exit {
                return Ok(exit);
            }
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events(terminal).await?;
        }
    }

    fn rows(&self) -> Vec<Row> {
        build_rows(self.session.document())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let state = if self.session.is_saving() {
            Span::styled("Saving...", Style::default().fg(Color::Yellow))
        } else if self.session.is_dirty() {
            Span::styled("● unsaved", Style::default().fg(Color::Yellow).bold())
        } else {
            Span::styled("no changes", Style::default().fg(Color::DarkGray))
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled(format!("PT COMMAND - {}  ", self.title), Style::default().fg(Color::Cyan).bold()),
            state,
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Sections
        let doc = self.session.document();
        let items: Vec<ListItem> = self
            .rows()
            .iter()
            .map(|row| {
                let style = match row {
                    Row::CircuitHeader(..) | Row::Lines(_) | Row::Cardio(_) => Style::default().bold(),
                    Row::AddCircuit | Row::AddExercise(_) => Style::default().fg(Color::Green),
                    _ => Style::default(),
                };
                ListItem::new(row_label(doc, row)).style(style)
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Edit Workout"))
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");
        let mut list_state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, chunks[1], &mut list_state);

        // Footer: input line, reps editor, or key help
        let footer = match &self.mode {
            Mode::Input { buffer, multiline, .. } => {
                let hint = if *multiline { "Enter: new line | Tab: done | Esc: cancel" } else { "Enter: done | Esc: cancel" };
                Paragraph::new(buffer.replace('\n', " ⏎ "))
                    .block(Block::default().borders(Borders::ALL).title(hint))
            }
            Mode::Reps { reps, thumb, .. } => {
                let which = match thumb {
                    Thumb::Min => "min",
                    Thumb::Max => "max",
                };
                Paragraph::new(format!("{} (moving {})", reps_label(&reps.format()), which))
                    .block(Block::default().borders(Borders::ALL).title("←/→: adjust | Tab: switch | Enter: save | Esc: close"))
            }
            Mode::Normal => {
                let text = self.status.clone().unwrap_or_else(|| {
                    "↑/↓: move | Enter: edit | a: add exercise | c: add circuit | d: delete | x: remove eq | s: save | q: cancel".to_string()
                });
                Paragraph::new(text)
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().borders(Borders::ALL))
            }
        };
        frame.render_widget(footer, chunks[2]);
    }

    async fn handle_events(&mut self, terminal: &mut Tui) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let mode = std::mem::replace(&mut self.mode, Mode::Normal);
            self.mode = match mode {
                Mode::Normal => {
                    self.handle_normal(key.code, terminal).await;
                    std::mem::replace(&mut self.mode, Mode::Normal)
                }
                Mode::Input { row, buffer, multiline } => self.handle_input(key.code, row, buffer, multiline),
                Mode::Reps { circuit, index, reps, thumb } => self.handle_reps(key.code, circuit, index, reps, thumb),
            };
        }
        Ok(())
    }

    fn current_row(&self) -> Option<Row> {
        self.rows().get(self.selected).cloned()
    }

    async fn handle_normal(&mut self, code: KeyCode, terminal: &mut Tui) {
        let rows = self.rows();
        self.status = None;
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < rows.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => self.begin_edit(),
            KeyCode::Char('a') => {
                if let Some(key) = self.current_row().and_then(|r| circuit_of(&r)) {
                    self.session.document_mut().add_exercise(&key);
                }
            }
            KeyCode::Char('c') => {
                self.session.document_mut().add_circuit();
            }
            KeyCode::Char('d') => self.delete_current(terminal),
            KeyCode::Char('x') => {
                if let Some(Row::Equipment(key, index)) = self.current_row() {
                    let last = self
                        .session
                        .document()
                        .section(&key)
                        .and_then(|s| s.payload.as_circuit())
                        .and_then(|c| c.exercises.get(index))
                        .and_then(|ex| ex.equipment().last().cloned());
                    if let Some(tag) = last {
                        self.session.document_mut().remove_equipment(&key, index, &tag);
                    }
                }
            }
            KeyCode::Char('s') => match self.session.save().await {
                SaveOutcome::Saved => self.exit = Some(EditorExit::Saved),
                SaveOutcome::Skipped => self.status = Some("Nothing to save".to_string()),
                SaveOutcome::Failed(e) => self.status = Some(format!("Failed to save workout: {}", e)),
            },
            KeyCode::Char('q') | KeyCode::Esc => {
                let dialog = Dialog { terminal: RefCell::new(terminal) };
                if self.session.request_cancel(&dialog) {
                    self.exit = Some(EditorExit::Cancelled);
                }
            }
            _ => {}
        }
        let len = self.rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn begin_edit(&mut self) {
        let Some(row) = self.current_row() else {
            return;
        };
        let doc = self.session.document();
        let exercise = |key: &Key, index: usize| {
            doc.section(key)
                .and_then(|s| s.payload.as_circuit())
                .and_then(|c| c.exercises.get(index))
                .cloned()
        };

        self.mode = match &row {
            Row::Lines(key) => {
                let buffer = doc.section(key).map(|s| lines_text(&s.payload)).unwrap_or_default();
                Mode::Input { row: row.clone(), buffer, multiline: true }
            }
            Row::Field(key, field) => {
                let value = doc
                    .section(key)
                    .and_then(|s| s.payload.as_circuit())
                    .map(|c| field.get(c).to_string())
                    .unwrap_or_default();
                Mode::Input { row: row.clone(), buffer: value, multiline: false }
            }
            Row::ExerciseName(key, index) => match exercise(key, *index) {
                Some(ex) => Mode::Input { row: row.clone(), buffer: ex.name, multiline: false },
                None => Mode::Normal,
            },
            Row::ExerciseReps(key, index) => match exercise(key, *index) {
                Some(ex) => Mode::Reps {
                    circuit: key.clone(),
                    index: *index,
                    reps: Reps::parse(ex.reps()),
                    thumb: Thumb::Max,
                },
                None => Mode::Normal,
            },
            Row::Equipment(..) => Mode::Input { row: row.clone(), buffer: String::new(), multiline: false },
            Row::AddExercise(key) => {
                let key = key.clone();
                self.session.document_mut().add_exercise(&key);
                Mode::Normal
            }
            Row::AddCircuit => {
                self.session.document_mut().add_circuit();
                Mode::Normal
            }
            Row::CircuitHeader(..) | Row::Cardio(_) => Mode::Normal,
        };
    }

    fn delete_current(&mut self, terminal: &mut Tui) {
        match self.current_row() {
            Some(Row::CircuitHeader(key, _)) | Some(Row::Cardio(key)) => {
                let dialog = Dialog { terminal: RefCell::new(terminal) };
                self.session.remove_section_confirmed(&key, &dialog);
            }
            Some(Row::ExerciseName(key, index))
            | Some(Row::ExerciseReps(key, index))
            | Some(Row::Equipment(key, index)) => {
                self.session.document_mut().remove_exercise(&key, index);
            }
            _ => {}
        }
    }

    fn handle_input(&mut self, code: KeyCode, row: Row, mut buffer: String, multiline: bool) -> Mode {
        let commit = match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Enter if multiline => {
                buffer.push('\n');
                false
            }
            KeyCode::Enter | KeyCode::Tab => true,
            KeyCode::Backspace => {
                buffer.pop();
                false
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                false
            }
            _ => false,
        };
        if !commit {
            return Mode::Input { row, buffer, multiline };
        }

        let doc = self.session.document_mut();
        match row {
            Row::Lines(key) => doc.set_text_lines(&key, &buffer),
            Row::Field(key, field) => doc.set_circuit_field(&key, field, &buffer),
            Row::ExerciseName(key, index) => doc.update_exercise(&key, index, ExerciseField::Name(buffer)),
            Row::Equipment(key, index) => doc.add_equipment(&key, index, &buffer),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_reps(&mut self, code: KeyCode, circuit: Key, index: usize, mut reps: Reps, mut thumb: Thumb) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Enter => {
                self.session
                    .document_mut()
                    .update_exercise(&circuit, index, ExerciseField::Reps(reps.format()));
                return Mode::Normal;
            }
            KeyCode::Left | KeyCode::Char('h') => reps.nudge(thumb, -1),
            KeyCode::Right | KeyCode::Char('l') => reps.nudge(thumb, 1),
            KeyCode::Tab => {
                thumb = match thumb {
                    Thumb::Min => Thumb::Max,
                    Thumb::Max => Thumb::Min,
                }
            }
            _ => {}
        }
        Mode::Reps { circuit, index, reps, thumb }
    }
}

/// Circuit a row belongs to, for "add exercise"
fn circuit_of(row: &Row) -> Option<Key> {
    match row {
        Row::CircuitHeader(key, _)
        | Row::Field(key, _)
        | Row::ExerciseName(key, _)
        | Row::ExerciseReps(key, _)
        | Row::Equipment(key, _)
        | Row::AddExercise(key) => Some(key.clone()),
        _ => None,
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
