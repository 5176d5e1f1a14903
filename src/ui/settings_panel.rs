use crate::data::{Persistable, Settings};
use crate::error::SettingsError;
use anyhow::Result;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyModifiers};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io::Stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::warn;

/// Status messages fade after this long.
const STATUS_TTL: Duration = Duration::from_secs(2);

const BASIC_LABELS: [&str; 4] = ["본부", "팀명", "이름", "자동입력 사용"];
const ENABLED_ROW: usize = 3;
const VACATION_LABELS: [&str; 2] = ["휴가 시작일", "휴가 종료일"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Section {
    #[default]
    Basic,
    Presets,
    Vacation,
}

impl Section {
    fn next(self) -> Self {
        match self {
            Section::Basic => Section::Presets,
            Section::Presets => Section::Vacation,
            Section::Vacation => Section::Basic,
        }
    }

    fn prev(self) -> Self {
        match self {
            Section::Basic => Section::Vacation,
            Section::Presets => Section::Basic,
            Section::Vacation => Section::Presets,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Section::Basic => "기본 정보",
            Section::Presets => "휴가사유 프리셋",
            Section::Vacation => "휴가 기간",
        }
    }
}

/// The row being typed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edit {
    Basic(usize),
    NewPreset,
    Preset(usize),
    Vacation(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusKind {
    Success,
    Error,
}

#[derive(Clone, Debug)]
struct Status {
    message: String,
    kind: StatusKind,
    shown_at: Instant,
}

pub struct App {
    pub settings: Settings,
    data_dir: PathBuf,
    section: Section,
    cursor: usize,
    edit: Option<Edit>,
    input_buffer: String,
    status: Option<Status>,
}

impl App {
    pub fn new(settings: Settings, data_dir: PathBuf) -> Self {
        App {
            settings,
            data_dir,
            section: Section::Basic,
            cursor: 0,
            edit: None,
            input_buffer: String::new(),
            status: None,
        }
    }

    fn row_count(&self) -> usize {
        match self.section {
            Section::Basic => BASIC_LABELS.len(),
            Section::Presets => self.settings.reason_presets.len(),
            Section::Vacation => VACATION_LABELS.len(),
        }
    }

    fn success(&mut self, message: &str) {
        self.status = Some(Status {
            message: message.to_string(),
            kind: StatusKind::Success,
            shown_at: Instant::now(),
        });
    }

    fn error(&mut self, message: &str) {
        self.status = Some(Status {
            message: message.to_string(),
            kind: StatusKind::Error,
            shown_at: Instant::now(),
        });
    }

    fn visible_status(&self, now: Instant) -> Option<&Status> {
        self.status
            .as_ref()
            .filter(|s| now.duration_since(s.shown_at) < STATUS_TTL)
    }

    /// Writes the store; reports a failure in the status line.
    fn persist(&mut self, success: &str) {
        match self.settings.save_to(&self.data_dir) {
            Ok(()) => self.success(success),
            Err(e) => {
                warn!(error = %e, "settings not saved");
                self.error("저장에 실패했습니다.");
            }
        }
    }

    fn report(&mut self, result: Result<(), SettingsError>, success: &str) {
        match result {
            Ok(()) => self.persist(success),
            Err(e) => self.error(&e.to_string()),
        }
    }

    /// Returns true when the panel should close.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return true;
        }
        match self.edit {
            Some(edit) => {
                self.handle_edit_key(edit, code);
                false
            }
            None => self.handle_browse_key(code),
        }
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => return true,
            KeyCode::Tab => {
                self.section = self.section.next();
                self.cursor = 0;
            }
            KeyCode::BackTab => {
                self.section = self.section.prev();
                self.cursor = 0;
            }
            KeyCode::Up => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                }
            }
            KeyCode::Down => {
                if self.cursor + 1 < self.row_count() {
                    self.cursor += 1;
                }
            }
            _ => match self.section {
                Section::Basic => self.handle_basic_key(code),
                Section::Presets => self.handle_preset_key(code),
                Section::Vacation => self.handle_vacation_key(code),
            },
        }
        false
    }

    fn handle_basic_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char(' ') if self.cursor == ENABLED_ROW => {
                self.settings.enabled = !self.settings.enabled;
                self.persist("기본 정보가 저장되었습니다!");
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                self.input_buffer = match self.cursor {
                    0 => self.settings.department.clone(),
                    1 => self.settings.team.clone(),
                    _ => self.settings.name.clone(),
                };
                self.edit = Some(Edit::Basic(self.cursor));
            }
            _ => {}
        }
    }

    fn handle_preset_key(&mut self, code: KeyCode) {
        let len = self.settings.reason_presets.len();
        match code {
            KeyCode::Char('a') => {
                self.input_buffer.clear();
                self.edit = Some(Edit::NewPreset);
            }
            KeyCode::Enter | KeyCode::Char('e') if self.cursor < len => {
                self.input_buffer = self.settings.reason_presets[self.cursor].clone();
                self.edit = Some(Edit::Preset(self.cursor));
            }
            KeyCode::Delete | KeyCode::Char('x') if self.cursor < len => {
                let result = self.settings.delete_preset(self.cursor).map(|_| ());
                if self.cursor > 0 && self.cursor >= self.settings.reason_presets.len() {
                    self.cursor -= 1;
                }
                self.report(result, "프리셋이 삭제되었습니다.");
            }
            KeyCode::Char('d') | KeyCode::Char(' ') if self.cursor < len => {
                let result = self.settings.toggle_default(self.cursor).map(|default| {
                    if default.is_some() { "기본값으로 설정되었습니다." } else { "기본값이 해제되었습니다." }
                });
                match result {
                    Ok(message) => self.persist(message),
                    Err(e) => self.error(&e.to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_vacation_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Enter | KeyCode::Char('e')) {
            let current = if self.cursor == 0 {
                &self.settings.vacation_start_date
            } else {
                &self.settings.vacation_end_date
            };
            self.input_buffer = current.clone().unwrap_or_default();
            self.edit = Some(Edit::Vacation(self.cursor));
        }
    }

    fn handle_edit_key(&mut self, edit: Edit, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.input_buffer.push(c),
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.edit = None;
            }
            KeyCode::Enter => {
                let value = std::mem::take(&mut self.input_buffer);
                if !self.commit_edit(edit, &value) {
                    // Keep the row open so the user can fix the value.
                    self.input_buffer = value;
                    return;
                }
                self.edit = None;
            }
            _ => {}
        }
    }

    /// Applies an edit. Returns false when validation rejected it.
    fn commit_edit(&mut self, edit: Edit, value: &str) -> bool {
        let result = match edit {
            Edit::Basic(row) => {
                let s = &self.settings;
                let (mut department, mut team, mut name) =
                    (s.department.clone(), s.team.clone(), s.name.clone());
                match row {
                    0 => department = value.to_string(),
                    1 => team = value.to_string(),
                    _ => name = value.to_string(),
                }
                let enabled = self.settings.enabled;
                self.settings.save_basic(&department, &team, &name, enabled);
                self.persist("기본 정보가 저장되었습니다!");
                return true;
            }
            Edit::NewPreset => self.settings.add_preset(value).map(|index| {
                self.cursor = index;
                "프리셋이 추가되었습니다!"
            }),
            Edit::Preset(index) => self
                .settings
                .edit_preset(index, value)
                .map(|()| "프리셋이 수정되었습니다!"),
            Edit::Vacation(row) => {
                let start = self.settings.vacation_start_date.clone().unwrap_or_default();
                let end = self.settings.vacation_end_date.clone().unwrap_or_default();
                let (start, end) = if row == 0 { (value.to_string(), end) } else { (start, value.to_string()) };
                self.settings
                    .set_vacation_range(&start, &end)
                    .map(|()| "휴가 기간이 저장되었습니다!")
            }
        };
        match result {
            Ok(message) => {
                self.persist(message);
                true
            }
            Err(e) => {
                self.error(&e.to_string());
                false
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────────

    pub fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // section tabs
                Constraint::Min(5),    // section table
                Constraint::Length(2), // input or key hints
                Constraint::Length(1), // status
            ])
            .split(f.area());

        self.render_tabs(f, chunks[0]);
        match self.section {
            Section::Basic => self.render_basic(f, chunks[1]),
            Section::Presets => self.render_presets(f, chunks[1]),
            Section::Vacation => self.render_vacation(f, chunks[1]),
        }
        self.render_hints(f, chunks[2]);

        if let Some(status) = self.visible_status(Instant::now()) {
            let color = match status.kind {
                StatusKind::Success => Color::Green,
                StatusKind::Error => Color::Red,
            };
            f.render_widget(
                Paragraph::new(Span::styled(status.message.clone(), Style::default().fg(color))),
                chunks[3],
            );
        }
    }

    fn render_tabs(&self, f: &mut Frame, area: Rect) {
        let spans: Vec<Span> = [Section::Basic, Section::Presets, Section::Vacation]
            .iter()
            .flat_map(|s| {
                let style = if *s == self.section {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                [Span::styled(format!(" {} ", s.title()), style), Span::raw(" ")]
            })
            .collect();
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// The value cell of a row, showing the input buffer while it is edited.
    fn cell_value(&self, edit: Edit, current: &str) -> String {
        if self.edit == Some(edit) {
            format!("{}_", self.input_buffer)
        } else {
            current.to_string()
        }
    }

    fn render_basic(&self, f: &mut Frame, area: Rect) {
        let s = &self.settings;
        let values = [
            s.department.as_str(),
            s.team.as_str(),
            s.name.as_str(),
            if s.enabled { "켜짐" } else { "꺼짐" },
        ];
        let rows: Vec<Row> = BASIC_LABELS
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (label, value))| {
                Row::new(vec![
                    Cell::from(format!("  {label}")),
                    Cell::from(self.cell_value(Edit::Basic(i), value)),
                ])
            })
            .collect();
        self.render_table(f, area, rows, ["항목", "값"], [Constraint::Length(18), Constraint::Min(30)]);
    }

    fn render_presets(&self, f: &mut Frame, area: Rect) {
        let mut rows: Vec<Row> = self
            .settings
            .reason_presets
            .iter()
            .enumerate()
            .map(|(i, preset)| {
                let is_default = self.settings.default_preset_index == Some(i);
                Row::new(vec![
                    Cell::from(if is_default { "★" } else { "☆" }),
                    Cell::from(self.cell_value(Edit::Preset(i), preset)),
                ])
            })
            .collect();
        if self.edit == Some(Edit::NewPreset) {
            rows.push(Row::new(vec![
                Cell::from("+"),
                Cell::from(format!("{}_", self.input_buffer)),
            ]));
        } else if rows.is_empty() {
            rows.push(Row::new(vec![
                Cell::from(""),
                Cell::from("등록된 휴가사유가 없습니다.")
                    .style(Style::default().fg(Color::DarkGray)),
            ]));
        }
        self.render_table(f, area, rows, ["기본", "휴가사유"], [Constraint::Length(6), Constraint::Min(30)]);
    }

    fn render_vacation(&self, f: &mut Frame, area: Rect) {
        let s = &self.settings;
        let values = [
            s.vacation_start_date.as_deref().unwrap_or("-"),
            s.vacation_end_date.as_deref().unwrap_or("-"),
        ];
        let rows: Vec<Row> = VACATION_LABELS
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (label, value))| {
                Row::new(vec![
                    Cell::from(format!("  {label}")),
                    Cell::from(self.cell_value(Edit::Vacation(i), value)),
                ])
            })
            .collect();
        self.render_table(f, area, rows, ["항목", "날짜 (YYYY-MM-DD)"], [Constraint::Length(18), Constraint::Min(30)]);
    }

    fn render_table(
        &self,
        f: &mut Frame,
        area: Rect,
        rows: Vec<Row>,
        headers: [&str; 2],
        widths: [Constraint; 2],
    ) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let header = Row::new(headers.iter().map(|h| Cell::from(h.to_string()).style(bold)));
        let mut table_state = TableState::default();
        if self.row_count() > 0 {
            table_state.select(Some(self.cursor));
        }
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", self.section.title())),
            )
            .row_highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_hints(&self, f: &mut Frame, area: Rect) {
        let hint = if self.edit.is_some() {
            "Enter=저장  Esc=취소"
        } else {
            match self.section {
                Section::Basic => "↑↓=이동  Enter/e=수정  Space=사용 전환  Tab=다음  q=종료",
                Section::Presets => "↑↓=이동  a=추가  Enter/e=수정  x=삭제  d=기본값  Tab=다음  q=종료",
                Section::Vacation => "↑↓=이동  Enter/e=수정 (비우면 해제)  Tab=다음  q=종료",
            }
        };
        f.render_widget(
            Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
            area,
        );
    }
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if app.handle_key(key.code, key.modifiers) {
                    break;
                }
            }
        }
    }
    Ok(())
}
