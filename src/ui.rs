pub mod screen;
pub mod settings;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Gauge, Paragraph, Widget, Wrap},
    Frame,
};

use lectern::{
    clock::Clock,
    display::{format_clock, DisplayFrame},
    sound::SoundPlayer,
    theme::Palette,
    timer::Mode,
};

use crate::{App, Focus};

const HORIZONTAL_MARGIN: u16 = 1;

/// Header, body, key hints, status line
fn screen_chunks(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// Area shared by the timer and notes panes
pub fn body_area(area: Rect) -> Rect {
    screen_chunks(area)[1]
}

/// Draw the current screen and place the terminal cursor in the notes pane
pub fn draw<C: Clock, P: SoundPlayer>(app: &App<C, P>, f: &mut Frame) {
    screen::current_screen(app).render(app, f);
}

fn mode_label_key(frame: &DisplayFrame) -> &'static str {
    match (frame.mode, frame.is_overtime) {
        (Mode::Lecture, true) => "mode-overtime",
        (Mode::Lecture, false) => "mode-lecture",
        (Mode::Break, _) => "mode-break",
        (Mode::Idle, _) => "mode-idle",
    }
}

fn mode_color<C: Clock, P: SoundPlayer>(app: &App<C, P>, palette: &Palette) -> Color {
    let frame = app.timer.display().frame();
    let warning_secs = i64::from(app.timer.settings().warning_minutes) * 60;
    match frame.mode {
        Mode::Idle => palette.muted,
        Mode::Break => palette.break_accent,
        Mode::Lecture if frame.is_overtime => palette.overtime,
        Mode::Lecture if app.timer.remaining_seconds() <= warning_secs => palette.warning,
        Mode::Lecture => palette.accent,
    }
}

/// Where the text cursor sits when the notes pane has focus
pub fn notes_cursor<C: Clock, P: SoundPlayer>(app: &App<C, P>, area: Rect) -> Option<Position> {
    if !app.editor.is_visible
        || app.focus != Focus::Notes
        || app.settings_modal.is_some()
        || app.confirm.is_some()
    {
        return None;
    }
    let (_, notes) = app.layout.split(body_area(area));
    let inner = Block::bordered().inner(notes);
    if inner.width == 0 || inner.height == 0 {
        return None;
    }
    let (line, column) = app.note.cursor_position();
    let row = line.saturating_sub(notes_scroll(line, inner.height) as usize);
    let x = inner.x + (column as u16).min(inner.width - 1);
    let y = inner.y + (row as u16).min(inner.height - 1);
    Some(Position::new(x, y))
}

/// Keep the cursor line inside a pane `height` rows tall
fn notes_scroll(cursor_line: usize, height: u16) -> u16 {
    (cursor_line as u16).saturating_sub(height.saturating_sub(1))
}

impl<C: Clock, P: SoundPlayer> Widget for &App<C, P> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = self.theme.palette();
        buf.set_style(area, palette.base);

        let [header, body, hints, status] = screen_chunks(area);
        self.render_header(header, buf, &palette);

        if self.editor.is_visible {
            let (timer_area, notes_area) = self.layout.split(body);
            self.render_timer(timer_area, buf, &palette);
            self.render_notes(notes_area, buf, &palette);
        } else {
            self.render_timer(body, buf, &palette);
        }

        self.render_hints(hints, buf, &palette);
        self.render_status(status, buf, &palette);
    }
}

impl<C: Clock, P: SoundPlayer> App<C, P> {
    fn render_header(&self, area: Rect, buf: &mut Buffer, palette: &Palette) {
        let frame = self.timer.display().frame();
        let area = area.inner(ratatui::layout::Margin::new(HORIZONTAL_MARGIN, 0));
        let [title_area, clock_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(8)]).areas(area);

        Paragraph::new(Line::from(vec![
            Span::styled(self.i18n.t("app-title"), palette.bold(palette.accent)),
            Span::raw("  "),
            Span::styled(
                self.i18n.t(mode_label_key(frame)),
                palette.bold(mode_color(self, palette)),
            ),
        ]))
        .render(title_area, buf);

        Paragraph::new(format_clock(self.timer.clock().now()))
            .style(palette.dim())
            .alignment(Alignment::Right)
            .render(clock_area, buf);
    }

    fn render_timer(&self, area: Rect, buf: &mut Buffer, palette: &Palette) {
        let frame = self.timer.display().frame();
        let color = mode_color(self, palette);
        let focused = self.focus == Focus::Timer;

        let block = Block::bordered()
            .border_type(if focused {
                BorderType::Thick
            } else {
                BorderType::Plain
            })
            .border_style(Style::default().fg(color))
            .title(Span::styled(
                format!(" {} ", self.i18n.t(mode_label_key(frame))),
                palette.bold(color),
            ));
        let inner = block.inner(area);
        block.render(area, buf);

        let free = inner.height.saturating_sub(5) / 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(free),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        Paragraph::new(Span::styled(
            frame.timer_text.as_str(),
            palette.bold(color).add_modifier(Modifier::REVERSED),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio(frame.progress.clamp(0.0, 1.0))
            .label(format!("{}%", frame.progress_percent()))
            .render(chunks[3], buf);

        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", self.i18n.t("label-end-time")), palette.dim()),
            Span::styled(frame.end_clock_text.as_str(), palette.bold(color)),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        let mut details = vec![
            Span::styled(format!("{} ", self.i18n.t("label-sessions")), palette.dim()),
            Span::raw(frame.session_count.to_string()),
        ];
        if self.timer.settings().muted {
            details.push(Span::raw("  "));
            details.push(Span::styled(
                self.i18n.t("status-muted"),
                palette.bold(palette.warning),
            ));
        }
        Paragraph::new(Line::from(details))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }

    fn render_notes(&self, area: Rect, buf: &mut Buffer, palette: &Palette) {
        let focused = self.focus == Focus::Notes;
        let doc_title = self
            .documents
            .current()
            .map(|d| d.title.as_str())
            .unwrap_or_else(|| self.i18n.t("editor-new-document"));

        let mut title = vec![Span::styled(
            format!(" {}: {doc_title} ", self.i18n.t("editor-title")),
            palette.bold(palette.accent),
        )];
        if self.note.is_dirty() {
            title.push(Span::styled(
                format!("({}) ", self.i18n.t("editor-unsaved")),
                palette.bold(palette.warning),
            ));
        }
        if let Some(position) = self
            .documents
            .current_id()
            .and_then(|id| self.documents.list().iter().position(|d| d.id == id))
        {
            title.push(Span::styled(
                format!("[{}/{}] ", position + 1, self.documents.len()),
                palette.dim(),
            ));
        }

        let block = Block::bordered()
            .border_type(if focused {
                BorderType::Thick
            } else {
                BorderType::Plain
            })
            .border_style(if focused {
                Style::default().fg(palette.accent)
            } else {
                palette.dim()
            })
            .title(Line::from(title));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.note.is_empty() && !focused {
            Paragraph::new(self.i18n.t("editor-hint"))
                .style(palette.dim())
                .wrap(Wrap { trim: true })
                .render(inner, buf);
            return;
        }

        let (line, _) = self.note.cursor_position();
        Paragraph::new(self.note.text())
            .scroll((notes_scroll(line, inner.height), 0))
            .render(inner, buf);
    }

    fn render_hints(&self, area: Rect, buf: &mut Buffer, palette: &Palette) {
        let area = area.inner(ratatui::layout::Margin::new(HORIZONTAL_MARGIN, 0));
        if self.focus == Focus::Notes && self.editor.is_visible {
            Paragraph::new(self.i18n.t("editor-hint"))
                .style(palette.dim())
                .render(area, buf);
            return;
        }

        let controls = self.timer.display().frame().controls;
        let mut hints = Vec::new();
        if controls.start_lecture || controls.resume_lecture {
            hints.push(("l", "tooltip-start-lecture-break"));
        }
        if controls.start_break {
            hints.push(("b", "tooltip-start-break1"));
            hints.push(("n", "tooltip-start-break2"));
        }
        if controls.stop {
            hints.push(("s", "tooltip-stop"));
        }
        if controls.adjust_end_time {
            hints.push(("[ ] { }", "tooltip-adjust"));
        }
        hints.extend([
            ("m", "tooltip-mute"),
            ("t", "tooltip-theme"),
            ("g", "tooltip-language"),
            ("o", "tooltip-settings"),
            ("e", "tooltip-editor"),
        ]);
        if self.editor.is_visible {
            hints.push(("< > =", "tooltip-resize"));
        }
        hints.push(("q", "tooltip-quit"));

        let spans = Itertools::intersperse(
            hints.into_iter().map(|(key, label)| {
                vec![
                    Span::styled(key, palette.bold(palette.accent)),
                    Span::raw(" "),
                    Span::styled(self.i18n.t(label), palette.dim()),
                ]
            }),
            vec![Span::raw("  ")],
        )
        .flatten()
        .collect_vec();

        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer, palette: &Palette) {
        let area = area.inner(ratatui::layout::Margin::new(HORIZONTAL_MARGIN, 0));
        let line = match (&self.confirm, &self.status) {
            (Some(confirm), _) => Span::styled(
                self.i18n.t(confirm.prompt_key()),
                palette.bold(palette.warning),
            ),
            (None, Some(status)) => Span::styled(status.text.as_str(), palette.bold(palette.accent)),
            (None, None) => return,
        };

        Paragraph::new(line).render(area, buf);
    }
}
