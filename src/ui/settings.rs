use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Cell, Clear, Paragraph, Row, Table, Tabs},
    Frame,
};

use lectern::{clock::Clock, sound::SoundPlayer};

use crate::{App, SettingsRow, SettingsTab};

const MODAL_WIDTH: u16 = 72;
const MODAL_HEIGHT: u16 = 14;

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn row_label<C: Clock, P: SoundPlayer>(app: &App<C, P>, row: SettingsRow) -> String {
    let key = match row {
        SettingsRow::Lecture => "label-lecture-time",
        SettingsRow::BreakA => "label-break-time",
        SettingsRow::BreakB => "label-lunch-time",
        SettingsRow::Warning => "label-warning-time",
        SettingsRow::TickInterval => "label-tick-interval",
        SettingsRow::Language => "label-language",
        SettingsRow::Sound(cue) => cue.label_key(),
        SettingsRow::Volume => "label-volume",
        SettingsRow::Mute => "label-mute",
        SettingsRow::Export | SettingsRow::Import | SettingsRow::Clear => {
            "label-data-export-import"
        }
    };
    app.i18n.t(key).to_string()
}

fn row_value<C: Clock, P: SoundPlayer>(app: &App<C, P>, row: SettingsRow) -> String {
    let settings = app.timer.settings();
    match row {
        SettingsRow::Lecture => settings.lecture_minutes.to_string(),
        SettingsRow::BreakA => settings.break_a_minutes.to_string(),
        SettingsRow::BreakB => settings.break_b_minutes.to_string(),
        SettingsRow::Warning => settings.warning_minutes.to_string(),
        SettingsRow::TickInterval => settings.tick_interval_seconds.to_string(),
        SettingsRow::Language => app.i18n.language().to_string(),
        SettingsRow::Sound(cue) => {
            let id = settings.sounds.for_cue(cue);
            let name = cue
                .variant_label_key(id)
                .map_or_else(|| id.to_string(), |key| app.i18n.t(&key).to_string());
            format!("{name}  [{}]", app.i18n.t("btn-test"))
        }
        SettingsRow::Volume => format!("{:.0}%", settings.volume * 100.0),
        SettingsRow::Mute => if settings.muted { "[x]" } else { "[ ]" }.to_string(),
        SettingsRow::Export => format!(
            "[{}] {}",
            app.i18n.t("button-export"),
            app.export_path.display()
        ),
        SettingsRow::Import => format!(
            "[{}] {}",
            app.i18n.t("button-import"),
            app.export_path.display()
        ),
        SettingsRow::Clear => format!("[{}]", app.i18n.t("button-clear-storage")),
    }
}

/// Tabbed settings modal over the centre of the screen
pub fn render_settings<C: Clock, P: SoundPlayer>(app: &App<C, P>, f: &mut Frame) {
    let Some(modal) = app.settings_modal else {
        return;
    };
    let palette = app.theme.palette();
    let area = centered(f.area(), MODAL_WIDTH, MODAL_HEIGHT);

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.accent))
        .title(Span::styled(
            format!(" {} ", app.i18n.t("modal-settings-title")),
            palette.bold(palette.accent),
        ))
        .style(palette.base);
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    let titles = SettingsTab::ALL
        .iter()
        .map(|tab| Line::from(app.i18n.t(tab.label_key())));
    let selected = SettingsTab::ALL
        .iter()
        .position(|tab| *tab == modal.tab)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(palette.dim())
        .highlight_style(palette.bold(palette.accent).add_modifier(Modifier::UNDERLINED));
    f.render_widget(tabs, chunks[0]);

    let rows = modal.tab.rows().iter().enumerate().map(|(i, row)| {
        let style = if i == modal.row {
            palette.bold(palette.accent).add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(row_label(app, *row)),
            Cell::from(row_value(app, *row)),
        ])
        .style(style)
    });
    let table = Table::new(rows, [Constraint::Length(26), Constraint::Min(10)]).column_spacing(1);
    f.render_widget(table, chunks[2]);

    let help = match modal.tab {
        SettingsTab::Data => "Enter: run  Tab: next tab  Esc: close",
        _ => "Up/Down: select  Left/Right: change  Enter: test  Tab: next tab  Esc: close",
    };
    f.render_widget(Paragraph::new(help).style(palette.dim()), chunks[3]);
}
