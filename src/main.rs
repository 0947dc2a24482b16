pub mod ui;

use std::{
    error::Error,
    fmt::Display,
    fs,
    io::{self, stdin, BufRead, Write},
    path::PathBuf,
    rc::Rc,
};

use chrono::{DateTime, Local};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
        KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};

use lectern::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    data,
    display::FrameCache,
    documents::{DocumentStore, EditorSettings},
    i18n::{I18n, Language},
    layout::SplitLayout,
    notes::NoteBuffer,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    settings::{BreakType, SettingsPatch, SettingsStore, StoredSettings},
    sound::{Cue, SoundConfig, SoundPlayer, SystemSoundPlayer},
    storage::{KeyValueStore, MemoryStore, SqliteStore},
    theme::Theme,
    timer::{EndTimeAdjustment, LectureTimer},
};

const STATUS_TTL_SECS: i64 = 4;
const NUDGE_PERCENT: f64 = 2.0;
const VOLUME_STEP: f64 = 0.1;

/// lecture and break timer tui with overtime cues and a notes pane
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A lecture and break timer for the terminal: counts down a lecture, keeps counting into overtime with periodic cues, chains a lecture after each break, and lets you move the end time by whole minutes. Includes a plain-text notes pane."
)]
pub struct Cli {
    /// lecture length in minutes (1-300), for this run only
    #[clap(short = 'l', long)]
    lecture: Option<u32>,

    /// length of break A in minutes (1-120)
    #[clap(long)]
    break_a: Option<u32>,

    /// length of break B in minutes (1-120)
    #[clap(long)]
    break_b: Option<u32>,

    /// play the warning cue this many minutes before a lecture ends (1-10)
    #[clap(short = 'w', long)]
    warning: Option<u32>,

    /// seconds between overtime cues (10-300, multiples of 10)
    #[clap(long)]
    tick_interval: Option<u32>,

    /// playback volume between 0.0 and 1.0
    #[clap(long)]
    volume: Option<f64>,

    /// start with sound muted
    #[clap(short = 'm', long)]
    mute: bool,

    /// interface language
    #[clap(long, value_enum)]
    language: Option<Language>,

    /// storage database path; ":memory:" keeps nothing
    #[clap(long)]
    storage: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// print a JSON snapshot of settings and documents
    Export {
        /// write to this file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// replace stored settings and documents from a JSON snapshot
    Import {
        file: PathBuf,

        /// do not ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },
    /// delete every stored setting and document
    Clear {
        /// do not ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Settings given on the command line, layered over the stored ones
    fn overrides(&self) -> SettingsPatch {
        SettingsPatch {
            lecture_minutes: self.lecture,
            break_a_minutes: self.break_a,
            break_b_minutes: self.break_b,
            warning_minutes: self.warning,
            tick_interval_seconds: self.tick_interval,
            volume: self.volume,
            muted: self.mute.then_some(true),
            ..SettingsPatch::default()
        }
    }

    fn open_store(&self) -> Result<Rc<dyn KeyValueStore>, Box<dyn Error>> {
        Ok(match &self.storage {
            Some(path) if path.as_os_str() == ":memory:" => Rc::new(MemoryStore::new()),
            Some(path) => Rc::new(SqliteStore::open(path)?),
            None => Rc::new(SqliteStore::open_default()?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Timer,
    Notes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTab {
    Time,
    Sound,
    Data,
}

impl SettingsTab {
    pub const ALL: [SettingsTab; 3] = [SettingsTab::Time, SettingsTab::Sound, SettingsTab::Data];

    pub fn label_key(self) -> &'static str {
        match self {
            SettingsTab::Time => "tab-time",
            SettingsTab::Sound => "tab-sound",
            SettingsTab::Data => "tab-data",
        }
    }

    pub fn rows(self) -> &'static [SettingsRow] {
        match self {
            SettingsTab::Time => &[
                SettingsRow::Lecture,
                SettingsRow::BreakA,
                SettingsRow::BreakB,
                SettingsRow::Warning,
                SettingsRow::TickInterval,
            ],
            SettingsTab::Sound => &[
                SettingsRow::Language,
                SettingsRow::Sound(Cue::Warning),
                SettingsRow::Sound(Cue::End),
                SettingsRow::Sound(Cue::Elapsed),
                SettingsRow::Volume,
                SettingsRow::Mute,
            ],
            SettingsTab::Data => &[SettingsRow::Export, SettingsRow::Import, SettingsRow::Clear],
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn cycled(self, step: isize) -> Self {
        let len = Self::ALL.len() as isize;
        Self::ALL[(self.index() as isize + step).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    Lecture,
    BreakA,
    BreakB,
    Warning,
    TickInterval,
    Language,
    Sound(Cue),
    Volume,
    Mute,
    Export,
    Import,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsModal {
    pub tab: SettingsTab,
    pub row: usize,
}

impl SettingsModal {
    pub fn selected(&self) -> SettingsRow {
        let rows = self.tab.rows();
        rows[self.row.min(rows.len() - 1)]
    }
}

/// Action waiting for a y/n answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    Import,
    Clear,
    OpenDocument(String),
    NewDocument,
    DeleteDocument(String),
}

impl Confirm {
    pub fn prompt_key(&self) -> &'static str {
        match self {
            Confirm::Import => "confirm-import",
            Confirm::Clear => "confirm-clear-storage",
            Confirm::OpenDocument(_) | Confirm::NewDocument => "confirm-discard",
            Confirm::DeleteDocument(_) => "confirm-delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub since: DateTime<Local>,
}

pub struct App<C: Clock = SystemClock, P: SoundPlayer = SystemSoundPlayer> {
    pub timer: LectureTimer<C, P, FrameCache>,
    pub documents: DocumentStore<Rc<dyn KeyValueStore>>,
    pub note: NoteBuffer,
    pub editor: EditorSettings,
    pub layout: SplitLayout,
    pub theme: Theme,
    pub i18n: I18n,
    pub focus: Focus,
    pub settings_modal: Option<SettingsModal>,
    pub confirm: Option<Confirm>,
    pub status: Option<StatusLine>,
    pub area: Rect,
    pub export_path: PathBuf,
    pub should_quit: bool,
    store: Rc<dyn KeyValueStore>,
    settings_store: StoredSettings<Rc<dyn KeyValueStore>>,
    overrides: SettingsPatch,
}

impl<C: Clock, P: SoundPlayer> App<C, P> {
    pub fn new(
        clock: C,
        player: P,
        store: Rc<dyn KeyValueStore>,
        overrides: SettingsPatch,
        language_override: Option<Language>,
    ) -> Self {
        let settings_store = StoredSettings::new(store.clone());
        let mut settings = settings_store.load();
        settings.apply(&overrides);
        let timer = LectureTimer::new(clock, player, FrameCache::new(), settings);

        let documents = DocumentStore::load(store.clone());
        let note = NoteBuffer::from_saved(documents.current().map_or("", |d| d.content.as_str()));
        let language = language_override.unwrap_or_else(|| Language::load(&store));

        Self {
            timer,
            note,
            documents,
            editor: EditorSettings::load(&store),
            layout: SplitLayout::load(&store),
            theme: Theme::load(&store),
            i18n: I18n::new(language),
            focus: Focus::Timer,
            settings_modal: None,
            confirm: None,
            status: None,
            area: Rect::default(),
            export_path: AppDirs::export_path()
                .unwrap_or_else(|| PathBuf::from("lectern-export.json")),
            should_quit: false,
            store,
            settings_store,
            overrides,
        }
    }

    /// Runtime tick: drive the timer and expire the status line
    pub fn on_tick(&mut self) {
        self.timer.poll();
        let now = self.timer.clock().now();
        if let Some(status) = &self.status {
            if (now - status.since).num_seconds() >= STATUS_TTL_SECS {
                self.status = None;
            }
        }
    }

    /// One turn of the event loop: dispatch the event, then poll the timer
    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Mouse(mouse) => self.on_mouse(mouse),
            AppEvent::FocusGained => self.timer.refresh(),
            AppEvent::Resize | AppEvent::Tick => {}
        }
        self.on_tick();
    }

    pub fn on_resize(&mut self, area: Rect) {
        self.area = area;
        self.timer.refresh();
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if let Some(confirm) = self.confirm.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.run_confirmed(confirm);
            }
            return;
        }

        if self.settings_modal.is_some() {
            self.on_settings_key(key);
            return;
        }

        match self.focus {
            Focus::Timer => self.on_timer_key(key),
            Focus::Notes => self.on_notes_key(key),
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        if !self.editor.is_visible || self.settings_modal.is_some() || self.confirm.is_some() {
            return;
        }

        let body = ui::body_area(self.area);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !self.layout.begin_drag(mouse.column, body) {
                    self.focus = if mouse.column >= self.layout.divider_column(body) {
                        Focus::Notes
                    } else {
                        Focus::Timer
                    };
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => self.layout.drag_to(mouse.column, body),
            MouseEventKind::Up(MouseButton::Left) => {
                if self.layout.end_drag() {
                    self.save_layout();
                }
            }
            _ => {}
        }
    }

    fn on_timer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') => {
                self.timer.start_lecture();
            }
            KeyCode::Char('b') => self.timer.start_break(BreakType::A),
            KeyCode::Char('n') => self.timer.start_break(BreakType::B),
            KeyCode::Char('s') | KeyCode::Esc => self.timer.stop_timer(),
            KeyCode::Char('[') => self.adjust_end_time(-1),
            KeyCode::Char(']') => self.adjust_end_time(1),
            KeyCode::Char('{') => self.adjust_end_time(-10),
            KeyCode::Char('}') => self.adjust_end_time(10),
            KeyCode::Char('m') => self.toggle_mute(),
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('g') => self.toggle_language(),
            KeyCode::Char('o') => {
                self.settings_modal = Some(SettingsModal {
                    tab: SettingsTab::Time,
                    row: 0,
                })
            }
            KeyCode::Char('e') => self.toggle_editor(),
            KeyCode::Tab if self.editor.is_visible => self.focus = Focus::Notes,
            KeyCode::Char('<') => {
                self.layout.nudge(-NUDGE_PERCENT);
                self.save_layout();
            }
            KeyCode::Char('>') => {
                self.layout.nudge(NUDGE_PERCENT);
                self.save_layout();
            }
            KeyCode::Char('=') => {
                self.layout.reset();
                self.save_layout();
            }
            _ => {}
        }
    }

    fn on_notes_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Tab | KeyCode::Esc => self.focus = Focus::Timer,
            KeyCode::Char('s') if ctrl => self.save_document(),
            KeyCode::Char('n') if ctrl => {
                if self.note.is_dirty() {
                    self.confirm = Some(Confirm::NewDocument);
                } else {
                    self.new_document();
                }
            }
            KeyCode::Char('d') if ctrl => {
                if let Some(id) = self.documents.current_id() {
                    self.confirm = Some(Confirm::DeleteDocument(id.to_string()));
                }
            }
            KeyCode::Char('p') if ctrl => self.switch_document(-1),
            KeyCode::Char('o') if ctrl => self.switch_document(1),
            KeyCode::Enter => self.note.newline(),
            KeyCode::Backspace => self.note.backspace(),
            KeyCode::Delete => self.note.delete(),
            KeyCode::Left => self.note.move_left(),
            KeyCode::Right => self.note.move_right(),
            KeyCode::Home => self.note.move_line_start(),
            KeyCode::End => self.note.move_line_end(),
            KeyCode::Char(c) if !ctrl => self.note.insert_char(c),
            _ => {}
        }
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        let Some(mut modal) = self.settings_modal else {
            return;
        };
        let rows = modal.tab.rows().len();

        match key.code {
            KeyCode::Esc | KeyCode::Char('o') | KeyCode::Char('q') => {
                self.settings_modal = None;
                return;
            }
            KeyCode::Tab => modal = SettingsModal { tab: modal.tab.cycled(1), row: 0 },
            KeyCode::BackTab => modal = SettingsModal { tab: modal.tab.cycled(-1), row: 0 },
            KeyCode::Up | KeyCode::Char('k') => modal.row = modal.row.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => modal.row = (modal.row + 1).min(rows - 1),
            KeyCode::Left | KeyCode::Char('-') | KeyCode::Char('h') => {
                self.change_setting(modal.selected(), -1)
            }
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('l') => {
                self.change_setting(modal.selected(), 1)
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_setting(modal.selected()),
            _ => {}
        }

        // import/clear may have reset the modal
        if self.settings_modal.is_some() {
            self.settings_modal = Some(modal);
        }
    }

    fn change_setting(&mut self, row: SettingsRow, step: i32) {
        let current = self.timer.settings().clone();
        let patch = match row {
            SettingsRow::Lecture => SettingsPatch {
                lecture_minutes: Some(current.lecture_minutes.saturating_add_signed(step)),
                ..SettingsPatch::default()
            },
            SettingsRow::BreakA => SettingsPatch {
                break_a_minutes: Some(current.break_a_minutes.saturating_add_signed(step)),
                ..SettingsPatch::default()
            },
            SettingsRow::BreakB => SettingsPatch {
                break_b_minutes: Some(current.break_b_minutes.saturating_add_signed(step)),
                ..SettingsPatch::default()
            },
            SettingsRow::Warning => SettingsPatch {
                warning_minutes: Some(current.warning_minutes.saturating_add_signed(step)),
                ..SettingsPatch::default()
            },
            SettingsRow::TickInterval => SettingsPatch {
                tick_interval_seconds: Some(
                    current.tick_interval_seconds.saturating_add_signed(step * 10),
                ),
                ..SettingsPatch::default()
            },
            SettingsRow::Volume => SettingsPatch {
                volume: Some(
                    ((current.volume + f64::from(step) * VOLUME_STEP) * 10.0).round() / 10.0,
                ),
                ..SettingsPatch::default()
            },
            SettingsRow::Sound(cue) => {
                let mut sounds = current.sounds.clone();
                sounds.cycle(cue);
                SettingsPatch {
                    sounds: Some(sounds),
                    ..SettingsPatch::default()
                }
            }
            SettingsRow::Mute => {
                self.toggle_mute();
                return;
            }
            SettingsRow::Language => {
                self.toggle_language();
                return;
            }
            SettingsRow::Export | SettingsRow::Import | SettingsRow::Clear => return,
        };
        self.update_settings(patch);
    }

    fn activate_setting(&mut self, row: SettingsRow) {
        match row {
            SettingsRow::Sound(cue) => self.timer.preview_cue(cue),
            SettingsRow::Mute => self.toggle_mute(),
            SettingsRow::Language => self.toggle_language(),
            SettingsRow::Export => self.export_to_file(),
            SettingsRow::Import => self.confirm = Some(Confirm::Import),
            SettingsRow::Clear => self.confirm = Some(Confirm::Clear),
            _ => {}
        }
    }

    /// Persist `patch`, then hand the merged settings to the timer
    fn update_settings(&mut self, patch: SettingsPatch) {
        self.overrides.forget(&patch);
        let written = self.settings_store.set(&patch);
        if let Some(mut settings) = self.report("settings", written) {
            settings.apply(&self.overrides);
            self.timer.apply_settings(settings);
        }
    }

    fn run_confirmed(&mut self, confirm: Confirm) {
        match confirm {
            Confirm::Import => self.import_from_file(),
            Confirm::Clear => {
                let cleared = data::clear(&self.store);
                if self.report("clear", cleared).is_some() {
                    self.reload_from_store();
                    self.notify(self.i18n.t("clear-storage-success").to_string());
                }
            }
            Confirm::OpenDocument(id) => self.open_document(&id),
            Confirm::NewDocument => self.new_document(),
            Confirm::DeleteDocument(id) => {
                let deleted = self.documents.delete(&id);
                if let Some(true) = self.report("delete document", deleted) {
                    if self.documents.current_id().is_none() {
                        self.note = NoteBuffer::new();
                    }
                    self.notify(self.i18n.t("editor-deleted").to_string());
                }
            }
        }
    }

    fn adjust_end_time(&mut self, delta_minutes: i64) {
        if self.timer.adjust_end_time(delta_minutes) == EndTimeAdjustment::Rejected
            && self.timer.is_running()
        {
            self.notify(self.i18n.t("status-end-time-rejected").to_string());
        }
    }

    fn toggle_mute(&mut self) {
        let muted = self.timer.toggle_mute();
        self.overrides.forget(&SettingsPatch {
            muted: Some(muted),
            ..SettingsPatch::default()
        });
        let saved = self.settings_store.set(&SettingsPatch {
            muted: Some(muted),
            ..SettingsPatch::default()
        });
        self.report("mute", saved);
        let key = if muted { "status-muted" } else { "status-unmuted" };
        self.notify(self.i18n.t(key).to_string());
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        let saved = self.theme.save(&self.store);
        self.report("theme", saved);
    }

    fn toggle_language(&mut self) {
        let language = self.i18n.language().toggled();
        self.i18n.set_language(language);
        let saved = language.save(&self.store);
        self.report("language", saved);
    }

    fn toggle_editor(&mut self) {
        self.editor.is_visible = !self.editor.is_visible;
        if !self.editor.is_visible {
            self.focus = Focus::Timer;
        }
        let saved = self.editor.save(&self.store);
        self.report("editor settings", saved);
    }

    fn save_layout(&mut self) {
        let saved = self.layout.save(&self.store);
        self.report("layout", saved);
    }

    fn save_document(&mut self) {
        let now = self.timer.clock().now();
        let title = self
            .documents
            .current()
            .map(|d| d.title.clone())
            .unwrap_or_default();
        let saved = self
            .documents
            .save(&title, self.note.text(), now)
            .map(|doc| doc.title.clone());
        if let Some(title) = self.report("save document", saved) {
            self.note.mark_saved();
            self.notify(format!("{}: {title}", self.i18n.t("editor-saved")));
        }
    }

    fn switch_document(&mut self, step: isize) {
        let Some(id) = self.documents.neighbour_id(step) else {
            return;
        };
        if self.documents.current_id() == Some(id.as_str()) {
            return;
        }
        if self.note.is_dirty() {
            self.confirm = Some(Confirm::OpenDocument(id));
        } else {
            self.open_document(&id);
        }
    }

    fn open_document(&mut self, id: &str) {
        if let Some(doc) = self.documents.open(id) {
            self.note = NoteBuffer::from_saved(&doc.content);
        }
    }

    fn new_document(&mut self) {
        self.documents.new_document();
        self.note = NoteBuffer::new();
    }

    fn export_to_file(&mut self) {
        let now = self.timer.clock().now();
        let written = data::export(&self.store, now)
            .map_err(|e| e.to_string())
            .and_then(|text| fs::write(&self.export_path, text).map_err(|e| e.to_string()));
        if self.report("export", written).is_some() {
            info!("exported to {}", self.export_path.display());
            self.notify(format!(
                "{} {}",
                self.i18n.t("export-success"),
                self.export_path.display()
            ));
        }
    }

    fn import_from_file(&mut self) {
        let imported = fs::read_to_string(&self.export_path)
            .map_err(|e| e.to_string())
            .and_then(|text| data::import(&self.store, &text).map_err(|e| e.to_string()));
        if self.report("import", imported).is_some() {
            self.reload_from_store();
            self.notify(self.i18n.t("import-success").to_string());
        }
    }

    /// Re-read everything from storage after an import or clear
    fn reload_from_store(&mut self) {
        self.timer.stop_timer();
        self.overrides = SettingsPatch::default();
        self.timer.apply_settings(self.settings_store.load());
        self.documents = DocumentStore::load(self.store.clone());
        self.note = NoteBuffer::from_saved(self.documents.current().map_or("", |d| d.content.as_str()));
        self.editor = EditorSettings::load(&self.store);
        self.layout = SplitLayout::load(&self.store);
        self.theme = Theme::load(&self.store);
        self.i18n.set_language(Language::load(&self.store));
        self.settings_modal = None;
        if !self.editor.is_visible {
            self.focus = Focus::Timer;
        }
    }

    fn notify(&mut self, text: String) {
        self.status = Some(StatusLine {
            text,
            since: self.timer.clock().now(),
        });
    }

    /// Log and surface a failed storage operation; the app keeps running
    fn report<T, E: Display>(&mut self, what: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{what} failed: {e}");
                self.notify(format!("{}: {e}", self.i18n.t("status-storage-error")));
                None
            }
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    // The TUI owns the terminal, so log lines go to a file
    if let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(&path) {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .try_init();
    }
}

fn confirm_on_stdin(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn run_command(command: Command, store: Rc<dyn KeyValueStore>) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Export { output } => {
            let text = data::export(&store, Local::now())?;
            match output {
                Some(path) => {
                    fs::write(&path, text)?;
                    println!("exported to {}", path.display());
                }
                None => println!("{text}"),
            }
        }
        Command::Import { file, yes } => {
            let text = fs::read_to_string(&file)?;
            if !yes
                && !confirm_on_stdin(
                    "This will replace all current settings and documents. Continue?",
                )?
            {
                println!("aborted");
                return Ok(());
            }
            let written = data::import(&store, &text)?;
            println!("imported {}", written.join(", "));
        }
        Command::Clear { yes } => {
            if !yes && !confirm_on_stdin("All settings and documents will be deleted. Continue?")? {
                println!("aborted");
                return Ok(());
            }
            data::clear(&store)?;
            println!("cleared");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let store = cli.open_store()?;

    if let Some(command) = cli.command.clone() {
        return run_command(command, store);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let player = SystemSoundPlayer::new(SoundConfig::default());
    let mut app = App::new(SystemClock, player, store, cli.overrides(), cli.language);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("lectern started");
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, C: Clock, P: SoundPlayer>(
    terminal: &mut Terminal<B>,
    app: &mut App<C, P>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let size = terminal.size()?;
    app.on_resize(Rect::new(0, 0, size.width, size.height));

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let event = runner.step();
        if let AppEvent::Resize = event {
            let size = terminal.size()?;
            app.on_resize(Rect::new(0, 0, size.width, size.height));
        }
        app.handle(event);

        if app.should_quit {
            info!("lectern exiting");
            break;
        }
    }

    Ok(())
}
