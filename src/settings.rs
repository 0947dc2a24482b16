use log::warn;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::sound::Cue;
use crate::storage::{KeyValueStore, StorageError, TIMER_SETTINGS_KEY};

pub const LECTURE_MINUTES_RANGE: (u32, u32) = (1, 300);
pub const BREAK_MINUTES_RANGE: (u32, u32) = (1, 120);
pub const WARNING_MINUTES_RANGE: (u32, u32) = (1, 10);
pub const TICK_INTERVAL_RANGE: (u32, u32) = (10, 300);
pub const TICK_INTERVAL_STEP: u32 = 10;

/// Which of the two configured break lengths a break session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum BreakType {
    #[default]
    A,
    B,
}

/// Accepts `"a"`/`"b"` in any case, and the browser app's `1`/`2`
impl<'de> Deserialize<'de> for BreakType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Debug, Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(1) => Ok(BreakType::A),
            Repr::Number(2) => Ok(BreakType::B),
            Repr::Name(name) if name.eq_ignore_ascii_case("a") => Ok(BreakType::A),
            Repr::Name(name) if name.eq_ignore_ascii_case("b") => Ok(BreakType::B),
            other => Err(de::Error::custom(format!("unknown break type {other:?}"))),
        }
    }
}

/// Configured sound id per cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoundSelections {
    pub warning: String,
    pub end: String,
    pub elapsed: String,
}

impl SoundSelections {
    pub fn for_cue(&self, cue: Cue) -> &str {
        match cue {
            Cue::Warning => &self.warning,
            Cue::End => &self.end,
            Cue::Elapsed => &self.elapsed,
        }
    }

    pub fn set_for_cue(&mut self, cue: Cue, id: impl Into<String>) {
        let id = id.into();
        match cue {
            Cue::Warning => self.warning = id,
            Cue::End => self.end = id,
            Cue::Elapsed => self.elapsed = id,
        }
    }

    /// Move the selection for `cue` to the next bundled variant, wrapping around
    pub fn cycle(&mut self, cue: Cue) {
        let variants = cue.variants();
        let current = self.for_cue(cue);
        let next = variants
            .iter()
            .position(|v| *v == current)
            .map(|i| variants[(i + 1) % variants.len()])
            .unwrap_or(variants[0]);
        self.set_for_cue(cue, next);
    }
}

impl Default for SoundSelections {
    fn default() -> Self {
        Self {
            warning: Cue::Warning.variants()[0].to_string(),
            end: Cue::End.variants()[0].to_string(),
            elapsed: Cue::Elapsed.variants()[0].to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SettingsRecord")]
pub struct Settings {
    pub lecture_minutes: u32,
    pub break_a_minutes: u32,
    pub break_b_minutes: u32,
    pub selected_break_type: BreakType,
    pub warning_minutes: u32,
    pub tick_interval_seconds: u32,
    pub volume: f64,
    pub muted: bool,
    pub sounds: SoundSelections,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lecture_minutes: 50,
            break_a_minutes: 10,
            break_b_minutes: 60,
            selected_break_type: BreakType::A,
            warning_minutes: 3,
            tick_interval_seconds: 60,
            volume: 0.5,
            muted: false,
            sounds: SoundSelections::default(),
        }
    }
}

/// Stored shape of the settings blob. Missing fields keep their defaults,
/// and the browser app's key names are read as aliases.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsRecord {
    #[serde(alias = "lectureTime")]
    lecture_minutes: Option<u32>,
    #[serde(alias = "break1Time")]
    break_a_minutes: Option<u32>,
    #[serde(alias = "break2Time")]
    break_b_minutes: Option<u32>,
    selected_break_type: Option<BreakType>,
    #[serde(alias = "warningTime")]
    warning_minutes: Option<u32>,
    #[serde(alias = "tickInterval")]
    tick_interval_seconds: Option<u32>,
    volume: Option<f64>,
    #[serde(alias = "isMuted")]
    muted: Option<bool>,
    sounds: Option<SoundSelections>,
    sound1_src: Option<String>,
    sound2_src: Option<String>,
    sound3_src: Option<String>,
}

/// `audio/sound1-2.wav` or a full URL to it becomes `sound1-2`
fn sound_id(src: &str) -> String {
    let file = src.rsplit('/').next().unwrap_or(src);
    file.split('.').next().unwrap_or(file).to_string()
}

impl From<SettingsRecord> for Settings {
    fn from(record: SettingsRecord) -> Self {
        let defaults = Settings::default();
        let mut sounds = record.sounds.unwrap_or(defaults.sounds);
        for (cue, src) in [
            (Cue::Warning, record.sound1_src),
            (Cue::End, record.sound2_src),
            (Cue::Elapsed, record.sound3_src),
        ] {
            if let Some(src) = src.filter(|s| !s.is_empty()) {
                sounds.set_for_cue(cue, sound_id(&src));
            }
        }

        Self {
            lecture_minutes: record.lecture_minutes.unwrap_or(defaults.lecture_minutes),
            break_a_minutes: record.break_a_minutes.unwrap_or(defaults.break_a_minutes),
            break_b_minutes: record.break_b_minutes.unwrap_or(defaults.break_b_minutes),
            selected_break_type: record
                .selected_break_type
                .unwrap_or(defaults.selected_break_type),
            warning_minutes: record.warning_minutes.unwrap_or(defaults.warning_minutes),
            tick_interval_seconds: record
                .tick_interval_seconds
                .unwrap_or(defaults.tick_interval_seconds),
            volume: record.volume.unwrap_or(defaults.volume),
            muted: record.muted.unwrap_or(defaults.muted),
            sounds,
        }
    }
}

impl Settings {
    /// Bring every field into its accepted range
    pub fn clamped(mut self) -> Self {
        self.lecture_minutes = clamp(self.lecture_minutes, LECTURE_MINUTES_RANGE);
        self.break_a_minutes = clamp(self.break_a_minutes, BREAK_MINUTES_RANGE);
        self.break_b_minutes = clamp(self.break_b_minutes, BREAK_MINUTES_RANGE);
        self.warning_minutes = clamp(self.warning_minutes, WARNING_MINUTES_RANGE);
        let tick = clamp(self.tick_interval_seconds, TICK_INTERVAL_RANGE);
        self.tick_interval_seconds = tick - tick % TICK_INTERVAL_STEP;
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            0.5
        };
        self
    }

    pub fn break_minutes(&self, break_type: BreakType) -> u32 {
        match break_type {
            BreakType::A => self.break_a_minutes,
            BreakType::B => self.break_b_minutes,
        }
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.lecture_minutes {
            self.lecture_minutes = v;
        }
        if let Some(v) = patch.break_a_minutes {
            self.break_a_minutes = v;
        }
        if let Some(v) = patch.break_b_minutes {
            self.break_b_minutes = v;
        }
        if let Some(v) = patch.selected_break_type {
            self.selected_break_type = v;
        }
        if let Some(v) = patch.warning_minutes {
            self.warning_minutes = v;
        }
        if let Some(v) = patch.tick_interval_seconds {
            self.tick_interval_seconds = v;
        }
        if let Some(v) = patch.volume {
            self.volume = v;
        }
        if let Some(v) = patch.muted {
            self.muted = v;
        }
        if let Some(ref v) = patch.sounds {
            self.sounds = v.clone();
        }
    }
}

fn clamp(value: u32, (min, max): (u32, u32)) -> u32 {
    value.clamp(min, max)
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub lecture_minutes: Option<u32>,
    pub break_a_minutes: Option<u32>,
    pub break_b_minutes: Option<u32>,
    pub selected_break_type: Option<BreakType>,
    pub warning_minutes: Option<u32>,
    pub tick_interval_seconds: Option<u32>,
    pub volume: Option<f64>,
    pub muted: Option<bool>,
    pub sounds: Option<SoundSelections>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Drop every field that `edited` sets
    pub fn forget(&mut self, edited: &SettingsPatch) {
        if edited.lecture_minutes.is_some() {
            self.lecture_minutes = None;
        }
        if edited.break_a_minutes.is_some() {
            self.break_a_minutes = None;
        }
        if edited.break_b_minutes.is_some() {
            self.break_b_minutes = None;
        }
        if edited.selected_break_type.is_some() {
            self.selected_break_type = None;
        }
        if edited.warning_minutes.is_some() {
            self.warning_minutes = None;
        }
        if edited.tick_interval_seconds.is_some() {
            self.tick_interval_seconds = None;
        }
        if edited.volume.is_some() {
            self.volume = None;
        }
        if edited.muted.is_some() {
            self.muted = None;
        }
        if edited.sounds.is_some() {
            self.sounds = None;
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<(), StorageError>;

    /// Load, merge `patch`, clamp and save; returns what was written
    fn set(&self, patch: &SettingsPatch) -> Result<Settings, StorageError> {
        let mut settings = self.load();
        settings.apply(patch);
        let settings = settings.clamped();
        self.save(&settings)?;
        Ok(settings)
    }
}

/// Settings kept as a JSON blob under `timerSettings`
#[derive(Debug)]
pub struct StoredSettings<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StoredSettings<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> SettingsStore for StoredSettings<S> {
    fn load(&self) -> Settings {
        match self.store.get(TIMER_SETTINGS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Settings>(&raw) {
                Ok(settings) => settings.clamped(),
                Err(e) => {
                    warn!("ignoring unreadable timer settings: {e}");
                    Settings::default()
                }
            },
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("failed to read timer settings: {e}");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        let data = serde_json::to_string(settings)?;
        self.store.set(TIMER_SETTINGS_KEY, &data)
    }
}
