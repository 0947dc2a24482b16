use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use log::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::settings::{Settings, SoundSelections};

/// The three audible events the timer can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Cue {
    Warning,
    End,
    Elapsed,
}

const WARNING_VARIANTS: [&str; 3] = ["sound1-1", "sound1-2", "sound1-3"];
const END_VARIANTS: [&str; 3] = ["sound2-1", "sound2-2", "sound2-3"];
const ELAPSED_VARIANTS: [&str; 3] = ["sound3-1", "sound3-2", "sound3-3"];

impl Cue {
    pub const ALL: [Cue; 3] = [Cue::Warning, Cue::End, Cue::Elapsed];

    /// Bundled sound ids selectable for this cue
    pub fn variants(self) -> &'static [&'static str; 3] {
        match self {
            Cue::Warning => &WARNING_VARIANTS,
            Cue::End => &END_VARIANTS,
            Cue::Elapsed => &ELAPSED_VARIANTS,
        }
    }

    /// i18n key of the cue's label
    pub fn label_key(self) -> &'static str {
        match self {
            Cue::Warning => "label-warning-sound",
            Cue::End => "label-end-sound",
            Cue::Elapsed => "label-tick-sound",
        }
    }

    /// i18n key naming the bundled variant `id`, e.g. `sound2-3` -> `sound-end-3`
    pub fn variant_label_key(self, id: &str) -> Option<String> {
        let family = match self {
            Cue::Warning => "warning",
            Cue::End => "end",
            Cue::Elapsed => "tick",
        };
        let index = self.variants().iter().position(|v| *v == id)?;
        Some(format!("sound-{family}-{}", index + 1))
    }
}

/// Volume, mute and per-cue selection the player honours
#[derive(Debug, Clone, PartialEq)]
pub struct SoundConfig {
    pub volume: f64,
    pub muted: bool,
    pub selections: SoundSelections,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for SoundConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            volume: settings.volume,
            muted: settings.muted,
            selections: settings.sounds.clone(),
        }
    }
}

impl SoundConfig {
    pub fn is_audible(&self) -> bool {
        !self.muted && self.volume > 0.0
    }
}

/// Fire-and-forget cue playback; implementations swallow their own failures
pub trait SoundPlayer {
    fn play(&mut self, cue: Cue);
    fn configure(&mut self, config: &SoundConfig);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Played,
    Bell,
    Muted,
    Silent,
    Disabled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    /// Platform player command, terminal bell when no sound file exists
    #[default]
    System,
    /// Terminal bell only
    Bell,
    Disabled,
}

/// Plays cue files through the platform's command line audio player
#[derive(Debug)]
pub struct SystemSoundPlayer {
    config: SoundConfig,
    mode: PlaybackMode,
    sounds_dir: Option<PathBuf>,
    children: Vec<Child>,
}

impl SystemSoundPlayer {
    pub fn new(config: SoundConfig) -> Self {
        Self::with_mode(config, PlaybackMode::System)
    }

    pub fn with_mode(config: SoundConfig, mode: PlaybackMode) -> Self {
        Self {
            config,
            mode,
            sounds_dir: AppDirs::sounds_dir(),
            children: Vec::new(),
        }
    }

    pub fn with_sounds_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sounds_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    pub fn sound_path(&self, cue: Cue) -> Option<PathBuf> {
        self.sounds_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.wav", self.config.selections.for_cue(cue))))
    }

    pub fn play_with_outcome(&mut self, cue: Cue) -> PlaybackOutcome {
        self.reap_finished();

        if self.config.muted {
            return PlaybackOutcome::Muted;
        }
        if self.config.volume <= 0.0 {
            return PlaybackOutcome::Silent;
        }

        match self.mode {
            PlaybackMode::Disabled => PlaybackOutcome::Disabled,
            PlaybackMode::Bell => ring_bell(),
            PlaybackMode::System => match self.sound_path(cue).filter(|p| p.is_file()) {
                Some(path) => match self.spawn_player(&path) {
                    Ok(child) => {
                        self.children.push(child);
                        PlaybackOutcome::Played
                    }
                    Err(e) => {
                        warn!("failed to play {} cue from {}: {e}", cue, path.display());
                        PlaybackOutcome::Failed
                    }
                },
                None => ring_bell(),
            },
        }
    }

    fn spawn_player(&self, path: &Path) -> io::Result<Child> {
        let mut cmd = player_command(path, self.config.volume);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }

    fn reap_finished(&mut self) {
        self.children
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

#[cfg(target_os = "macos")]
fn player_command(path: &Path, volume: f64) -> Command {
    let mut cmd = Command::new("afplay");
    cmd.arg("-v").arg(format!("{volume:.2}")).arg(path);
    cmd
}

#[cfg(not(target_os = "macos"))]
fn player_command(path: &Path, volume: f64) -> Command {
    // paplay volume is linear, 65536 = 100%
    let mut cmd = Command::new("paplay");
    cmd.arg(format!("--volume={}", (volume * 65536.0).round() as u32))
        .arg(path);
    cmd
}

fn ring_bell() -> PlaybackOutcome {
    let mut stdout = io::stdout();
    match stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
        Ok(()) => PlaybackOutcome::Bell,
        Err(e) => {
            warn!("failed to ring terminal bell: {e}");
            PlaybackOutcome::Failed
        }
    }
}

impl SoundPlayer for SystemSoundPlayer {
    fn play(&mut self, cue: Cue) {
        let outcome = self.play_with_outcome(cue);
        debug!("{cue} cue: {outcome:?}");
    }

    fn configure(&mut self, config: &SoundConfig) {
        self.config = config.clone();
    }
}

/// Collects cues instead of playing them; applies the same mute/volume gate
#[derive(Debug, Default)]
pub struct RecordingPlayer {
    config: SoundConfig,
    played: Vec<Cue>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> &[Cue] {
        &self.played
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.played.iter().filter(|c| **c == cue).count()
    }

    pub fn take(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.played)
    }
}

impl SoundPlayer for RecordingPlayer {
    fn play(&mut self, cue: Cue) {
        if self.config.is_audible() {
            self.played.push(cue);
        }
    }

    fn configure(&mut self, config: &SoundConfig) {
        self.config = config.clone();
    }
}
