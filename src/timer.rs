use chrono::{DateTime, DurationRound, Local, TimeDelta};
use log::{debug, info};

use crate::clock::Clock;
use crate::display::{format_clock, format_time, Controls, DisplayFrame, DisplayPort, IDLE_END_CLOCK};
use crate::settings::{BreakType, Settings};
use crate::sound::{Cue, SoundConfig, SoundPlayer};

/// Cadence of the session tick while a session runs
pub const TICK_PERIOD: TimeDelta = TimeDelta::seconds(1);
/// Delay between a finished break and the lecture that follows it
pub const AUTO_CHAIN_DELAY: TimeDelta = TimeDelta::seconds(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Mode {
    #[default]
    Idle,
    Lecture,
    Break,
}

/// Result of an end-time adjustment request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndTimeAdjustment {
    /// New custom end time in effect
    Applied(DateTime<Local>),
    /// The break was ended by the adjustment
    BreakEnded,
    /// Nothing changed: idle, or the target was not in the future
    Rejected,
}

/// What a call to [`LectureTimer::poll`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Idle,
    Waiting,
    Ticked,
    AutoChained,
}

/// Lecture/break session state machine.
///
/// Remaining time is always re-derived from wall-clock deltas, never counted
/// down, so late or skipped ticks self-correct on the next evaluation.
#[derive(Debug)]
pub struct LectureTimer<C: Clock, P: SoundPlayer, D: DisplayPort> {
    clock: C,
    player: P,
    display: D,
    settings: Settings,
    mode: Mode,
    origin: Option<DateTime<Local>>,
    planned_secs: i64,
    custom_end: Option<DateTime<Local>>,
    remaining: i64,
    overtime: bool,
    // Set when the lecture first runs out; survives adjustments out of overtime
    completed: bool,
    warning_fired: bool,
    last_elapsed_cue: Option<i64>,
    session_count: u32,
    selected_break: BreakType,
    // At most one tick schedule and one deferred lecture start exist at a time.
    next_tick: Option<DateTime<Local>>,
    pending_chain: Option<DateTime<Local>>,
}

impl<C: Clock, P: SoundPlayer, D: DisplayPort> LectureTimer<C, P, D> {
    pub fn new(clock: C, mut player: P, display: D, settings: Settings) -> Self {
        let settings = settings.clamped();
        player.configure(&SoundConfig::from(&settings));
        let mut timer = Self {
            clock,
            player,
            display,
            selected_break: settings.selected_break_type,
            settings,
            mode: Mode::Idle,
            origin: None,
            planned_secs: 0,
            custom_end: None,
            remaining: 0,
            overtime: false,
            completed: false,
            warning_fired: false,
            last_elapsed_cue: None,
            session_count: 0,
            next_tick: None,
            pending_chain: None,
        };
        timer.render();
        timer
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode != Mode::Idle
    }

    pub fn is_overtime(&self) -> bool {
        self.overtime
    }

    /// Seconds left as of the last evaluation; negative in overtime
    pub fn remaining_seconds(&self) -> i64 {
        self.remaining
    }

    pub fn planned_duration_seconds(&self) -> i64 {
        self.planned_secs
    }

    pub fn custom_end_time(&self) -> Option<DateTime<Local>> {
        self.custom_end
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn selected_break_type(&self) -> BreakType {
        self.selected_break
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_ticking(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn has_pending_auto_chain(&self) -> bool {
        self.pending_chain.is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Replace the configuration; a running session keeps its planned duration
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings.clamped();
        self.player.configure(&SoundConfig::from(&self.settings));
        if self.mode == Mode::Idle {
            self.selected_break = self.settings.selected_break_type;
        }
        self.render();
    }

    /// Flip the mute flag; returns the new value
    pub fn toggle_mute(&mut self) -> bool {
        self.settings.muted = !self.settings.muted;
        self.player.configure(&SoundConfig::from(&self.settings));
        self.settings.muted
    }

    /// Play a cue through the configured player, e.g. to preview a sound choice
    pub fn preview_cue(&mut self, cue: Cue) {
        self.player.play(cue);
    }

    /// Start a lecture; ignored while a lecture is already running
    pub fn start_lecture(&mut self) -> bool {
        if self.mode == Mode::Lecture {
            return false;
        }
        let planned = minutes_to_secs(self.settings.lecture_minutes);
        self.begin_session(Mode::Lecture, planned);
        info!("lecture started ({} min)", planned / 60);
        true
    }

    pub fn start_break(&mut self, break_type: BreakType) {
        self.selected_break = break_type;
        let planned = minutes_to_secs(self.settings.break_minutes(break_type));
        self.begin_session(Mode::Break, planned);
        info!("break {break_type} started ({} min)", planned / 60);
    }

    /// Return to idle, cancelling the tick schedule and any pending auto-chain
    pub fn stop_timer(&mut self) {
        if self.mode != Mode::Idle {
            info!("{} stopped", self.mode);
        }
        self.reset_to_idle();
        self.render();
    }

    /// Move the session end by `delta_minutes`, landing on a whole minute
    pub fn adjust_end_time(&mut self, delta_minutes: i64) -> EndTimeAdjustment {
        if self.mode == Mode::Idle {
            return EndTimeAdjustment::Rejected;
        }

        let now = self.clock.now();
        self.remaining = self.remaining_at(now);
        let current_end = self
            .custom_end
            .unwrap_or_else(|| now + TimeDelta::seconds(self.remaining));
        let Ok(target) =
            (current_end + TimeDelta::minutes(delta_minutes)).duration_trunc(TimeDelta::minutes(1))
        else {
            return EndTimeAdjustment::Rejected;
        };

        if target <= now {
            // A break asked to end in the past simply ends now.
            if self.mode == Mode::Break {
                self.complete_break(now);
                return EndTimeAdjustment::BreakEnded;
            }
            debug!("end time {} rejected, not in the future", format_clock(target));
            return EndTimeAdjustment::Rejected;
        }

        self.custom_end = Some(target);
        self.remaining = self.remaining_at(now);
        info!("{} end time set to {}", self.mode, format_clock(target));

        if self.mode == Mode::Break && self.remaining <= 0 {
            self.complete_break(now);
            return EndTimeAdjustment::BreakEnded;
        }
        if self.overtime && self.remaining >= 0 {
            self.overtime = false;
            self.last_elapsed_cue = None;
        }

        self.render();
        EndTimeAdjustment::Applied(target)
    }

    /// Drive the timer from an event loop; call as often as convenient
    pub fn poll(&mut self) -> PollOutcome {
        let now = self.clock.now();

        if let Some(due) = self.pending_chain {
            if now >= due {
                self.pending_chain = None;
                self.start_lecture();
                return PollOutcome::AutoChained;
            }
        }

        match self.next_tick {
            Some(due) if now >= due => {
                let next = due + TICK_PERIOD;
                self.next_tick = Some(if next > now { next } else { now + TICK_PERIOD });
                self.tick();
                PollOutcome::Ticked
            }
            Some(_) => PollOutcome::Waiting,
            None if self.pending_chain.is_some() => PollOutcome::Waiting,
            None => PollOutcome::Idle,
        }
    }

    /// One session evaluation: recompute, detect overtime or break end, raise cues
    pub fn tick(&mut self) {
        if self.mode == Mode::Idle {
            return;
        }

        let now = self.clock.now();
        self.remaining = self.remaining_at(now);
        debug!("{} tick, {}s remaining", self.mode, self.remaining);

        match self.mode {
            Mode::Lecture if self.remaining < 0 => {
                if !self.overtime {
                    self.overtime = true;
                    if !self.completed {
                        self.completed = true;
                        self.session_count += 1;
                        info!("lecture reached its end, overtime begins");
                        self.player.play(Cue::End);
                    }
                }
                self.render();
                self.check_elapsed_cue();
            }
            Mode::Break if self.remaining <= 0 => self.complete_break(now),
            _ => {
                self.render();
                self.check_warning_cue();
            }
        }
    }

    /// Re-evaluate and redraw without raising cues, e.g. after a resume
    pub fn refresh(&mut self) {
        if self.mode != Mode::Idle {
            self.remaining = self.remaining_at(self.clock.now());
        }
        self.render();
    }

    pub fn end_time(&self) -> Option<DateTime<Local>> {
        if self.mode == Mode::Idle {
            return None;
        }
        let now = self.clock.now();
        Some(self.custom_end.unwrap_or_else(|| {
            if self.remaining > 0 {
                now + TimeDelta::seconds(self.remaining)
            } else {
                now
            }
        }))
    }

    pub fn frame(&self) -> DisplayFrame {
        let timer_text = match self.mode {
            Mode::Idle => format_time(minutes_to_secs(self.settings.lecture_minutes)),
            _ if self.overtime => format!("+{}", format_time(self.remaining)),
            _ => format_time(self.remaining),
        };

        let progress = match self.mode {
            Mode::Idle => 0.0,
            _ if self.overtime => 1.0,
            _ => {
                let total = self.planned_secs.max(1) as f64;
                ((total - self.remaining as f64) / total).clamp(0.0, 1.0)
            }
        };

        let end_clock_text = self
            .end_time()
            .map(format_clock)
            .unwrap_or_else(|| IDLE_END_CLOCK.to_string());

        DisplayFrame {
            timer_text,
            progress,
            end_clock_text,
            mode: self.mode,
            is_overtime: self.overtime,
            session_count: self.session_count,
            controls: Controls::for_mode(self.mode),
        }
    }

    fn begin_session(&mut self, mode: Mode, planned_secs: i64) {
        let now = self.clock.now();
        self.mode = mode;
        self.planned_secs = planned_secs;
        self.origin = Some(now);
        self.custom_end = None;
        self.overtime = false;
        self.completed = false;
        self.warning_fired = false;
        self.last_elapsed_cue = None;
        self.remaining = planned_secs;
        self.pending_chain = None;
        self.next_tick = Some(now + TICK_PERIOD);
        self.render();
    }

    fn reset_to_idle(&mut self) {
        self.mode = Mode::Idle;
        self.origin = None;
        self.custom_end = None;
        self.overtime = false;
        self.completed = false;
        self.remaining = 0;
        self.next_tick = None;
        self.pending_chain = None;
    }

    fn complete_break(&mut self, now: DateTime<Local>) {
        info!("break finished, lecture resumes shortly");
        self.reset_to_idle();
        self.render();
        self.player.play(Cue::End);
        self.pending_chain = Some(now + AUTO_CHAIN_DELAY);
    }

    fn check_warning_cue(&mut self) {
        if self.mode != Mode::Lecture || self.overtime || self.completed || self.warning_fired {
            return;
        }
        if self.remaining == minutes_to_secs(self.settings.warning_minutes) {
            self.warning_fired = true;
            info!("warning threshold reached");
            self.player.play(Cue::Warning);
        }
    }

    fn check_elapsed_cue(&mut self) {
        let over = -self.remaining;
        let interval = i64::from(self.settings.tick_interval_seconds.max(1));
        if over > 0 && over % interval == 0 && self.last_elapsed_cue != Some(over) {
            self.last_elapsed_cue = Some(over);
            self.player.play(Cue::Elapsed);
        }
    }

    fn remaining_at(&self, now: DateTime<Local>) -> i64 {
        match (self.custom_end, self.origin) {
            (Some(end), _) => floor_secs(end - now),
            (None, Some(origin)) => self.planned_secs - floor_secs(now - origin),
            (None, None) => self.planned_secs,
        }
    }

    fn render(&mut self) {
        let frame = self.frame();
        self.display.render(&frame);
    }
}

fn minutes_to_secs(minutes: u32) -> i64 {
    i64::from(minutes.max(1)) * 60
}

fn floor_secs(delta: TimeDelta) -> i64 {
    delta.num_milliseconds().div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::display::FrameCache;
    use crate::sound::RecordingPlayer;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    type TestTimer = LectureTimer<ManualClock, RecordingPlayer, FrameCache>;

    fn start_at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 4, 1, h, m, s).unwrap()
    }

    fn timer_with(settings: Settings) -> TestTimer {
        LectureTimer::new(
            ManualClock::new(start_at(9, 0, 0)),
            RecordingPlayer::new(),
            FrameCache::new(),
            settings,
        )
    }

    fn timer() -> TestTimer {
        timer_with(Settings::default())
    }

    /// Advance one second at a time, polling like the event loop does
    fn run_secs(timer: &mut TestTimer, secs: i64) {
        for _ in 0..secs {
            timer.clock().advance_secs(1);
            timer.poll();
        }
    }

    #[test]
    fn test_idle_frame() {
        let timer = timer();
        let frame = timer.display().frame();
        assert_eq!(frame.mode, Mode::Idle);
        assert_eq!(frame.timer_text, "50:00");
        assert_eq!(frame.progress, 0.0);
        assert_eq!(frame.end_clock_text, "--:--:--");
        assert!(timer.custom_end_time().is_none());
        assert!(!timer.is_overtime());
    }

    #[test]
    fn test_start_lecture_sets_planned_duration() {
        let mut timer = timer();
        assert!(timer.start_lecture());
        assert_eq!(timer.mode(), Mode::Lecture);
        assert_eq!(timer.planned_duration_seconds(), 3000);

        timer.clock().advance_millis(400);
        timer.refresh();
        let remaining = timer.remaining_seconds();
        assert!(remaining > 2998 && remaining <= 3000, "got {remaining}");
        assert_eq!(timer.display().frame().end_clock_text, "09:50:00");
    }

    #[test]
    fn test_start_lecture_twice_is_ignored() {
        let mut timer = timer();
        timer.start_lecture();
        run_secs(&mut timer, 10);
        assert!(!timer.start_lecture());
        assert_eq!(timer.remaining_seconds(), 2990);
    }

    #[test]
    fn test_countdown_follows_wall_clock_across_missed_ticks() {
        let mut timer = timer();
        timer.start_lecture();

        // a suspended terminal delivers no ticks for two minutes
        timer.clock().advance_secs(125);
        assert_eq!(timer.poll(), PollOutcome::Ticked);
        assert_eq!(timer.remaining_seconds(), 3000 - 125);
        assert_eq!(timer.display().frame().timer_text, "47:55");
    }

    #[test]
    fn test_lecture_enters_overtime_once() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            ..Settings::default()
        });
        timer.start_lecture();

        run_secs(&mut timer, 60);
        assert!(!timer.is_overtime());
        assert_eq!(timer.display().frame().timer_text, "00:00");

        run_secs(&mut timer, 1);
        assert!(timer.is_overtime());
        assert_eq!(timer.mode(), Mode::Lecture);
        assert_eq!(timer.player().count(Cue::End), 1);
        assert_eq!(timer.session_count(), 1);

        run_secs(&mut timer, 30);
        assert_eq!(timer.player().count(Cue::End), 1);
        assert_eq!(timer.session_count(), 1);
        let frame = timer.display().frame();
        assert_eq!(frame.timer_text, "+00:31");
        assert_eq!(frame.progress, 1.0);
        assert!(frame.is_overtime);
    }

    #[test]
    fn test_overtime_runs_without_cutoff() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            ..Settings::default()
        });
        timer.start_lecture();
        timer.clock().advance_secs(60 + 5 * 3600);
        timer.poll();
        assert_eq!(timer.mode(), Mode::Lecture);
        assert!(timer.is_overtime());
        assert_eq!(timer.display().frame().timer_text, "+300:00");
    }

    #[test]
    fn test_elapsed_cue_on_interval_multiples() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            tick_interval_seconds: 60,
            ..Settings::default()
        });
        timer.start_lecture();
        run_secs(&mut timer, 60);

        run_secs(&mut timer, 30);
        assert_eq!(timer.player().count(Cue::Elapsed), 0);
        run_secs(&mut timer, 30);
        assert_eq!(timer.player().count(Cue::Elapsed), 1);
        run_secs(&mut timer, 30);
        assert_eq!(timer.player().count(Cue::Elapsed), 1);
        run_secs(&mut timer, 30);
        assert_eq!(timer.player().count(Cue::Elapsed), 2);
        run_secs(&mut timer, 60);
        assert_eq!(timer.player().count(Cue::Elapsed), 3);
    }

    #[test]
    fn test_elapsed_cue_not_repeated_within_same_second() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            tick_interval_seconds: 10,
            ..Settings::default()
        });
        timer.start_lecture();
        timer.clock().advance_secs(70);
        timer.tick();
        timer.tick();
        assert_eq!(timer.player().count(Cue::Elapsed), 1);
    }

    #[test]
    fn test_warning_fires_once_per_lecture() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 5,
            warning_minutes: 3,
            ..Settings::default()
        });
        timer.start_lecture();

        run_secs(&mut timer, 119);
        assert_eq!(timer.player().count(Cue::Warning), 0);
        run_secs(&mut timer, 1);
        assert_eq!(timer.remaining_seconds(), 180);
        assert_eq!(timer.player().count(Cue::Warning), 1);

        // push the end out a minute, then cross 03:00 again
        assert_matches!(timer.adjust_end_time(1), EndTimeAdjustment::Applied(_));
        assert_eq!(timer.remaining_seconds(), 240);
        run_secs(&mut timer, 60);
        assert_eq!(timer.remaining_seconds(), 180);
        assert_eq!(timer.player().count(Cue::Warning), 1);
    }

    #[test]
    fn test_warning_rearms_for_next_lecture() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 4,
            warning_minutes: 3,
            ..Settings::default()
        });
        timer.start_lecture();
        run_secs(&mut timer, 60);
        timer.stop_timer();
        timer.start_lecture();
        run_secs(&mut timer, 60);
        assert_eq!(timer.player().count(Cue::Warning), 2);
    }

    #[test]
    fn test_break_never_goes_into_overtime() {
        let mut timer = timer_with(Settings {
            break_a_minutes: 1,
            ..Settings::default()
        });
        timer.start_break(BreakType::A);
        run_secs(&mut timer, 60);

        assert_eq!(timer.mode(), Mode::Idle);
        assert!(!timer.is_overtime());
        assert_eq!(timer.player().count(Cue::End), 1);
        assert_eq!(timer.session_count(), 0);
        assert!(timer.has_pending_auto_chain());
    }

    #[test]
    fn test_break_completion_auto_chains_lecture() {
        let mut timer = timer_with(Settings {
            break_b_minutes: 2,
            ..Settings::default()
        });
        timer.start_break(BreakType::B);
        assert_eq!(timer.planned_duration_seconds(), 120);
        run_secs(&mut timer, 120);
        assert_eq!(timer.mode(), Mode::Idle);

        timer.clock().advance_millis(500);
        assert_eq!(timer.poll(), PollOutcome::Waiting);
        timer.clock().advance_millis(500);
        assert_eq!(timer.poll(), PollOutcome::AutoChained);
        assert_eq!(timer.mode(), Mode::Lecture);
        assert_eq!(timer.planned_duration_seconds(), 3000);
        assert!(!timer.has_pending_auto_chain());
    }

    #[test]
    fn test_stop_cancels_pending_auto_chain() {
        let mut timer = timer_with(Settings {
            break_a_minutes: 1,
            ..Settings::default()
        });
        timer.start_break(BreakType::A);
        run_secs(&mut timer, 60);
        assert!(timer.has_pending_auto_chain());

        timer.stop_timer();
        assert!(!timer.has_pending_auto_chain());
        run_secs(&mut timer, 5);
        assert_eq!(timer.mode(), Mode::Idle);
    }

    #[test]
    fn test_manual_start_cancels_pending_auto_chain() {
        let mut timer = timer_with(Settings {
            break_a_minutes: 1,
            ..Settings::default()
        });
        timer.start_break(BreakType::A);
        run_secs(&mut timer, 60);

        timer.start_break(BreakType::B);
        run_secs(&mut timer, 3);
        assert_eq!(timer.mode(), Mode::Break);
        assert_eq!(timer.selected_break_type(), BreakType::B);
    }

    #[test]
    fn test_adjust_when_idle_is_noop() {
        let mut timer = timer();
        assert_eq!(timer.adjust_end_time(10), EndTimeAdjustment::Rejected);
        assert_eq!(timer.mode(), Mode::Idle);
        assert!(timer.custom_end_time().is_none());
    }

    #[test]
    fn test_adjust_truncates_to_whole_minute() {
        let mut timer = timer();
        timer.clock().set(start_at(9, 0, 30));
        timer.start_lecture();

        let outcome = timer.adjust_end_time(1);
        assert_eq!(outcome, EndTimeAdjustment::Applied(start_at(9, 51, 0)));
        assert_eq!(timer.custom_end_time(), Some(start_at(9, 51, 0)));
        assert_eq!(timer.remaining_seconds(), 3030);
        assert_eq!(timer.display().frame().end_clock_text, "09:51:00");
    }

    #[test]
    fn test_adjust_stacks_on_custom_end() {
        let mut timer = timer();
        timer.start_lecture();
        timer.adjust_end_time(10);
        timer.adjust_end_time(-1);
        assert_eq!(timer.custom_end_time(), Some(start_at(9, 59, 0)));
    }

    #[test]
    fn test_adjust_into_past_is_rejected_for_lecture() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 5,
            ..Settings::default()
        });
        timer.start_lecture();
        run_secs(&mut timer, 10);

        assert_eq!(timer.adjust_end_time(-10), EndTimeAdjustment::Rejected);
        assert_eq!(timer.mode(), Mode::Lecture);
        assert!(timer.custom_end_time().is_none());
        assert_eq!(timer.remaining_seconds(), 290);
    }

    #[test]
    fn test_adjust_rejection_keeps_existing_custom_end() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 5,
            ..Settings::default()
        });
        timer.start_lecture();
        timer.adjust_end_time(1);
        let before = timer.custom_end_time();
        assert_eq!(timer.adjust_end_time(-10), EndTimeAdjustment::Rejected);
        assert_eq!(timer.custom_end_time(), before);
    }

    #[test]
    fn test_adjust_break_into_past_completes_it() {
        let mut timer = timer_with(Settings {
            break_a_minutes: 5,
            ..Settings::default()
        });
        timer.start_break(BreakType::A);

        assert_eq!(timer.adjust_end_time(-10), EndTimeAdjustment::BreakEnded);
        assert_eq!(timer.mode(), Mode::Idle);
        assert_eq!(timer.player().count(Cue::End), 1);
        assert!(timer.has_pending_auto_chain());

        run_secs(&mut timer, 1);
        assert_eq!(timer.mode(), Mode::Lecture);
    }

    #[test]
    fn test_custom_end_drives_remaining() {
        let mut timer = timer();
        timer.start_lecture();
        timer.adjust_end_time(-40);
        assert_eq!(timer.custom_end_time(), Some(start_at(9, 10, 0)));

        timer.clock().advance_secs(61);
        timer.poll();
        assert_eq!(timer.remaining_seconds(), 539);
    }

    #[test]
    fn test_adjust_out_of_overtime_resumes_countdown() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            ..Settings::default()
        });
        timer.start_lecture();
        run_secs(&mut timer, 90);
        assert!(timer.is_overtime());

        assert_matches!(timer.adjust_end_time(2), EndTimeAdjustment::Applied(_));
        assert_eq!(timer.custom_end_time(), Some(start_at(9, 3, 0)));
        assert!(!timer.is_overtime());
        assert_eq!(timer.display().frame().timer_text, "01:30");
    }

    #[test]
    fn test_lecture_completes_once_across_adjustments() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            ..Settings::default()
        });
        timer.start_lecture();
        run_secs(&mut timer, 61);
        assert!(timer.is_overtime());
        assert_eq!(timer.session_count(), 1);

        assert_matches!(timer.adjust_end_time(2), EndTimeAdjustment::Applied(_));
        assert!(!timer.is_overtime());
        run_secs(&mut timer, 120);

        assert!(timer.is_overtime());
        assert_eq!(timer.session_count(), 1);
        assert_eq!(timer.player().count(Cue::End), 1);
        assert_eq!(timer.player().count(Cue::Warning), 0);

        timer.stop_timer();
        timer.start_lecture();
        run_secs(&mut timer, 61);
        assert_eq!(timer.session_count(), 2);
        assert_eq!(timer.player().count(Cue::End), 2);
    }

    #[test]
    fn test_break_stop_lecture_roundtrip() {
        let mut timer = timer();
        timer.start_break(BreakType::A);
        timer.adjust_end_time(5);
        timer.stop_timer();
        timer.start_lecture();

        assert!(timer.custom_end_time().is_none());
        assert!(!timer.is_overtime());
        assert_eq!(timer.mode(), Mode::Lecture);
    }

    #[test]
    fn test_stop_clears_schedule() {
        let mut timer = timer();
        timer.start_lecture();
        assert!(timer.is_ticking());
        timer.stop_timer();
        assert!(!timer.is_ticking());
        assert_eq!(timer.poll(), PollOutcome::Idle);

        let frame = timer.display().frame();
        assert_eq!(frame.progress, 0.0);
        assert_eq!(frame.end_clock_text, "--:--:--");
    }

    #[test]
    fn test_progress_fraction() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 10,
            ..Settings::default()
        });
        timer.start_lecture();
        run_secs(&mut timer, 150);
        assert!((timer.display().frame().progress - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_break_progress_uses_selected_break() {
        let mut timer = timer_with(Settings {
            break_a_minutes: 10,
            break_b_minutes: 20,
            ..Settings::default()
        });
        timer.start_break(BreakType::B);
        run_secs(&mut timer, 300);
        assert!((timer.display().frame().progress - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_end_clock_clamps_to_now_in_overtime() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            ..Settings::default()
        });
        timer.start_lecture();
        run_secs(&mut timer, 75);
        assert_eq!(timer.display().frame().end_clock_text, "09:01:15");
    }

    #[test]
    fn test_refresh_is_idempotent_and_silent() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            ..Settings::default()
        });
        timer.start_lecture();
        timer.clock().advance_secs(120);
        timer.refresh();
        let first = timer.display().frame().clone();
        timer.refresh();
        assert_eq!(timer.display().frame(), &first);
        assert_eq!(timer.remaining_seconds(), -60);
        assert!(timer.player().played().is_empty());
    }

    #[test]
    fn test_muted_timer_plays_nothing() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 1,
            muted: true,
            ..Settings::default()
        });
        timer.start_lecture();
        run_secs(&mut timer, 180);
        assert!(timer.is_overtime());
        assert!(timer.player().played().is_empty());
    }

    #[test]
    fn test_toggle_mute_reconfigures_player() {
        let mut timer = timer();
        assert!(timer.toggle_mute());
        timer.preview_cue(Cue::Warning);
        assert!(!timer.toggle_mute());
        timer.preview_cue(Cue::End);
        assert_eq!(timer.player().played(), &[Cue::End]);
    }

    #[test]
    fn test_zero_durations_are_clamped() {
        let mut timer = timer_with(Settings {
            lecture_minutes: 0,
            break_a_minutes: 0,
            ..Settings::default()
        });
        timer.start_lecture();
        assert_eq!(timer.planned_duration_seconds(), 60);
        timer.start_break(BreakType::A);
        assert_eq!(timer.planned_duration_seconds(), 60);
    }

    #[test]
    fn test_settings_change_updates_idle_display_only() {
        let mut timer = timer();
        timer.apply_settings(Settings {
            lecture_minutes: 25,
            ..Settings::default()
        });
        assert_eq!(timer.display().frame().timer_text, "25:00");

        timer.start_lecture();
        timer.apply_settings(Settings {
            lecture_minutes: 90,
            ..Settings::default()
        });
        assert_eq!(timer.planned_duration_seconds(), 1500);
    }

    #[test]
    fn test_display_rendered_on_every_mutation() {
        let mut timer = timer();
        let initial = timer.display().renders();
        timer.start_lecture();
        run_secs(&mut timer, 3);
        timer.stop_timer();
        assert_eq!(timer.display().renders(), initial + 5);
    }
}
