use chrono::{DateTime, Local};

use crate::timer::Mode;

pub const IDLE_END_CLOCK: &str = "--:--:--";

/// Which session controls are offered in the current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub start_lecture: bool,
    pub resume_lecture: bool,
    pub start_break: bool,
    pub stop: bool,
    pub adjust_end_time: bool,
}

impl Controls {
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            start_lecture: mode == Mode::Idle,
            resume_lecture: mode == Mode::Break,
            start_break: mode != Mode::Break,
            stop: mode != Mode::Idle,
            adjust_end_time: mode != Mode::Idle,
        }
    }
}

/// Everything a view needs to draw the timer
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub timer_text: String,
    /// 0.0..=1.0
    pub progress: f64,
    pub end_clock_text: String,
    pub mode: Mode,
    pub is_overtime: bool,
    pub session_count: u32,
    pub controls: Controls,
}

impl Default for DisplayFrame {
    fn default() -> Self {
        Self {
            timer_text: format_time(0),
            progress: 0.0,
            end_clock_text: IDLE_END_CLOCK.to_string(),
            mode: Mode::Idle,
            is_overtime: false,
            session_count: 0,
            controls: Controls::for_mode(Mode::Idle),
        }
    }
}

impl DisplayFrame {
    pub fn progress_percent(&self) -> u16 {
        (self.progress * 100.0).round().clamp(0.0, 100.0) as u16
    }
}

/// Receives a freshly computed frame after every timer mutation.
/// Must be cheap; it is called on every tick.
pub trait DisplayPort {
    fn render(&mut self, frame: &DisplayFrame);
}

/// Keeps the latest frame for a UI that draws on its own schedule
#[derive(Debug, Default)]
pub struct FrameCache {
    frame: DisplayFrame,
    renders: u64,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &DisplayFrame {
        &self.frame
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }
}

impl DisplayPort for FrameCache {
    fn render(&mut self, frame: &DisplayFrame) {
        self.frame = frame.clone();
        self.renders += 1;
    }
}

/// `MM:SS` of the absolute value; minutes are not wrapped into hours
pub fn format_time(seconds: i64) -> String {
    let abs = seconds.unsigned_abs();
    format!("{:02}:{:02}", abs / 60, abs % 60)
}

pub fn format_clock(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(3000), "50:00");
        assert_eq!(format_time(-75), "01:15");
    }

    #[test]
    fn test_format_time_past_an_hour() {
        assert_eq!(format_time(300 * 60), "300:00");
    }

    #[test]
    fn test_format_clock() {
        let at = Local.with_ymd_and_hms(2024, 4, 1, 9, 5, 7).unwrap();
        assert_eq!(format_clock(at), "09:05:07");
    }

    #[test]
    fn test_controls_per_mode() {
        let idle = Controls::for_mode(Mode::Idle);
        assert!(idle.start_lecture && idle.start_break);
        assert!(!idle.stop && !idle.resume_lecture && !idle.adjust_end_time);

        let lecture = Controls::for_mode(Mode::Lecture);
        assert!(!lecture.start_lecture && lecture.start_break && lecture.stop);

        let brk = Controls::for_mode(Mode::Break);
        assert!(brk.resume_lecture && !brk.start_break && brk.stop);
    }

    #[test]
    fn test_frame_cache_counts_renders() {
        let mut cache = FrameCache::new();
        let frame = DisplayFrame {
            timer_text: "12:34".into(),
            ..DisplayFrame::default()
        };
        cache.render(&frame);
        cache.render(&frame);
        assert_eq!(cache.renders(), 2);
        assert_eq!(cache.frame().timer_text, "12:34");
    }

    #[test]
    fn test_progress_percent_rounds() {
        let frame = DisplayFrame {
            progress: 0.456,
            ..DisplayFrame::default()
        };
        assert_eq!(frame.progress_percent(), 46);
    }
}
