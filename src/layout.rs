use log::warn;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::storage::{KeyValueStore, StorageError, LAYOUT_LEFT_WIDTH_KEY};

pub const DEFAULT_LEFT_PERCENT: f64 = 50.0;
pub const MIN_LEFT_PERCENT: f64 = 30.0;
pub const MAX_LEFT_PERCENT: f64 = 70.0;

/// Timer pane / note pane split, as a percentage of the total width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitLayout {
    left_percent: f64,
    dragging: bool,
}

impl Default for SplitLayout {
    fn default() -> Self {
        Self {
            left_percent: DEFAULT_LEFT_PERCENT,
            dragging: false,
        }
    }
}

impl SplitLayout {
    pub fn with_percent(percent: f64) -> Self {
        let mut layout = Self::default();
        layout.set_percent(percent);
        layout
    }

    pub fn left_percent(&self) -> f64 {
        self.left_percent
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_percent(&mut self, percent: f64) {
        self.left_percent = if percent.is_finite() {
            percent.clamp(MIN_LEFT_PERCENT, MAX_LEFT_PERCENT)
        } else {
            DEFAULT_LEFT_PERCENT
        };
    }

    /// Put the divider under `column` of an area `total_width` cells wide
    pub fn resize_to(&mut self, column: u16, total_width: u16) {
        if total_width == 0 {
            return;
        }
        self.set_percent(f64::from(column) / f64::from(total_width) * 100.0);
    }

    pub fn nudge(&mut self, delta: f64) {
        self.set_percent(self.left_percent + delta);
    }

    pub fn reset(&mut self) {
        self.left_percent = DEFAULT_LEFT_PERCENT;
    }

    /// Split `area` into (timer, notes)
    pub fn split(&self, area: Rect) -> (Rect, Rect) {
        let left = self.left_percent.round() as u16;
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(left), Constraint::Percentage(100 - left)])
            .split(area);
        (chunks[0], chunks[1])
    }

    pub fn divider_column(&self, area: Rect) -> u16 {
        self.split(area).1.x
    }

    /// Start a drag when `column` hits the divider (one cell of slack either side)
    pub fn begin_drag(&mut self, column: u16, area: Rect) -> bool {
        let divider = self.divider_column(area);
        self.dragging = column.abs_diff(divider) <= 1;
        self.dragging
    }

    pub fn drag_to(&mut self, column: u16, area: Rect) {
        if self.dragging {
            self.resize_to(column.saturating_sub(area.x), area.width);
        }
    }

    /// Returns whether a drag was in progress, i.e. whether to persist
    pub fn end_drag(&mut self) -> bool {
        std::mem::replace(&mut self.dragging, false)
    }

    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get(LAYOUT_LEFT_WIDTH_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<f64>() {
                Ok(percent) => Self::with_percent(percent),
                Err(e) => {
                    warn!("ignoring layout width {raw:?}: {e}");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("failed to read layout width: {e}");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore>(&self, store: &S) -> Result<(), StorageError> {
        store.set(LAYOUT_LEFT_WIDTH_KEY, &self.left_percent.to_string())
    }
}
