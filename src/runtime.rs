use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    /// Terminal regained focus; the timer re-derives its state from the clock
    FocusGained,
    Tick,
}

/// Source of terminal events (keyboard, mouse, resize, focus)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Ok(CtEvent::Mouse(mouse)) => AppEvent::Mouse(mouse),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(CtEvent::FocusGained) => AppEvent::FocusGained,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(forwarded).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    /// Faster than the one-second session tick so seconds never visibly skip
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks follow a fixed schedule: a steady stream of input never holds
/// back the next `Tick` past its deadline.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Cell<Instant>,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Cell::new(Instant::now() + ticker.interval());
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Returns the next event, or Tick once the tick deadline has passed
    pub fn step(&self) -> AppEvent {
        let now = Instant::now();
        let deadline = self.next_tick.get();
        if now >= deadline {
            return self.tick(now);
        }
        match self.event_source.recv_timeout(deadline - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.tick(Instant::now())
            }
        }
    }

    fn tick(&self, now: Instant) -> AppEvent {
        self.next_tick.set(now + self.ticker.interval());
        AppEvent::Tick
    }
}
