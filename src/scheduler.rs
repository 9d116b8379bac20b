use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::config::TempoConfig;
use crate::utilities::state::LiveSettings;

pub const COUNTDOWN_BEATS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    /// Countdown ticks count 4 down to 1, main beats count up from 0.
    pub index: u32,
    pub is_accent: bool,
    pub is_countdown: bool,
}

impl BeatEvent {
    pub fn countdown(index: u32) -> Self {
        Self {
            index,
            is_accent: false,
            is_countdown: true,
        }
    }

    pub fn beat(index: u32, is_accent: bool) -> Self {
        Self {
            index,
            is_accent,
            is_countdown: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Stopped,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Finished => write!(f, "Finished"),
            RunOutcome::Stopped => write!(f, "Stopped"),
        }
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Shared stop flag. Clones observe the same flag, and cancelling wakes any
/// thread parked in [`CancelToken::wait_timeout`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        let _guard = self.state.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.state.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` or until cancelled, whichever comes first.
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let guard = self.state.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .state
            .wake
            .wait_timeout_while(guard, duration, |_| !self.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_cancelled()
    }
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration, cancel: &CancelToken);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) {
        cancel.wait_timeout(duration);
    }
}

pub struct BeatScheduler {
    config: TempoConfig,
    settings: Arc<LiveSettings>,
    sleeper: Arc<dyn Sleeper>,
}

impl BeatScheduler {
    pub fn new(config: TempoConfig, settings: Arc<LiveSettings>) -> Self {
        Self::with_sleeper(config, settings, Arc::new(ThreadSleeper))
    }

    pub fn with_sleeper(config: TempoConfig, settings: Arc<LiveSettings>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            config,
            settings,
            sleeper,
        }
    }

    /// Runs the countdown and then the main beat loop on the calling thread.
    /// Returns once `cancel` is set or every beat has been played.
    pub fn run<F>(&self, cancel: &CancelToken, mut on_event: F) -> RunOutcome
    where
        F: FnMut(BeatEvent),
    {
        let interval = self.config.interval();

        for i in (1..=COUNTDOWN_BEATS).rev() {
            if cancel.is_cancelled() {
                debug!(remaining = i, "cancelled during countdown");
                return RunOutcome::Stopped;
            }
            on_event(BeatEvent::countdown(i));
            self.sleeper.sleep(interval, cancel);
        }

        let mut index: u32 = 0;
        while !cancel.is_cancelled() && self.has_beat(index) {
            let is_accent = self.settings.accent_enabled() && self.config.is_accent_position(index);
            on_event(BeatEvent::beat(index, is_accent));
            self.sleeper.sleep(interval, cancel);
            index = index.saturating_add(1);
        }

        if cancel.is_cancelled() {
            RunOutcome::Stopped
        } else {
            RunOutcome::Finished
        }
    }

    fn has_beat(&self, index: u32) -> bool {
        match self.config.total_beats {
            Some(total) => index < total.get(),
            None => true,
        }
    }
}
