use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub const MAX_VOLUME: u32 = 100;
pub const DEFAULT_CLICK_VOLUME: u32 = 50;
pub const DEFAULT_ACCENT_VOLUME: u32 = 80;

/// Settings the user may change while a run is in progress.
#[derive(Debug)]
pub struct LiveSettings {
    accent_enabled: AtomicBool,
    click_volume: AtomicU32,  // 0-100
    accent_volume: AtomicU32, // 0-100
}

impl LiveSettings {
    pub fn new() -> Self {
        Self::with_values(true, DEFAULT_CLICK_VOLUME, DEFAULT_ACCENT_VOLUME)
    }

    pub fn with_values(accent_enabled: bool, click_volume: u32, accent_volume: u32) -> Self {
        Self {
            accent_enabled: AtomicBool::new(accent_enabled),
            click_volume: AtomicU32::new(click_volume.min(MAX_VOLUME)),
            accent_volume: AtomicU32::new(accent_volume.min(MAX_VOLUME)),
        }
    }

    pub fn accent_enabled(&self) -> bool {
        self.accent_enabled.load(Ordering::Relaxed)
    }

    pub fn set_accent_enabled(&self, enabled: bool) {
        self.accent_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flips the accent toggle and returns the new value.
    pub fn toggle_accent(&self) -> bool {
        !self.accent_enabled.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn click_volume(&self) -> u32 {
        self.click_volume.load(Ordering::Relaxed)
    }

    pub fn set_click_volume(&self, volume: u32) {
        self.click_volume.store(volume.min(MAX_VOLUME), Ordering::Relaxed);
    }

    pub fn accent_volume(&self) -> u32 {
        self.accent_volume.load(Ordering::Relaxed)
    }

    pub fn set_accent_volume(&self, volume: u32) {
        self.accent_volume.store(volume.min(MAX_VOLUME), Ordering::Relaxed);
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress of the active run, written by the worker and read by the UI.
#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
    current_beat_index: AtomicU32,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn current_beat_index(&self) -> u32 {
        self.current_beat_index.load(Ordering::Relaxed)
    }

    pub fn begin(&self) {
        self.current_beat_index.store(0, Ordering::Relaxed);
        self.running.store(true, Ordering::Relaxed);
    }

    pub fn set_beat(&self, index: u32) {
        self.current_beat_index.store(index, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.current_beat_index.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LiveSettings::new();
        assert!(settings.accent_enabled());
        assert_eq!(settings.click_volume(), 50);
        assert_eq!(settings.accent_volume(), 80);
    }

    #[test]
    fn test_volume_is_clamped() {
        let settings = LiveSettings::with_values(false, 250, 101);
        assert_eq!(settings.click_volume(), 100);
        assert_eq!(settings.accent_volume(), 100);

        settings.set_click_volume(0);
        settings.set_accent_volume(1000);
        assert_eq!(settings.click_volume(), 0);
        assert_eq!(settings.accent_volume(), 100);
    }

    #[test]
    fn test_toggle_accent_returns_new_value() {
        let settings = LiveSettings::new();
        assert!(!settings.toggle_accent());
        assert!(!settings.accent_enabled());
        assert!(settings.toggle_accent());
        assert!(settings.accent_enabled());
    }

    #[test]
    fn test_run_state_lifecycle() {
        let state = RunState::new();
        assert!(!state.is_running());

        state.begin();
        state.set_beat(7);
        assert!(state.is_running());
        assert_eq!(state.current_beat_index(), 7);

        state.reset();
        assert!(!state.is_running());
        assert_eq!(state.current_beat_index(), 0);
    }
}
