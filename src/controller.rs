use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::ClickPlayer;
use crate::config::TempoConfig;
use crate::error::InputError;
use crate::form::InputForm;
use crate::scheduler::{BeatEvent, BeatScheduler, CancelToken, RunOutcome, Sleeper, ThreadSleeper};
use crate::utilities::sound::ClickKind;
use crate::utilities::state::{LiveSettings, RunState};

const UPDATE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Started(TempoConfig),
    Beat(BeatEvent),
    Ended(RunOutcome),
}

struct ActiveRun {
    cancel: CancelToken,
    worker: JoinHandle<()>,
}

pub struct Metronome {
    settings: Arc<LiveSettings>,
    run_state: Arc<RunState>,
    player: Arc<dyn ClickPlayer>,
    sleeper: Arc<dyn Sleeper>,
    form: InputForm,
    update_tx: mpsc::Sender<Update>,
    update_rx: mpsc::Receiver<Update>,
    active: Option<ActiveRun>,
}

impl Metronome {
    pub fn new(player: Arc<dyn ClickPlayer>, settings: Arc<LiveSettings>) -> Self {
        Self::with_sleeper(player, settings, Arc::new(ThreadSleeper))
    }

    pub fn with_sleeper(player: Arc<dyn ClickPlayer>, settings: Arc<LiveSettings>, sleeper: Arc<dyn Sleeper>) -> Self {
        let (update_tx, update_rx) = mpsc::channel();
        Self {
            settings,
            run_state: Arc::new(RunState::new()),
            player,
            sleeper,
            form: InputForm::default(),
            update_tx,
            update_rx,
            active: None,
        }
    }

    /// Validates the inputs and starts a new run. An active run is stopped
    /// and joined first.
    pub fn start(&mut self, bpm: &str, total_beats: &str, beats_per_measure: &str) -> Result<(), InputError> {
        let config = TempoConfig::parse(bpm, total_beats, beats_per_measure).inspect_err(|e| {
            warn!("rejected input: {e}");
        })?;
        self.launch(config);
        Ok(())
    }

    pub fn start_from_form(&mut self) -> Result<(), InputError> {
        let config = self.form.parse().inspect_err(|e| {
            warn!("rejected input: {e}");
        })?;
        self.launch(config);
        Ok(())
    }

    pub fn launch(&mut self, config: TempoConfig) {
        if self.active.is_some() {
            info!("restarting active run");
        }
        self.stop_and_join();

        let cancel = CancelToken::new();
        let scheduler = BeatScheduler::with_sleeper(config, Arc::clone(&self.settings), Arc::clone(&self.sleeper));
        let settings = Arc::clone(&self.settings);
        let run_state = Arc::clone(&self.run_state);
        let player = Arc::clone(&self.player);
        let update_tx = self.update_tx.clone();
        let worker_cancel = cancel.clone();

        run_state.begin();
        let _ = update_tx.send(Update::Started(config));
        info!(
            bpm = config.bpm.get(),
            total_beats = ?config.total_beats,
            beats_per_measure = config.beats_per_measure.get(),
            "starting run"
        );

        let worker = thread::spawn(move || {
            let outcome = scheduler.run(&worker_cancel, |event| {
                // Volumes are read here so a change applies from the next beat on
                if event.is_accent {
                    player.play(ClickKind::Accent, settings.accent_volume());
                } else {
                    player.play(ClickKind::Click, settings.click_volume());
                }
                if !event.is_countdown {
                    run_state.set_beat(event.index);
                }
                debug!(?event, "beat");
                let _ = update_tx.send(Update::Beat(event));
            });
            run_state.reset();
            info!(%outcome, "run ended");
            let _ = update_tx.send(Update::Ended(outcome));
        });

        self.active = Some(ActiveRun { cancel, worker });
    }

    pub fn stop(&self) {
        if let Some(active) = &self.active {
            info!("stop requested");
            active.cancel.cancel();
        }
    }

    pub fn join(&mut self) {
        if let Some(active) = self.active.take() {
            if active.worker.join().is_err() {
                warn!("metronome worker panicked");
            }
        }
    }

    fn stop_and_join(&mut self) {
        self.stop();
        self.join();
    }

    pub fn is_running(&self) -> bool {
        self.run_state.is_running()
    }

    pub fn current_beat(&self) -> u32 {
        self.run_state.current_beat_index()
    }

    pub fn try_recv_update(&self) -> Option<Update> {
        self.update_rx.try_recv().ok()
    }

    pub fn recv_update_timeout(&self, timeout: Duration) -> Option<Update> {
        self.update_rx.recv_timeout(timeout).ok()
    }

    /// Blocks for the next update. Returns `None` once no run is active and
    /// everything it published has been received.
    pub fn next_update(&mut self) -> Option<Update> {
        loop {
            if let Some(update) = self.recv_update_timeout(UPDATE_POLL) {
                return Some(update);
            }
            if !self.is_running() {
                // run state resets just before Ended is sent
                self.join();
                return self.try_recv_update();
            }
        }
    }

    pub fn settings(&self) -> &LiveSettings {
        &self.settings
    }

    pub fn accent_enabled(&self) -> bool {
        self.settings.accent_enabled()
    }

    pub fn set_accent_enabled(&self, enabled: bool) {
        self.settings.set_accent_enabled(enabled);
    }

    pub fn toggle_accent(&self) -> bool {
        self.settings.toggle_accent()
    }

    pub fn set_click_volume(&self, volume: u32) {
        self.settings.set_click_volume(volume);
    }

    pub fn set_accent_volume(&self, volume: u32) {
        self.settings.set_accent_volume(volume);
    }

    pub fn adjust_click_volume(&self, change: i32) {
        let volume = (self.settings.click_volume() as i32 + change).clamp(0, 100) as u32;
        self.settings.set_click_volume(volume);
    }

    pub fn adjust_accent_volume(&self, change: i32) {
        let volume = (self.settings.accent_volume() as i32 + change).clamp(0, 100) as u32;
        self.settings.set_accent_volume(volume);
    }

    /// Takes effect on the next start.
    pub fn set_bpm(&mut self, preset: u32) {
        self.form.set_bpm(preset);
    }

    pub fn form(&self) -> &InputForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut InputForm {
        &mut self.form
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use super::*;

    #[derive(Default)]
    struct RecordingPlayer {
        plays: Mutex<Vec<(ClickKind, u32)>>,
    }

    impl RecordingPlayer {
        fn plays(&self) -> Vec<(ClickKind, u32)> {
            self.plays.lock().unwrap().clone()
        }
    }

    impl ClickPlayer for RecordingPlayer {
        fn play(&self, kind: ClickKind, volume: u32) {
            self.plays.lock().unwrap().push((kind, volume));
        }
    }

    struct FixedSleeper(Duration);

    impl Sleeper for FixedSleeper {
        fn sleep(&self, _duration: Duration, cancel: &CancelToken) {
            cancel.wait_timeout(self.0);
        }
    }

    fn build(step: Duration) -> (Metronome, Arc<RecordingPlayer>) {
        let player = Arc::new(RecordingPlayer::default());
        let metronome = Metronome::with_sleeper(
            player.clone(),
            Arc::new(LiveSettings::new()),
            Arc::new(FixedSleeper(step)),
        );
        (metronome, player)
    }

    fn drain(metronome: &Metronome) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Some(update) = metronome.try_recv_update() {
            updates.push(update);
        }
        updates
    }

    fn wait_for_beats(metronome: &Metronome, count: u32) -> Vec<Update> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut updates = Vec::new();
        let mut beats = 0;
        while beats < count && Instant::now() < deadline {
            if let Some(update) = metronome.recv_update_timeout(Duration::from_millis(50)) {
                if let Update::Beat(event) = update {
                    if !event.is_countdown {
                        beats += 1;
                    }
                }
                updates.push(update);
            }
        }
        assert_eq!(beats, count, "timed out waiting for beats");
        updates
    }

    fn wait_for_update(metronome: &Metronome, expected: Update) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if metronome.recv_update_timeout(Duration::from_millis(50)) == Some(expected) {
                return;
            }
        }
        panic!("timed out waiting for {:?}", expected);
    }

    #[test]
    fn test_invalid_input_never_starts() {
        let (mut metronome, player) = build(Duration::ZERO);

        for (bpm, beats, measure) in [("abc", "8", "4"), ("0", "8", "4"), ("120", "x", "4"), ("120", "8", "0")] {
            assert!(metronome.start(bpm, beats, measure).is_err());
        }

        assert!(!metronome.is_running());
        metronome.join();
        assert!(drain(&metronome).is_empty());
        assert!(player.plays().is_empty());
    }

    #[test]
    fn test_finite_run_publishes_every_event() {
        let (mut metronome, player) = build(Duration::ZERO);

        metronome.start("120", "8", "4").unwrap();
        metronome.join();

        let updates = drain(&metronome);
        let config = TempoConfig::parse("120", "8", "4").unwrap();
        assert_eq!(updates.first(), Some(&Update::Started(config)));
        assert_eq!(updates.last(), Some(&Update::Ended(RunOutcome::Finished)));

        let beats: Vec<BeatEvent> = updates
            .iter()
            .filter_map(|u| match u {
                Update::Beat(event) => Some(*event),
                _ => None,
            })
            .collect();
        assert_eq!(beats.len(), 12);
        assert!(beats[..4].iter().all(|e| e.is_countdown));
        assert_eq!(beats[4..].iter().map(|e| e.index).collect::<Vec<_>>(), (0..8).collect::<Vec<_>>());

        // countdown and regular beats click at 50, downbeats accent at 80
        let plays = player.plays();
        assert_eq!(plays.len(), 12);
        assert_eq!(plays[0], (ClickKind::Click, 50));
        assert_eq!(plays[4], (ClickKind::Accent, 80));
        assert_eq!(plays[5], (ClickKind::Click, 50));
        assert_eq!(plays[8], (ClickKind::Accent, 80));

        assert!(!metronome.is_running());
        assert_eq!(metronome.current_beat(), 0);
    }

    #[test]
    fn test_settings_apply_to_plays() {
        let (mut metronome, player) = build(Duration::ZERO);
        metronome.set_click_volume(30);
        metronome.set_accent_volume(150);
        metronome.set_accent_enabled(false);

        metronome.start("200", "4", "").unwrap();
        metronome.join();

        let plays = player.plays();
        assert_eq!(plays.len(), 8);
        assert!(plays.iter().all(|&p| p == (ClickKind::Click, 30)));
        assert_eq!(metronome.settings().accent_volume(), 100);
    }

    #[test]
    fn test_unbounded_run_stops_only_when_asked() {
        let (mut metronome, _) = build(Duration::from_millis(1));

        metronome.start("120", "", "4").unwrap();
        let updates = wait_for_beats(&metronome, 20);
        assert!(!updates.contains(&Update::Ended(RunOutcome::Finished)));
        assert!(metronome.is_running());

        metronome.stop();
        metronome.join();
        let rest = drain(&metronome);
        assert_eq!(rest.last(), Some(&Update::Ended(RunOutcome::Stopped)));
        assert!(!metronome.is_running());
    }

    #[test]
    fn test_stop_during_countdown() {
        let (mut metronome, _) = build(Duration::from_millis(100));

        metronome.start("120", "8", "4").unwrap();
        metronome.stop();
        metronome.join();

        let updates = drain(&metronome);
        assert_eq!(updates.last(), Some(&Update::Ended(RunOutcome::Stopped)));
        assert!(updates.iter().all(|u| match u {
            Update::Beat(event) => event.is_countdown,
            _ => true,
        }));
    }

    #[test]
    fn test_start_while_running_restarts() {
        let (mut metronome, _) = build(Duration::from_millis(1));

        metronome.start("120", "", "4").unwrap();
        wait_for_beats(&metronome, 3);

        metronome.start("90", "2", "4").unwrap();
        metronome.join();

        let updates = drain(&metronome);
        let started: Vec<usize> = updates
            .iter()
            .enumerate()
            .filter(|(_, u)| matches!(u, Update::Started(_)))
            .map(|(i, _)| i)
            .collect();
        let stopped = updates
            .iter()
            .position(|u| *u == Update::Ended(RunOutcome::Stopped))
            .expect("first run should report Stopped");

        // the old run is fully over before the new one begins
        assert_eq!(started.len(), 1);
        assert!(stopped < started[0]);
        assert_eq!(updates.last(), Some(&Update::Ended(RunOutcome::Finished)));
    }

    #[test]
    fn test_restart_does_not_wait_out_the_old_interval() {
        // real sleeper, 1 BPM: every wait is a full minute
        let mut metronome = Metronome::new(Arc::new(RecordingPlayer::default()), Arc::new(LiveSettings::new()));

        metronome.start("1", "", "4").unwrap();
        wait_for_update(&metronome, Update::Beat(BeatEvent::countdown(4)));

        let restart = Instant::now();
        metronome.start("1", "", "4").unwrap();
        assert!(restart.elapsed() < Duration::from_millis(200), "restart took {:?}", restart.elapsed());

        let quit = Instant::now();
        drop(metronome);
        assert!(quit.elapsed() < Duration::from_millis(200), "drop took {:?}", quit.elapsed());
    }

    #[test]
    fn test_next_update_ends_with_outcome() {
        let (mut metronome, _) = build(Duration::ZERO);
        assert_eq!(metronome.next_update(), None);

        metronome.start("300", "3", "4").unwrap();
        let mut updates = Vec::new();
        while let Some(update) = metronome.next_update() {
            updates.push(update);
        }

        assert_eq!(updates.len(), 1 + 4 + 3 + 1);
        assert_eq!(updates.last(), Some(&Update::Ended(RunOutcome::Finished)));
    }

    #[test]
    fn test_set_bpm_and_start_from_form() {
        let (mut metronome, _) = build(Duration::ZERO);
        metronome.set_bpm(80);
        metronome.form_mut().focus_next();
        metronome.form_mut().backspace();
        metronome.form_mut().backspace();
        metronome.form_mut().push_char('2');

        metronome.start_from_form().unwrap();
        metronome.join();

        let updates = drain(&metronome);
        match updates.first() {
            Some(Update::Started(config)) => {
                assert_eq!(config.bpm.get(), 80);
                assert_eq!(config.total_beats.map(|n| n.get()), Some(2));
            }
            other => panic!("expected Started, got {:?}", other),
        }
    }

    #[test]
    fn test_adjust_volume_clamps() {
        let (metronome, _) = build(Duration::ZERO);
        metronome.adjust_click_volume(-80);
        metronome.adjust_accent_volume(40);
        assert_eq!(metronome.settings().click_volume(), 0);
        assert_eq!(metronome.settings().accent_volume(), 100);
        assert!(!metronome.toggle_accent());
        assert!(!metronome.accent_enabled());
    }
}
