use std::num::NonZeroU32;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pro_metronome::audio::SilentPlayer;
use pro_metronome::scheduler::COUNTDOWN_BEATS;
use pro_metronome::utilities::state::LiveSettings;
use pro_metronome::{BeatEvent, BeatScheduler, CancelToken, Metronome, RunOutcome, TempoConfig, Update};

fn nz(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

#[test]
fn events_are_spaced_by_the_interval() {
    // 1200 BPM -> 50ms between events
    let config = TempoConfig::new(nz(1200), Some(nz(4)), nz(4));
    let scheduler = BeatScheduler::new(config, Arc::new(LiveSettings::new()));

    let start = Instant::now();
    let mut stamps: Vec<(BeatEvent, Duration)> = Vec::new();
    let outcome = scheduler.run(&CancelToken::new(), |e| stamps.push((e, start.elapsed())));
    let total = start.elapsed();

    assert_eq!(outcome, RunOutcome::Finished);
    assert_eq!(stamps.len(), (COUNTDOWN_BEATS + 4) as usize);

    // sleeps never return early, so each gap is at least one interval
    for pair in stamps.windows(2) {
        assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(50));
    }
    assert!(total >= Duration::from_millis(50 * 8));
}

#[test]
fn stop_takes_effect_within_one_interval() {
    let mut metronome = Metronome::new(Arc::new(SilentPlayer), Arc::new(LiveSettings::new()));

    // 600 BPM -> 100ms interval, unbounded
    metronome.start("600", "", "4").unwrap();
    thread::sleep(Duration::from_millis(650));
    assert!(metronome.is_running());

    let stop_requested = Instant::now();
    metronome.stop();
    metronome.join();
    let latency = stop_requested.elapsed();

    assert!(latency <= Duration::from_millis(100) + Duration::from_millis(150), "latency {:?}", latency);
    assert!(!metronome.is_running());

    let mut last = None;
    while let Some(update) = metronome.try_recv_update() {
        last = Some(update);
    }
    assert_eq!(last, Some(Update::Ended(RunOutcome::Stopped)));
}
