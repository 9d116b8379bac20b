use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::InputError;

pub const DEFAULT_BEATS_PER_MEASURE: NonZeroU32 = NonZeroU32::new(4).unwrap();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoConfig {
    pub bpm: NonZeroU32,
    /// `None` runs until cancelled.
    pub total_beats: Option<NonZeroU32>,
    pub beats_per_measure: NonZeroU32,
}

impl TempoConfig {
    pub fn new(bpm: NonZeroU32, total_beats: Option<NonZeroU32>, beats_per_measure: NonZeroU32) -> Self {
        Self {
            bpm,
            total_beats,
            beats_per_measure,
        }
    }

    /// Blank beat count means unbounded, blank beats-per-measure means 4.
    pub fn parse(bpm: &str, total_beats: &str, beats_per_measure: &str) -> Result<Self, InputError> {
        let bpm = parse_positive(bpm).ok_or_else(|| InputError::InvalidBpm(bpm.to_string()))?;

        let total_beats = if total_beats.trim().is_empty() {
            None
        } else {
            Some(
                parse_positive(total_beats)
                    .ok_or_else(|| InputError::InvalidBeatCount(total_beats.to_string()))?,
            )
        };

        let beats_per_measure = if beats_per_measure.trim().is_empty() {
            DEFAULT_BEATS_PER_MEASURE
        } else {
            parse_positive(beats_per_measure)
                .ok_or_else(|| InputError::InvalidMeasure(beats_per_measure.to_string()))?
        };

        Ok(Self::new(bpm, total_beats, beats_per_measure))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(60) / self.bpm.get()
    }

    pub fn is_accent_position(&self, index: u32) -> bool {
        index % self.beats_per_measure.get() == 0
    }
}

fn parse_positive(text: &str) -> Option<NonZeroU32> {
    // i64 first so "-3" is rejected as non-positive rather than as garbage
    let value: i64 = text.trim().parse().ok()?;
    u32::try_from(value).ok().and_then(NonZeroU32::new)
}
