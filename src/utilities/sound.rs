use std::f32::consts::PI;

pub const SAMPLE_RATE: u32 = 44100;
pub const TONE_DURATION_MS: u32 = 100;
pub const CLICK_FREQUENCY: f32 = 1000.0;
pub const ACCENT_FREQUENCY: f32 = 1500.0;

const FADE_OUT_MS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClickKind {
    /// Regular beats and countdown ticks.
    Click,
    /// First beat of a measure.
    Accent,
}

impl ClickKind {
    pub const ALL: [ClickKind; 2] = [ClickKind::Click, ClickKind::Accent];

    pub fn name(&self) -> &'static str {
        match self {
            ClickKind::Click => "Click",
            ClickKind::Accent => "Accent",
        }
    }

    pub fn create_sound(&self) -> Vec<f32> {
        match self {
            ClickKind::Click => create_click_sound(),
            ClickKind::Accent => create_accent_sound(),
        }
    }
}

pub fn create_click_sound() -> Vec<f32> {
    create_tone(CLICK_FREQUENCY)
}

pub fn create_accent_sound() -> Vec<f32> {
    create_tone(ACCENT_FREQUENCY)
}

fn create_tone(frequency: f32) -> Vec<f32> {
    let samples = (SAMPLE_RATE * TONE_DURATION_MS / 1000) as usize;
    let fade_samples = (SAMPLE_RATE * FADE_OUT_MS / 1000) as usize;

    let mut wave: Vec<f32> = Vec::with_capacity(samples);
    for i in 0..samples {
        let t = i as f32 / SAMPLE_RATE as f32;
        // Short linear release so the tone doesn't end on a pop
        let remaining = samples - i;
        let envelope = if remaining < fade_samples {
            remaining as f32 / fade_samples as f32
        } else {
            1.0
        };
        let sample = (t * frequency * 2.0 * PI).sin() * envelope;
        wave.push(sample);
    }
    wave
}

/// Returns a copy of `samples` scaled by `volume` (0-100).
pub fn apply_volume(samples: &[f32], volume: u32) -> Vec<f32> {
    let gain = volume.min(100) as f32 / 100.0;
    samples.iter().map(|sample| sample * gain).collect()
}
