use clap::Parser;

use crate::utilities::state::{DEFAULT_ACCENT_VOLUME, DEFAULT_CLICK_VOLUME};

/// Terminal metronome with a counted-in start and accented downbeats.
#[derive(Parser, Debug, Clone)]
#[command(name = "pro-metronome", version, about)]
pub struct Args {
    /// Initial tempo in beats per minute.
    #[arg(long, default_value = "100")]
    pub bpm: String,

    /// Number of beats to play after the countdown. Empty plays until stopped.
    #[arg(long, default_value = "16")]
    pub beats: String,

    /// Beats per measure. The first beat of each measure is accented.
    #[arg(long, default_value = "4")]
    pub measure: String,

    /// Start with the accent turned off.
    #[arg(long)]
    pub no_accent: bool,

    /// Click volume, 0-100.
    #[arg(long, default_value_t = DEFAULT_CLICK_VOLUME, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub click_volume: u32,

    /// Accent volume, 0-100.
    #[arg(long, default_value_t = DEFAULT_ACCENT_VOLUME, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub accent_volume: u32,

    /// Play one run straight away and print beats instead of opening the UI.
    #[arg(long)]
    pub headless: bool,

    /// Don't open an audio device.
    #[arg(long, requires = "headless")]
    pub mute: bool,
}
