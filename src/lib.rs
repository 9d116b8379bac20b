pub mod audio;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod logging;
pub mod scheduler;
pub mod utilities;

pub use config::TempoConfig;
pub use controller::{Metronome, Update};
pub use error::{AudioError, InputError};
pub use scheduler::{BeatEvent, BeatScheduler, CancelToken, RunOutcome};
