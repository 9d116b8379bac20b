use thiserror::Error;

/// Rejected user input. The run never starts when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid BPM: {0:?}")]
    InvalidBpm(String),

    #[error("invalid beat count: {0:?}")]
    InvalidBeatCount(String),

    #[error("invalid beats per measure: {0:?}")]
    InvalidMeasure(String),
}

impl InputError {
    pub fn status_message(&self) -> &'static str {
        "Please enter valid numbers!"
    }
}

/// Audio device failures. These are fatal at startup.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open default output stream: {0}")]
    Stream(#[from] rodio::StreamError),

    #[error("audio thread exited before reporting readiness")]
    ThreadGone,

    #[error("failed to spawn audio thread: {0}")]
    Spawn(#[from] std::io::Error),
}
