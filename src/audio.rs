use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rodio::{OutputStream, buffer::SamplesBuffer};
use tracing::{debug, info, warn};

use crate::error::AudioError;
use crate::utilities::cache::SoundCache;
use crate::utilities::sound::{ClickKind, SAMPLE_RATE};

pub enum AudioCommand {
    Play(Vec<f32>),
    Shutdown,
}

/// Anything that can sound a click at a given volume (0-100).
pub trait ClickPlayer: Send + Sync {
    fn play(&self, kind: ClickKind, volume: u32);
}

pub struct AudioHandle {
    audio_tx: mpsc::Sender<AudioCommand>,
    sound_cache: Arc<SoundCache>,
    thread: Option<JoinHandle<()>>,
}

impl AudioHandle {
    /// Blocks until the output device is open on the audio thread.
    pub fn spawn(sound_cache: Arc<SoundCache>) -> Result<Self, AudioError> {
        let (audio_tx, audio_rx) = mpsc::channel::<AudioCommand>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), AudioError>>(1);

        let thread = thread::Builder::new()
            .name("audio".into())
            .spawn(move || audio_loop(audio_rx, ready_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => return Err(AudioError::ThreadGone),
        }

        info!("audio output ready");
        Ok(Self {
            audio_tx,
            sound_cache,
            thread: Some(thread),
        })
    }

    fn send(&self, cmd: AudioCommand) {
        if self.audio_tx.send(cmd).is_err() {
            warn!("audio thread is gone, dropping command");
        }
    }
}

impl ClickPlayer for AudioHandle {
    fn play(&self, kind: ClickKind, volume: u32) {
        debug!(kind = kind.name(), volume, "play");
        self.send(AudioCommand::Play(self.sound_cache.scaled(kind, volume)));
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        self.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn audio_loop(audio_rx: mpsc::Receiver<AudioCommand>, ready_tx: mpsc::SyncSender<Result<(), AudioError>>) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready_tx.send(Err(AudioError::Stream(e)));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    while let Ok(cmd) = audio_rx.recv() {
        match cmd {
            AudioCommand::Play(sound_data) => {
                // play_raw mixes, so a long tone at a fast tempo overlaps instead of queueing
                let source = SamplesBuffer::new(1, SAMPLE_RATE, sound_data);
                if let Err(e) = stream_handle.play_raw(source) {
                    warn!("failed to play click: {e}");
                }
            }
            AudioCommand::Shutdown => break,
        }
    }
    debug!("audio thread exiting");
}

/// Plays nothing. Used by headless runs with `--mute` and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl ClickPlayer for SilentPlayer {
    fn play(&self, _kind: ClickKind, _volume: u32) {}
}
