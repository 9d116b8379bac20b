use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor,
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll, read},
    execute,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use tracing::info;

use pro_metronome::audio::{AudioHandle, ClickPlayer, SilentPlayer};
use pro_metronome::cli::Args;
use pro_metronome::form::{BPM_PRESETS, InputForm};
use pro_metronome::logging;
use pro_metronome::utilities::cache::{SoundCache, UICache};
use pro_metronome::utilities::display::{ViewState, render};
use pro_metronome::utilities::state::LiveSettings;
use pro_metronome::{Metronome, Update};

const UI_UPDATE_INTERVAL: Duration = Duration::from_millis(16);
const VOLUME_STEP: i32 = 10;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::setup();

    let settings = Arc::new(LiveSettings::with_values(
        !args.no_accent,
        args.click_volume,
        args.accent_volume,
    ));

    // No output device is fatal, unless explicitly running silent
    let player: Arc<dyn ClickPlayer> = if args.headless && args.mute {
        Arc::new(SilentPlayer)
    } else {
        Arc::new(AudioHandle::spawn(Arc::new(SoundCache::new())).context("could not initialise audio output")?)
    };

    let mut metronome = Metronome::new(player, settings);
    *metronome.form_mut() = InputForm::new(&args.bpm, &args.beats, &args.measure);

    if args.headless {
        return run_headless(&mut metronome);
    }

    enable_raw_mode()?;
    execute!(io::stdout(), cursor::Hide, Clear(ClearType::All))?;

    let result = run_ui(&mut metronome);

    // Restore the terminal even if the UI loop failed
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Show, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    disable_raw_mode()?;
    result?;

    metronome.stop();
    println!("Metronome stopped. Goodbye!");
    Ok(())
}

fn run_ui(metronome: &mut Metronome) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(io::stdout());
    let mut view = ViewState::new();
    let mut cache = UICache::new();
    let mut last_ui_update = Instant::now();
    render(metronome, &view, &mut cache, &mut writer, last_ui_update)?;

    loop {
        let now = Instant::now();

        let mut dirty = false;
        while let Some(update) = metronome.try_recv_update() {
            view.apply(update, now);
            dirty = true;
        }

        if dirty || now.duration_since(last_ui_update) >= UI_UPDATE_INTERVAL {
            render(metronome, &view, &mut cache, &mut writer, now)?;
            last_ui_update = now;
        }

        if poll(Duration::from_millis(1))? {
            if let Event::Key(key_event) = read()? {
                if key_event.kind == KeyEventKind::Press && !handle_key(metronome, &mut view, key_event) {
                    break;
                }
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Returns `false` when the user asked to quit.
fn handle_key(metronome: &mut Metronome, view: &mut ViewState, key_event: KeyEvent) -> bool {
    let shift = key_event.modifiers.contains(KeyModifiers::SHIFT);
    match key_event.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Enter => start(metronome, view),
        KeyCode::Char(' ') => {
            if metronome.is_running() {
                metronome.stop();
            } else {
                start(metronome, view);
            }
        }
        KeyCode::Char('x') => metronome.stop(),
        KeyCode::Char('a') => {
            let enabled = metronome.toggle_accent();
            info!(enabled, "accent toggled");
        }
        KeyCode::Char('v') => metronome.adjust_click_volume(VOLUME_STEP),
        KeyCode::Char('c') => metronome.adjust_click_volume(-VOLUME_STEP),
        KeyCode::Char('V') => metronome.adjust_accent_volume(VOLUME_STEP),
        KeyCode::Char('C') => metronome.adjust_accent_volume(-VOLUME_STEP),
        KeyCode::Char(c) if c.is_ascii_digit() => metronome.form_mut().push_char(c),
        KeyCode::Backspace => metronome.form_mut().backspace(),
        KeyCode::Tab if shift => metronome.form_mut().focus_prev(),
        KeyCode::Tab => metronome.form_mut().focus_next(),
        KeyCode::BackTab => metronome.form_mut().focus_prev(),
        KeyCode::F(n @ 1..=4) => metronome.set_bpm(BPM_PRESETS[(n - 1) as usize]),
        KeyCode::Up => metronome.form_mut().nudge_bpm(5),
        KeyCode::Down => metronome.form_mut().nudge_bpm(-5),
        KeyCode::Right => metronome.form_mut().nudge_bpm(1),
        KeyCode::Left => metronome.form_mut().nudge_bpm(-1),
        _ => {}
    }
    true
}

fn start(metronome: &mut Metronome, view: &mut ViewState) {
    if let Err(e) = metronome.start_from_form() {
        view.on_input_error(&e);
    }
}

fn run_headless(metronome: &mut Metronome) -> anyhow::Result<()> {
    if let Err(e) = metronome.start_from_form() {
        println!("{}", e.status_message());
        return Err(e.into());
    }

    let mut view = ViewState::new();
    while let Some(update) = metronome.next_update() {
        view.apply(update, Instant::now());
        match update {
            Update::Beat(event) if !event.is_countdown => {
                let marker = if event.is_accent { '>' } else { ' ' };
                println!("{} {:<16} {}", marker, view.beat_label, view.time_label);
            }
            Update::Ended(_) => {
                println!("{}", view.status);
                break;
            }
            _ => println!("{}", view.status),
        }
    }
    metronome.join();
    Ok(())
}
