use crossterm::{
    cursor, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use std::io::Write;
use std::time::{Duration, Instant};

use crate::config::TempoConfig;
use crate::controller::{Metronome, Update};
use crate::error::InputError;
use crate::form::Field;
use crate::utilities::cache::UICache;

const TITLE_ROW: u16 = 1;
const DIVIDER_ROW: u16 = 2;
const FORM_PANEL_ROW: u16 = 4;
const STATUS_ROW: u16 = 9;
const BEAT_PANEL_ROW: u16 = 11;
const TIME_ROW: u16 = 15;
const SETTINGS_PANEL_ROW: u16 = 17;
const CONTROLS_TITLE_ROW: u16 = 22;
const CONTROLS_START_ROW: u16 = 23;

const COUNTDOWN_FLASH: Duration = Duration::from_millis(100);
const BEAT_FLASH: Duration = Duration::from_millis(50);
const IDLE_BEAT_COLOR: Color = Color::Red;

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub status: String,
    pub beat_label: String,
    pub time_label: String,
    total_beats: Option<u32>,
    flash: Option<(Color, Instant)>,
    settle: Option<Color>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: Update, now: Instant) {
        match update {
            Update::Started(config) => self.on_started(&config),
            Update::Beat(event) if event.is_countdown => {
                self.status = format!("Starting in {}", event.index);
                self.flash_then_settle(Color::White, Color::Red, now + COUNTDOWN_FLASH);
            }
            Update::Beat(event) => {
                self.status = "Running...".to_string();
                self.beat_label = match self.total_beats {
                    Some(total) => format!("Beat: {}/{}", event.index + 1, total),
                    None => format!("Beat: {}", event.index + 1),
                };
                self.time_label = chrono::Local::now().format("%H:%M:%S").to_string();
                if event.is_accent {
                    self.flash_then_settle(Color::Yellow, Color::Red, now + BEAT_FLASH);
                } else {
                    self.flash_then_settle(Color::Red, Color::Yellow, now + BEAT_FLASH);
                }
            }
            Update::Ended(outcome) => {
                self.status = outcome.to_string();
                self.beat_label.clear();
                self.flash = None;
                self.settle = None;
            }
        }
    }

    pub fn on_started(&mut self, config: &TempoConfig) {
        self.status = "Countdown...".to_string();
        self.total_beats = config.total_beats.map(|n| n.get());
        self.beat_label.clear();
    }

    pub fn on_input_error(&mut self, error: &InputError) {
        self.status = error.status_message().to_string();
    }

    fn flash_then_settle(&mut self, flash: Color, settle: Color, until: Instant) {
        self.flash = Some((flash, until));
        self.settle = Some(settle);
    }

    pub fn beat_color(&self, now: Instant) -> Color {
        match self.flash {
            Some((color, until)) if now < until => color,
            _ => self.settle.unwrap_or(IDLE_BEAT_COLOR),
        }
    }
}

fn draw_box_border<W: Write>(writer: &mut W, x: u16, y: u16, width: u16, height: u16) -> std::io::Result<()> {
    let horizontal = "-".repeat(width.saturating_sub(2) as usize);
    queue!(writer, cursor::MoveTo(x, y), Print(format!("+{}+", horizontal)))?;
    for i in 1..height.saturating_sub(1) {
        queue!(writer, cursor::MoveTo(x, y + i), Print("|"))?;
        queue!(writer, cursor::MoveTo(x + width - 1, y + i), Print("|"))?;
    }
    queue!(writer, cursor::MoveTo(x, y + height - 1), Print(format!("+{}+", horizontal)))?;
    Ok(())
}

pub fn create_progress_bar(progress: f64, width: usize, filled_char: char, empty_char: char) -> String {
    let filled_width = ((progress.clamp(0.0, 1.0)) * width as f64) as usize;
    let mut bar = String::with_capacity(width);
    for i in 0..width {
        bar.push(if i < filled_width { filled_char } else { empty_char });
    }
    bar
}

pub fn render<W: Write>(
    metronome: &Metronome,
    view: &ViewState,
    cache: &mut UICache,
    writer: &mut W,
    now: Instant,
) -> std::io::Result<()> {
    let form = metronome.form();
    let settings = metronome.settings();
    let accent = settings.accent_enabled();
    let click_volume = settings.click_volume();
    let accent_volume = settings.accent_volume();
    let running = metronome.is_running();
    let flash = view.beat_color(now);

    if cache.first_render {
        queue!(writer, Clear(ClearType::All))?;
        queue!(
            writer,
            cursor::MoveTo(20, TITLE_ROW),
            SetAttribute(Attribute::Bold),
            SetForegroundColor(Color::Blue),
            Print("=== PRO METRONOME ==="),
            ResetColor,
        )?;
        queue!(
            writer,
            cursor::MoveTo(5, DIVIDER_ROW),
            SetForegroundColor(Color::Cyan),
            Print("=".repeat(56)),
            ResetColor,
        )?;
        draw_controls(writer)?;
    }

    // Input fields
    if cache.first_render || form.fields() != &cache.last_fields || form.focus().index() != cache.last_focus {
        draw_box_border(writer, 5, FORM_PANEL_ROW, 40, 5)?;
        for field in Field::ALL {
            let row = FORM_PANEL_ROW + 1 + field.index() as u16;
            let focused = field == form.focus();
            queue!(
                writer,
                cursor::MoveTo(7, row),
                Clear(ClearType::UntilNewLine),
                SetForegroundColor(if focused { Color::Yellow } else { Color::White }),
                Print(format!("{} {:<18} [{:<6}]", if focused { '>' } else { ' ' }, field.label(), form.get(field))),
                ResetColor,
                cursor::MoveTo(44, row),
                Print("|"),
            )?;
        }
        cache.last_fields = form.fields().clone();
        cache.last_focus = form.focus().index();
    }

    if cache.first_render || view.status != cache.last_status || running != cache.last_running {
        queue!(
            writer,
            cursor::MoveTo(7, STATUS_ROW),
            Clear(ClearType::UntilNewLine),
            SetForegroundColor(Color::Yellow),
            Print(&view.status),
            ResetColor,
        )?;
        cache.last_status = view.status.clone();
        cache.last_running = running;
    }

    // Beat counter, colored by the current flash
    if cache.first_render || view.beat_label != cache.last_beat_label || Some(flash) != cache.last_flash {
        draw_box_border(writer, 5, BEAT_PANEL_ROW, 40, 3)?;
        queue!(
            writer,
            cursor::MoveTo(7, BEAT_PANEL_ROW + 1),
            Print(" ".repeat(36)),
            cursor::MoveTo(7, BEAT_PANEL_ROW + 1),
            SetAttribute(Attribute::Bold),
            SetForegroundColor(flash),
            Print(&view.beat_label),
            ResetColor,
        )?;
        cache.last_beat_label = view.beat_label.clone();
        cache.last_flash = Some(flash);
    }

    if cache.first_render || view.time_label != cache.last_time_label {
        queue!(
            writer,
            cursor::MoveTo(7, TIME_ROW),
            Clear(ClearType::UntilNewLine),
            SetForegroundColor(Color::White),
            Print(&view.time_label),
            ResetColor,
        )?;
        cache.last_time_label = view.time_label.clone();
    }

    if cache.first_render
        || accent != cache.last_accent
        || click_volume != cache.last_click_volume
        || accent_volume != cache.last_accent_volume
    {
        draw_box_border(writer, 5, SETTINGS_PANEL_ROW, 40, 5)?;
        queue!(
            writer,
            cursor::MoveTo(7, SETTINGS_PANEL_ROW + 1),
            SetForegroundColor(if accent { Color::Green } else { Color::DarkGrey }),
            Print(format!("Accent: {:<3}", if accent { "ON" } else { "OFF" })),
            ResetColor,
        )?;
        queue!(
            writer,
            cursor::MoveTo(7, SETTINGS_PANEL_ROW + 2),
            SetForegroundColor(Color::Cyan),
            Print(format!(
                "Click Volume:  {:>3}% {}",
                click_volume,
                create_progress_bar(click_volume as f64 / 100.0, 15, '#', '.')
            )),
            cursor::MoveTo(7, SETTINGS_PANEL_ROW + 3),
            Print(format!(
                "Accent Volume: {:>3}% {}",
                accent_volume,
                create_progress_bar(accent_volume as f64 / 100.0, 15, '#', '.')
            )),
            ResetColor,
        )?;
        cache.last_accent = accent;
        cache.last_click_volume = click_volume;
        cache.last_accent_volume = accent_volume;
    }

    cache.first_render = false;
    writer.flush()
}

fn draw_controls<W: Write>(writer: &mut W) -> std::io::Result<()> {
    const CONTROLS: [&str; 8] = [
        "TAB / SHIFT+TAB  Next / previous field, 0-9 and BACKSPACE edit",
        "ENTER            Start (restarts a running metronome)",
        "SPACE / X        Start-stop toggle / Stop",
        "A                Toggle accent",
        "V / C            Click volume +10 / -10",
        "SHIFT+V / C      Accent volume +10 / -10",
        "F1-F4            60 / 80 / 100 / 120 BPM,  arrows nudge BPM",
        "Q / ESC          Quit",
    ];

    queue!(
        writer,
        cursor::MoveTo(5, CONTROLS_TITLE_ROW),
        SetAttribute(Attribute::Bold),
        SetForegroundColor(Color::Magenta),
        Print("CONTROLS"),
        ResetColor,
    )?;
    for (i, line) in CONTROLS.iter().enumerate() {
        queue!(
            writer,
            cursor::MoveTo(5, CONTROLS_START_ROW + i as u16),
            SetForegroundColor(Color::DarkGrey),
            Print(line),
            ResetColor,
        )?;
    }
    Ok(())
}
