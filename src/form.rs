use crate::config::TempoConfig;
use crate::error::InputError;

pub const BPM_PRESETS: [u32; 4] = [60, 80, 100, 120];
pub const MIN_NUDGE_BPM: u32 = 30;
pub const MAX_NUDGE_BPM: u32 = 300;
const FALLBACK_BPM: u32 = 100;
const MAX_FIELD_LEN: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Bpm,
    Beats,
    Measure,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Bpm, Field::Beats, Field::Measure];

    pub fn index(&self) -> usize {
        match self {
            Field::Bpm => 0,
            Field::Beats => 1,
            Field::Measure => 2,
        }
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Bpm => "BPM",
            Field::Beats => "Beats",
            Field::Measure => "Beats per Measure",
        }
    }
}

/// The three text inputs exactly as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputForm {
    fields: [String; 3],
    focus: Field,
}

impl InputForm {
    pub fn new(bpm: &str, beats: &str, measure: &str) -> Self {
        Self {
            fields: [bpm.to_string(), beats.to_string(), measure.to_string()],
            focus: Field::Bpm,
        }
    }

    pub fn get(&self, field: Field) -> &str {
        &self.fields[field.index()]
    }

    pub fn fields(&self) -> &[String; 3] {
        &self.fields
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Appends a digit to the focused field. Other characters are ignored.
    pub fn push_char(&mut self, c: char) {
        let field = &mut self.fields[self.focus.index()];
        if c.is_ascii_digit() && field.len() < MAX_FIELD_LEN {
            field.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.fields[self.focus.index()].pop();
    }

    pub fn set_bpm(&mut self, preset: u32) {
        self.fields[Field::Bpm.index()] = preset.to_string();
    }

    /// Moves the BPM field by `change`, clamped to 30..=300.
    pub fn nudge_bpm(&mut self, change: i32) {
        let current = self.get(Field::Bpm).trim().parse::<u32>().unwrap_or(FALLBACK_BPM);
        let new_bpm = (current as i64 + change as i64).clamp(MIN_NUDGE_BPM as i64, MAX_NUDGE_BPM as i64) as u32;
        self.set_bpm(new_bpm);
    }

    pub fn parse(&self) -> Result<TempoConfig, InputError> {
        TempoConfig::parse(self.get(Field::Bpm), self.get(Field::Beats), self.get(Field::Measure))
    }
}

impl Default for InputForm {
    fn default() -> Self {
        Self::new("100", "16", "4")
    }
}
