use std::collections::HashMap;

use crossterm::style::Color;

use crate::utilities::sound::{ClickKind, apply_volume};

#[derive(Debug)]
pub struct SoundCache {
    sounds: HashMap<ClickKind, Vec<f32>>,
}

impl SoundCache {
    pub fn new() -> Self {
        let mut sounds = HashMap::new();
        for &kind in &ClickKind::ALL {
            sounds.insert(kind, kind.create_sound());
        }
        Self { sounds }
    }

    pub fn get_sound(&self, kind: ClickKind) -> &[f32] {
        &self.sounds[&kind]
    }

    pub fn scaled(&self, kind: ClickKind, volume: u32) -> Vec<f32> {
        apply_volume(self.get_sound(kind), volume)
    }
}

impl Default for SoundCache {
    fn default() -> Self {
        Self::new()
    }
}

/// What was last drawn, so unchanged panels are skipped on redraw.
#[derive(Default)]
pub struct UICache {
    pub last_fields: [String; 3],
    pub last_focus: usize,
    pub last_status: String,
    pub last_beat_label: String,
    pub last_time_label: String,
    pub last_flash: Option<Color>,
    pub last_accent: bool,
    pub last_click_volume: u32,
    pub last_accent_volume: u32,
    pub last_running: bool,
    pub first_render: bool,
}

impl UICache {
    pub fn new() -> Self {
        Self {
            first_render: true,
            ..Default::default()
        }
    }
}
