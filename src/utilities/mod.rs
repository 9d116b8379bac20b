pub mod cache;
pub mod display;
pub mod sound;
pub mod state;
