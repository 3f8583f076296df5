// Audio module - click synthesis, device output and offline rendering

#[cfg(not(target_os = "android"))]
pub mod engine_cpal;
pub mod metronome;
pub mod render;

// Re-export commonly used types for convenience
#[cfg(not(target_os = "android"))]
pub use engine_cpal::ClickEngine;
pub use metronome::{ClickPulse, ClickTone, ClickVoice};
pub use render::{
    render_click_track, write_wav, RenderedTrack, MAX_RENDER_SAMPLE_RATE, MAX_RENDER_SECONDS,
};
