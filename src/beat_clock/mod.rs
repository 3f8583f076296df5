//! BeatClock - lookahead metronome
//!
//! - [`tempo`]: clamped BPM value
//! - [`scheduler`]: pure lookahead scheduling against the device clock
//! - [`pending`]: cancellable deferred beat callbacks
//! - [`clock`]: tokio-driven runtime tying them to an audio output

pub mod clock;
pub mod pending;
pub mod scheduler;
pub mod tempo;

pub use clock::{BeatClock, BeatObserver, TempoObserver};
pub use scheduler::{BeatEvent, LookaheadScheduler};
pub use tempo::Tempo;
