// TabStash Practice Core - metronome, auto-scroll and tab search
// Sample-accurate clicks via a lookahead scheduler feeding a lock-free queue

// Module declarations
pub mod audio;
pub mod beat_clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod scroll;
pub mod search;
pub mod session;

// Re-exports for convenience
pub use beat_clock::{BeatClock, BeatEvent, Tempo};
pub use config::PracticeConfig;
pub use error::{AudioError, ErrorCode, SearchError};
pub use scroll::{ScrollDriver, ScrollMode, ScrollState};
pub use search::{filter_tab_list, SearchDocument, SearchIndex, SearchService, TabItem};
pub use session::{PracticeSession, SessionPatch};
