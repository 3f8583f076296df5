//! Auto-scroll for the tab viewer
//!
//! The driver is host-agnostic: a [`ScrollSurface`] stands in for the page
//! and a [`FrameRequester`] for the display refresh callback. Tempo sync
//! follows a [`BeatClock`](crate::beat_clock::BeatClock) through its watch
//! channel.

pub mod driver;
pub mod speed;
pub mod surface;

pub use driver::{ScrollDriver, ScrollMode, ScrollState};
pub use speed::{ScrollSpeed, SpeedPresets};
pub use surface::{FrameQueue, FrameRequester, FrameToken, ScrollSurface, VirtualSurface};
