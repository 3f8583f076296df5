//! Engine module housing the audio output seam.
//!
//! `backend` defines the `AudioOutput` trait the beat clock schedules into,
//! the platform default factory and the stub output used off-device.

pub mod backend;

pub use backend::{
    default_output_factory, shared_output_factory, AudioOutput, DeviceState, ManualClock,
    OutputFactory, StubOutput,
};
