use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::metronome::ClickPulse;
use crate::error::AudioError;

use super::{AudioOutput, DeviceState};

/// Stub output used for deterministic testing and CLI tooling.
///
/// Pulses are recorded instead of played. The device clock is either a
/// [`ManualClock`] advanced by the caller or tokio's clock, which makes the
/// stub follow paused time in `#[tokio::test(start_paused = true)]` tests.
pub struct StubOutput {
    clock: StubClock,
    suspended: AtomicBool,
    resume_calls: AtomicU64,
    pulses: Mutex<Vec<ClickPulse>>,
}

enum StubClock {
    Manual(ManualClock),
    Tokio(tokio::time::Instant),
}

impl StubOutput {
    pub fn with_manual_clock(clock: ManualClock) -> Self {
        Self::from_clock(StubClock::Manual(clock))
    }

    /// Clock origin is the moment of construction.
    pub fn with_tokio_clock() -> Self {
        Self::from_clock(StubClock::Tokio(tokio::time::Instant::now()))
    }

    fn from_clock(clock: StubClock) -> Self {
        Self {
            clock,
            suspended: AtomicBool::new(false),
            resume_calls: AtomicU64::new(0),
            pulses: Mutex::new(Vec::new()),
        }
    }

    /// Puts the stub into the suspended power state.
    pub fn suspended(self) -> Self {
        self.suspended.store(true, Ordering::SeqCst);
        self
    }

    /// Snapshot of every pulse scheduled so far, in scheduling order.
    pub fn pulses(&self) -> Vec<ClickPulse> {
        self.pulses
            .lock()
            .map(|pulses| pulses.clone())
            .unwrap_or_default()
    }

    pub fn resume_calls(&self) -> u64 {
        self.resume_calls.load(Ordering::SeqCst)
    }
}

impl AudioOutput for StubOutput {
    fn current_time(&self) -> f64 {
        match &self.clock {
            StubClock::Manual(clock) => clock.now(),
            StubClock::Tokio(origin) => origin.elapsed().as_secs_f64(),
        }
    }

    fn state(&self) -> DeviceState {
        if self.suspended.load(Ordering::SeqCst) {
            DeviceState::Suspended
        } else {
            DeviceState::Running
        }
    }

    fn resume(&self) -> Result<(), AudioError> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        self.suspended.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn schedule_click(&self, pulse: ClickPulse) -> Result<(), AudioError> {
        self.pulses
            .lock()
            .map_err(|_| AudioError::LockPoisoned {
                component: "stub_output".to_string(),
            })?
            .push(pulse);
        Ok(())
    }
}

/// Manually advanced device clock, in seconds.
///
/// Clones share the same time value.
#[derive(Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}
