//! ClickEngine - CPAL output stream with a device-clock pulse queue
//!
//! Architecture:
//! - Scheduler side: [`AudioOutput::schedule_click`] pushes pulses into a
//!   lock-free SPSC ring buffer
//! - Audio callback: drains the queue into a fixed set of voices and mixes
//!   them at their exact start frame
//! - Device clock: frames rendered / sample rate, advanced only by the
//!   callback
//!
//! `cpal::Stream` is not `Send` on every platform, so the stream lives on a
//! dedicated thread that holds it until the engine is dropped.

#[cfg(not(target_os = "android"))]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
#[cfg(not(target_os = "android"))]
use rtrb::{Consumer, Producer, RingBuffer};
#[cfg(not(target_os = "android"))]
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(not(target_os = "android"))]
use std::sync::{mpsc, Arc, Mutex};
#[cfg(not(target_os = "android"))]
use std::thread::JoinHandle;

#[cfg(not(target_os = "android"))]
use super::metronome::{ClickPulse, ClickVoice};
#[cfg(not(target_os = "android"))]
use crate::config::AudioConfig;
#[cfg(not(target_os = "android"))]
use crate::engine::backend::{AudioOutput, DeviceState};
#[cfg(not(target_os = "android"))]
use crate::error::{log_audio_error, AudioError};

/// Maximum clicks mixed at once; further pulses wait in the queue.
#[cfg(not(target_os = "android"))]
const MAX_VOICES: usize = 16;

#[cfg(not(target_os = "android"))]
pub struct ClickEngine {
    /// Producer side of the pulse queue
    pulses: Mutex<Producer<ClickPulse>>,
    /// Frames rendered by the output callback (the device clock)
    frame_counter: Arc<AtomicU64>,
    /// Suspended devices output silence and freeze the clock
    suspended: Arc<AtomicBool>,
    /// Sample rate in Hz
    sample_rate: u32,
    /// Dropping the sender releases the stream thread
    shutdown: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

#[cfg(not(target_os = "android"))]
impl ClickEngine {
    /// Opens the default output device.
    ///
    /// The engine starts suspended, like a freshly created browser audio
    /// context; the beat clock resumes it on `start()`.
    pub fn open(config: &AudioConfig) -> Result<Self, AudioError> {
        let (producer, consumer) = RingBuffer::new(config.pulse_queue_size.max(1));
        let frame_counter = Arc::new(AtomicU64::new(0));
        let suspended = Arc::new(AtomicBool::new(true));

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, AudioError>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread_counter = Arc::clone(&frame_counter);
        let thread_suspended = Arc::clone(&suspended);
        let worker = std::thread::Builder::new()
            .name("tabstash-audio".to_string())
            .spawn(move || {
                let (stream, sample_rate) =
                    match create_output_stream(consumer, thread_counter, thread_suspended) {
                        Ok(opened) => opened,
                        Err(err) => {
                            let _ = ready_tx.send(Err(err));
                            return;
                        }
                    };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(AudioError::HardwareError {
                        details: format!("Output start failed: {}", e),
                    }));
                    return;
                }
                let _ = ready_tx.send(Ok(sample_rate));

                // Hold the stream until the engine is dropped
                let _ = shutdown_rx.recv();
                drop(stream);
            })?;

        let sample_rate = ready_rx
            .recv()
            .map_err(|e| AudioError::StreamFailure {
                reason: format!("audio thread exited before reporting: {}", e),
            })?
            .map_err(|err| {
                log_audio_error(&err, "open_click_engine");
                err
            })?;

        log::info!(
            "[ClickEngine] Output stream open at {} Hz (queue {})",
            sample_rate,
            config.pulse_queue_size
        );

        Ok(ClickEngine {
            pulses: Mutex::new(producer),
            frame_counter,
            suspended,
            sample_rate,
            shutdown: Some(shutdown_tx),
            worker: Some(worker),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter.load(Ordering::Relaxed)
    }
}

#[cfg(not(target_os = "android"))]
impl AudioOutput for ClickEngine {
    fn current_time(&self) -> f64 {
        self.frame_counter() as f64 / self.sample_rate as f64
    }

    fn state(&self) -> DeviceState {
        if self.suspended.load(Ordering::Relaxed) {
            DeviceState::Suspended
        } else {
            DeviceState::Running
        }
    }

    fn resume(&self) -> Result<(), AudioError> {
        self.suspended.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn schedule_click(&self, pulse: ClickPulse) -> Result<(), AudioError> {
        let mut producer = self.pulses.lock().map_err(|_| AudioError::LockPoisoned {
            component: "click_engine_queue".to_string(),
        })?;
        producer.push(pulse).map_err(|_| AudioError::QueueFull)
    }
}

#[cfg(not(target_os = "android"))]
impl Drop for ClickEngine {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(not(target_os = "android"))]
fn create_output_stream(
    mut consumer: Consumer<ClickPulse>,
    frame_counter: Arc<AtomicU64>,
    suspended: Arc<AtomicBool>,
) -> Result<(cpal::Stream, u32), AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable {
            reason: "No default output device found".to_string(),
        })?;

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Failed to get default output config: {:?}", e),
        })?;

    let stream_config: cpal::StreamConfig = config.clone().into();
    let channels_count = stream_config.channels as usize;
    let sample_rate = stream_config.sample_rate.0;

    let mut voices: Vec<ClickVoice> = Vec::with_capacity(MAX_VOICES);

    let err_fn = |err| log::error!("[ClickEngine] Output stream error: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if suspended.load(Ordering::Relaxed) {
                    data.fill(0.0);
                    return;
                }

                let start_frame = frame_counter.load(Ordering::Relaxed);
                // Pulses stamped in the past play at the start of this buffer
                while voices.len() < MAX_VOICES {
                    match consumer.pop() {
                        Ok(pulse) => voices
                            .push(ClickVoice::new(pulse, sample_rate).not_before(start_frame)),
                        Err(_) => break,
                    }
                }

                // data.len() = frames * channels
                let frame_count = data.len() / channels_count;

                for i in 0..frame_count {
                    let frame = start_frame + i as u64;
                    let sample_val: f32 = voices.iter().filter_map(|v| v.sample_at(frame)).sum();

                    for ch in 0..channels_count {
                        data[i * channels_count + ch] = sample_val;
                    }
                }

                let end_frame = start_frame + frame_count as u64;
                voices.retain(|v| !v.finished_by(end_frame));
                frame_counter.fetch_add(frame_count as u64, Ordering::Relaxed);
            },
            err_fn,
            None,
        ),
        _ => {
            return Err(AudioError::StreamOpenFailed {
                reason: "Only F32 sample format is currently supported for output".to_string(),
            })
        }
    }
    .map_err(|e| AudioError::StreamOpenFailed {
        reason: format!("{:?}", e),
    })?;

    Ok((stream, sample_rate))
}
