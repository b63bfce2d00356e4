//! Local audio pipeline for voice sessions.
//!
//! Capture runs through a platform backend (cpal); the captured frames are
//! forwarded untouched to the outgoing mic track, while a parallel
//! detection graph (high-pass filter, dynamics compressor, FFT analyser)
//! derives a speech-activity signal. The graph never feeds the transmitted
//! stream: remote peers receive the raw platform-denoised capture, not a
//! double-filtered one.

pub mod capture;
pub mod detector;
pub mod device;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod playback;

pub use capture::{CaptureConstraints, CaptureSource, CaptureStream, CpalCaptureSource};
pub use detector::SpeechDetector;
pub use device::{AudioDeviceInfo, list_input_devices, list_output_devices};
pub use dsp::DetectionGraph;
pub use error::AudioError;
pub use pipeline::{AudioPipeline, DEFAULT_NOISE_CANCELLATION, MicSink};
pub use playback::{CpalPlayback, PlaybackSink};

/// Capture and playback sample rate, Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Samples per capture frame (20 ms at 48 kHz, mono).
pub const FRAME_SIZE: usize = 960;
