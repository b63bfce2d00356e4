use crate::device::SYSTEM_DEFAULT_DEVICE_NAME;
use crate::error::AudioError;
use crate::FRAME_SIZE;
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Capture constraints requested from the platform backend. The backend
/// applies what it supports; constraints it cannot honor are ignored.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Seam between the pipeline and the platform's device capture capability.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Open a capture stream on the named device, or the default device
    /// when `device` is `None`. Implementations with a blocking backend
    /// must not stall the calling task while the stream is built.
    async fn acquire(
        &self,
        device: Option<&str>,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, AudioError>;
}

/// A live microphone stream: mono f32 frames plus the track-level mute flag.
///
/// `enabled` is the single mute point for the whole session. Every peer
/// sender wraps the same underlying track, so clearing this one flag mutes
/// all of them at once; the stream keeps producing frames of silence while
/// muted so downstream consumers observe a continuous signal.
///
/// Dropping the stream stops the backend stream (scoped release).
pub struct CaptureStream {
    pub(crate) frames: Option<mpsc::Receiver<Vec<f32>>>,
    enabled: Arc<AtomicBool>,
    device_name: String,
    sample_rate: u32,
    stop: Arc<AtomicBool>,
}

impl CaptureStream {
    pub fn new(
        frames: mpsc::Receiver<Vec<f32>>,
        enabled: Arc<AtomicBool>,
        device_name: impl Into<String>,
        sample_rate: u32,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            frames: Some(frames),
            enabled,
            device_name: device_name.into(),
            sample_rate,
            stop,
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn take_frames(&mut self) -> Option<mpsc::Receiver<Vec<f32>>> {
        self.frames.take()
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// Microphone capture through cpal.
pub struct CpalCaptureSource;

impl CpalCaptureSource {
    pub fn new() -> Self {
        Self
    }

    fn find_input_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
        let host = cpal::default_host();

        match name {
            None | Some(SYSTEM_DEFAULT_DEVICE_NAME) => host
                .default_input_device()
                .ok_or_else(|| AudioError::DeviceAccess("no input device available".into())),
            Some(wanted) => {
                let devices = host
                    .input_devices()
                    .map_err(|e| AudioError::DeviceAccess(e.to_string()))?;
                for device in devices {
                    if device.name().is_ok_and(|n| n == wanted) {
                        return Ok(device);
                    }
                }
                Err(AudioError::DeviceAccess(format!(
                    "input device '{wanted}' not found"
                )))
            }
        }
    }
}

impl Default for CpalCaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureSource for CpalCaptureSource {
    async fn acquire(
        &self,
        device: Option<&str>,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, AudioError> {
        let device = device.map(str::to_owned);
        let constraints = constraints.clone();

        // Enumerating devices and opening the stream block on the backend,
        // so they run off the async runtime.
        tokio::task::spawn_blocking(move || acquire_blocking(device.as_deref(), &constraints))
            .await
            .map_err(|e| AudioError::Backend(format!("capture setup task failed: {e}")))?
    }
}

fn acquire_blocking(
    device: Option<&str>,
    constraints: &CaptureConstraints,
) -> Result<CaptureStream, AudioError> {
    debug!(?device, ?constraints, "acquiring microphone");

    let device = CpalCaptureSource::find_input_device(device)?;
    let device_name = device
        .name()
        .unwrap_or_else(|_| SYSTEM_DEFAULT_DEVICE_NAME.to_owned());
    let config = device
        .default_input_config()
        .map_err(|e| AudioError::DeviceAccess(e.to_string()))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    let sample_format = config.sample_format();
    let stream_config: cpal::StreamConfig = config.into();

    let (frame_tx, frame_rx) = mpsc::channel(32);
    let enabled = Arc::new(AtomicBool::new(true));
    let stop = Arc::new(AtomicBool::new(false));

    // cpal streams are !Send, so each capture owns a thread that builds
    // the stream and keeps it alive until the stop flag is raised.
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), AudioError>>();
    let enabled_cb = enabled.clone();
    let stop_thread = stop.clone();

    std::thread::spawn(move || {
        let build = match sample_format {
            SampleFormat::F32 => {
                build_input_stream::<f32>(&device, &stream_config, channels, frame_tx, enabled_cb)
            }
            SampleFormat::I16 => {
                build_input_stream::<i16>(&device, &stream_config, channels, frame_tx, enabled_cb)
            }
            SampleFormat::U16 => {
                build_input_stream::<u16>(&device, &stream_config, channels, frame_tx, enabled_cb)
            }
            other => Err(AudioError::DeviceAccess(format!(
                "unsupported sample format: {other:?}"
            ))),
        };

        let stream = match build {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(AudioError::DeviceAccess(e.to_string())));
            return;
        }
        let _ = ready_tx.send(Ok(()));

        while !stop_thread.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(100));
        }
        drop(stream);
    });

    ready_rx
        .recv()
        .map_err(|_| AudioError::DeviceAccess("capture thread died during setup".into()))??;

    debug!(device = %device_name, sample_rate, "microphone acquired");
    Ok(CaptureStream::new(
        frame_rx,
        enabled,
        device_name,
        sample_rate,
        stop,
    ))
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    frame_tx: mpsc::Sender<Vec<f32>>,
    enabled: Arc<AtomicBool>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let err_fn = |err| warn!("input stream error: {err}");
    let mut pending: Vec<f32> = Vec::with_capacity(FRAME_SIZE);

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let muted = !enabled.load(Ordering::Acquire);

                // Downmix interleaved channels to mono.
                for samples in data.chunks(channels) {
                    let sum: f32 = samples.iter().map(|s| f32::from_sample_(*s)).sum();
                    let sample = sum / channels as f32;
                    pending.push(if muted { 0.0 } else { sample });

                    if pending.len() == FRAME_SIZE {
                        let frame = std::mem::replace(
                            &mut pending,
                            Vec::with_capacity(FRAME_SIZE),
                        );
                        // Drop the frame when the consumer lags; capture
                        // must never block the audio callback.
                        let _ = frame_tx.try_send(frame);
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::DeviceAccess(e.to_string()))?;

    Ok(stream)
}
