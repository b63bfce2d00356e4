use crate::device::SYSTEM_DEFAULT_DEVICE_NAME;
use crate::error::AudioError;
use crate::FRAME_SIZE;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Queued samples beyond which incoming audio is dropped instead of
/// building up latency.
const MAX_QUEUED_SAMPLES: usize = FRAME_SIZE * 20;

/// Per-peer playback element.
///
/// One sink is created per remote stream and owned by that peer's session;
/// sinks are never shared or pooled. Receive-side muting lives here as the
/// second half of the mute contract: the sender also disables its own track.
pub trait PlaybackSink: Send + Sync {
    /// Queue decoded samples for playback.
    fn write(&self, samples: &[f32]);

    fn set_muted(&self, muted: bool);

    fn is_muted(&self) -> bool;

    /// Retarget the sink at a different output device.
    fn set_output_device(&self, device: &str) -> Result<(), AudioError>;
}

enum SinkCommand {
    Rebuild(String),
    Stop,
}

/// Playback through a cpal output stream on a dedicated thread.
pub struct CpalPlayback {
    queue: Arc<Mutex<VecDeque<f32>>>,
    muted: Arc<AtomicBool>,
    commands: std::sync::mpsc::Sender<SinkCommand>,
}

impl CpalPlayback {
    pub fn new(output_device: Option<&str>) -> Result<Self, AudioError> {
        let queue: Arc<Mutex<VecDeque<f32>>> = Arc::new(Mutex::new(VecDeque::new()));
        let muted = Arc::new(AtomicBool::new(false));
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel::<SinkCommand>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), AudioError>>();

        let device = output_device
            .unwrap_or(SYSTEM_DEFAULT_DEVICE_NAME)
            .to_owned();
        let queue_thread = queue.clone();
        let muted_thread = muted.clone();

        // cpal streams are !Send; the thread owns the stream and rebuilds
        // it in place when the output device changes.
        std::thread::spawn(move || {
            let mut stream = match build_output_stream(&device, &queue_thread, &muted_thread) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            loop {
                match cmd_rx.recv_timeout(Duration::from_millis(200)) {
                    Ok(SinkCommand::Rebuild(name)) => {
                        match build_output_stream(&name, &queue_thread, &muted_thread) {
                            Ok(fresh) => stream = fresh,
                            Err(e) => warn!("output device switch failed: {e}"),
                        }
                    }
                    Ok(SinkCommand::Stop) | Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                        break;
                    }
                    Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                }
            }
            drop(stream);
        });

        ready_rx
            .recv()
            .map_err(|_| AudioError::Backend("playback thread died during setup".into()))??;

        debug!("playback sink started");
        Ok(Self {
            queue,
            muted,
            commands: cmd_tx,
        })
    }
}

impl PlaybackSink for CpalPlayback {
    fn write(&self, samples: &[f32]) {
        if self.muted.load(Ordering::Acquire) {
            return;
        }
        let Ok(mut queue) = self.queue.lock() else {
            return;
        };
        if queue.len() + samples.len() > MAX_QUEUED_SAMPLES {
            return;
        }
        queue.extend(samples.iter().copied());
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Release);
        if muted {
            if let Ok(mut queue) = self.queue.lock() {
                queue.clear();
            }
        }
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    fn set_output_device(&self, device: &str) -> Result<(), AudioError> {
        self.commands
            .send(SinkCommand::Rebuild(device.to_owned()))
            .map_err(|_| AudioError::Backend("playback thread gone".into()))
    }
}

impl Drop for CpalPlayback {
    fn drop(&mut self) {
        let _ = self.commands.send(SinkCommand::Stop);
    }
}

fn find_output_device(name: &str) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();

    if name == SYSTEM_DEFAULT_DEVICE_NAME {
        return host
            .default_output_device()
            .ok_or_else(|| AudioError::Backend("no output device available".into()));
    }

    let devices = host
        .output_devices()
        .map_err(|e| AudioError::Backend(e.to_string()))?;
    for device in devices {
        if device.name().is_ok_and(|n| n == name) {
            return Ok(device);
        }
    }
    Err(AudioError::Backend(format!(
        "output device '{name}' not found"
    )))
}

fn build_output_stream(
    name: &str,
    queue: &Arc<Mutex<VecDeque<f32>>>,
    muted: &Arc<AtomicBool>,
) -> Result<cpal::Stream, AudioError> {
    let device = find_output_device(name)?;
    let config = device
        .default_output_config()
        .map_err(|e| AudioError::Backend(e.to_string()))?;

    let channels = config.channels() as usize;
    let sample_format = config.sample_format();
    let stream_config: cpal::StreamConfig = config.into();

    let stream = match sample_format {
        SampleFormat::F32 => {
            typed_output_stream::<f32>(&device, &stream_config, channels, queue, muted)?
        }
        SampleFormat::I16 => {
            typed_output_stream::<i16>(&device, &stream_config, channels, queue, muted)?
        }
        SampleFormat::U16 => {
            typed_output_stream::<u16>(&device, &stream_config, channels, queue, muted)?
        }
        other => {
            return Err(AudioError::Backend(format!(
                "unsupported sample format: {other:?}"
            )));
        }
    };

    stream.play().map_err(|e| AudioError::Backend(e.to_string()))?;
    Ok(stream)
}

fn typed_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    queue: &Arc<Mutex<VecDeque<f32>>>,
    muted: &Arc<AtomicBool>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let queue = queue.clone();
    let muted = muted.clone();
    let err_fn = |err| warn!("output stream error: {err}");

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let silent = muted.load(Ordering::Acquire);
                let Ok(mut queue) = queue.lock() else {
                    for slot in data.iter_mut() {
                        *slot = T::from_sample_(0.0);
                    }
                    return;
                };

                for frame in data.chunks_mut(channels) {
                    let sample = if silent {
                        0.0
                    } else {
                        queue.pop_front().unwrap_or(0.0)
                    };
                    for slot in frame {
                        *slot = T::from_sample_(sample);
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::Backend(e.to_string()))?;

    Ok(stream)
}
