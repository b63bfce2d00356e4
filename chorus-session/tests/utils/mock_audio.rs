use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chorus_audio::{
    AudioError, CaptureConstraints, CaptureSource, CaptureStream, FRAME_SIZE, PlaybackSink,
    SAMPLE_RATE,
};
use chorus_core::UserId;
use chorus_session::PlaybackFactory;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Capture source that produces deterministic broadband noise, loud
/// enough to trip speech detection. Honors the stream's enabled and stop
/// flags like a real backend.
pub struct MockCaptureSource {
    /// When set, the next `acquire` fails once.
    pub fail_next: Arc<AtomicBool>,
}

impl MockCaptureSource {
    pub fn new() -> Self {
        Self {
            fail_next: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl CaptureSource for MockCaptureSource {
    async fn acquire(
        &self,
        device: Option<&str>,
        _constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, AudioError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AudioError::DeviceAccess("mock device unavailable".into()));
        }

        let (frame_tx, frame_rx) = mpsc::channel(8);
        let enabled = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(AtomicBool::new(false));
        let name = device.unwrap_or("mock-default").to_string();

        let task_enabled = enabled.clone();
        let task_stop = stop.clone();
        tokio::spawn(async move {
            let mut rng_state: u32 = 0x1234_5678;
            let mut ticker = tokio::time::interval(Duration::from_millis(20));
            loop {
                ticker.tick().await;
                if task_stop.load(Ordering::Acquire) {
                    break;
                }
                let frame: Vec<f32> = if task_enabled.load(Ordering::Acquire) {
                    (0..FRAME_SIZE)
                        .map(|_| {
                            rng_state = rng_state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                            (rng_state as f32 / u32::MAX as f32) - 0.5
                        })
                        .collect()
                } else {
                    vec![0.0; FRAME_SIZE]
                };
                if frame_tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        Ok(CaptureStream::new(frame_rx, enabled, name, SAMPLE_RATE, stop))
    }
}

/// Observable state of one created sink, kept alive by the factory even
/// after the sink itself is dropped.
pub struct SinkProbe {
    muted: AtomicBool,
    device: Mutex<Option<String>>,
    samples: AtomicUsize,
}

impl SinkProbe {
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    pub fn device(&self) -> Option<String> {
        self.device.lock().unwrap().clone()
    }

    pub fn samples_written(&self) -> usize {
        self.samples.load(Ordering::Acquire)
    }
}

struct CountingSink {
    probe: Arc<SinkProbe>,
    active: Arc<AtomicUsize>,
}

impl PlaybackSink for CountingSink {
    fn write(&self, samples: &[f32]) {
        self.probe.samples.fetch_add(samples.len(), Ordering::AcqRel);
    }

    fn set_muted(&self, muted: bool) {
        self.probe.muted.store(muted, Ordering::Release);
    }

    fn is_muted(&self) -> bool {
        self.probe.is_muted()
    }

    fn set_output_device(&self, device: &str) -> Result<(), AudioError> {
        *self.probe.device.lock().unwrap() = Some(device.to_string());
        Ok(())
    }
}

impl Drop for CountingSink {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Playback factory that counts live sinks and exposes per-peer probes.
pub struct CountingPlaybackFactory {
    active: Arc<AtomicUsize>,
    probes: DashMap<UserId, Arc<SinkProbe>>,
}

impl CountingPlaybackFactory {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            probes: DashMap::new(),
        }
    }

    /// Number of sinks created and not yet dropped.
    pub fn active_sinks(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn probe(&self, remote: &UserId) -> Option<Arc<SinkProbe>> {
        self.probes.get(remote).map(|entry| entry.value().clone())
    }
}

impl PlaybackFactory for CountingPlaybackFactory {
    fn create(
        &self,
        remote: &UserId,
        output_device: Option<&str>,
    ) -> Result<Arc<dyn PlaybackSink>, AudioError> {
        let probe = Arc::new(SinkProbe {
            muted: AtomicBool::new(false),
            device: Mutex::new(output_device.map(str::to_string)),
            samples: AtomicUsize::new(0),
        });
        self.probes.insert(remote.clone(), probe.clone());
        self.active.fetch_add(1, Ordering::AcqRel);
        Ok(Arc::new(CountingSink {
            probe,
            active: self.active.clone(),
        }))
    }
}
