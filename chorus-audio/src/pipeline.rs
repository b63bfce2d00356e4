use crate::capture::{CaptureConstraints, CaptureSource, CaptureStream};
use crate::detector::SpeechDetector;
use crate::dsp::DetectionGraph;
use crate::error::AudioError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Where raw captured frames go: the shared outgoing mic track. One sink
/// serves every peer sender.
#[async_trait]
pub trait MicSink: Send + Sync {
    async fn write(&self, frame: Vec<f32>, sample_rate: u32);
}

/// Default noise-cancellation level for a fresh session.
pub const DEFAULT_NOISE_CANCELLATION: u8 = 50;

/// Owns the microphone for one joined session.
///
/// Exactly one pipeline exists per session. Frames are forwarded raw to
/// the [`MicSink`] and, in parallel, through the [`DetectionGraph`] that
/// drives the local speaking flag. Acquisition is always paired with
/// release: dropping the pipeline stops capture on every exit path.
pub struct AudioPipeline {
    source: Arc<dyn CaptureSource>,
    sink: Arc<dyn MicSink>,
    constraints: CaptureConstraints,
    stream: Option<CaptureStream>,
    level_tx: watch::Sender<u8>,
    speaking_tx: Arc<watch::Sender<bool>>,
    speaking_rx: watch::Receiver<bool>,
    muted: bool,
}

impl AudioPipeline {
    /// Acquire the microphone and start processing.
    ///
    /// Fails with [`AudioError::DeviceAccess`] when permission is denied or
    /// no device exists; nothing is left half-open in that case.
    pub async fn acquire(
        source: Arc<dyn CaptureSource>,
        sink: Arc<dyn MicSink>,
        device: Option<&str>,
        level: u8,
    ) -> Result<Self, AudioError> {
        let mut stream = source
            .acquire(device, &CaptureConstraints::default())
            .await?;

        let (level_tx, _) = watch::channel(level.min(100));
        let (speaking_tx, speaking_rx) = watch::channel(false);
        let speaking_tx = Arc::new(speaking_tx);

        let mut pipeline = Self {
            source,
            sink,
            constraints: CaptureConstraints::default(),
            stream: None,
            level_tx,
            speaking_tx,
            speaking_rx,
            muted: false,
        };
        pipeline.spawn_processing(&mut stream);
        pipeline.stream = Some(stream);

        info!(device = pipeline.input_device(), "audio pipeline started");
        Ok(pipeline)
    }

    /// Per-stream processing task. Ends on its own when the stream's frame
    /// channel closes, i.e. when the capture stream is dropped.
    fn spawn_processing(&self, stream: &mut CaptureStream) {
        let Some(mut frames) = stream.take_frames() else {
            return;
        };
        let sample_rate = stream.sample_rate();
        let sink = self.sink.clone();
        let speaking_tx = self.speaking_tx.clone();
        let mut level_rx = self.level_tx.subscribe();

        tokio::spawn(async move {
            let mut graph = DetectionGraph::new(sample_rate as f32, *level_rx.borrow());
            let mut detector = SpeechDetector::new();

            while let Some(frame) = frames.recv().await {
                if level_rx.has_changed().unwrap_or(false) {
                    graph.set_level(*level_rx.borrow_and_update());
                }

                // The transmitted signal is the raw capture; the graph only
                // feeds the speech detector.
                let activity = graph.process(&frame);
                sink.write(frame, sample_rate).await;

                if let Some(speaking) = detector.update(activity) {
                    let _ = speaking_tx.send(speaking);
                }
            }

            debug!("audio processing task finished");
        });
    }

    /// Speaking-state transitions for the local stream.
    pub fn speaking(&self) -> watch::Receiver<bool> {
        self.speaking_rx.clone()
    }

    /// Track-level mute. Applied once here; every sender shares the track.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(stream) = &self.stream {
            stream.set_enabled(!muted);
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn noise_cancellation_level(&self) -> u8 {
        *self.level_tx.borrow()
    }

    /// Live re-parameterization; the graph is not rebuilt and no easing is
    /// applied between levels.
    pub fn set_noise_cancellation_level(&self, level: u8) {
        self.level_tx.send_replace(level.min(100));
    }

    pub fn input_device(&self) -> &str {
        self.stream
            .as_ref()
            .map(|s| s.device_name())
            .unwrap_or_default()
    }

    /// Switch the capture device, rebuilding the detection graph.
    ///
    /// The new device is acquired before the old stream is touched: on
    /// failure the session keeps capturing from the previous device and
    /// gets [`AudioError::DeviceSwitch`] back.
    pub async fn switch_input_device(&mut self, device: &str) -> Result<(), AudioError> {
        let mut fresh = self
            .source
            .acquire(Some(device), &self.constraints)
            .await
            .map_err(|e| AudioError::DeviceSwitch(e.to_string()))?;

        fresh.set_enabled(!self.muted);
        self.spawn_processing(&mut fresh);

        // Old stream drops here, stopping its backend and ending its task.
        self.stream = Some(fresh);
        info!(device, "input device switched");
        Ok(())
    }

    /// Stop capture and tear the graph down. Equivalent to dropping, but
    /// explicit at call sites that must release on error paths.
    pub fn release(mut self) {
        self.stream = None;
        let _ = self.speaking_tx.send(false);
        info!("audio pipeline released");
    }
}
