use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chorus_audio::MicSink;
use tracing::trace;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Packs a frame of f32 samples into the little-endian byte layout the
/// remote side unpacks with [`decode_samples`].
pub fn encode_samples(frame: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() * 4);
    for sample in frame {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Inverse of [`encode_samples`]. A trailing partial sample is dropped.
pub fn decode_samples(payload: &[u8]) -> Vec<f32> {
    payload
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// The one local audio track shared by every peer connection in a session.
///
/// Captured frames are written here exactly as they came off the device;
/// the noise-suppression graph only feeds speech detection, never the
/// transmitted signal.
#[derive(Clone)]
pub struct MicTrack {
    track: Arc<TrackLocalStaticSample>,
}

impl MicTrack {
    pub fn new() -> Self {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            "chorus-mic".to_owned(),
        ));
        Self { track }
    }

    pub fn track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }
}

impl Default for MicTrack {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MicSink for MicTrack {
    async fn write(&self, frame: Vec<f32>, sample_rate: u32) {
        if frame.is_empty() || sample_rate == 0 {
            return;
        }
        let duration = Duration::from_secs_f64(frame.len() as f64 / f64::from(sample_rate));
        let sample = Sample {
            data: Bytes::from(encode_samples(&frame)),
            duration,
            ..Default::default()
        };
        if let Err(err) = self.track.write_sample(&sample).await {
            trace!(%err, "dropping mic frame, no bound transport");
        }
    }
}
