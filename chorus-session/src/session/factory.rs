use std::sync::Arc;

use chorus_audio::{AudioError, CpalPlayback, PlaybackSink};
use chorus_core::UserId;

/// Creates one playback sink per remote peer.
///
/// A seam for tests and for embedders that mix remote streams themselves
/// instead of opening one OS stream per peer.
pub trait PlaybackFactory: Send + Sync {
    fn create(
        &self,
        remote: &UserId,
        output_device: Option<&str>,
    ) -> Result<Arc<dyn PlaybackSink>, AudioError>;
}

/// Default factory backed by the OS audio output.
#[derive(Default)]
pub struct CpalPlaybackFactory;

impl PlaybackFactory for CpalPlaybackFactory {
    fn create(
        &self,
        _remote: &UserId,
        output_device: Option<&str>,
    ) -> Result<Arc<dyn PlaybackSink>, AudioError> {
        Ok(Arc::new(CpalPlayback::new(output_device)?))
    }
}
