use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    /// Microphone permission denied or no usable input device. Fatal to a
    /// join attempt; recoverable by retrying after the situation changes.
    #[error("microphone access failed: {0}")]
    DeviceAccess(String),

    /// An input device switch failed; the previous stream is still live.
    #[error("input device switch failed: {0}")]
    DeviceSwitch(String),

    /// Platform audio backend failure outside acquisition.
    #[error("audio backend error: {0}")]
    Backend(String),
}
