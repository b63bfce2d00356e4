mod analyser;
mod compressor;
mod filter;

pub use analyser::{Analyser, FFT_SIZE, MAX_DECIBELS, MIN_DECIBELS};
pub use compressor::{Compressor, CompressorParams};
pub use filter::{HighPass, cutoff_for_level};

/// The speech-detection chain: high-pass -> compressor -> analyser.
///
/// Detection only. The transmitted stream bypasses this graph entirely;
/// remote peers get the raw platform-denoised capture.
pub struct DetectionGraph {
    filter: HighPass,
    compressor: Compressor,
    analyser: Analyser,
    level: u8,
    scratch: Vec<f32>,
}

impl DetectionGraph {
    pub fn new(sample_rate: f32, level: u8) -> Self {
        let level = level.min(100);
        Self {
            filter: HighPass::with_level(sample_rate, level),
            compressor: Compressor::with_level(sample_rate, level),
            analyser: Analyser::new(),
            level,
            scratch: Vec::new(),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Re-parameterize filter and compressor live; no rebuild, no easing.
    pub fn set_level(&mut self, level: u8) {
        let level = level.min(100);
        self.level = level;
        self.filter.set_level(level);
        self.compressor.set_level(level);
    }

    /// Run one captured frame through the chain and poll the analyser.
    /// Returns the mean byte-scale magnitude for the speech detector.
    pub fn process(&mut self, frame: &[f32]) -> f32 {
        self.scratch.clear();
        self.scratch.extend_from_slice(frame);
        self.filter.process_buffer(&mut self.scratch);
        self.compressor.process_buffer(&mut self.scratch);
        self.analyser.push(&self.scratch);
        self.analyser.mean_byte_magnitude()
    }
}
