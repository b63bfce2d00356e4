use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// FFT window length.
pub const FFT_SIZE: usize = 2048;

/// dB floor mapped to byte value 0.
pub const MIN_DECIBELS: f32 = -100.0;

/// dB ceiling mapped to byte value 255.
pub const MAX_DECIBELS: f32 = -30.0;

/// Exponential smoothing applied to bin magnitudes between polls.
const SMOOTHING: f32 = 0.8;

/// Frequency-domain analyser with byte-scaled output.
///
/// Reproduces the semantics the speech detector was tuned against:
/// windowed FFT, per-bin magnitude smoothed across polls, converted to
/// dBFS and mapped onto a 0..=255 scale over [-100, -30] dB.
pub struct Analyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    ring: Vec<f32>,
    write_pos: usize,
    filled: bool,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl Analyser {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Hann window.
        let window = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / FFT_SIZE as f32).cos()))
            .collect();

        Self {
            fft,
            window,
            ring: vec![0.0; FFT_SIZE],
            write_pos: 0,
            filled: false,
            smoothed: vec![0.0; FFT_SIZE / 2],
            scratch: vec![Complex::default(); FFT_SIZE],
        }
    }

    /// Append captured samples to the analysis window.
    pub fn push(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.ring[self.write_pos] = sample;
            self.write_pos += 1;
            if self.write_pos == FFT_SIZE {
                self.write_pos = 0;
                self.filled = true;
            }
        }
    }

    /// Mean byte-scale magnitude over all frequency bins, 0.0..=255.0.
    pub fn mean_byte_magnitude(&mut self) -> f32 {
        // Unroll the ring so the FFT sees samples in capture order.
        let start = if self.filled { self.write_pos } else { 0 };
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let idx = (start + i) % FFT_SIZE;
            *slot = Complex::new(self.ring[idx] * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let norm = 2.0 / FFT_SIZE as f32;
        let mut sum = 0.0f32;
        for (bin, slot) in self.scratch[..FFT_SIZE / 2].iter().enumerate() {
            let magnitude = slot.norm() * norm;
            let smoothed = &mut self.smoothed[bin];
            *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;
            sum += byte_scale(*smoothed);
        }

        sum / (FFT_SIZE / 2) as f32
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a linear magnitude to the 0..=255 scale over [-100, -30] dB.
fn byte_scale(magnitude: f32) -> f32 {
    if magnitude <= 0.0 {
        return 0.0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS) * 255.0;
    scaled.clamp(0.0, 255.0)
}
