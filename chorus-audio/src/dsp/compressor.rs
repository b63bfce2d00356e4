/// Compressor parameters derived from a noise-cancellation level.
///
/// All mappings are linear over level 0..=100:
/// threshold -100..0 dB, knee 40..10 dB, ratio 1..20. Attack is instant
/// and release is fixed at 250 ms, matching the reference processing node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
}

impl CompressorParams {
    pub fn for_level(level: u8) -> Self {
        let level = f32::from(level.min(100));
        Self {
            threshold_db: -100.0 + level,
            knee_db: 40.0 - level * 0.30,
            ratio: 1.0 + level * 0.19,
        }
    }
}

const RELEASE_SECONDS: f32 = 0.25;
const SILENCE_DB: f32 = -120.0;

/// Feed-forward dynamics compressor with a soft knee.
pub struct Compressor {
    params: CompressorParams,
    release_coeff: f32,
    envelope_db: f32,
}

impl Compressor {
    pub fn new(sample_rate: f32, params: CompressorParams) -> Self {
        Self {
            params,
            release_coeff: (-1.0 / (RELEASE_SECONDS * sample_rate)).exp(),
            envelope_db: SILENCE_DB,
        }
    }

    pub fn with_level(sample_rate: f32, level: u8) -> Self {
        Self::new(sample_rate, CompressorParams::for_level(level))
    }

    pub fn params(&self) -> CompressorParams {
        self.params
    }

    pub fn set_params(&mut self, params: CompressorParams) {
        self.params = params;
    }

    pub fn set_level(&mut self, level: u8) {
        self.params = CompressorParams::for_level(level);
    }

    /// Soft-knee gain curve: input level in, output level out, both dBFS.
    fn transfer(&self, input_db: f32) -> f32 {
        let CompressorParams {
            threshold_db,
            knee_db,
            ratio,
        } = self.params;

        let overshoot = input_db - threshold_db;
        if 2.0 * overshoot < -knee_db {
            input_db
        } else if knee_db > 0.0 && 2.0 * overshoot.abs() <= knee_db {
            let t = overshoot + knee_db / 2.0;
            input_db + (1.0 / ratio - 1.0) * t * t / (2.0 * knee_db)
        } else {
            threshold_db + overshoot / ratio
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let input_db = if input.abs() > 0.0 {
            20.0 * input.abs().log10()
        } else {
            SILENCE_DB
        };

        // Instant attack, exponential release.
        if input_db > self.envelope_db {
            self.envelope_db = input_db;
        } else {
            self.envelope_db =
                input_db + (self.envelope_db - input_db) * self.release_coeff;
        }

        let gain_db = self.transfer(self.envelope_db) - self.envelope_db;
        input * 10f32.powf(gain_db / 20.0)
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer {
            *sample = self.process(*sample);
        }
    }
}
