use std::f32::consts::{FRAC_1_SQRT_2, PI};

/// Map a noise-cancellation level (0..=100) to the high-pass cutoff in Hz.
/// Linear over the whole domain: 0 -> 0 Hz, 100 -> 2000 Hz.
pub fn cutoff_for_level(level: u8) -> f32 {
    f32::from(level.min(100)) / 100.0 * 2000.0
}

/// Second-order high-pass filter (RBJ biquad, Q = 1/sqrt(2)).
///
/// A cutoff of 0 Hz degenerates to the identity, so level 0 is a bypass.
pub struct HighPass {
    sample_rate: f32,
    cutoff: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl HighPass {
    pub fn new(sample_rate: f32, cutoff: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            cutoff: -1.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.set_cutoff(cutoff);
        filter
    }

    pub fn with_level(sample_rate: f32, level: u8) -> Self {
        Self::new(sample_rate, cutoff_for_level(level))
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Re-parameterize in place. Filter memory is kept so the signal does
    /// not glitch when the level slider moves mid-stream.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if cutoff == self.cutoff {
            return;
        }
        self.cutoff = cutoff;

        if cutoff <= 0.0 {
            self.b0 = 1.0;
            self.b1 = 0.0;
            self.b2 = 0.0;
            self.a1 = 0.0;
            self.a2 = 0.0;
            return;
        }

        let w0 = 2.0 * PI * cutoff / self.sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * FRAC_1_SQRT_2);

        let a0 = 1.0 + alpha;
        self.b0 = (1.0 + cos_w0) / 2.0 / a0;
        self.b1 = -(1.0 + cos_w0) / a0;
        self.b2 = (1.0 + cos_w0) / 2.0 / a0;
        self.a1 = -2.0 * cos_w0 / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub fn set_level(&mut self, level: u8) {
        self.set_cutoff(cutoff_for_level(level));
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer {
            *sample = self.process(*sample);
        }
    }
}
