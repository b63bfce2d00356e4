/// Mean byte-scale magnitude above which a stream counts as speech.
pub const SPEAKING_THRESHOLD: f32 = 30.0;

/// Edge-triggered speech-activity detector.
///
/// Fed the analyser's mean magnitude once per frame; reports `Some(state)`
/// only when the speaking state flips, so consumers see transitions rather
/// than a value per tick.
#[derive(Debug)]
pub struct SpeechDetector {
    threshold: f32,
    speaking: bool,
}

impl SpeechDetector {
    pub fn new() -> Self {
        Self::with_threshold(SPEAKING_THRESHOLD)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            speaking: false,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn update(&mut self, mean_magnitude: f32) -> Option<bool> {
        let speaking = mean_magnitude > self.threshold;
        if speaking == self.speaking {
            return None;
        }
        self.speaking = speaking;
        Some(speaking)
    }
}

impl Default for SpeechDetector {
    fn default() -> Self {
        Self::new()
    }
}
