//! In-memory audio clip: mono 16-bit PCM at a known sample rate.

/// Mono 16-bit PCM audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// PCM samples (16-bit signed integers).
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioClip {
    /// Creates a clip from samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Creates a zero-length clip.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// Duration in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append another clip, resampling it to this clip's rate if needed.
    pub fn append(&mut self, other: &AudioClip) {
        if other.sample_rate == self.sample_rate {
            self.samples.extend_from_slice(&other.samples);
        } else {
            self.samples
                .extend(resample(&other.samples, other.sample_rate, self.sample_rate));
        }
    }

    /// Append `duration_ms` of silence.
    pub fn append_silence(&mut self, duration_ms: u32) {
        let count = samples_for(duration_ms, self.sample_rate);
        self.samples.extend(std::iter::repeat_n(0, count));
    }

    /// Return this clip at `sample_rate`.
    pub fn resampled(self, sample_rate: u32) -> Self {
        if self.sample_rate == sample_rate {
            return self;
        }
        Self::new(
            resample(&self.samples, self.sample_rate, sample_rate),
            sample_rate,
        )
    }
}

fn samples_for(duration_ms: u32, sample_rate: u32) -> usize {
    (sample_rate as u64 * duration_ms as u64 / 1000) as usize
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx.min(samples.len() - 1)]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
