/// Decoded PCM audio, de-interleaved into one buffer per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    pub sample_rate: u32,
    pub channels: u16,
    /// `samples[channel][frame]`, normalized to [-1, 1].
    pub samples: Vec<Vec<f32>>,
}

impl Sound {
    pub fn frame_count(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    /// Length in seconds.
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frame_count() as f32 / self.sample_rate as f32
        }
    }
}
