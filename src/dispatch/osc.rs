//! Per-channel oscilloscope buffers

/// Samples kept per buffer
pub const OSC_BUFFER_LEN: usize = 65_536;

/// Ring buffer of one voice's output for waveform display
#[derive(Debug, Clone)]
pub struct OscBuffer {
    data: Vec<i16>,
    needle: usize,
    rate: u32,
}

impl OscBuffer {
    /// Create a silent buffer sampled at `rate` Hz
    pub fn new(rate: u32) -> Self {
        Self {
            data: vec![0; OSC_BUFFER_LEN],
            needle: 0,
            rate,
        }
    }

    /// Append one sample, overwriting the oldest
    pub fn push(&mut self, sample: i16) {
        self.data[self.needle] = sample;
        self.needle = (self.needle + 1) % OSC_BUFFER_LEN;
    }

    /// Position the next sample is written to
    pub fn needle(&self) -> usize {
        self.needle
    }

    /// Sample rate of the buffer
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Change the sample rate
    pub fn set_rate(&mut self, rate: u32) {
        self.rate = rate;
    }

    /// Raw ring contents
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// The most recent `n` samples, oldest first
    pub fn latest(&self, n: usize) -> Vec<i16> {
        let n = n.min(OSC_BUFFER_LEN);
        let start = (self.needle + OSC_BUFFER_LEN - n) % OSC_BUFFER_LEN;
        (0..n)
            .map(|i| self.data[(start + i) % OSC_BUFFER_LEN])
            .collect()
    }
}
