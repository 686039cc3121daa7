//! Shared voice engine of the WSG family
//!
//! Up to eight voices play 32-step, 4-bit waveforms out of a common wave
//! memory. Each voice has a phase accumulator read with `fracbits` fractional
//! bits, a 4-bit volume per side and an optional noise generator. Variants
//! only differ in how register writes land on these voices.

use super::voice::Voice;

/// Voices in the largest variant
pub const MAX_VOICES: usize = 8;

/// Waveform slots in wave memory
pub const WAVE_SLOTS: usize = 16;

/// Samples of wave memory (16 slots of 32 steps)
pub const WAVE_MEMORY_SIZE: usize = WAVE_SLOTS * 32;

/// Bytes of sound register space tracked by the core
pub const SOUND_REGS_SIZE: usize = 0x400;

/// Rate the accumulators are designed for (Hz)
pub const INTERNAL_RATE: u32 = 192_000;

const BASE_FRACBITS: u32 = 15;

/// Voice engine state shared by every variant back end
#[derive(Debug, Clone)]
pub struct WsgCore {
    voices: [Voice; MAX_VOICES],
    voice_count: usize,
    stereo: bool,
    wave: [u8; WAVE_MEMORY_SIZE],
    regs: [u8; SOUND_REGS_SIZE],
    fracbits: u32,
    sample_rate: u32,
    last: (i16, i16),
    voice_out: [i16; MAX_VOICES],
}

impl Default for WsgCore {
    fn default() -> Self {
        Self::new()
    }
}

impl WsgCore {
    /// Create a stopped core with 8 mono voices at the internal rate
    pub fn new() -> Self {
        Self {
            voices: Default::default(),
            voice_count: MAX_VOICES,
            stereo: false,
            wave: [0; WAVE_MEMORY_SIZE],
            regs: [0; SOUND_REGS_SIZE],
            fracbits: BASE_FRACBITS,
            sample_rate: INTERNAL_RATE,
            last: (0, 0),
            voice_out: [0; MAX_VOICES],
        }
    }

    /// Set the number of active voices (clamped to 1..=8)
    pub fn set_voices(&mut self, voices: usize) {
        self.voice_count = voices.clamp(1, MAX_VOICES);
    }

    /// Number of active voices
    pub fn voices(&self) -> usize {
        self.voice_count
    }

    /// Enable independent left/right volume
    pub fn set_stereo(&mut self, stereo: bool) {
        self.stereo = stereo;
    }

    /// Whether left/right volumes are independent
    pub fn is_stereo(&self) -> bool {
        self.stereo
    }

    /// Put every voice, register and wave memory back to power-on state
    pub fn start(&mut self) {
        self.voices = Default::default();
        self.regs = [0; SOUND_REGS_SIZE];
        self.wave = [0; WAVE_MEMORY_SIZE];
        self.last = (0, 0);
        self.voice_out = [0; MAX_VOICES];
    }

    /// Adapt the accumulator precision to a new output rate.
    ///
    /// Rates below the internal rate are doubled until they reach it, adding
    /// one fractional bit per doubling.
    pub fn clock_changed(&mut self, rate: u32) {
        let mut clock = rate.max(1);
        let mut multiple = 0;
        while clock < INTERNAL_RATE {
            clock *= 2;
            multiple += 1;
        }
        self.fracbits = BASE_FRACBITS + multiple;
        self.sample_rate = clock;
    }

    /// Effective sample rate after `clock_changed`
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Fractional bits of the phase accumulators
    pub fn fracbits(&self) -> u32 {
        self.fracbits
    }

    /// Store one 4-bit sample in wave memory (index wraps)
    pub fn update_waveform(&mut self, index: usize, sample: u8) {
        self.wave[index % WAVE_MEMORY_SIZE] = sample & 0x0f;
    }

    /// Wave memory contents
    pub fn wave_memory(&self) -> &[u8] {
        &self.wave
    }

    /// Voice state, for inspection
    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub(crate) fn voice_mut(&mut self, index: usize) -> Option<&mut Voice> {
        if index < self.voice_count {
            self.voices.get_mut(index)
        } else {
            None
        }
    }

    /// Raw sound register value
    pub fn reg(&self, offset: usize) -> u8 {
        self.regs.get(offset).copied().unwrap_or(0)
    }

    /// Store a register value; false when it was already set (or out of range)
    pub(crate) fn store(&mut self, offset: usize, data: u8) -> bool {
        match self.regs.get_mut(offset) {
            Some(reg) if *reg != data => {
                *reg = data;
                true
            }
            _ => false,
        }
    }

    /// Generate one output sample
    pub fn clock(&mut self) {
        let hold_time = 1u32 << self.fracbits.saturating_sub(16);
        let (mut left, mut right) = (0i32, 0i32);

        let Self {
            voices,
            voice_count,
            stereo,
            wave,
            fracbits,
            voice_out,
            ..
        } = self;

        for (voice, out) in voices[..*voice_count].iter_mut().zip(voice_out.iter_mut()) {
            let lv = voice.volume[0];
            let rv = if *stereo { voice.volume[1] } else { lv };

            let (l, r) = if voice.noise_sw {
                voice.clock_noise(hold_time, lv, rv, *voice_count)
            } else {
                voice.clock_tone(&wave[..], *fracbits, lv, rv, *voice_count)
            };

            left += l;
            right += r;
            *out = clamp_i16((l + r) / 2);
        }

        self.last = (clamp_i16(left), clamp_i16(right));
    }

    /// Last generated (left, right) sample
    pub fn sample(&self) -> (i16, i16) {
        self.last
    }

    /// Last output of a voice
    pub fn voice_output(&self, voice: usize) -> i16 {
        self.voice_out.get(voice).copied().unwrap_or(0)
    }
}

#[inline]
fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_changed_adds_fracbits() {
        let mut core = WsgCore::new();
        core.clock_changed(INTERNAL_RATE);
        assert_eq!(core.fracbits(), 15);
        core.clock_changed(24_000);
        assert_eq!(core.fracbits(), 18);
        assert_eq!(core.sample_rate(), INTERNAL_RATE);
    }

    #[test]
    fn test_store_skips_unchanged() {
        let mut core = WsgCore::new();
        assert!(core.store(0x10, 3));
        assert!(!core.store(0x10, 3));
        assert!(!core.store(SOUND_REGS_SIZE, 1));
        assert_eq!(core.reg(0x10), 3);
    }

    #[test]
    fn test_start_clears_state() {
        let mut core = WsgCore::new();
        core.update_waveform(5, 0xff);
        assert_eq!(core.wave_memory()[5], 0x0f);
        core.store(1, 1);
        core.start();
        assert_eq!(core.reg(1), 0);
        assert!(core.wave_memory().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_mono_mirrors_left_volume() {
        let mut core = WsgCore::new();
        core.set_voices(1);
        for i in 0..32 {
            core.update_waveform(i, 15);
        }
        if let Some(v) = core.voice_mut(0) {
            v.frequency = 0x1000;
            v.volume = [15, 0];
        }
        core.clock();
        let (l, r) = core.sample();
        assert!(l > 0);
        assert_eq!(l, r);
        assert_eq!(core.voice_output(0), l);
    }

    #[test]
    fn test_inactive_voices_are_not_writable() {
        let mut core = WsgCore::new();
        core.set_voices(3);
        assert!(core.voice_mut(2).is_some());
        assert!(core.voice_mut(3).is_none());
    }
}
