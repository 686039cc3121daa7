//! One WSG voice: phase accumulator, volumes and noise generator

/// Steps per waveform
pub const WAVE_STEPS: u32 = 32;

/// Output mixing level per voice before division by the voice count
const MIX_LEVEL: i32 = 1 << (16 - 4 - 4);

/// Scale a signed level by the mix level shared among `voices`
#[inline]
pub(crate) fn output_level(n: i32, voices: usize) -> i32 {
    n * MIX_LEVEL / voices.max(1) as i32
}

/// State of a single voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub(crate) frequency: u32,
    pub(crate) counter: u32,
    pub(crate) volume: [u8; 2],
    pub(crate) noise_sw: bool,
    pub(crate) noise_state: bool,
    pub(crate) noise_seed: u32,
    pub(crate) noise_counter: u32,
    pub(crate) noise_hold: u32,
    pub(crate) waveform_select: u8,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            frequency: 0,
            counter: 0,
            volume: [0; 2],
            noise_sw: false,
            noise_state: false,
            noise_seed: 1,
            noise_counter: 0,
            noise_hold: 0,
            waveform_select: 0,
        }
    }
}

impl Voice {
    /// Phase increment (20-bit on most variants)
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// (left, right) volume; mono cores only use the left value
    pub fn volume(&self) -> [u8; 2] {
        self.volume
    }

    /// Wave memory slot played by this voice
    pub fn waveform_select(&self) -> u8 {
        self.waveform_select
    }

    /// Whether the voice plays noise instead of its waveform
    pub fn noise_enabled(&self) -> bool {
        self.noise_sw
    }

    /// Render one tone sample and advance the accumulator.
    pub(crate) fn clock_tone(
        &mut self,
        wave: &[u8],
        fracbits: u32,
        lv: u8,
        rv: u8,
        voices: usize,
    ) -> (i32, i32) {
        if self.frequency == 0 || (lv == 0 && rv == 0) {
            return (0, 0);
        }

        let pos = (self.counter >> fracbits) & (WAVE_STEPS - 1);
        let index = (self.waveform_select as usize * WAVE_STEPS as usize + pos as usize) % wave.len();
        let sample = (wave[index] & 0x0f) as i32 - 8;
        self.counter = self.counter.wrapping_add(self.frequency);

        (
            output_level(sample * lv as i32, voices),
            output_level(sample * rv as i32, voices),
        )
    }

    /// Render one noise sample and advance the noise generator.
    ///
    /// The low byte of the frequency sets the noise rate.
    pub(crate) fn clock_noise(&mut self, hold_time: u32, lv: u8, rv: u8, voices: usize) -> (i32, i32) {
        let f = self.frequency & 0xff;
        if f == 0 || (lv == 0 && rv == 0) {
            return (0, 0);
        }

        let sign = if self.noise_state { 1 } else { -1 };
        let out = (
            sign * output_level(0x07 * (lv as i32 >> 1), voices),
            sign * output_level(0x07 * (rv as i32 >> 1), voices),
        );

        if self.noise_hold > 0 {
            self.noise_hold -= 1;
            return out;
        }
        self.noise_hold = hold_time;

        self.noise_counter += f << 4;
        let steps = self.noise_counter >> 12;
        self.noise_counter &= 0xfff;
        for _ in 0..steps {
            self.step_lfsr();
        }

        out
    }

    /// 17-bit LFSR step
    fn step_lfsr(&mut self) {
        if (self.noise_seed + 1) & 2 != 0 {
            self.noise_state = !self.noise_state;
        }
        if self.noise_seed & 1 != 0 {
            self.noise_seed ^= 0x28000;
        }
        self.noise_seed >>= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfsr_first_step() {
        let mut v = Voice::default();
        v.step_lfsr();
        assert!(v.noise_state);
        assert_eq!(v.noise_seed, 0x14000);
    }

    #[test]
    fn test_silent_without_frequency_or_volume() {
        let wave = [15u8; 64];
        let mut v = Voice::default();
        assert_eq!(v.clock_tone(&wave, 15, 15, 15, 3), (0, 0));
        v.frequency = 0x1000;
        assert_eq!(v.clock_tone(&wave, 15, 0, 0, 3), (0, 0));
        assert_eq!(v.counter, 0);
    }

    #[test]
    fn test_tone_reads_selected_slot() {
        let mut wave = [8u8; 64];
        wave[32] = 15;
        let mut v = Voice {
            frequency: 1 << 15,
            waveform_select: 1,
            ..Voice::default()
        };
        let (l, r) = v.clock_tone(&wave, 15, 15, 0, 1);
        assert_eq!(l, output_level(7 * 15, 1));
        assert_eq!(r, 0);
        // one full step per sample
        assert_eq!(v.clock_tone(&wave, 15, 15, 0, 1), (0, 0));
    }

    #[test]
    fn test_noise_alternates_sign_with_state() {
        let mut v = Voice {
            frequency: 0xff,
            noise_sw: true,
            ..Voice::default()
        };
        let (first, _) = v.clock_noise(0, 15, 15, 1);
        assert_eq!(first, -output_level(7 * 7, 1));
        assert!(v.noise_counter < 0x1000);
    }
}
