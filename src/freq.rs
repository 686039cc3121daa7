//! Frequency Resolver
//!
//! Converts symbolic notes into the chip's phase-accumulator increment and
//! folds fine pitch and macro pitch offsets into the final frequency word.
//!
//! The accumulator runs at `CHIP_CLOCK / 16` and is 20 bits wide, so a word
//! `f` plays `f * 192000 / 2^20` Hz. Note 57 is A-4.

use crate::context::DispatchContext;

/// Input clock of every variant (Hz)
pub const CHIP_CLOCK: u32 = 3_072_000;

/// Divider mapping note frequency onto the accumulator increment
pub const CHIP_FREQBASE: f64 = 524_288.0;

/// Semitone step size used for non-linear fine pitch
pub const PITCH_OCTAVE: i32 = 2;

/// Macro pitch offset range (relative macros clamp here)
pub const PITCH2_RANGE: i32 = 2048;

const PITCH_TABLE_CENTER: i32 = 2048;
const PITCH_TABLE_LAST: i32 = 4095;
const PITCH_STEPS_PER_OCTAVE: f64 = 12.0 * 128.0;

/// Base frequency word of a note.
///
/// `tuning * 2^((note + 3) / 12)` scaled by `divider / clock`, truncated.
pub fn note_frequency(clock: f64, divider: f64, note: i32, tuning: f64) -> i32 {
    let base = tuning * 2f64.powf((note as f64 + 3.0) / 12.0);
    // float to int casts saturate
    (base * (divider / clock)) as i32
}

/// Multiplier (1024 = unity) of the linear pitch table at `index` (0..=4095)
pub fn pitch_multiplier(index: i32) -> i64 {
    let steps = (index.clamp(0, PITCH_TABLE_LAST) - PITCH_TABLE_CENTER) as f64;
    (1024.0 * 2f64.powf(steps / PITCH_STEPS_PER_OCTAVE)) as i64
}

/// Fold fine pitch and macro pitch into a base frequency.
pub fn calc_freq(base: i32, pitch: i32, linear: bool, octave: i32, pitch2: i32) -> i32 {
    if linear {
        let index = pitch.clamp(-PITCH_TABLE_CENTER, PITCH_TABLE_LAST - PITCH_TABLE_CENTER)
            + PITCH_TABLE_CENTER;
        let scaled = (base as i64 * pitch_multiplier(index)) >> 10;
        saturate(scaled + pitch2 as i64)
    } else {
        let fine = (pitch as i64 * octave as i64) >> 1;
        saturate(base as i64 + fine + pitch2 as i64)
    }
}

#[inline]
fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Resolve the final chip frequency word, saturating at `max_freq`.
pub fn resolve(ctx: &DispatchContext, base: i32, pitch: i32, pitch2: i32, max_freq: u32) -> u32 {
    let freq = calc_freq(base, pitch, ctx.linear_pitch, PITCH_OCTAVE, pitch2);
    freq.clamp(0, max_freq.min(i32::MAX as u32) as i32) as u32
}

/// Base frequency of a note for this chip under the context's tuning
pub fn note_base(ctx: &DispatchContext, note: i32) -> i32 {
    note_frequency(CHIP_CLOCK as f64, CHIP_FREQBASE, note, ctx.tuning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MAX_FREQ_20BIT;

    #[test]
    fn test_a4_plays_440hz() {
        let ctx = DispatchContext::new();
        let word = note_base(&ctx, 57);
        let hz = word as f64 * (CHIP_CLOCK as f64 / 16.0) / (1u64 << 20) as f64;
        approx::assert_relative_eq!(hz, 440.0, max_relative = 0.001);
    }

    #[test]
    fn test_octave_doubles() {
        let ctx = DispatchContext::new();
        let a4 = note_base(&ctx, 57);
        let a5 = note_base(&ctx, 69);
        assert!((a5 - a4 * 2).abs() <= 1);
    }

    #[test]
    fn test_pitch_table_center_is_unity() {
        assert_eq!(pitch_multiplier(2048), 1024);
        assert_eq!(pitch_multiplier(2048 + 1536), 2048);
        assert_eq!(pitch_multiplier(9999), pitch_multiplier(4095));
    }

    #[test]
    fn test_calc_freq_modes() {
        assert_eq!(calc_freq(1000, 0, true, PITCH_OCTAVE, 0), 1000);
        assert_eq!(calc_freq(1000, 0, true, PITCH_OCTAVE, 5), 1005);
        assert_eq!(calc_freq(1000, 10, false, PITCH_OCTAVE, 3), 1013);
        assert!(calc_freq(1000, 64, true, PITCH_OCTAVE, 0) > 1000);
    }

    #[test]
    fn test_resolve_saturates() {
        let ctx = DispatchContext::new();
        assert_eq!(resolve(&ctx, 5_000_000, 0, 0, MAX_FREQ_20BIT), MAX_FREQ_20BIT);
        assert_eq!(resolve(&ctx, 100, 0, -4000, MAX_FREQ_20BIT), 0);
        assert_eq!(resolve(&ctx, 70_000, 0, 0, 0xFFFF), 0xFFFF);
    }

    #[test]
    fn test_extreme_inputs_saturate() {
        let ctx = DispatchContext::new();
        assert_eq!(note_base(&ctx, i32::MAX), i32::MAX);
        assert_eq!(note_base(&ctx, i32::MIN), 0);

        assert_eq!(
            calc_freq(1000, i32::MAX, true, PITCH_OCTAVE, 0),
            calc_freq(1000, 2047, true, PITCH_OCTAVE, 0)
        );
        assert_eq!(calc_freq(i32::MAX, 0, true, PITCH_OCTAVE, i32::MAX), i32::MAX);
        assert_eq!(calc_freq(i32::MAX, i32::MAX, false, PITCH_OCTAVE, i32::MAX), i32::MAX);
        assert_eq!(calc_freq(0, i32::MIN, false, PITCH_OCTAVE, i32::MIN), i32::MIN);
        assert_eq!(
            resolve(&ctx, 1000, i32::MIN, 0, MAX_FREQ_20BIT),
            calc_freq(1000, -2048, true, PITCH_OCTAVE, 0) as u32
        );
    }
}
