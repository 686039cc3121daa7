//! Register decoders of the four WSG variants
//!
//! Each back end owns a [`WsgCore`] and maps register writes onto its
//! voices. A write that leaves a register unchanged is ignored.

use super::engine::WsgCore;
use crate::backend::WsgBackend;

/// Sound register block of the 15XX (offsets above it are plain RAM)
const SHARED_SOUND_REGS: usize = 0x40;

/// Forward the variant-independent part of [`WsgBackend`] to the core.
macro_rules! forward_to_core {
    () => {
        fn set_voices(&mut self, voices: usize) {
            self.core.set_voices(voices);
        }

        fn set_stereo(&mut self, stereo: bool) {
            self.core.set_stereo(stereo);
        }

        fn start(&mut self) {
            self.core.start();
        }

        fn clock_changed(&mut self, rate: u32) {
            self.core.clock_changed(rate);
        }

        fn update_waveform(&mut self, index: usize, sample: u8) {
            self.core.update_waveform(index, sample);
        }

        fn clock(&mut self) {
            self.core.clock();
        }

        fn sample(&self) -> (i16, i16) {
            self.core.sample()
        }

        fn voice_output(&self, voice: usize) -> i16 {
            self.core.voice_output(voice)
        }
    };
}

/// Pac-Man WSG: 3 voices with nibble-wide registers
///
/// | Offset | Function |
/// |---|---|
/// | 0x05, 0x0a, 0x0f | wave select of voice 0-2 |
/// | 0x10-0x14 | voice 0 frequency, 5 nibbles low to high |
/// | 0x16-0x19, 0x1b-0x1e | voice 1-2 frequency bits 4-19 |
/// | 0x15, 0x1a, 0x1f | volume of voice 0-2 |
#[derive(Debug, Clone, Default)]
pub struct PacmanSound {
    core: WsgCore,
}

impl PacmanSound {
    /// Create a stopped Pac-Man core
    pub fn new() -> Self {
        Self::default()
    }

    /// Voice engine
    pub fn core(&self) -> &WsgCore {
        &self.core
    }

    fn sound_w(&mut self, offset: usize, data: u8) {
        let data = data & 0x0f;
        if offset >= 0x20 || !self.core.store(offset, data) {
            return;
        }

        let ch = match offset {
            0..=4 => return,
            0x05..=0x0f => (offset - 5) / 5,
            0x10 => 0,
            _ => (offset - 0x11) / 5,
        };

        let base = ch * 5;
        let regs: [u8; 5] = std::array::from_fn(|i| self.core.reg(0x10 + base + i));
        let Some(voice) = self.core.voice_mut(ch) else {
            return;
        };

        match offset - base {
            0x05 => voice.waveform_select = data & 7,
            0x10..=0x14 => {
                let low = if ch == 0 { regs[0] as u32 } else { 0 };
                voice.frequency = regs[1..]
                    .iter()
                    .rev()
                    .fold(0u32, |acc, &n| (acc << 4) | n as u32)
                    << 4
                    | low;
            }
            0x15 => voice.volume[0] = data,
            _ => {}
        }
    }
}

impl WsgBackend for PacmanSound {
    fn write_register(&mut self, addr: u16, value: u8) {
        self.sound_w(addr as usize, value);
    }

    forward_to_core!();
}

/// Pole Position: 8 stereo voices with 16-bit frequency
///
/// Per voice `n` (base `n*4`): frequency low/high at +0, +1, rear right
/// volume at +2 (high nibble), front volume at +3 (left high nibble, right
/// low nibble) and rear left volume with wave select at +0x23.
#[derive(Debug, Clone, Default)]
pub struct PolePosSound {
    core: WsgCore,
}

impl PolePosSound {
    /// Create a stopped Pole Position core
    pub fn new() -> Self {
        Self::default()
    }

    /// Voice engine
    pub fn core(&self) -> &WsgCore {
        &self.core
    }

    fn sound_w(&mut self, offset: usize, data: u8) {
        if offset >= 0x40 || !self.core.store(offset, data) {
            return;
        }

        let ch = (offset & 0x1f) / 4;
        let base = ch * 4;
        let freq_lo = self.core.reg(base);
        let freq_hi = self.core.reg(base + 1);
        let rear_r = self.core.reg(base + 2);
        let front = self.core.reg(base + 3);
        let rear_l = self.core.reg(base + 0x23);
        let Some(voice) = self.core.voice_mut(ch) else {
            return;
        };

        match offset & 0x23 {
            0x00 | 0x01 => {
                voice.frequency = freq_lo as u32 | (freq_hi as u32) << 8;
            }
            reg @ (0x02 | 0x03 | 0x23) => {
                if reg == 0x23 {
                    voice.waveform_select = data & 7;
                }
                let left = ((front >> 4) + (rear_l >> 4)) / 2;
                let right = ((front & 0x0f) + (rear_r >> 4)) / 2;
                // slots 8 and up select the 52XX/54XX chips: voice muted
                voice.volume = if rear_l & 8 != 0 { [0, 0] } else { [left, right] };
            }
            _ => {}
        }
    }
}

impl WsgBackend for PolePosSound {
    fn write_register(&mut self, addr: u16, value: u8) {
        self.sound_w(addr as usize, value);
    }

    forward_to_core!();
}

/// Namco 15XX: 8 mono voices in 8-byte blocks
///
/// Per voice `n` (base `n*8`): volume at +3, frequency bits 0-7 at +4,
/// bits 8-15 at +5, and +6 holds the wave select (high nibble) with
/// frequency bits 16-19 (low nibble). Offsets 0x40 and up are plain RAM.
#[derive(Debug, Clone, Default)]
pub struct Namco15xxSound {
    core: WsgCore,
}

impl Namco15xxSound {
    /// Create a stopped 15XX core
    pub fn new() -> Self {
        Self::default()
    }

    /// Voice engine
    pub fn core(&self) -> &WsgCore {
        &self.core
    }

    fn sharedram_w(&mut self, offset: usize, data: u8) {
        if offset < SHARED_SOUND_REGS {
            self.sound_w(offset, data);
        } else {
            self.core.store(offset, data);
        }
    }

    fn sound_w(&mut self, offset: usize, data: u8) {
        if !self.core.store(offset, data) {
            return;
        }

        let ch = offset / 8;
        let base = ch * 8;
        let freq = block_frequency(
            self.core.reg(base + 6),
            self.core.reg(base + 5),
            self.core.reg(base + 4),
        );
        let Some(voice) = self.core.voice_mut(ch) else {
            return;
        };

        match offset - base {
            0x03 => voice.volume[0] = data & 0x0f,
            0x04..=0x06 => {
                if offset - base == 0x06 {
                    voice.waveform_select = (data >> 4) & 7;
                }
                voice.frequency = freq;
            }
            _ => {}
        }
    }
}

impl WsgBackend for Namco15xxSound {
    fn write_register(&mut self, addr: u16, value: u8) {
        self.sharedram_w(addr as usize, value);
    }

    forward_to_core!();
}

/// Namco CUS30: 8 stereo voices with noise
///
/// Offsets are relative to the sound register block. Per voice `n` (base
/// `n*8`): left volume at +0, wave select (high nibble) with frequency bits
/// 16-19 at +1, frequency bits 8-15 at +2 and 0-7 at +3, right volume at +4.
/// Bit 7 of +4 switches noise on for the *next* voice.
#[derive(Debug, Clone, Default)]
pub struct Cus30Sound {
    core: WsgCore,
}

impl Cus30Sound {
    /// Create a stopped CUS30 core
    pub fn new() -> Self {
        Self::default()
    }

    /// Voice engine
    pub fn core(&self) -> &WsgCore {
        &self.core
    }

    fn sound_w(&mut self, offset: usize, data: u8) {
        if offset >= SHARED_SOUND_REGS || !self.core.store(offset, data) {
            return;
        }

        let ch = offset / 8;
        let base = ch * 8;
        if ch >= self.core.voices() {
            return;
        }
        let freq = block_frequency(
            self.core.reg(base + 1),
            self.core.reg(base + 2),
            self.core.reg(base + 3),
        );

        match offset - base {
            0x00 => {
                if let Some(voice) = self.core.voice_mut(ch) {
                    voice.volume[0] = data & 0x0f;
                }
            }
            reg @ 0x01..=0x03 => {
                if let Some(voice) = self.core.voice_mut(ch) {
                    if reg == 0x01 {
                        voice.waveform_select = (data >> 4) & 0x0f;
                    }
                    voice.frequency = freq;
                }
            }
            0x04 => {
                if let Some(voice) = self.core.voice_mut(ch) {
                    voice.volume[1] = data & 0x0f;
                }
                let next = (ch + 1) % self.core.voices();
                if let Some(voice) = self.core.voice_mut(next) {
                    voice.noise_sw = data & 0x80 != 0;
                }
            }
            _ => {}
        }
    }
}

impl WsgBackend for Cus30Sound {
    fn write_register(&mut self, addr: u16, value: u8) {
        self.sound_w(addr as usize, value);
    }

    forward_to_core!();
}

/// 20-bit frequency from (bits 16-19 in the low nibble, bits 8-15, bits 0-7)
#[inline]
fn block_frequency(high: u8, mid: u8, low: u8) -> u32 {
    ((high as u32 & 0x0f) << 16) | (mid as u32) << 8 | low as u32
}
