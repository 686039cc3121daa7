//! Channel state
//!
//! One [`Channel`] per voice. Besides the synthesis parameters it carries
//! three one-tick edge flags: key-on, key-off and frequency-changed. Commands
//! set them; the tick that resolves the channel's frequency clears all three.

use std::sync::Arc;

use bitflags::bitflags;

use crate::context::{DispatchContext, Instrument};
use crate::macros::MacroState;
use crate::wave_synth::WaveSynth;

bitflags! {
    /// Per-channel edge flags consumed by the next tick
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelFlags: u8 {
        /// Note started since the last tick
        const KEY_ON = 0x01;
        /// Note stopped since the last tick
        const KEY_OFF = 0x02;
        /// Frequency must be resolved again
        const FREQ_CHANGED = 0x04;
    }
}

/// Wave index of a channel that has not played yet
pub const WAVE_UNSET: i32 = -1;

/// State of one voice
#[derive(Debug, Clone)]
pub struct Channel {
    /// Resolved chip frequency word
    pub freq: i32,
    /// Frequency word before pitch offsets
    pub base_freq: i32,
    /// Fine pitch from the PITCH command
    pub pitch: i32,
    /// Pitch macro offset
    pub pitch2: i32,
    /// Last note
    pub note: i32,
    /// Instrument id (-1 = none)
    pub ins: i32,
    /// Left level in the high nibble, right level in the low nibble
    pub pan: u8,
    /// Voice sounding
    pub active: bool,
    /// Instrument changed since the last note-on
    pub ins_changed: bool,
    /// Portamento slide in progress
    pub in_porta: bool,
    /// Noise mode
    pub noise: bool,
    /// Nominal volume (0-15)
    pub vol: i32,
    /// Volume after the volume macro
    pub out_vol: i32,
    /// Selected wavetable, or [`WAVE_UNSET`]
    pub wave: i32,
    pub(crate) flags: ChannelFlags,
    pub(crate) std: MacroState,
    pub(crate) ws: WaveSynth,
}

impl Channel {
    /// Default channel bound to an engine context
    pub fn new(ctx: Arc<DispatchContext>) -> Self {
        Self {
            freq: 0,
            base_freq: 0,
            pitch: 0,
            pitch2: 0,
            note: 0,
            ins: -1,
            pan: 0xff,
            active: false,
            ins_changed: true,
            in_porta: false,
            noise: false,
            vol: 15,
            out_vol: 15,
            wave: WAVE_UNSET,
            flags: ChannelFlags::empty(),
            std: MacroState::new(),
            ws: WaveSynth::new(ctx),
        }
    }

    /// Restart macros from an instrument (or stop them) and clear the macro pitch offset
    pub(crate) fn macro_init(&mut self, ins: Option<Arc<Instrument>>) {
        self.std.init(ins);
        self.pitch2 = 0;
    }

    /// Key-on edge pending
    pub fn key_on(&self) -> bool {
        self.flags.contains(ChannelFlags::KEY_ON)
    }

    /// Key-off edge pending
    pub fn key_off(&self) -> bool {
        self.flags.contains(ChannelFlags::KEY_OFF)
    }

    /// Frequency update pending
    pub fn freq_changed(&self) -> bool {
        self.flags.contains(ChannelFlags::FREQ_CHANGED)
    }

    /// Pending edge flags
    pub fn flags(&self) -> ChannelFlags {
        self.flags
    }

    /// Macro evaluation state
    pub fn macros(&self) -> &MacroState {
        &self.std
    }

    /// Waveform state
    pub fn wave_synth(&self) -> &WaveSynth {
        &self.ws
    }

    /// Left level (0-15)
    pub fn pan_left(&self) -> u8 {
        self.pan >> 4
    }

    /// Right level (0-15)
    pub fn pan_right(&self) -> u8 {
        self.pan & 0x0f
    }

    /// (left, right) output levels: `out_vol` scaled by the pan nibbles
    pub fn stereo_levels(&self) -> (u8, u8) {
        let vol = self.out_vol.clamp(0, 15);
        let scale = |nibble: u8| (nibble as i32 * vol / 15) as u8;
        (scale(self.pan_left()), scale(self.pan_right()))
    }
}
