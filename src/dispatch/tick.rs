//! Per-tick channel update and register emission
//!
//! Every tick each channel advances its macros, applies what fired, uploads
//! its waveform when it changed and resolves its frequency if anything
//! touched it. Afterwards the full register image of every voice is queued in
//! the layout of the selected variant, whether or not it changed.

use std::sync::Arc;

use super::{ChannelFlags, WsgDispatch};
use crate::context::MacroMode;
use crate::device::DeviceType;
use crate::freq::{self, PITCH2_RANGE};
use crate::{Result, WsgError};

impl WsgDispatch {
    /// Advance every channel by one tick and queue the register image.
    ///
    /// Fails with [`WsgError::NotInitialized`] before `init`.
    pub fn tick(&mut self) -> Result<()> {
        if self.chip.is_none() {
            return Err(WsgError::NotInitialized);
        }

        for i in 0..self.chan.len() {
            if self.update_channel(i) {
                self.update_wave(i);
            }
            self.resolve_channel(i);
        }

        match self.variant.device() {
            DeviceType::Pacman => self.emit_pacman(),
            DeviceType::PolePosition => self.emit_pole_position(),
            DeviceType::Namco15xx => self.emit_15xx(),
            DeviceType::Cus30 => self.emit_cus30(),
        }

        self.cycles.tick();
        Ok(())
    }

    /// Apply this tick's macros to channel `i`; true if its waveform must be uploaded
    fn update_channel(&mut self, i: usize) -> bool {
        let ctx = Arc::clone(&self.ctx);
        let noise_capable = i >= self.variant.noise_channel_start();
        let ch = &mut self.chan[i];

        ch.std.next();

        if ch.std.vol.had {
            ch.out_vol = ((ch.vol & 15) * ch.std.vol.val.clamp(0, 15)) >> 4;
        }

        if ch.std.duty.had && noise_capable {
            ch.noise = ch.std.duty.val != 0;
            ch.flags.insert(ChannelFlags::FREQ_CHANGED);
        }

        if ch.std.arp.had {
            if !ch.in_porta {
                let note = match ch.std.arp.mode {
                    MacroMode::Absolute => ch.std.arp.val,
                    MacroMode::Relative => ch.note.saturating_add(ch.std.arp.val),
                };
                ch.base_freq = freq::note_base(&ctx, note);
            }
            ch.flags.insert(ChannelFlags::FREQ_CHANGED);
        } else if ch.std.arp.mode == MacroMode::Absolute && ch.std.arp.finished {
            ch.base_freq = freq::note_base(&ctx, ch.note);
            ch.flags.insert(ChannelFlags::FREQ_CHANGED);
        }

        if ch.std.wave.had && (ch.wave != ch.std.wave.val || ch.ws.active_changed()) {
            ch.wave = ch.std.wave.val;
            ch.ws.change_wave1(ch.wave);
            if !ch.key_off() {
                ch.flags.insert(ChannelFlags::KEY_ON);
            }
        }

        if ch.std.pan_l.had {
            ch.pan = (ch.pan & 0x0f) | (((ch.std.pan_l.val & 15) as u8) << 4);
        }
        if ch.std.pan_r.had {
            ch.pan = (ch.pan & 0xf0) | (ch.std.pan_r.val & 15) as u8;
        }

        if ch.std.pitch.had {
            ch.pitch2 = match ch.std.pitch.mode {
                MacroMode::Relative => {
                    ch.pitch2
                        .saturating_add(ch.std.pitch.val)
                        .clamp(-PITCH2_RANGE, PITCH2_RANGE)
                }
                MacroMode::Absolute => ch.std.pitch.val,
            };
            ch.flags.insert(ChannelFlags::FREQ_CHANGED);
        }

        let phase_reset = ch.std.phase_reset.had && ch.std.phase_reset.val == 1;
        ch.active && (ch.ws.tick() || phase_reset)
    }

    /// Recompute the frequency word of channel `i` if any edge is pending, then clear the edges
    fn resolve_channel(&mut self, i: usize) {
        let max_freq = self.variant.max_freq();
        let ctx = &self.ctx;
        let ch = &mut self.chan[i];

        if !ch.flags.is_empty() {
            ch.freq = freq::resolve(ctx, ch.base_freq, ch.pitch, ch.pitch2, max_freq) as i32;
            log::trace!(
                "ch{i}: freq {:#07x} (base {}, pitch {}, pitch2 {})",
                ch.freq,
                ch.base_freq,
                ch.pitch,
                ch.pitch2
            );
            // no key trigger register: edges only force the frequency update
            ch.flags = ChannelFlags::empty();
        }
    }

    fn out_volume(&self, i: usize) -> u8 {
        if self.is_muted(i) {
            return 0;
        }
        self.chan[i].out_vol.clamp(0, 15) as u8
    }

    fn stereo_levels(&self, i: usize) -> (u8, u8) {
        if self.is_muted(i) {
            return (0, 0);
        }
        self.chan[i].stereo_levels()
    }

    fn chan_freq(&self, i: usize) -> u32 {
        self.chan[i].freq.max(0) as u32
    }

    /// Volumes, then frequency nibbles, then the fixed wave selects.
    ///
    /// Voice 0 owns frequency bits 0-3; voices 1 and 2 start at bit 4.
    fn emit_pacman(&mut self) {
        let n = self.chan.len();
        for i in 0..n {
            let vol = self.out_volume(i);
            self.write(self.variant.reg_volume(i), vol);
        }
        for i in 0..n {
            let freq = self.chan_freq(i);
            let base = self.variant.reg_freq(i);
            let first = if i == 0 { 0 } else { 1 };
            for k in first..5u16 {
                self.write(base + k, ((freq >> (4 * k)) & 0x0f) as u8);
            }
        }
        for i in 0..n {
            self.write(self.variant.reg_wave_sel(i), i as u8);
        }
    }

    fn emit_pole_position(&mut self) {
        for i in 0..self.chan.len() {
            let freq = self.chan_freq(i);
            let base = self.variant.reg_freq(i);
            let (l, r) = self.stereo_levels(i);
            self.write(base, (freq & 0xff) as u8);
            self.write(base + 1, ((freq >> 8) & 0xff) as u8);
            self.write(self.variant.reg_volume_r(i), r << 4);
            self.write(base + 3, (l << 4) | r);
            self.write(self.variant.reg_wave_sel(i), (l << 4) | i as u8);
        }
    }

    fn emit_15xx(&mut self) {
        for i in 0..self.chan.len() {
            let freq = self.chan_freq(i);
            let base = self.variant.reg_freq(i);
            let vol = self.out_volume(i);
            self.write(self.variant.reg_volume(i), vol);
            self.write(base, (freq & 0xff) as u8);
            self.write(base + 1, ((freq >> 8) & 0xff) as u8);
            self.write(
                self.variant.reg_wave_sel(i),
                ((freq >> 16) & 0x0f) as u8 | (i as u8) << 4,
            );
        }
    }

    /// Addresses are relative to the CUS30 sound register block.
    fn emit_cus30(&mut self) {
        let n = self.chan.len();
        for i in 0..n {
            let freq = self.chan_freq(i);
            let base = self.variant.reg_volume(i);
            let (l, r) = self.stereo_levels(i);
            let next = (i + 1) % n;
            let noise = if self.chan[next].noise { 0x80 } else { 0 };
            debug_assert_eq!(self.variant.reg_volume_r(i), self.variant.reg_noise(next));

            self.write(base, l);
            self.write(
                self.variant.reg_wave_sel(i),
                ((freq >> 16) & 0x0f) as u8 | (i as u8) << 4,
            );
            self.write(base + 2, ((freq >> 8) & 0xff) as u8);
            self.write(base + 3, (freq & 0xff) as u8);
            self.write(self.variant.reg_volume_r(i), r | noise);
        }
    }
}
