//! Command dispatcher
//!
//! [`WsgDispatch`] turns tracker commands into chip register writes:
//!
//! 1. [`WsgDispatch::dispatch`] mutates channel state between ticks
//! 2. [`WsgDispatch::tick`] advances macros, resolves frequencies and queues
//!    the variant's register writes
//! 3. [`WsgDispatch::acquire`] drains the queue into the chip core and renders
//!    samples
//!
//! ```
//! use namco_wsg::{Command, DispatchContext, DeviceType, WsgDispatch};
//!
//! let mut wsg = WsgDispatch::new(DispatchContext::new());
//! wsg.set_device_type(DeviceType::Pacman);
//! assert_eq!(wsg.init(), 3);
//!
//! wsg.dispatch(Command::note_on(0, 57));
//! wsg.tick().unwrap();
//!
//! let (mut left, mut right) = (vec![0i16; 256], vec![0i16; 256]);
//! wsg.acquire(&mut left, &mut right).unwrap();
//! ```

mod channel;
mod command;
mod cycle_counter;
mod osc;
mod queue;
mod tick;

pub use channel::{Channel, ChannelFlags, WAVE_UNSET};
pub use command::{
    effect_name, Command, CommandKind, NOTE_NULL, STATUS_HANDLED, STATUS_PORTA_DONE,
    STATUS_UNHANDLED, VOLUME_MAX,
};
pub use cycle_counter::CycleCounter;
pub use osc::{OscBuffer, OSC_BUFFER_LEN};
pub use queue::{QueuedWrite, RegisterPool, RegisterWrite, WriteQueue, RESET_MARKER_ADDR};

use std::io::Write;
use std::sync::Arc;

use crate::backend::WsgBackend;
use crate::config::{ChipFlags, DispatchConfig};
use crate::context::{DispatchContext, MacroMode};
use crate::device::{DeviceType, DeviceVariant, MAX_CHANNELS};
use crate::freq::{self, CHIP_CLOCK};
use crate::wave_synth::{WAVE_HEIGHT, WAVE_WIDTH};
use crate::{wsg, Result, WsgError};

/// Output rate divider of the chip clock
const CLOCK_DIVIDER: u32 = 16;

/// Tick-driven dispatcher for one Namco WSG chip
pub struct WsgDispatch {
    variant: DeviceVariant,
    flags: ChipFlags,
    chip_clock: u32,
    rate: u32,
    ctx: Arc<DispatchContext>,
    chan: Vec<Channel>,
    osc: Vec<OscBuffer>,
    muted: [bool; MAX_CHANNELS],
    chip: Option<Box<dyn WsgBackend>>,
    queue: WriteQueue,
    pool: RegisterPool,
    cycles: CycleCounter,
    cur_chan: Option<usize>,
}

impl WsgDispatch {
    /// Create an uninitialized Pac-Man dispatcher over an engine context
    pub fn new(ctx: DispatchContext) -> Self {
        let variant = DeviceVariant::default();
        Self {
            variant,
            flags: ChipFlags::empty(),
            chip_clock: CHIP_CLOCK,
            rate: CHIP_CLOCK / CLOCK_DIVIDER,
            ctx: Arc::new(ctx),
            chan: Vec::new(),
            osc: Vec::new(),
            muted: [false; MAX_CHANNELS],
            chip: None,
            queue: WriteQueue::new(),
            pool: RegisterPool::default(),
            cycles: CycleCounter::new(),
            cur_chan: None,
        }
    }

    /// Create a dispatcher configured from a [`DispatchConfig`]
    pub fn from_config(config: &DispatchConfig, ctx: DispatchContext) -> Self {
        let mut wsg = Self::new(ctx);
        wsg.set_device_type(config.device);
        wsg.flags = config.chip_flags();
        wsg.queue.set_dump_writes(config.dump_writes);
        wsg.queue.set_skip_writes(config.skip_register_writes);
        wsg
    }

    /// Select the hardware variant. Call before [`init`](Self::init).
    pub fn set_device_type(&mut self, device: DeviceType) {
        log::debug!("device type: {} ({} channels)", device.name(), DeviceVariant::new(device).channels());
        self.variant = DeviceVariant::new(device);
    }

    /// Selected hardware variant
    pub fn device_type(&self) -> DeviceType {
        self.variant.device()
    }

    /// Register map and capabilities of the selected variant
    pub fn variant(&self) -> &DeviceVariant {
        &self.variant
    }

    /// Apply a flags word. The clock is fixed; the output rate is clock / 16.
    pub fn set_flags(&mut self, flags: ChipFlags) {
        self.flags = flags;
        self.chip_clock = CHIP_CLOCK;
        self.rate = self.chip_clock / CLOCK_DIVIDER;
        for osc in &mut self.osc {
            osc.set_rate(self.rate);
        }
    }

    /// Input clock (Hz)
    pub fn chip_clock(&self) -> u32 {
        self.chip_clock
    }

    /// Output sample rate (Hz)
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Build the chip core for the selected variant and reset.
    ///
    /// Returns the channel count.
    pub fn init(&mut self) -> usize {
        self.init_with_backend(wsg::create_backend(self.variant.device()))
    }

    /// Like [`init`](Self::init) with a caller-supplied chip core
    pub fn init_with_backend(&mut self, chip: Box<dyn WsgBackend>) -> usize {
        let channels = self.variant.channels();
        self.muted = [false; MAX_CHANNELS];
        self.osc = vec![OscBuffer::new(self.rate); channels];
        self.chip = Some(chip);
        self.set_flags(self.flags);
        self.reset();
        log::debug!("init: {} at {} Hz", self.variant.device().name(), self.rate);
        channels
    }

    /// Whether `init` has run (and `quit` has not)
    pub fn is_initialized(&self) -> bool {
        self.chip.is_some()
    }

    /// Return every channel, the queue, the pool and the chip to power-on state
    pub fn reset(&mut self) {
        self.queue.clear();
        self.pool.clear();

        let ctx = &self.ctx;
        self.chan = (0..self.variant.channels())
            .map(|_| {
                let mut ch = Channel::new(Arc::clone(ctx));
                ch.ws.init(None, WAVE_WIDTH, WAVE_HEIGHT, false);
                ch
            })
            .collect();

        self.queue.mark_reset();

        if let Some(chip) = self.chip.as_deref_mut() {
            chip.set_voices(self.variant.channels());
            chip.set_stereo(self.variant.is_stereo());
            chip.start();
            chip.clock_changed(self.rate);
        }

        self.cycles.reset();
        self.cur_chan = None;
        log::debug!("reset: {} channels", self.chan.len());
    }

    /// Drop the chip core and the oscilloscope buffers
    pub fn quit(&mut self) {
        self.osc.clear();
        self.chip = None;
        log::debug!("quit");
    }

    /// Number of channels of the selected variant
    pub fn channels(&self) -> usize {
        self.variant.channels()
    }

    /// Whether the variant has distinct left/right output
    pub fn is_stereo(&self) -> bool {
        self.variant.is_stereo()
    }

    /// Whether a key-off ends a running arpeggio (always on this chip)
    pub fn key_off_affects_arp(&self, _ch: usize) -> bool {
        true
    }

    /// Replace the engine context and rebind every channel to it
    pub fn set_context(&mut self, ctx: DispatchContext) {
        self.ctx = Arc::new(ctx);
        for ch in &mut self.chan {
            ch.ws.set_engine(Arc::clone(&self.ctx));
        }
    }

    /// Engine context
    pub fn context(&self) -> &DispatchContext {
        &self.ctx
    }

    /// Apply a command to its channel and return a status or query result.
    ///
    /// A channel out of range returns [`STATUS_UNHANDLED`].
    pub fn dispatch(&mut self, c: Command) -> i32 {
        let ctx = &self.ctx;
        let Some(ch) = self.chan.get_mut(c.chan) else {
            return STATUS_UNHANDLED;
        };
        self.cur_chan = Some(c.chan);

        match c.kind {
            CommandKind::NoteOn => {
                if c.value != NOTE_NULL {
                    ch.base_freq = freq::note_base(ctx, c.value);
                    ch.flags.insert(ChannelFlags::FREQ_CHANGED);
                    ch.note = c.value;
                }
                ch.active = true;
                ch.flags.insert(ChannelFlags::KEY_ON);
                let ins = ctx.instrument(ch.ins);
                ch.macro_init(ins.cloned());
                if ch.wave < 0 {
                    ch.wave = 0;
                    ch.ws.change_wave1(ch.wave);
                }
                ch.ws.init(ins.map(|i| &**i), WAVE_WIDTH, WAVE_HEIGHT, ch.ins_changed);
                ch.ins_changed = false;
            }
            CommandKind::NoteOff => {
                ch.active = false;
                ch.flags.insert(ChannelFlags::KEY_OFF);
                ch.macro_init(None);
            }
            CommandKind::NoteOffEnv | CommandKind::EnvRelease => {
                ch.std.release();
            }
            CommandKind::Instrument => {
                if ch.ins != c.value || c.value2 == 1 {
                    ch.ins = c.value;
                    ch.ins_changed = true;
                }
            }
            CommandKind::Volume => {
                if ch.vol != c.value {
                    ch.vol = c.value;
                    if !ch.std.vol.has {
                        ch.out_vol = c.value;
                    }
                }
            }
            CommandKind::GetVolume => {
                return if ch.std.vol.has { ch.vol } else { ch.out_vol };
            }
            CommandKind::Pitch => {
                ch.pitch = c.value;
                ch.flags.insert(ChannelFlags::FREQ_CHANGED);
            }
            CommandKind::Wave => {
                ch.wave = c.value;
                ch.ws.change_wave1(ch.wave);
                ch.flags.insert(ChannelFlags::KEY_ON);
            }
            CommandKind::NotePorta => {
                let dest = freq::note_base(ctx, c.value2);
                let reached = if dest > ch.base_freq {
                    ch.base_freq = ch.base_freq.saturating_add(c.value);
                    ch.base_freq >= dest
                } else {
                    ch.base_freq = ch.base_freq.saturating_sub(c.value);
                    ch.base_freq <= dest
                };
                ch.flags.insert(ChannelFlags::FREQ_CHANGED);
                if reached {
                    ch.base_freq = dest;
                    ch.in_porta = false;
                    return STATUS_PORTA_DONE;
                }
            }
            CommandKind::StdNoiseMode => {
                ch.noise = c.value != 0;
            }
            CommandKind::Panning => {
                ch.pan = ((c.value & 0xf0) | ((c.value2 >> 4) & 0x0f)) as u8;
            }
            CommandKind::Legato => {
                let arp = &ch.std.arp;
                let offset = if arp.will && arp.mode == MacroMode::Relative {
                    arp.val
                } else {
                    0
                };
                ch.base_freq = freq::note_base(ctx, c.value.saturating_add(offset));
                ch.flags.insert(ChannelFlags::FREQ_CHANGED);
                ch.note = c.value;
            }
            CommandKind::PrePorta => {
                if ch.active && c.value2 != 0 && ctx.reset_macro_on_porta {
                    ch.macro_init(ctx.instrument(ch.ins).cloned());
                }
                ch.in_porta = c.value != 0;
            }
            CommandKind::GetVolMax => return VOLUME_MAX,
            CommandKind::AlwaysSetVolume => return 1,
            CommandKind::Other(_) => {}
        }

        STATUS_HANDLED
    }

    /// [`dispatch`](Self::dispatch) that rejects a channel out of range
    pub fn try_dispatch(&mut self, c: Command) -> Result<i32> {
        if c.chan >= self.chan.len() {
            return Err(WsgError::InvalidChannel {
                channel: c.chan,
                channels: self.chan.len(),
            });
        }
        Ok(self.dispatch(c))
    }

    /// Mark every channel's instrument and frequency dirty and re-upload all waveforms
    pub fn force_ins(&mut self) {
        for i in 0..self.chan.len() {
            self.chan[i].ins_changed = true;
            self.chan[i].flags.insert(ChannelFlags::FREQ_CHANGED);
            self.update_wave(i);
        }
    }

    /// Mute or unmute a channel
    pub fn mute_channel(&mut self, ch: usize, mute: bool) {
        if let Some(m) = self.muted.get_mut(ch) {
            *m = mute;
        }
    }

    /// Whether a channel is muted
    pub fn is_muted(&self, ch: usize) -> bool {
        self.muted.get(ch).copied().unwrap_or(false)
    }

    /// A wavetable changed: channels playing it reload and re-upload it
    pub fn notify_wave_change(&mut self, wave: i32) {
        for i in 0..self.chan.len() {
            if self.chan[i].wave == wave {
                self.chan[i].ws.change_wave1(wave);
                self.update_wave(i);
            }
        }
    }

    /// An instrument is about to be deleted: stop macros that use it
    pub fn notify_ins_deletion(&mut self, ins: i32) {
        let Some(ins) = self.ctx.instrument(ins).cloned() else {
            return;
        };
        for ch in &mut self.chan {
            ch.std.notify_ins_deletion(&ins);
        }
    }

    /// Queue a raw register write, bypassing command handling
    pub fn poke(&mut self, addr: u16, val: u8) {
        self.write(addr, val);
    }

    /// Queue several raw register writes in order
    pub fn poke_many(&mut self, writes: &[(u16, u8)]) {
        for &(addr, val) in writes {
            self.write(addr, val);
        }
    }

    /// Drain pending writes into the chip, then render `min(left.len(), right.len())` frames.
    ///
    /// Mono variants produce identical left and right samples. Returns the
    /// number of frames rendered.
    pub fn acquire(&mut self, left: &mut [i16], right: &mut [i16]) -> Result<usize> {
        let chip = self.chip.as_deref_mut().ok_or(WsgError::NotInitialized)?;

        let applied = self.queue.drain_into(chip, &mut self.pool);
        if applied > 0 {
            log::trace!("applied {applied} register writes");
        }

        let frames = left.len().min(right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            chip.clock();
            (*l, *r) = chip.sample();
            for (i, osc) in self.osc.iter_mut().enumerate() {
                osc.push(chip.voice_output(i));
            }
        }

        self.cycles.advance(frames as u64);
        Ok(frames)
    }

    /// Channel state for display
    pub fn chan_state(&self, ch: usize) -> Option<&Channel> {
        self.chan.get(ch)
    }

    /// Oscilloscope buffer of a channel
    pub fn osc_buffer(&self, ch: usize) -> Option<&OscBuffer> {
        self.osc.get(ch)
    }

    /// Register pool mirror
    pub fn register_pool(&self) -> &[u8] {
        self.pool.as_slice()
    }

    /// Declared size of the register pool
    pub fn register_pool_size(&self) -> usize {
        self.pool.size()
    }

    /// Writes queued since the last drain
    pub fn pending_writes(&self) -> impl Iterator<Item = &QueuedWrite> {
        self.queue.pending()
    }

    /// Suppress register writes (state is still updated)
    pub fn set_skip_register_writes(&mut self, skip: bool) {
        self.queue.set_skip_writes(skip);
    }

    /// Record queued writes in the dump log
    pub fn set_dump_writes(&mut self, dump: bool) {
        self.queue.set_dump_writes(dump);
    }

    /// Take the dump log
    pub fn take_dump(&mut self) -> Vec<RegisterWrite> {
        self.queue.take_dump()
    }

    /// Export the dump log as CSV (`addr,val`). Returns the number of rows.
    pub fn write_dump_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv = csv::Writer::from_writer(writer);
        for w in self.queue.dump() {
            csv.serialize(w)?;
        }
        csv.flush()?;
        Ok(self.queue.dump().len())
    }

    /// Sample and tick counters
    pub fn cycles(&self) -> &CycleCounter {
        &self.cycles
    }

    /// Channel addressed by the last command
    pub fn current_channel(&self) -> Option<usize> {
        self.cur_chan
    }

    /// Flags word in effect
    pub fn flags(&self) -> ChipFlags {
        self.flags
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.queue.push(addr, val);
    }

    /// Copy a channel's waveform into its slot of the chip's wave memory
    fn update_wave(&mut self, ch: usize) {
        let (Some(chip), Some(channel)) = (self.chip.as_deref_mut(), self.chan.get(ch)) else {
            return;
        };
        log::trace!("ch{ch}: wave upload (wave {})", channel.wave);
        for (i, &s) in channel.ws.output().iter().take(WAVE_WIDTH).enumerate() {
            chip.update_waveform(ch * WAVE_WIDTH + i, s.clamp(0, WAVE_HEIGHT) as u8);
        }
    }
}
