//! Waveform sub-state of a channel
//!
//! Holds the channel's active waveform, scaled from the shared wavetable
//! table to the chip's wave memory format (32 steps, 4-bit), and reports
//! when it changed so the dispatcher knows to re-upload wave memory.

use std::sync::Arc;

use crate::context::{DispatchContext, Instrument};

/// Steps per waveform in wave memory
pub const WAVE_WIDTH: usize = 32;

/// Largest sample value in wave memory
pub const WAVE_HEIGHT: i32 = 15;

/// Waveform state owned by one channel
#[derive(Debug, Clone)]
pub struct WaveSynth {
    ctx: Arc<DispatchContext>,
    width: usize,
    height: i32,
    output: Vec<i32>,
    wave1: i32,
    enabled: bool,
    first: bool,
    active_changed: bool,
}

impl WaveSynth {
    /// Create a waveform state bound to an engine context
    pub fn new(ctx: Arc<DispatchContext>) -> Self {
        Self {
            ctx,
            width: WAVE_WIDTH,
            height: WAVE_HEIGHT,
            output: vec![0; WAVE_WIDTH],
            wave1: 0,
            enabled: false,
            first: false,
            active_changed: false,
        }
    }

    /// Rebind to another engine context
    pub fn set_engine(&mut self, ctx: Arc<DispatchContext>) {
        self.ctx = ctx;
    }

    /// Configure size and pick up the instrument's synthesizer settings.
    ///
    /// The instrument's first wave is reloaded when `ins_changed` is set or
    /// when synthesis was previously off.
    pub fn init(&mut self, ins: Option<&Instrument>, width: usize, height: i32, ins_changed: bool) {
        self.width = width.min(256);
        self.height = height;
        self.output.resize(self.width, 0);

        let params = match ins {
            Some(ins) if ins.wave_synth.enabled => &ins.wave_synth,
            _ => {
                if self.enabled {
                    self.active_changed = true;
                }
                self.enabled = false;
                return;
            }
        };

        let was_enabled = self.enabled;
        if !was_enabled {
            self.active_changed = true;
        }
        self.enabled = true;
        if ins_changed || !was_enabled {
            self.change_wave1(params.wave1);
        }
    }

    /// Load wavetable `num` into the output, scaled to width x height
    pub fn change_wave1(&mut self, num: i32) {
        self.wave1 = num;
        let (width, height) = (self.width, self.height);

        // unknown ids play wave 0 when any wavetable exists
        let wave = self.ctx.wavetable(num).or_else(|| self.ctx.wavetable(0));
        match wave {
            Some(w) if w.max >= 1 && !w.is_empty() => {
                let len = w.len();
                for (i, out) in self.output.iter_mut().enumerate() {
                    let data = w.data[i * len / width] as i64 * height as i64 / w.max as i64;
                    *out = data.clamp(0, height as i64) as i32;
                }
            }
            _ => self.output.iter_mut().for_each(|s| *s = 0),
        }

        self.first = true;
    }

    /// Advance one tick; true if the output changed since the last tick
    pub fn tick(&mut self) -> bool {
        std::mem::take(&mut self.first)
    }

    /// True once after synthesis was switched on or off
    pub fn active_changed(&mut self) -> bool {
        std::mem::take(&mut self.active_changed)
    }

    /// Current waveform samples (0..=height)
    pub fn output(&self) -> &[i32] {
        &self.output
    }

    /// Wavetable loaded last
    pub fn wave1(&self) -> i32 {
        self.wave1
    }

    /// Whether an instrument drives the waveform
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
