//! Shared engine context
//!
//! Every channel reads instrument macros, wavetables and song-level pitch
//! settings from one [`DispatchContext`]. The dispatcher holds it behind an
//! `Arc` and hands a clone to each channel's macro and waveform state, so
//! channels own their evaluation state but never copy the tables.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Default concert pitch (A-4) in Hz
pub const DEFAULT_TUNING: f64 = 440.0;

/// How a macro value is applied to the channel.
///
/// For arpeggio, `Relative` offsets the playing note and `Absolute` plays a
/// fixed note. For pitch, `Relative` accumulates into the pitch offset and
/// `Absolute` replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroMode {
    /// Offset from / accumulate onto the current value
    #[default]
    Relative,
    /// Replace the current value
    Absolute,
}

/// One macro sequence of an instrument (empty = not present)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroSequence {
    /// Values emitted one per tick
    pub values: Vec<i32>,
    /// Position to jump back to after the last value
    pub loop_point: Option<usize>,
    /// Position held until the note is released
    pub release_point: Option<usize>,
    /// Application mode
    pub mode: MacroMode,
}

impl MacroSequence {
    /// Sequence that plays `values` once
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }

    /// Set the loop point
    pub fn with_loop(mut self, point: usize) -> Self {
        self.loop_point = Some(point);
        self
    }

    /// Set the release point
    pub fn with_release(mut self, point: usize) -> Self {
        self.release_point = Some(point);
        self
    }

    /// Set the application mode
    pub fn with_mode(mut self, mode: MacroMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of values in the sequence
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the sequence has no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The macro set of an instrument
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentMacros {
    /// Volume (0-15, scales the channel volume)
    pub vol: MacroSequence,
    /// Duty, used as noise mode on noise-capable channels
    pub duty: MacroSequence,
    /// Arpeggio (note offsets or fixed notes)
    pub arp: MacroSequence,
    /// Waveform index
    pub wave: MacroSequence,
    /// Fine pitch offset
    pub pitch: MacroSequence,
    /// Left pan level (0-15)
    pub pan_l: MacroSequence,
    /// Right pan level (0-15)
    pub pan_r: MacroSequence,
    /// Phase reset trigger (1 = re-upload the waveform)
    pub phase_reset: MacroSequence,
}

/// Waveform synthesizer settings of an instrument
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSynthParams {
    /// Whether the instrument drives the channel's waveform
    pub enabled: bool,
    /// Waveform loaded on note-on when enabled
    pub wave1: i32,
}

/// Instrument definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instrument {
    /// Display name
    pub name: String,
    /// Macro sequences
    pub macros: InstrumentMacros,
    /// Waveform synthesizer settings
    pub wave_synth: WaveSynthParams,
}

impl Instrument {
    /// Create an empty instrument
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A user wavetable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wavetable {
    /// Samples, 0..=max
    pub data: Vec<i32>,
    /// Largest sample value
    pub max: i32,
}

impl Wavetable {
    /// Create a wavetable from samples and their range
    pub fn new(data: Vec<i32>, max: i32) -> Self {
        Self { data, max }
    }

    /// 32-step, 4-bit triangle
    pub fn triangle() -> Self {
        let data = (0..32)
            .map(|i| if i < 16 { i } else { 31 - i })
            .collect::<Vec<_>>();
        Self { data, max: 15 }
    }

    /// 32-step, 4-bit square
    pub fn square() -> Self {
        let data = (0..32).map(|i| if i < 16 { 15 } else { 0 }).collect();
        Self { data, max: 15 }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the table holds no samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Read-only tables and song settings shared by all channels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchContext {
    /// Frequency of A-4 in Hz
    pub tuning: f64,
    /// Use the exponential pitch table instead of additive pitch
    pub linear_pitch: bool,
    /// Re-initialize macros when a portamento starts on a sounding note
    pub reset_macro_on_porta: bool,
    instruments: Vec<Arc<Instrument>>,
    wavetables: Vec<Wavetable>,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            tuning: DEFAULT_TUNING,
            linear_pitch: true,
            reset_macro_on_porta: false,
            instruments: Vec::new(),
            wavetables: Vec::new(),
        }
    }
}

impl DispatchContext {
    /// Empty context with default song settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instrument; its id is its index
    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instruments.push(Arc::new(instrument));
        self
    }

    /// Append a wavetable; its id is its index
    pub fn with_wavetable(mut self, wave: Wavetable) -> Self {
        self.wavetables.push(wave);
        self
    }

    /// Look up an instrument by id
    pub fn instrument(&self, id: i32) -> Option<&Arc<Instrument>> {
        usize::try_from(id).ok().and_then(|i| self.instruments.get(i))
    }

    /// Look up a wavetable by id
    pub fn wavetable(&self, id: i32) -> Option<&Wavetable> {
        usize::try_from(id).ok().and_then(|i| self.wavetables.get(i))
    }

    /// Number of instruments
    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    /// Number of wavetables
    pub fn wavetable_count(&self) -> usize {
        self.wavetables.len()
    }
}
