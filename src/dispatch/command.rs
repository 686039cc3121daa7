//! Dispatch commands and status codes

/// "No note" payload for [`CommandKind::NoteOn`]: retrigger without a pitch change
pub const NOTE_NULL: i32 = i32::MAX;

/// Command not handled (also returned for a channel out of range)
pub const STATUS_UNHANDLED: i32 = 0;

/// Command handled
pub const STATUS_HANDLED: i32 = 1;

/// Portamento reached its target note
pub const STATUS_PORTA_DONE: i32 = 2;

/// Highest channel volume
pub const VOLUME_MAX: i32 = 15;

/// Command tags understood by the dispatcher.
///
/// Payload use per tag (`value`, `value2`):
///
/// | Kind | value | value2 |
/// |---|---|---|
/// | `NoteOn` | note or [`NOTE_NULL`] | |
/// | `Instrument` | instrument id | 1 = force |
/// | `Volume` | volume 0-15 | |
/// | `Pitch` | fine pitch | |
/// | `Wave` | wavetable id | |
/// | `NotePorta` | step | target note |
/// | `StdNoiseMode` | noise on (non-zero) | |
/// | `Panning` | left 0-255 | right 0-255 |
/// | `Legato` | note | |
/// | `PrePorta` | porta active | macro reset requested |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum CommandKind {
    NoteOn,
    NoteOff,
    NoteOffEnv,
    EnvRelease,
    Instrument,
    Volume,
    GetVolume,
    Pitch,
    Wave,
    NotePorta,
    StdNoiseMode,
    Panning,
    Legato,
    PrePorta,
    GetVolMax,
    AlwaysSetVolume,
    /// Any command this chip does not implement (raw host code)
    Other(u16),
}

/// A command addressed to one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Command {
    pub kind: CommandKind,
    pub chan: usize,
    pub value: i32,
    pub value2: i32,
}

impl Command {
    /// Command without payload
    pub fn new(kind: CommandKind, chan: usize) -> Self {
        Self {
            kind,
            chan,
            value: 0,
            value2: 0,
        }
    }

    /// Command with one payload value
    pub fn with_value(kind: CommandKind, chan: usize, value: i32) -> Self {
        Self {
            value,
            ..Self::new(kind, chan)
        }
    }

    /// Command with both payload values
    pub fn with_values(kind: CommandKind, chan: usize, value: i32, value2: i32) -> Self {
        Self {
            value,
            value2,
            ..Self::new(kind, chan)
        }
    }

    /// Key on, optionally at a new note
    pub fn note_on(chan: usize, note: i32) -> Self {
        Self::with_value(CommandKind::NoteOn, chan, note)
    }

    /// Key off
    pub fn note_off(chan: usize) -> Self {
        Self::new(CommandKind::NoteOff, chan)
    }

    /// Select an instrument
    pub fn instrument(chan: usize, ins: i32) -> Self {
        Self::with_value(CommandKind::Instrument, chan, ins)
    }

    /// Set the channel volume
    pub fn volume(chan: usize, vol: i32) -> Self {
        Self::with_value(CommandKind::Volume, chan, vol)
    }

    /// Slide toward `target` note by `step` frequency units per call
    pub fn note_porta(chan: usize, step: i32, target: i32) -> Self {
        Self::with_values(CommandKind::NotePorta, chan, step, target)
    }

    /// Set left/right levels (high nibble of each is used)
    pub fn panning(chan: usize, left: i32, right: i32) -> Self {
        Self::with_values(CommandKind::Panning, chan, left, right)
    }

    /// Change note without retriggering
    pub fn legato(chan: usize, note: i32) -> Self {
        Self::with_value(CommandKind::Legato, chan, note)
    }
}

/// Description of a chip-specific tracker effect
pub fn effect_name(effect: u8) -> Option<&'static str> {
    match effect {
        0x10 => Some("10xx: Change waveform"),
        0x11 => Some("11xx: Toggle noise mode"),
        _ => None,
    }
}
