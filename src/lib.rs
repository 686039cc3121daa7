//! Namco WSG command dispatcher
//!
//! Drives the Namco wavetable sound generator family (Pac-Man WSG, Pole
//! Position, 15XX, CUS30) from tracker-style commands. Commands update
//! per-channel state, a tick advances instrument macros and turns the state
//! into an ordered stream of register writes, and audio acquisition applies
//! those writes to a chip core before rendering samples.
//!
//! # Features
//! - Four hardware variants with their own register maps (3 or 8 voices,
//!   mono or stereo, 16- or 20-bit frequency)
//! - Volume, arpeggio, pitch, waveform, panning, noise and phase-reset macros
//! - Portamento, legato and arpeggio interaction
//! - FIFO register write queue with register pool mirror and dump log
//! - Built-in wavetable chip core with the CUS30 noise generator
//!
//! # Crate feature flags
//! - `render` (default): the `namco-wsg-render` WAV renderer binary
//!
//! # Quick start
//! ```
//! use namco_wsg::{Command, DeviceType, DispatchContext, Wavetable, WsgDispatch};
//!
//! let ctx = DispatchContext::new().with_wavetable(Wavetable::triangle());
//! let mut wsg = WsgDispatch::new(ctx);
//! wsg.set_device_type(DeviceType::Namco15xx);
//! let channels = wsg.init();
//! assert_eq!(channels, 8);
//!
//! wsg.dispatch(Command::note_on(0, 60));
//! wsg.tick().unwrap();
//!
//! let (mut left, mut right) = (vec![0i16; 3200], vec![0i16; 3200]);
//! wsg.acquire(&mut left, &mut right).unwrap();
//! ```

#![warn(missing_docs)]

pub mod backend; // Chip core interface
pub mod config; // Dispatcher configuration
pub mod context; // Shared instruments, wavetables, song settings
pub mod device; // Variant register maps
pub mod dispatch; // Command dispatcher and tick engine
pub mod freq; // Note and pitch to frequency word
pub mod macros; // Macro evaluation
pub mod wave_synth; // Channel waveform state
pub mod wsg; // Chip sound core

/// Error types for dispatcher setup and export
#[derive(thiserror::Error, Debug)]
pub enum WsgError {
    /// Device id not in the WSG family
    #[error("Unknown device type: {0}")]
    UnknownDevice(i32),

    /// Operation needs `init` first
    #[error("Dispatcher not initialized")]
    NotInitialized,

    /// Channel index out of range
    #[error("Channel {channel} out of range (0..{channels})")]
    InvalidChannel {
        /// Requested channel
        channel: usize,
        /// Channels of the selected variant
        channels: usize,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error while exporting
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<serde_json::Error> for WsgError {
    fn from(err: serde_json::Error) -> Self {
        WsgError::Config(err.to_string())
    }
}

/// Result type for dispatcher operations
pub type Result<T> = std::result::Result<T, WsgError>;

// Public API exports
pub use backend::WsgBackend;
pub use config::{ChipFlags, DispatchConfig};
pub use context::{
    DispatchContext, Instrument, InstrumentMacros, MacroMode, MacroSequence, WaveSynthParams,
    Wavetable,
};
pub use device::{register_sheet, DeviceType, DeviceVariant};
pub use dispatch::{
    effect_name, Channel, ChannelFlags, Command, CommandKind, RegisterWrite, WsgDispatch,
    NOTE_NULL, STATUS_HANDLED, STATUS_PORTA_DONE, STATUS_UNHANDLED,
};
pub use macros::{MacroSlot, MacroState};
pub use wave_synth::WaveSynth;
