//! Namco WSG sound core
//!
//! A wavetable voice engine ([`WsgCore`]) shared by four register front ends,
//! one per hardware variant. Use [`create_backend`] to get the front end for
//! a [`DeviceType`].

mod engine;
mod variants;
mod voice;

pub use engine::{
    WsgCore, INTERNAL_RATE, MAX_VOICES, SOUND_REGS_SIZE, WAVE_MEMORY_SIZE, WAVE_SLOTS,
};
pub use variants::{Cus30Sound, Namco15xxSound, PacmanSound, PolePosSound};
pub use voice::{Voice, WAVE_STEPS};

use crate::backend::WsgBackend;
use crate::device::DeviceType;

/// Build the chip core matching a device variant
pub fn create_backend(device: DeviceType) -> Box<dyn WsgBackend> {
    match device {
        DeviceType::Pacman => Box::new(PacmanSound::new()),
        DeviceType::PolePosition => Box::new(PolePosSound::new()),
        DeviceType::Namco15xx => Box::new(Namco15xxSound::new()),
        DeviceType::Cus30 => Box::new(Cus30Sound::new()),
    }
}
