//! Device Variant Table
//!
//! The Namco WSG family shares one voice engine across several boards that
//! differ in voice count, register layout and stereo capability. A
//! [`DeviceVariant`] is selected once before `init` and fixes:
//! - channel count (3 or 8)
//! - per-channel register addresses (volume, frequency, wave select,
//!   right volume, noise select)
//! - stereo output and the width of the frequency word

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::WsgError;

/// Most voices any variant exposes.
pub const MAX_CHANNELS: usize = 8;

/// Largest frequency word accepted by the 20-bit accumulator variants.
pub const MAX_FREQ_20BIT: u32 = 0xF_FFFF;

/// Largest frequency word accepted by Pole Position's 16-bit registers.
pub const MAX_FREQ_16BIT: u32 = 0xFFFF;

/// Declared register pool size reported for introspection.
pub const REGISTER_POOL_SIZE: usize = 112;

/// Register cheat sheet for diagnostic display: (name, address).
const REGISTER_SHEET: [(&str, &str); 10] = [
    ("Select", "0"),
    ("MasterVol", "1"),
    ("FreqL", "2"),
    ("FreqH", "3"),
    ("DataCtl", "4"),
    ("ChanVol", "5"),
    ("WaveCtl", "6"),
    ("NoiseCtl", "7"),
    ("LFOFreq", "8"),
    ("LFOCtl", "9"),
];

/// Hardware sub-variant selector.
///
/// Discriminants match the integer ids used by the host tracker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceType {
    /// Pac-Man WSG: 3 voices, mono, nibble-wide registers
    #[default]
    Pacman = 1,
    /// Pole Position: 8 voices, stereo, 16-bit frequency
    PolePosition = 2,
    /// Namco 15XX: 8 voices, mono
    Namco15xx = 15,
    /// Namco CUS30: 8 voices, stereo, noise on every voice
    Cus30 = 30,
}

impl DeviceType {
    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::Pacman => "Namco WSG",
            DeviceType::PolePosition => "Namco Pole Position",
            DeviceType::Namco15xx => "Namco C15",
            DeviceType::Cus30 => "Namco C30",
        }
    }
}

impl TryFrom<i32> for DeviceType {
    type Error = WsgError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        DeviceType::from_i32(value).ok_or(WsgError::UnknownDevice(value))
    }
}

impl std::str::FromStr for DeviceType {
    type Err = WsgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pacman" | "wsg" | "1" => Ok(DeviceType::Pacman),
            "pole-position" | "polepos" | "2" => Ok(DeviceType::PolePosition),
            "namco15xx" | "15xx" | "c15" | "15" => Ok(DeviceType::Namco15xx),
            "cus30" | "c30" | "30" => Ok(DeviceType::Cus30),
            other => Err(WsgError::Config(format!("unknown device '{other}'"))),
        }
    }
}

/// Immutable register map and capabilities of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVariant {
    device: DeviceType,
    channels: usize,
    stereo: bool,
    max_freq: u32,
    noise_channel_start: usize,
    reg_volume: [u16; MAX_CHANNELS],
    reg_volume_r: [u16; MAX_CHANNELS],
    reg_freq: [u16; MAX_CHANNELS],
    reg_wave_sel: [u16; MAX_CHANNELS],
    reg_noise: [u16; MAX_CHANNELS],
}

impl DeviceVariant {
    /// Build the descriptor for a device type
    pub fn new(device: DeviceType) -> Self {
        let mut variant = DeviceVariant {
            device,
            channels: MAX_CHANNELS,
            stereo: false,
            max_freq: MAX_FREQ_20BIT,
            noise_channel_start: 4,
            reg_volume: [0; MAX_CHANNELS],
            reg_volume_r: [0; MAX_CHANNELS],
            reg_freq: [0; MAX_CHANNELS],
            reg_wave_sel: [0; MAX_CHANNELS],
            reg_noise: [0; MAX_CHANNELS],
        };

        match device {
            DeviceType::Pacman => {
                variant.channels = 3;
                for i in 0..3 {
                    let base = (i * 5) as u16;
                    variant.reg_volume[i] = base + 0x15;
                    variant.reg_freq[i] = base + 0x10;
                    variant.reg_wave_sel[i] = base + 0x05;
                }
            }
            DeviceType::PolePosition => {
                variant.stereo = true;
                variant.max_freq = MAX_FREQ_16BIT;
                for i in 0..MAX_CHANNELS {
                    let base = (i << 2) as u16;
                    variant.reg_volume[i] = base + 0x23;
                    variant.reg_volume_r[i] = base + 0x02;
                    variant.reg_freq[i] = base;
                    variant.reg_wave_sel[i] = base + 0x23;
                }
            }
            DeviceType::Namco15xx => {
                for i in 0..MAX_CHANNELS {
                    let base = (i << 3) as u16;
                    variant.reg_volume[i] = base + 0x03;
                    variant.reg_freq[i] = base + 0x04;
                    variant.reg_wave_sel[i] = base + 0x06;
                }
            }
            DeviceType::Cus30 => {
                variant.stereo = true;
                for i in 0..MAX_CHANNELS {
                    let base = (i << 3) as u16;
                    variant.reg_volume[i] = base;
                    variant.reg_freq[i] = base + 0x01;
                    variant.reg_wave_sel[i] = base + 0x01;
                    variant.reg_volume_r[i] = base + 0x04;
                    // noise enable for voice i sits in the previous voice's block
                    variant.reg_noise[i] = ((((i + 7) & 7) << 3) + 0x04) as u16;
                }
            }
        }

        variant
    }

    /// Selected device type
    pub fn device(&self) -> DeviceType {
        self.device
    }

    /// Number of voices
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Whether the variant produces distinct left/right output
    pub fn is_stereo(&self) -> bool {
        self.stereo
    }

    /// Largest frequency word the variant's registers hold
    pub fn max_freq(&self) -> u32 {
        self.max_freq
    }

    /// First channel whose duty macro drives noise mode
    pub fn noise_channel_start(&self) -> usize {
        self.noise_channel_start
    }

    /// Volume (or left volume) register of a channel
    pub fn reg_volume(&self, ch: usize) -> u16 {
        self.reg_volume[ch]
    }

    /// Right volume register of a channel (stereo variants only)
    pub fn reg_volume_r(&self, ch: usize) -> u16 {
        self.reg_volume_r[ch]
    }

    /// Base frequency register of a channel
    pub fn reg_freq(&self, ch: usize) -> u16 {
        self.reg_freq[ch]
    }

    /// Wave select register of a channel
    pub fn reg_wave_sel(&self, ch: usize) -> u16 {
        self.reg_wave_sel[ch]
    }

    /// Register holding the noise enable bit of a channel (CUS30 only)
    pub fn reg_noise(&self, ch: usize) -> u16 {
        self.reg_noise[ch]
    }
}

impl Default for DeviceVariant {
    fn default() -> Self {
        Self::new(DeviceType::default())
    }
}

/// Human-readable register names for diagnostic display
pub fn register_sheet() -> &'static [(&'static str, &'static str)] {
    &REGISTER_SHEET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_from_raw() {
        assert_eq!(DeviceType::try_from(1).unwrap(), DeviceType::Pacman);
        assert_eq!(DeviceType::try_from(15).unwrap(), DeviceType::Namco15xx);
        assert_eq!(DeviceType::try_from(30).unwrap(), DeviceType::Cus30);
        assert!(matches!(
            DeviceType::try_from(7),
            Err(WsgError::UnknownDevice(7))
        ));
    }

    #[test]
    fn test_channel_counts() {
        assert_eq!(DeviceVariant::new(DeviceType::Pacman).channels(), 3);
        assert_eq!(DeviceVariant::new(DeviceType::PolePosition).channels(), 8);
        assert_eq!(DeviceVariant::new(DeviceType::Namco15xx).channels(), 8);
        assert_eq!(DeviceVariant::new(DeviceType::Cus30).channels(), 8);
    }

    #[test]
    fn test_pacman_register_map() {
        let v = DeviceVariant::new(DeviceType::Pacman);
        assert_eq!(v.reg_volume(0), 0x15);
        assert_eq!(v.reg_volume(1), 0x1a);
        assert_eq!(v.reg_volume(2), 0x1f);
        assert_eq!(v.reg_freq(1), 0x15);
        assert_eq!(v.reg_wave_sel(2), 0x0f);
        assert!(!v.is_stereo());
    }

    #[test]
    fn test_cus30_noise_register_wraps() {
        let v = DeviceVariant::new(DeviceType::Cus30);
        assert_eq!(v.reg_noise(0), 0x3c);
        assert_eq!(v.reg_noise(1), 0x04);
        assert_eq!(v.reg_volume_r(3), 0x1c);
    }

    #[test]
    fn test_pole_position_is_16bit() {
        let v = DeviceVariant::new(DeviceType::PolePosition);
        assert_eq!(v.max_freq(), MAX_FREQ_16BIT);
        assert!(v.is_stereo());
    }

    #[test]
    fn test_register_sheet() {
        let sheet = register_sheet();
        assert_eq!(sheet.len(), 10);
        assert_eq!(sheet[6], ("WaveCtl", "6"));
    }
}
