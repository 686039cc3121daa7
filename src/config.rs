//! Dispatcher configuration
//!
//! [`DispatchConfig`] bundles everything fixed before `init`: the hardware
//! variant, the chip flags word and the write queue modes. It loads from
//! JSON:
//!
//! ```
//! use namco_wsg::{DeviceType, DispatchConfig};
//!
//! let cfg = DispatchConfig::from_json(r#"{ "device": "cus30", "dump_writes": true }"#).unwrap();
//! assert_eq!(cfg.device, DeviceType::Cus30);
//! assert!(!cfg.skip_register_writes);
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::device::DeviceType;
use crate::freq::CHIP_CLOCK;
use crate::Result;

bitflags! {
    /// Chip flags word.
    ///
    /// Every bit is carried through unchanged; none alters the fixed
    /// 3.072 MHz clock yet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChipFlags: u32 {
        const _ = !0;
    }
}

impl ChipFlags {
    /// Input clock selected by these flags (Hz)
    pub fn clock(&self) -> u32 {
        CHIP_CLOCK
    }

    /// Output sample rate selected by these flags (Hz)
    pub fn rate(&self) -> u32 {
        self.clock() / 16
    }
}

/// Settings applied when a dispatcher is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Hardware variant
    pub device: DeviceType,
    /// Raw flags word
    pub flags: u32,
    /// Record queued writes in the dump log
    pub dump_writes: bool,
    /// Suppress register writes
    pub skip_register_writes: bool,
}

impl DispatchConfig {
    /// Parse a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Flags word as [`ChipFlags`]
    pub fn chip_flags(&self) -> ChipFlags {
        ChipFlags::from_bits_retain(self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WsgError;

    #[test]
    fn test_defaults() {
        let cfg = DispatchConfig::from_json("{}").unwrap();
        assert_eq!(cfg, DispatchConfig::default());
        assert_eq!(cfg.device, DeviceType::Pacman);
        assert_eq!(cfg.chip_flags().rate(), 192_000);
    }

    #[test]
    fn test_roundtrip_keeps_flags() {
        let cfg = DispatchConfig {
            device: DeviceType::PolePosition,
            flags: 0x8001,
            ..Default::default()
        };
        let back = DispatchConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back.chip_flags().bits(), 0x8001);
        assert_eq!(back.device, DeviceType::PolePosition);
    }

    #[test]
    fn test_bad_device_is_config_error() {
        let err = DispatchConfig::from_json(r#"{ "device": "sn76489" }"#).unwrap_err();
        assert!(matches!(err, WsgError::Config(_)));
    }
}
