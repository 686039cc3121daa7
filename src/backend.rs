//! Backend trait abstraction for WSG chip cores
//!
//! The dispatcher never synthesizes audio itself. It talks to a chip core
//! through this interface: register writes, wave memory updates, voice
//! configuration and sample generation. Each hardware variant provides its
//! own implementation with its own register decoding, and tests can plug in
//! a recording core to observe the exact write stream.

/// Common interface for Namco WSG chip cores
///
/// # Example
///
/// ```
/// use namco_wsg::{DeviceType, WsgBackend, wsg};
///
/// let mut chip = wsg::create_backend(DeviceType::Pacman);
/// chip.set_voices(3);
/// chip.start();
/// chip.write_register(0x15, 0x0F); // voice 0 volume
/// chip.write_register(0x13, 0x01); // voice 0 frequency bits 12-15
/// chip.clock();
/// let (left, right) = chip.sample();
/// assert_eq!(left, right);
/// ```
pub trait WsgBackend: Send {
    /// Write one register through the variant's register map.
    ///
    /// # Arguments
    ///
    /// * `addr` - Register address in the variant's sound register space
    /// * `value` - Register value (variants mask to their register width)
    fn write_register(&mut self, addr: u16, value: u8);

    /// Set the number of active voices (1-8)
    fn set_voices(&mut self, voices: usize);

    /// Enable or disable independent left/right volumes
    fn set_stereo(&mut self, stereo: bool);

    /// Start (or restart) the core: clears voices and registers
    fn start(&mut self);

    /// Notify the core of a new output sample rate in Hz
    fn clock_changed(&mut self, rate: u32);

    /// Store one 4-bit sample in wave memory
    ///
    /// # Arguments
    ///
    /// * `index` - Sample index (waveform slot * 32 + step)
    /// * `sample` - Sample value (0-15)
    fn update_waveform(&mut self, index: usize, sample: u8);

    /// Advance the core by one output sample
    fn clock(&mut self);

    /// Last generated (left, right) sample; equal on mono cores
    fn sample(&self) -> (i16, i16);

    /// Last output of a single voice, for oscilloscope display
    fn voice_output(&self, _voice: usize) -> i16 {
        0
    }

    /// Generate samples into caller-provided left/right buffers
    ///
    /// Fills `min(left.len(), right.len())` frames.
    fn generate_into(&mut self, left: &mut [i16], right: &mut [i16]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            self.clock();
            (*l, *r) = self.sample();
        }
    }
}
