//! Register write queue and register pool
//!
//! Writes produced by a tick wait in a FIFO until the next `acquire`, which
//! applies them to the chip core in order before any sample is generated.
//! Every applied write is mirrored into the [`RegisterPool`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::backend::WsgBackend;
use crate::device::REGISTER_POOL_SIZE;

/// Address of the marker entry a reset appends to the dump log
pub const RESET_MARKER_ADDR: u32 = 0xffff_ffff;

/// Bytes allocated for the pool mirror
const POOL_CAPACITY: usize = 128;

/// A pending register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedWrite {
    /// Register address
    pub addr: u16,
    /// Register value
    pub val: u8,
}

/// An entry of the register dump log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterWrite {
    /// Register address, or [`RESET_MARKER_ADDR`]
    pub addr: u32,
    /// Register value
    pub val: u16,
}

/// Ordered queue of register writes
#[derive(Debug, Clone, Default)]
pub struct WriteQueue {
    pending: VecDeque<QueuedWrite>,
    dump: Vec<RegisterWrite>,
    skip_writes: bool,
    dump_writes: bool,
}

impl WriteQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write. Suppressed writes reach neither the chip nor the dump log.
    pub fn push(&mut self, addr: u16, val: u8) {
        if self.skip_writes {
            return;
        }
        self.pending.push_back(QueuedWrite { addr, val });
        if self.dump_writes {
            self.dump.push(RegisterWrite {
                addr: addr as u32,
                val: val as u16,
            });
        }
    }

    /// Append the reset marker to the dump log (when dumping)
    pub fn mark_reset(&mut self) {
        if self.dump_writes {
            self.dump.push(RegisterWrite {
                addr: RESET_MARKER_ADDR,
                val: 0,
            });
        }
    }

    /// Apply every pending write to the chip and the pool, oldest first.
    ///
    /// Returns the number of writes applied.
    pub fn drain_into(&mut self, chip: &mut dyn WsgBackend, pool: &mut RegisterPool) -> usize {
        let count = self.pending.len();
        while let Some(w) = self.pending.pop_front() {
            chip.write_register(w.addr, w.val);
            pool.set(w.addr, w.val);
        }
        count
    }

    /// Drop pending writes without applying them
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Writes waiting for the next drain
    pub fn pending(&self) -> impl Iterator<Item = &QueuedWrite> {
        self.pending.iter()
    }

    /// Number of writes waiting
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Suppress all further writes
    pub fn set_skip_writes(&mut self, skip: bool) {
        self.skip_writes = skip;
    }

    /// Whether writes are suppressed
    pub fn skip_writes(&self) -> bool {
        self.skip_writes
    }

    /// Record queued writes in the dump log
    pub fn set_dump_writes(&mut self, dump: bool) {
        self.dump_writes = dump;
    }

    /// Whether writes are being recorded
    pub fn dump_writes(&self) -> bool {
        self.dump_writes
    }

    /// Recorded writes
    pub fn dump(&self) -> &[RegisterWrite] {
        &self.dump
    }

    /// Take the dump log, leaving it empty
    pub fn take_dump(&mut self) -> Vec<RegisterWrite> {
        std::mem::take(&mut self.dump)
    }
}

/// Mirror of the chip's register space, for inspection only
#[derive(Debug, Clone)]
pub struct RegisterPool {
    bytes: [u8; POOL_CAPACITY],
}

impl Default for RegisterPool {
    fn default() -> Self {
        Self {
            bytes: [0; POOL_CAPACITY],
        }
    }
}

impl RegisterPool {
    /// Store a value; addresses past the pool are ignored
    pub fn set(&mut self, addr: u16, val: u8) {
        if let Some(b) = self.bytes.get_mut(addr as usize) {
            *b = val;
        }
    }

    /// Value at `addr` (0 outside the pool)
    pub fn get(&self, addr: u16) -> u8 {
        self.bytes.get(addr as usize).copied().unwrap_or(0)
    }

    /// Zero every byte
    pub fn clear(&mut self) {
        self.bytes = [0; POOL_CAPACITY];
    }

    /// The whole buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared register pool size
    pub fn size(&self) -> usize {
        REGISTER_POOL_SIZE
    }
}
