//! Per-channel macro evaluation
//!
//! A [`MacroState`] walks the macro sequences of the channel's instrument,
//! one step per tick. For every macro kind it reports whether a value fired
//! this tick (`had`), the value and its mode, and whether the sequence just
//! ran out (`finished`). The dispatcher only reads these flags; how values
//! are applied to the channel lives in the tick update.

use std::sync::Arc;

use crate::context::{Instrument, MacroMode, MacroSequence};

/// Evaluation state of one macro kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroSlot {
    /// Sequence is present and still running
    pub has: bool,
    /// A value fired on the last step
    pub had: bool,
    /// Sequence was present at note-on
    pub will: bool,
    /// Sequence stopped on the previous step (set for exactly one step)
    pub finished: bool,
    /// Last value
    pub val: i32,
    /// Application mode of the sequence
    pub mode: MacroMode,
    pos: usize,
}

impl MacroSlot {
    fn start(&mut self, seq: &MacroSequence) {
        *self = MacroSlot::default();
        if !seq.is_empty() {
            self.has = true;
            self.will = true;
            self.mode = seq.mode;
        }
    }

    fn step(&mut self, seq: Option<&MacroSequence>, released: bool) {
        self.finished = self.had && !self.has;
        self.had = self.has;
        if !self.has {
            return;
        }

        let Some(seq) = seq else {
            self.has = false;
            return;
        };
        let Some(&val) = seq.values.get(self.pos) else {
            self.has = false;
            return;
        };

        let len = seq.len();
        self.val = val;
        self.pos += 1;

        if let Some(rel) = seq.release_point {
            if self.pos > rel && !released {
                match seq.loop_point {
                    Some(lp) if lp < len && lp < rel => self.pos = lp,
                    _ => self.pos -= 1,
                }
            }
        }

        if self.pos >= len {
            let loops_after_release = |lp: usize| {
                seq.release_point
                    .map_or(true, |rel| lp >= rel || rel >= len)
            };
            match seq.loop_point {
                Some(lp) if lp < len && loops_after_release(lp) => self.pos = lp,
                _ => self.has = false,
            }
        }
    }
}

/// Macro evaluation state owned by one channel
#[derive(Debug, Clone, Default)]
pub struct MacroState {
    ins: Option<Arc<Instrument>>,
    released: bool,
    /// Volume
    pub vol: MacroSlot,
    /// Duty / noise mode
    pub duty: MacroSlot,
    /// Arpeggio
    pub arp: MacroSlot,
    /// Waveform
    pub wave: MacroSlot,
    /// Pitch
    pub pitch: MacroSlot,
    /// Left panning
    pub pan_l: MacroSlot,
    /// Right panning
    pub pan_r: MacroSlot,
    /// Phase reset
    pub phase_reset: MacroSlot,
}

impl MacroState {
    /// Create an idle macro state
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart every macro from an instrument, or stop them all with `None`
    pub fn init(&mut self, ins: Option<Arc<Instrument>>) {
        let empty = MacroSequence::default();
        let macros = ins.as_deref().map(|i| &i.macros);

        self.vol.start(macros.map_or(&empty, |m| &m.vol));
        self.duty.start(macros.map_or(&empty, |m| &m.duty));
        self.arp.start(macros.map_or(&empty, |m| &m.arp));
        self.wave.start(macros.map_or(&empty, |m| &m.wave));
        self.pitch.start(macros.map_or(&empty, |m| &m.pitch));
        self.pan_l.start(macros.map_or(&empty, |m| &m.pan_l));
        self.pan_r.start(macros.map_or(&empty, |m| &m.pan_r));
        self.phase_reset.start(macros.map_or(&empty, |m| &m.phase_reset));

        self.released = false;
        self.ins = ins;
    }

    /// Advance every macro by one tick
    pub fn next(&mut self) {
        let macros = self.ins.as_deref().map(|i| &i.macros);
        let released = self.released;

        self.vol.step(macros.map(|m| &m.vol), released);
        self.duty.step(macros.map(|m| &m.duty), released);
        self.arp.step(macros.map(|m| &m.arp), released);
        self.wave.step(macros.map(|m| &m.wave), released);
        self.pitch.step(macros.map(|m| &m.pitch), released);
        self.pan_l.step(macros.map(|m| &m.pan_l), released);
        self.pan_r.step(macros.map(|m| &m.pan_r), released);
        self.phase_reset.step(macros.map(|m| &m.phase_reset), released);
    }

    /// Let sequences move past their release points
    pub fn release(&mut self) {
        self.released = true;
    }

    /// Whether the note has been released
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Instrument currently driving the macros
    pub fn instrument(&self) -> Option<&Arc<Instrument>> {
        self.ins.as_ref()
    }

    /// Drop `ins` if it is the instrument in use
    pub fn notify_ins_deletion(&mut self, ins: &Arc<Instrument>) {
        if self.ins.as_ref().is_some_and(|cur| Arc::ptr_eq(cur, ins)) {
            self.init(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument_with(f: impl FnOnce(&mut Instrument)) -> Arc<Instrument> {
        let mut ins = Instrument::new("test");
        f(&mut ins);
        Arc::new(ins)
    }

    #[test]
    fn test_sequence_plays_once_then_finishes() {
        let ins = instrument_with(|i| i.macros.vol = MacroSequence::new(vec![15, 10]));
        let mut state = MacroState::new();
        state.init(Some(ins));

        state.next();
        assert!(state.vol.had);
        assert_eq!(state.vol.val, 15);

        state.next();
        assert!(state.vol.had);
        assert_eq!(state.vol.val, 10);
        assert!(!state.vol.has);

        state.next();
        assert!(!state.vol.had);
        assert!(state.vol.finished);

        state.next();
        assert!(!state.vol.finished);
    }

    #[test]
    fn test_loop_point_wraps() {
        let ins = instrument_with(|i| {
            i.macros.arp = MacroSequence::new(vec![0, 4, 7]).with_loop(1);
        });
        let mut state = MacroState::new();
        state.init(Some(ins));

        let vals: Vec<i32> = (0..6)
            .map(|_| {
                state.next();
                state.arp.val
            })
            .collect();
        assert_eq!(vals, vec![0, 4, 7, 4, 7, 4]);
        assert!(state.arp.has);
    }

    #[test]
    fn test_release_point_holds_until_release() {
        let ins = instrument_with(|i| {
            i.macros.vol = MacroSequence::new(vec![15, 12, 8]).with_release(1);
        });
        let mut state = MacroState::new();
        state.init(Some(ins));

        for _ in 0..4 {
            state.next();
        }
        assert_eq!(state.vol.val, 12);
        assert!(state.vol.has);

        state.release();
        state.next();
        assert_eq!(state.vol.val, 12);
        state.next();
        assert_eq!(state.vol.val, 8);
        assert!(!state.vol.has);
    }

    #[test]
    fn test_init_none_stops_everything() {
        let ins = instrument_with(|i| i.macros.pitch = MacroSequence::new(vec![1, 2, 3]));
        let mut state = MacroState::new();
        state.init(Some(ins));
        state.next();
        state.init(None);
        state.next();
        assert!(!state.pitch.has);
        assert!(!state.pitch.had);
        assert!(state.instrument().is_none());
    }

    #[test]
    fn test_notify_deletion_only_matches_same_instrument() {
        let ins = instrument_with(|i| i.macros.vol = MacroSequence::new(vec![1]));
        let other = instrument_with(|_| {});
        let mut state = MacroState::new();
        state.init(Some(ins.clone()));

        state.notify_ins_deletion(&other);
        assert!(state.instrument().is_some());

        state.notify_ins_deletion(&ins);
        assert!(state.instrument().is_none());
        assert!(!state.vol.has);
    }
}
