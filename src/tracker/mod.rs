//! Tracker engine capability
//!
//! The music controller only orchestrates; the per-frame sequencing of track
//! data into register writes belongs to a [`TrackerEngine`]. Two engines ship
//! with the crate:
//!
//! - [`stream::RegisterStreamEngine`] (feature `tracker`) replays pre-rendered
//!   register frames from banked ROM
//! - [`SilentEngine`] accepts every call and produces no sound, for builds or
//!   configurations without music playback

#[cfg(feature = "tracker")]
pub mod stream;

use crate::bank::{BankId, BankedMemory, TrackAddress};
use crate::hardware::SoundHardware;

/// Object-safe interface of a tracker engine
///
/// The controller calls `start`/`set_loop` with the track table's bank
/// pushed, `stop` with the caller's bank pushed, and `tick` once per frame.
/// Engines may select any bank while ticking; the controller refreshes the
/// bank stack top afterwards.
pub trait TrackerEngine: Send {
    /// Begin playing the track at `track` in `bank`
    ///
    /// `channels` is a channel mask (bit 0 = channel 1) the engine may write.
    /// Looping is off until [`set_loop`](Self::set_loop) says otherwise.
    fn start(&mut self, track: TrackAddress, bank: BankId, channels: u8);

    /// Restart the track at its end instead of halting
    fn set_loop(&mut self, enabled: bool);

    /// Halt playback
    fn stop(&mut self, hw: &mut dyn SoundHardware);

    /// Advance playback by one frame
    fn tick(&mut self, memory: &mut dyn BankedMemory, hw: &mut dyn SoundHardware);

    /// Check if the engine is producing music
    fn is_playing(&self) -> bool {
        false
    }
}

impl<E: TrackerEngine + ?Sized> TrackerEngine for Box<E> {
    fn start(&mut self, track: TrackAddress, bank: BankId, channels: u8) {
        (**self).start(track, bank, channels);
    }

    fn set_loop(&mut self, enabled: bool) {
        (**self).set_loop(enabled);
    }

    fn stop(&mut self, hw: &mut dyn SoundHardware) {
        (**self).stop(hw);
    }

    fn tick(&mut self, memory: &mut dyn BankedMemory, hw: &mut dyn SoundHardware) {
        (**self).tick(memory, hw);
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}

/// Engine that ignores every call
///
/// Stands in where the platform has no tracker. The controller still performs
/// its full bank push/pop sequence around the calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SilentEngine;

impl TrackerEngine for SilentEngine {
    fn start(&mut self, _track: TrackAddress, _bank: BankId, _channels: u8) {}

    fn set_loop(&mut self, _enabled: bool) {}

    fn stop(&mut self, _hw: &mut dyn SoundHardware) {}

    fn tick(&mut self, _memory: &mut dyn BankedMemory, _hw: &mut dyn SoundHardware) {}
}
