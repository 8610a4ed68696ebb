//! Bank-switched music controller
//!
//! Remembers which track is playing and brackets every tracker engine call
//! with the bank switches the engine needs:
//!
//! 1. look up the track's bank in the track table (banked read)
//! 2. push the caller's bank
//! 3. push the table bank, read the track pointer, start the engine
//! 4. pop both, leaving the caller's bank selected
//!
//! The pushes are [`BankGuard`]s, so the pops also happen when the engine is
//! the [`SilentEngine`](crate::SilentEngine) stub.

use crate::bank::{BankGuard, BankId, BankedMemory, TrackTable};
use crate::hardware::SoundHardware;
use crate::tracker::TrackerEngine;

/// Track index meaning "no track playing"
pub const NO_TRACK: u8 = 255;

/// Channel mask handed to the engine: music on channels 1-3, channel 4 left to
/// the effect driver
pub const TRACKER_CHANNELS: u8 = 0x07;

/// Music controller state machine
///
/// `Idle` (index [`NO_TRACK`]) moves to `Playing(i)` on [`play`](Self::play);
/// playing the same index again is ignored; [`stop`](Self::stop) returns to
/// `Idle` from any state.
#[derive(Debug, Clone)]
pub struct MusicController<E> {
    engine: E,
    current_index: u8,
    channels: u8,
}

impl<E: TrackerEngine> MusicController<E> {
    /// Create an idle controller driving `engine` on [`TRACKER_CHANNELS`]
    pub fn new(engine: E) -> Self {
        Self::with_channels(engine, TRACKER_CHANNELS)
    }

    /// Create an idle controller with a custom engine channel mask
    pub fn with_channels(engine: E, channels: u8) -> Self {
        MusicController {
            engine,
            current_index: NO_TRACK,
            channels,
        }
    }

    /// Index of the active track, `None` when idle
    pub fn current_track(&self) -> Option<u8> {
        (self.current_index != NO_TRACK).then_some(self.current_index)
    }

    /// Check if a track is active
    pub fn is_playing(&self) -> bool {
        self.current_index != NO_TRACK
    }

    /// Channel mask passed to the engine on start
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// The tracker engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the tracker engine
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Start track `index`
    ///
    /// Does nothing if `index` is already the active track. `index` must name
    /// an entry of `tracks`; other values read whatever the ROM holds.
    ///
    /// # Arguments
    ///
    /// * `memory` - Banked memory holding the table and the track data
    /// * `tracks` - Track table to resolve `index` in
    /// * `index` - Track number
    /// * `looped` - Restart the track when it ends
    /// * `caller_bank` - Bank the calling code runs from; selected again on return
    pub fn play<M: BankedMemory>(
        &mut self,
        memory: &mut M,
        tracks: &TrackTable,
        index: u8,
        looped: bool,
        caller_bank: BankId,
    ) {
        if index == self.current_index {
            log::trace!("track {index} already playing");
            return;
        }
        if !tracks.contains(index) {
            log::warn!("track {index} is outside the {} entry track table", tracks.len());
        }
        debug_assert!(
            index == NO_TRACK || tracks.contains(index),
            "track index {index} out of range"
        );

        self.current_index = index;
        let music_bank = tracks.resolve_bank(memory, index);

        let mut caller = BankGuard::push(memory, caller_bank);
        let table = BankGuard::push(&mut *caller, tracks.bank());
        let track = tracks.track_address(&*table, index);
        log::debug!("playing track {index} ({track} in bank {music_bank}), loop {looped}");

        self.engine.start(track, music_bank, self.channels);
        self.engine.set_loop(looped);
    }

    /// Halt the engine and return to idle
    ///
    /// Safe to call when nothing is playing.
    pub fn stop<M: BankedMemory, H: SoundHardware>(
        &mut self,
        memory: &mut M,
        hw: &mut H,
        caller_bank: BankId,
    ) {
        let _caller = BankGuard::push(memory, caller_bank);
        if let Some(index) = self.current_track() {
            log::debug!("stopping track {index}");
        }
        self.engine.stop(hw);
        self.current_index = NO_TRACK;
    }

    /// Advance the engine one frame and re-select the bank stack top
    pub fn update<M: BankedMemory, H: SoundHardware>(&mut self, memory: &mut M, hw: &mut H) {
        self.engine.tick(memory, hw);
        memory.refresh_bank();
    }
}
