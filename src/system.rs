//! Audio-subsystem context
//!
//! [`SoundSystem`] owns everything the seven driver entry points touch: the
//! banked memory, the APU registers, the track table, the music controller and
//! the effect driver. The frame scheduler calls [`SoundSystem::update`] once per
//! frame; game code calls the play/stop methods between frames.
//!
//! Hosts that run the scheduler on another thread than the game logic can use
//! [`SharedSoundSystem`], which serializes the calls behind a mutex so each one
//! still runs to completion before the next starts.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::bank::{BankId, BankedMemory, TrackTable};
use crate::config::DriverConfig;
use crate::effects::EffectDriver;
use crate::hardware::SoundHardware;
use crate::music::MusicController;
use crate::tracker::TrackerEngine;
use crate::Result;

/// Sound driver context
///
/// # Example
///
/// ```
/// use dmg_sound::{ApuRegisters, BankId, Register, Rom, SilentEngine, SoundHardware, SoundSystem, TrackTable};
///
/// let rom = Rom::new(4).unwrap();
/// let tracks = TrackTable::new(BankId(2), 0x4000, 0x4000, 0);
/// let mut sound = SoundSystem::new(rom, ApuRegisters::new(), tracks, SilentEngine);
///
/// sound.play_beep(2);
/// assert_eq!(sound.hardware().read_register(Register::Nr43), 0x2A);
/// ```
#[derive(Debug)]
pub struct SoundSystem<M, H, E> {
    memory: M,
    hardware: H,
    tracks: TrackTable,
    music: MusicController<E>,
    effects: EffectDriver,
}

impl<M: BankedMemory, H: SoundHardware, E: TrackerEngine> SoundSystem<M, H, E> {
    /// Create an idle sound system
    pub fn new(memory: M, hardware: H, tracks: TrackTable, engine: E) -> Self {
        Self::with_controller(memory, hardware, tracks, MusicController::new(engine))
    }

    /// Create an idle sound system around an existing controller
    pub fn with_controller(
        memory: M,
        hardware: H,
        tracks: TrackTable,
        music: MusicController<E>,
    ) -> Self {
        SoundSystem {
            memory,
            hardware,
            tracks,
            music,
            effects: EffectDriver::new(),
        }
    }

    /// Start music track `index`, unless it is already playing
    ///
    /// `caller_bank` is selected again when the call returns.
    pub fn play_track(&mut self, index: u8, looped: bool, caller_bank: BankId) {
        self.music
            .play(&mut self.memory, &self.tracks, index, looped, caller_bank);
    }

    /// Stop the music
    pub fn stop_track(&mut self, caller_bank: BankId) {
        self.music
            .stop(&mut self.memory, &mut self.hardware, caller_bank);
    }

    /// Per-frame update: tracker tick, bank refresh, then the tone countdown
    ///
    /// The countdown runs last so a silencing write to NR12 lands after
    /// anything the tracker wrote this frame.
    pub fn update(&mut self) {
        self.music.update(&mut self.memory, &mut self.hardware);
        self.effects.tick(&mut self.hardware);
    }

    /// Start a tone on channel 1 for `frames` updates (0 = until stopped)
    pub fn play_tone(&mut self, frequency: u16, frames: u8) {
        self.effects.play_tone(&mut self.hardware, frequency, frames);
    }

    /// Silence the tone now
    pub fn stop_tone(&mut self) {
        self.effects.stop_tone(&mut self.hardware);
    }

    /// Fire a beep on channel 4
    pub fn play_beep(&mut self, pitch: u8) {
        self.effects.play_beep(&mut self.hardware, pitch);
    }

    /// Fire a crash on channel 4
    pub fn play_crash(&mut self) {
        self.effects.play_crash(&mut self.hardware);
    }

    /// Index of the active music track
    pub fn current_track(&self) -> Option<u8> {
        self.music.current_track()
    }

    /// Frames left on the tone countdown
    pub fn tone_frames(&self) -> u8 {
        self.effects.tone_frames()
    }

    /// Check if a tone countdown is running
    pub fn tone_active(&self) -> bool {
        self.effects.tone_active()
    }

    /// The banked memory
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// The APU registers
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Mutable access to the APU registers, for host-side writes
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// The track table
    pub fn tracks(&self) -> &TrackTable {
        &self.tracks
    }

    /// The tracker engine
    pub fn engine(&self) -> &E {
        self.music.engine()
    }

    /// Take the memory and hardware back out of the context
    pub fn into_parts(self) -> (M, H) {
        (self.memory, self.hardware)
    }

    /// Move the context behind a shareable lock
    pub fn into_shared(self) -> SharedSoundSystem<M, H, E> {
        SharedSoundSystem {
            inner: Arc::new(Mutex::new(self)),
        }
    }
}

impl<M: BankedMemory, H: SoundHardware> SoundSystem<M, H, Box<dyn TrackerEngine>> {
    /// Build a sound system whose engine and channel mask come from `config`
    pub fn from_config(
        config: &DriverConfig,
        memory: M,
        hardware: H,
        tracks: TrackTable,
    ) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "sound system with {:?} engine on channels 0x{:02x}",
            config.engine,
            config.tracker_channels
        );
        let music = MusicController::with_channels(config.build_engine(), config.tracker_channels);
        Ok(Self::with_controller(memory, hardware, tracks, music))
    }
}

/// Cloneable, lock-protected handle to a [`SoundSystem`]
///
/// Each method locks for the duration of one driver call.
pub struct SharedSoundSystem<M, H, E> {
    inner: Arc<Mutex<SoundSystem<M, H, E>>>,
}

impl<M, H, E> Clone for SharedSoundSystem<M, H, E> {
    fn clone(&self) -> Self {
        SharedSoundSystem {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: BankedMemory, H: SoundHardware, E: TrackerEngine> SharedSoundSystem<M, H, E> {
    /// Lock the context for a sequence of calls
    pub fn lock(&self) -> MutexGuard<'_, SoundSystem<M, H, E>> {
        self.inner.lock()
    }

    /// See [`SoundSystem::play_track`]
    pub fn play_track(&self, index: u8, looped: bool, caller_bank: BankId) {
        self.inner.lock().play_track(index, looped, caller_bank);
    }

    /// See [`SoundSystem::stop_track`]
    pub fn stop_track(&self, caller_bank: BankId) {
        self.inner.lock().stop_track(caller_bank);
    }

    /// See [`SoundSystem::update`]
    pub fn update(&self) {
        self.inner.lock().update();
    }

    /// See [`SoundSystem::play_tone`]
    pub fn play_tone(&self, frequency: u16, frames: u8) {
        self.inner.lock().play_tone(frequency, frames);
    }

    /// See [`SoundSystem::stop_tone`]
    pub fn stop_tone(&self) {
        self.inner.lock().stop_tone();
    }

    /// See [`SoundSystem::play_beep`]
    pub fn play_beep(&self, pitch: u8) {
        self.inner.lock().play_beep(pitch);
    }

    /// See [`SoundSystem::play_crash`]
    pub fn play_crash(&self) {
        self.inner.lock().play_crash();
    }

    /// See [`SoundSystem::current_track`]
    pub fn current_track(&self) -> Option<u8> {
        self.inner.lock().current_track()
    }

    /// See [`SoundSystem::tone_frames`]
    pub fn tone_frames(&self) -> u8 {
        self.inner.lock().tone_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{Rom, TrackEntry};
    use crate::config::EngineVariant;
    use crate::hardware::{ApuRegisters, Register};
    use crate::tracker::SilentEngine;

    fn tracks_in(rom: &mut Rom) -> TrackTable {
        let entries = [
            TrackEntry::new(BankId(3), 0x4000),
            TrackEntry::new(BankId(3), 0x4800),
        ];
        TrackTable::author(rom, BankId(2), 0x4000, &entries).unwrap()
    }

    #[test]
    fn test_update_order_silences_after_music() {
        let mut rom = Rom::new(4).unwrap();
        let tracks = tracks_in(&mut rom);
        let mut sound = SoundSystem::new(rom, ApuRegisters::new(), tracks, SilentEngine);

        sound.play_tone(0x0500, 1);
        sound.update();
        assert_eq!(sound.hardware().read_register(Register::Nr12), 0);
        assert_eq!(sound.memory().active_bank(), BankId(1));
    }

    #[test]
    fn test_from_config() {
        let mut rom = Rom::new(4).unwrap();
        let tracks = tracks_in(&mut rom);
        let config = DriverConfig::default()
            .engine(EngineVariant::Silent)
            .tracker_channels(0x03);
        let mut sound = SoundSystem::from_config(&config, rom, ApuRegisters::new(), tracks).unwrap();

        sound.play_track(1, true, BankId(1));
        assert_eq!(sound.current_track(), Some(1));
        assert!(!sound.engine().is_playing());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut rom = Rom::new(4).unwrap();
        let tracks = tracks_in(&mut rom);
        let config = DriverConfig::default().frame_rate_hz(-1.0);
        assert!(SoundSystem::from_config(&config, rom, ApuRegisters::new(), tracks).is_err());
    }

    #[test]
    fn test_shared_handle_across_threads() {
        let mut rom = Rom::new(4).unwrap();
        let tracks = tracks_in(&mut rom);
        let shared = SoundSystem::new(rom, ApuRegisters::new(), tracks, SilentEngine).into_shared();

        shared.play_tone(0x0600, 30);
        let ticker = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for _ in 0..30 {
                    shared.update();
                }
            })
        };
        shared.play_track(0, true, BankId(1));
        ticker.join().unwrap();

        assert_eq!(shared.tone_frames(), 0);
        assert_eq!(shared.current_track(), Some(0));
        let sound = shared.lock();
        assert_eq!(sound.hardware().read_register(Register::Nr12), 0);
        assert_eq!(sound.memory().active_bank(), BankId(1));
    }

    #[cfg(not(feature = "tracker"))]
    #[test]
    fn test_fallback_engine_restores_caller_bank() {
        let mut rom = Rom::new(4).unwrap();
        let tracks = tracks_in(&mut rom);
        rom.push_bank(BankId(3));
        let depth = rom.stack_depth();
        let config = DriverConfig::default().engine(EngineVariant::RegisterStream);
        let mut sound = SoundSystem::from_config(&config, rom, ApuRegisters::new(), tracks).unwrap();

        sound.play_track(1, true, BankId(3));
        assert_eq!(sound.memory().active_bank(), BankId(3));
        sound.update();
        assert_eq!(sound.memory().active_bank(), BankId(3));
        sound.stop_track(BankId(3));

        assert!(!sound.engine().is_playing());
        assert_eq!(sound.current_track(), None);
        assert_eq!(sound.memory().active_bank(), BankId(3));
        assert_eq!(sound.memory().stack_depth(), depth);
    }
}
