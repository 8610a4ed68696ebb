//! Game Boy (DMG) sound driver
//!
//! A small driver layer for the DMG audio unit and banked background music.
//! It covers two jobs:
//!
//! - starting and stopping looped music tracks stored in banked ROM, delegating
//!   the per-frame sequencing to a [`TrackerEngine`]
//! - one-shot sound effects (tone, beep, crash) written straight to the APU
//!   registers, with a frame countdown that silences the tone
//!
//! # Crate feature flags
//! - `tracker` (default): the [`RegisterStreamEngine`] that replays pre-rendered
//!   register frames. Without it only [`SilentEngine`] is available.
//!
//! # Quick start
//! ```
//! use dmg_sound::{ApuRegisters, BankId, Rom, SilentEngine, SoundSystem, TrackEntry, TrackTable};
//!
//! let mut rom = Rom::new(4).unwrap();
//! let entries = [TrackEntry::new(BankId(3), 0x4000)];
//! let tracks = TrackTable::author(&mut rom, BankId(2), 0x4000, &entries).unwrap();
//!
//! let mut sound = SoundSystem::new(rom, ApuRegisters::new(), tracks, SilentEngine);
//! sound.play_track(0, true, BankId(1));
//! sound.play_tone(0x783, 10);
//! for _ in 0..10 {
//!     sound.update(); // once per frame
//! }
//! assert!(!sound.tone_active());
//! sound.stop_track(BankId(1));
//! ```

#![warn(missing_docs)]

pub mod bank; // Banked ROM, bank stack and track table
pub mod config; // Driver configuration
pub mod effects; // Direct tone/beep/crash driver
pub mod hardware; // APU register model
pub mod music; // Bank-switched music controller
pub mod system; // Audio-subsystem context
pub mod tracker; // Tracker engine capability

/// Error types for driver setup (configuration, ROM and track authoring).
///
/// The playback operations themselves never fail.
#[derive(thiserror::Error, Debug)]
pub enum SoundError {
    /// IO error from the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Bank number outside the ROM image
    #[error("bank {bank} out of range (ROM has {count} banks)")]
    BankOutOfRange {
        /// Requested bank.
        bank: BankId,
        /// Number of banks in the image.
        count: usize,
    },

    /// Address not reachable through the given bank
    #[error("address 0x{addr:04x} is not mapped by bank {bank}")]
    InvalidAddress {
        /// Bank the address was used with.
        bank: BankId,
        /// Offending CPU address.
        addr: u16,
    },

    /// Write would run past the end of a bank
    #[error("{len} bytes at 0x{addr:04x} overflow bank {bank}")]
    RomOverflow {
        /// Target bank.
        bank: BankId,
        /// Start address of the write.
        addr: u16,
        /// Length of the write.
        len: usize,
    },

    /// More tracks than the 8-bit index can address
    #[error("track table holds {0} entries, at most 255 are addressable")]
    TooManyTracks(usize),

    /// Address outside the APU register window
    #[error("0x{0:04x} is not an APU register")]
    InvalidRegister(u16),

    /// Register frame with more writes than the stream format allows
    #[error("register frame has {0} writes, at most 254 fit in one frame")]
    FrameTooLong(usize),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for SoundError {
    /// Converts a String into `SoundError::Other`.
    fn from(msg: String) -> Self {
        SoundError::Other(msg)
    }
}

impl From<&str> for SoundError {
    fn from(msg: &str) -> Self {
        SoundError::Other(msg.to_string())
    }
}

/// Result type for driver setup operations
pub type Result<T> = std::result::Result<T, SoundError>;

// Public API exports
pub use bank::{BankGuard, BankId, BankedMemory, Rom, TrackAddress, TrackEntry, TrackTable};
pub use config::{DriverConfig, EngineVariant};
pub use effects::EffectDriver;
pub use hardware::{ApuRegisters, Channel, OutputRouting, Register, SoundControl, SoundHardware};
pub use music::{MusicController, NO_TRACK, TRACKER_CHANNELS};
pub use system::{SharedSoundSystem, SoundSystem};
#[cfg(feature = "tracker")]
pub use tracker::stream::{encode_frames, RegisterFrame, RegisterStreamEngine};
pub use tracker::{SilentEngine, TrackerEngine};
