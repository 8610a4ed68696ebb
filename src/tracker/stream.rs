//! Register stream tracker engine
//!
//! Plays tracks that were rendered ahead of time into per-frame APU register
//! writes. A stream is a sequence of frames:
//!
//! ```text
//! count  (offset value) * count      one frame, count in 0..=254
//! 0xFF                               end of stream
//! ```
//!
//! `offset` is relative to NR10 (0xFF10), so 0x00-0x2F cover the registers and
//! wave RAM. A frame with count 0 is a rest. At the end marker the engine
//! either restarts the stream (looping) or halts.
//!
//! Writes to channels outside the engine's channel mask are dropped. NR51 is
//! merged so only the routing bits of owned channels change, and NR52 writes
//! that would power the APU off are dropped. NR50 is written as is.

use super::TrackerEngine;
use crate::bank::{BankId, BankedMemory, TrackAddress};
use crate::hardware::{
    Channel, OutputRouting, Register, SoundControl, SoundHardware, APU_END, APU_START,
};
use crate::{Result, SoundError};

/// Marker byte that ends a stream
pub const END_OF_STREAM: u8 = 0xFF;

const MAX_FRAME_WRITES: usize = END_OF_STREAM as usize - 1;
const WINDOW_END: u16 = 0x7FFF;

/// Register writes for one frame, as (APU address, value) pairs
pub type RegisterFrame = Vec<(u16, u8)>;

/// Encode frames into the stream layout read by [`RegisterStreamEngine`]
///
/// # Example
///
/// ```
/// use dmg_sound::{encode_frames, Register};
///
/// let data = encode_frames(&[
///     vec![(Register::Nr12.addr(), 0xF0), (Register::Nr14.addr(), 0x87)],
///     vec![],
/// ])
/// .unwrap();
/// assert_eq!(data, [2, 0x02, 0xF0, 0x04, 0x87, 0, 0xFF]);
/// ```
pub fn encode_frames(frames: &[RegisterFrame]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(frames.iter().map(|f| 1 + 2 * f.len()).sum::<usize>() + 1);
    for frame in frames {
        if frame.len() > MAX_FRAME_WRITES {
            return Err(SoundError::FrameTooLong(frame.len()));
        }
        out.push(frame.len() as u8);
        for &(addr, value) in frame {
            if !(APU_START..=APU_END).contains(&addr) {
                return Err(SoundError::InvalidRegister(addr));
            }
            out.push((addr - APU_START) as u8);
            out.push(value);
        }
    }
    out.push(END_OF_STREAM);
    Ok(out)
}

/// Tracker engine replaying register streams from banked ROM
#[derive(Debug, Clone, Default)]
pub struct RegisterStreamEngine {
    track: TrackAddress,
    bank: BankId,
    position: u16,
    channels: u8,
    looping: bool,
    playing: bool,
    frames_played: u64,
}

impl RegisterStreamEngine {
    /// Create an idle engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the engine was last started with
    pub fn track(&self) -> TrackAddress {
        self.track
    }

    /// Bank holding the current track
    pub fn bank(&self) -> BankId {
        self.bank
    }

    /// Check if the stream restarts at its end
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Frames played since the last start
    pub fn frames_played(&self) -> u64 {
        self.frames_played
    }

    fn next_byte(&mut self, memory: &mut dyn BankedMemory) -> Option<u8> {
        if self.position > WINDOW_END {
            return None;
        }
        let byte = memory.read_banked_u8(self.bank, self.position);
        self.position += 1;
        Some(byte)
    }

    fn owns(&self, addr: u16) -> bool {
        Channel::for_addr(addr).map_or(true, |ch| self.channels & ch.mask_bit() != 0)
    }

    fn owned_routing(&self) -> OutputRouting {
        Channel::ALL
            .iter()
            .filter(|ch| self.channels & ch.mask_bit() != 0)
            .fold(OutputRouting::empty(), |acc, ch| acc | ch.routing())
    }

    /// Write one stream byte, keeping registers of other channels intact
    fn apply(&self, hw: &mut dyn SoundHardware, addr: u16, value: u8) {
        match Register::from_addr(addr) {
            Some(Register::Nr51) => {
                let owned = self.owned_routing().bits();
                let merged = (hw.read(addr) & !owned) | (value & owned);
                hw.write(addr, merged);
            }
            Some(Register::Nr52) if value & SoundControl::AUDIO_ON.bits() == 0 => {
                log::trace!("register stream {} power-off write dropped", self.track);
            }
            _ if self.owns(addr) => hw.write(addr, value),
            _ => {}
        }
    }

    fn halt(&mut self, reason: &str) {
        log::debug!("register stream {} halted: {reason}", self.track);
        self.playing = false;
    }

    /// Read the frame header, wrapping to the start when looping
    fn frame_len(&mut self, memory: &mut dyn BankedMemory) -> Option<u8> {
        match self.next_byte(memory)? {
            END_OF_STREAM if self.looping => {
                self.position = self.track.0;
                match self.next_byte(memory)? {
                    END_OF_STREAM => None,
                    count => Some(count),
                }
            }
            END_OF_STREAM => None,
            count => Some(count),
        }
    }
}

impl TrackerEngine for RegisterStreamEngine {
    fn start(&mut self, track: TrackAddress, bank: BankId, channels: u8) {
        log::debug!("register stream {track} in bank {bank} started, channels 0x{channels:02x}");
        self.track = track;
        self.bank = bank;
        self.position = track.0;
        self.channels = channels;
        self.looping = false;
        self.playing = true;
        self.frames_played = 0;
    }

    fn set_loop(&mut self, enabled: bool) {
        self.looping = enabled;
    }

    fn stop(&mut self, hw: &mut dyn SoundHardware) {
        self.playing = false;
        for ch in Channel::ALL {
            if self.channels & ch.mask_bit() != 0 {
                hw.write_register(ch.volume_register(), 0);
            }
        }
    }

    fn tick(&mut self, memory: &mut dyn BankedMemory, hw: &mut dyn SoundHardware) {
        if !self.playing {
            return;
        }

        let Some(count) = self.frame_len(memory) else {
            self.halt("end of stream");
            return;
        };

        for _ in 0..count {
            let (Some(offset), Some(value)) = (self.next_byte(memory), self.next_byte(memory))
            else {
                log::warn!("register stream {} runs past bank {}", self.track, self.bank);
                self.halt("ran off the end of the bank");
                return;
            };

            let addr = APU_START + offset as u16;
            if addr > APU_END {
                log::warn!("register stream {} writes non-APU offset 0x{offset:02x}", self.track);
                continue;
            }
            self.apply(hw, addr, value);
        }

        self.frames_played += 1;
        log::trace!("register stream {} frame {}", self.track, self.frames_played);
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
