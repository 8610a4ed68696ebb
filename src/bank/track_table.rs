//! Music track table
//!
//! The table lives in one ROM bank as two parallel arrays:
//! - one byte per track naming the bank that holds the track data
//! - one little-endian pointer per track to the start of the track data
//!
//! The bank byte is fetched with a banked read; the pointer is read while the
//! table bank is pushed, since the tracker engine is started from there.

use super::{BankId, BankedMemory, Rom, TrackAddress};
use crate::music::NO_TRACK;
use crate::{Result, SoundError};

/// Location of one track in ROM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEntry {
    /// Bank holding the track data
    pub bank: BankId,
    /// Address of the track data inside that bank
    pub data: TrackAddress,
}

impl TrackEntry {
    /// Describe a track stored at `addr` in `bank`
    pub fn new(bank: BankId, addr: u16) -> Self {
        TrackEntry {
            bank,
            data: TrackAddress(addr),
        }
    }
}

/// Read-only index from track number to track location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackTable {
    bank: BankId,
    banks_addr: u16,
    tracks_addr: u16,
    len: u8,
}

impl TrackTable {
    /// Describe a table already present in a ROM image
    ///
    /// # Arguments
    ///
    /// * `bank` - Bank holding both arrays
    /// * `banks_addr` - Address of the per-track bank bytes
    /// * `tracks_addr` - Address of the per-track data pointers
    /// * `len` - Number of tracks
    pub fn new(bank: BankId, banks_addr: u16, tracks_addr: u16, len: u8) -> Self {
        TrackTable {
            bank,
            banks_addr,
            tracks_addr,
            len,
        }
    }

    /// Lay out a table for `entries` in `rom` at `base` and describe it
    ///
    /// The bank bytes come first, immediately followed by the pointers.
    /// Index 255 is reserved for "no track", so at most 255 entries fit.
    pub fn author(rom: &mut Rom, bank: BankId, base: u16, entries: &[TrackEntry]) -> Result<Self> {
        if entries.len() > NO_TRACK as usize {
            return Err(SoundError::TooManyTracks(entries.len()));
        }

        let bank_bytes: Vec<u8> = entries.iter().map(|e| e.bank.0).collect();
        let pointers: Vec<u8> = entries
            .iter()
            .flat_map(|e| e.data.0.to_le_bytes())
            .collect();

        let tracks_addr = base
            .checked_add(entries.len() as u16)
            .ok_or(SoundError::RomOverflow {
                bank,
                addr: base,
                len: bank_bytes.len() + pointers.len(),
            })?;
        rom.write(bank, base, &bank_bytes)?;
        rom.write(bank, tracks_addr, &pointers)?;

        log::debug!(
            "authored {} track entries in bank {bank} at 0x{base:04x}",
            entries.len()
        );
        Ok(Self::new(bank, base, tracks_addr, entries.len() as u8))
    }

    /// Bank holding the table
    pub fn bank(&self) -> BankId {
        self.bank
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Check if the table has no tracks
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if `index` names a track in the table
    pub fn contains(&self, index: u8) -> bool {
        index < self.len
    }

    /// Look up the bank holding track `index` with a banked read
    ///
    /// Leaves the table bank selected; callers refresh or pop afterwards.
    pub fn resolve_bank<M: BankedMemory + ?Sized>(&self, memory: &mut M, index: u8) -> BankId {
        let addr = self.banks_addr.wrapping_add(index as u16);
        BankId(memory.read_banked_u8(self.bank, addr))
    }

    /// Read the data pointer of track `index` through the current mapping
    ///
    /// The table bank must be selected.
    pub fn track_address<M: BankedMemory + ?Sized>(&self, memory: &M, index: u8) -> TrackAddress {
        let addr = self.tracks_addr.wrapping_add(2 * index as u16);
        TrackAddress(memory.read_u16(addr))
    }
}
