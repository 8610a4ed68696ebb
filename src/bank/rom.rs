//! Banked cartridge ROM
//!
//! Bank 0 is fixed at 0x0000-0x3FFF; the bank selected through the mapper is
//! visible at 0x4000-0x7FFF. Selecting bank 0 maps bank 1 into the window, as
//! MBC1 does. The bank stack lives next to the image so the
//! push/pop/refresh primitives and the mapper register stay consistent.

use std::path::Path;

use super::{BankId, BankedMemory};
use crate::{Result, SoundError};

/// Size of one ROM bank in bytes
pub const BANK_SIZE: usize = 0x4000;
/// First address of the switchable window
pub const SWITCHABLE_BASE: u16 = 0x4000;
/// Largest image an 8-bit bank number can address
pub const MAX_BANKS: usize = 256;

const SWITCHABLE_END: u16 = 0x7FFF;

/// Banked ROM image implementing [`BankedMemory`]
#[derive(Debug, Clone)]
pub struct Rom {
    banks: Vec<Box<[u8]>>,
    selected: BankId,
    stack: Vec<BankId>,
    // last out-of-range bank reported, so streams reading it do not warn per byte
    mirror_warned: Option<BankId>,
}

impl Rom {
    /// Create an image of `bank_count` banks filled with 0xFF
    ///
    /// Bank 1 starts selected and forms the base of the bank stack.
    pub fn new(bank_count: usize) -> Result<Self> {
        if !(2..=MAX_BANKS).contains(&bank_count) {
            return Err(SoundError::Other(format!(
                "ROM needs between 2 and {MAX_BANKS} banks, got {bank_count}"
            )));
        }
        let banks = (0..bank_count)
            .map(|_| vec![0xFF; BANK_SIZE].into_boxed_slice())
            .collect();
        Ok(Self::with_banks(banks))
    }

    /// Split a raw cartridge image into banks, padding the last one with 0xFF
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(SoundError::Other("empty ROM image".to_string()));
        }
        let bank_count = data.len().div_ceil(BANK_SIZE).max(2);
        if bank_count > MAX_BANKS {
            return Err(SoundError::Other(format!(
                "ROM image of {} bytes needs {bank_count} banks, at most {MAX_BANKS} are addressable",
                data.len()
            )));
        }

        let mut banks: Vec<Box<[u8]>> = Vec::with_capacity(bank_count);
        for i in 0..bank_count {
            let mut bank = vec![0xFF; BANK_SIZE];
            let start = (i * BANK_SIZE).min(data.len());
            let end = ((i + 1) * BANK_SIZE).min(data.len());
            bank[..end - start].copy_from_slice(&data[start..end]);
            banks.push(bank.into_boxed_slice());
        }
        Ok(Self::with_banks(banks))
    }

    /// Load a cartridge image from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        log::debug!(
            "loaded {} byte ROM image from {}",
            data.len(),
            path.as_ref().display()
        );
        Self::from_bytes(&data)
    }

    fn with_banks(banks: Vec<Box<[u8]>>) -> Self {
        Rom {
            banks,
            selected: BankId(1),
            stack: vec![BankId(1)],
            mirror_warned: None,
        }
    }

    /// Number of banks in the image
    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Number of entries on the bank stack, including the base entry
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Copy `bytes` into `bank` starting at CPU address `addr`
    ///
    /// Bank 0 is written through 0x0000-0x3FFF, every other bank through the
    /// switchable window.
    pub fn write(&mut self, bank: BankId, addr: u16, bytes: &[u8]) -> Result<()> {
        let count = self.banks.len();
        let data = self
            .banks
            .get_mut(bank.index())
            .ok_or(SoundError::BankOutOfRange { bank, count })?;

        let window = if bank.index() == 0 {
            0..SWITCHABLE_BASE
        } else {
            SWITCHABLE_BASE..SWITCHABLE_END + 1
        };
        if !window.contains(&addr) {
            return Err(SoundError::InvalidAddress { bank, addr });
        }

        let offset = (addr - window.start) as usize;
        if offset + bytes.len() > BANK_SIZE {
            return Err(SoundError::RomOverflow {
                bank,
                addr,
                len: bytes.len(),
            });
        }
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Bank the mapper actually selects for `bank`
    ///
    /// Like MBC1, a request for bank 0 selects bank 1; the window never shows
    /// bank 0. The mapper ignores bank bits the image does not have.
    fn mapped(&self, bank: BankId) -> BankId {
        let requested = bank.index().max(1);
        BankId((requested % self.banks.len()) as u8)
    }

    fn select(&mut self, bank: BankId) {
        let mapped = self.mapped(bank);
        if bank.index() != 0 && mapped != bank && self.mirror_warned != Some(bank) {
            log::warn!(
                "bank {bank} selected on a {} bank ROM, mirrors bank {mapped}",
                self.banks.len()
            );
            self.mirror_warned = Some(bank);
        }
        self.selected = mapped;
    }

    fn top(&self) -> BankId {
        self.stack.last().copied().unwrap_or(BankId(1))
    }
}

impl BankedMemory for Rom {
    fn active_bank(&self) -> BankId {
        self.selected
    }

    fn read_u8(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => self.banks[0][addr as usize],
            SWITCHABLE_BASE..=SWITCHABLE_END => {
                self.banks[self.selected.index()][(addr - SWITCHABLE_BASE) as usize]
            }
            _ => 0xFF,
        }
    }

    fn read_banked_u8(&mut self, bank: BankId, addr: u16) -> u8 {
        self.select(bank);
        self.read_u8(addr)
    }

    fn push_bank(&mut self, bank: BankId) {
        self.stack.push(bank);
        self.select(bank);
    }

    fn pop_bank(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            log::warn!("bank stack underflow, keeping base bank {}", self.top());
        }
        self.select(self.top());
    }

    fn refresh_bank(&mut self) {
        self.select(self.top());
    }
}
