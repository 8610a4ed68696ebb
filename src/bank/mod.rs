//! Banked ROM access
//!
//! Music data lives in switchable 16 KiB ROM banks. Code that reads it must
//! select the right bank, read, and hand the previous selection back to its
//! caller. [`BankedMemory`] exposes the bank stack primitives; [`BankGuard`]
//! scopes a push so the matching pop happens on every exit path.

pub mod rom;
pub mod track_table;

use std::fmt;
use std::ops::{Deref, DerefMut};

pub use rom::{Rom, BANK_SIZE, MAX_BANKS, SWITCHABLE_BASE};
pub use track_table::{TrackEntry, TrackTable};

/// ROM bank number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BankId(pub u8);

impl BankId {
    /// Bank number as an index into a bank list
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CPU address of a track's data inside the switchable window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TrackAddress(pub u16);

impl fmt::Display for TrackAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Bank-switched memory with a bank stack
///
/// The stack top is the bank the current code expects to see in the
/// switchable window. Reads through [`read_banked_u8`](Self::read_banked_u8)
/// (and anything a tracker engine does) may leave a different bank selected;
/// [`refresh_bank`](Self::refresh_bank) re-selects the stack top.
pub trait BankedMemory: Send {
    /// Bank currently selected in the switchable window
    fn active_bank(&self) -> BankId;

    /// Read a byte through the current mapping
    fn read_u8(&self, addr: u16) -> u8;

    /// Read a little-endian word through the current mapping
    fn read_u16(&self, addr: u16) -> u16 {
        let low = self.read_u8(addr);
        let high = self.read_u8(addr.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Select `bank` and read a byte from it
    ///
    /// The selection is left in place; the stack is not touched.
    fn read_banked_u8(&mut self, bank: BankId, addr: u16) -> u8;

    /// Push `bank` onto the stack and select it
    fn push_bank(&mut self, bank: BankId);

    /// Drop the stack top and select the bank beneath it
    fn pop_bank(&mut self);

    /// Re-select the stack top
    fn refresh_bank(&mut self);
}

/// Scoped bank selection
///
/// Pushes a bank when created and pops it when dropped. Guards nest through
/// `DerefMut`, and inner guards are dropped first, so the pops mirror the
/// pushes.
///
/// # Example
///
/// ```
/// use dmg_sound::{BankGuard, BankId, BankedMemory, Rom};
///
/// let mut rom = Rom::new(4).unwrap();
/// let home = rom.active_bank();
/// {
///     let mut caller = BankGuard::push(&mut rom, BankId(2));
///     let data = BankGuard::push(&mut *caller, BankId(3));
///     assert_eq!(data.active_bank(), BankId(3));
/// }
/// assert_eq!(rom.active_bank(), home);
/// ```
pub struct BankGuard<'a, M: BankedMemory + ?Sized> {
    memory: &'a mut M,
}

impl<'a, M: BankedMemory + ?Sized> BankGuard<'a, M> {
    /// Push `bank` and return the guard that will pop it
    pub fn push(memory: &'a mut M, bank: BankId) -> Self {
        memory.push_bank(bank);
        BankGuard { memory }
    }
}

impl<M: BankedMemory + ?Sized> Deref for BankGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.memory
    }
}

impl<M: BankedMemory + ?Sized> DerefMut for BankGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.memory
    }
}

impl<M: BankedMemory + ?Sized> Drop for BankGuard<'_, M> {
    fn drop(&mut self) {
        self.memory.pop_bank();
    }
}
