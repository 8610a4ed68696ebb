//! APU hardware access
//!
//! [`SoundHardware`] is the seam between the driver and whatever actually owns
//! the sound registers: a memory-mapped IO shim on hardware, an emulator core,
//! or the plain [`ApuRegisters`] file used by hosts and tests.

pub mod registers;

pub use registers::{
    Channel, OutputRouting, Register, SoundControl, APU_END, APU_START, WAVE_RAM_START,
};

/// Byte-addressed access to the APU register window (0xFF10-0xFF3F)
///
/// # Example
///
/// ```
/// use dmg_sound::{ApuRegisters, Register, SoundHardware};
///
/// fn power_on<H: SoundHardware>(hw: &mut H) {
///     hw.write_register(Register::Nr52, 0x80);
///     hw.write_register(Register::Nr50, 0x77);
/// }
///
/// let mut hw = ApuRegisters::new();
/// power_on(&mut hw);
/// assert_eq!(hw.read_register(Register::Nr50), 0x77);
/// ```
pub trait SoundHardware: Send {
    /// Write a byte to an APU address
    ///
    /// Addresses outside the APU window are ignored.
    fn write(&mut self, addr: u16, value: u8);

    /// Read a byte from an APU address, 0xFF outside the window
    fn read(&self, addr: u16) -> u8;

    /// Write a named register
    fn write_register(&mut self, reg: Register, value: u8) {
        self.write(reg.addr(), value);
    }

    /// Read a named register
    fn read_register(&self, reg: Register) -> u8 {
        self.read(reg.addr())
    }

    /// Read-modify-write that sets `bits` in a register
    fn set_bits(&mut self, reg: Register, bits: u8) {
        let value = self.read_register(reg) | bits;
        self.write_register(reg, value);
    }
}

const WINDOW_LEN: usize = (APU_END - APU_START + 1) as usize;

/// Plain APU register file
///
/// Stores every byte written to the window and reads it back unchanged. It does
/// not emulate the write-only bits or the NR52 power-off clear of real
/// hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApuRegisters {
    regs: [u8; WINDOW_LEN],
}

impl ApuRegisters {
    /// Create a register file with every byte cleared
    pub fn new() -> Self {
        ApuRegisters {
            regs: [0; WINDOW_LEN],
        }
    }

    /// All 48 bytes of the window, NR10 first
    pub fn as_slice(&self) -> &[u8] {
        &self.regs
    }

    fn offset(addr: u16) -> Option<usize> {
        if (APU_START..=APU_END).contains(&addr) {
            Some((addr - APU_START) as usize)
        } else {
            None
        }
    }
}

impl Default for ApuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundHardware for ApuRegisters {
    fn write(&mut self, addr: u16, value: u8) {
        match Self::offset(addr) {
            Some(offset) => {
                log::trace!("APU 0x{addr:04x} <- 0x{value:02x}");
                self.regs[offset] = value;
            }
            None => log::warn!("ignoring write of 0x{value:02x} to non-APU address 0x{addr:04x}"),
        }
    }

    fn read(&self, addr: u16) -> u8 {
        Self::offset(addr).map_or(0xFF, |offset| self.regs[offset])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_file() {
        let mut hw = ApuRegisters::new();
        assert_eq!(hw.read_register(Register::Nr12), 0);

        hw.write_register(Register::Nr12, 0xF0);
        assert_eq!(hw.read_register(Register::Nr12), 0xF0);
        assert_eq!(hw.as_slice()[2], 0xF0);
    }

    #[test]
    fn test_out_of_window_access() {
        let mut hw = ApuRegisters::new();
        hw.write(0xFF40, 0x91);
        assert_eq!(hw.read(0xFF40), 0xFF);
        assert!(hw.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_set_bits_preserves_existing_routing() {
        let mut hw = ApuRegisters::new();
        hw.write_register(Register::Nr51, 0x22);
        hw.set_bits(Register::Nr51, 0x11);
        assert_eq!(hw.read_register(Register::Nr51), 0x33);
    }

    #[test]
    fn test_wave_ram_is_addressable() {
        let mut hw = ApuRegisters::new();
        hw.write(WAVE_RAM_START + 15, 0xAB);
        assert_eq!(hw.read(APU_END), 0xAB);
    }
}
