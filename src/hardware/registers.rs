//! DMG APU Register Definitions
//!
//! The sound unit is controlled through byte registers mapped at
//! 0xFF10-0xFF26, followed by 16 bytes of wave pattern RAM at 0xFF30-0xFF3F.

use std::fmt;

use bitflags::bitflags;

/// First address of the APU register window (NR10).
pub const APU_START: u16 = 0xFF10;
/// Last address of the APU register window (end of wave RAM).
pub const APU_END: u16 = 0xFF3F;
/// Start of the 16-byte wave pattern RAM.
pub const WAVE_RAM_START: u16 = 0xFF30;

/// NRx4 bit 7: restart the channel.
pub const TRIGGER: u8 = 0x80;
/// NRx4 bit 6: stop the channel when its length timer expires.
pub const LENGTH_ENABLE: u8 = 0x40;
/// NR50 value with both terminals at full volume.
pub const MASTER_VOLUME_MAX: u8 = 0x77;

/// APU Register Address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Channel 1 sweep - NR10
    Nr10 = 0xFF10,
    /// Channel 1 duty and length - NR11
    Nr11 = 0xFF11,
    /// Channel 1 volume envelope - NR12
    Nr12 = 0xFF12,
    /// Channel 1 period low - NR13
    Nr13 = 0xFF13,
    /// Channel 1 period high and control - NR14
    Nr14 = 0xFF14,
    /// Channel 2 duty and length - NR21
    Nr21 = 0xFF16,
    /// Channel 2 volume envelope - NR22
    Nr22 = 0xFF17,
    /// Channel 2 period low - NR23
    Nr23 = 0xFF18,
    /// Channel 2 period high and control - NR24
    Nr24 = 0xFF19,
    /// Channel 3 DAC enable - NR30
    Nr30 = 0xFF1A,
    /// Channel 3 length - NR31
    Nr31 = 0xFF1B,
    /// Channel 3 output level - NR32
    Nr32 = 0xFF1C,
    /// Channel 3 period low - NR33
    Nr33 = 0xFF1D,
    /// Channel 3 period high and control - NR34
    Nr34 = 0xFF1E,
    /// Channel 4 length - NR41
    Nr41 = 0xFF20,
    /// Channel 4 volume envelope - NR42
    Nr42 = 0xFF21,
    /// Channel 4 frequency and randomness - NR43
    Nr43 = 0xFF22,
    /// Channel 4 control - NR44
    Nr44 = 0xFF23,
    /// Master volume and VIN panning - NR50
    Nr50 = 0xFF24,
    /// Sound panning - NR51
    Nr51 = 0xFF25,
    /// Audio master control - NR52
    Nr52 = 0xFF26,
}

impl Register {
    /// Convert a CPU address to a Register, `None` for unused slots and wave RAM
    pub fn from_addr(addr: u16) -> Option<Self> {
        match addr {
            0xFF10 => Some(Register::Nr10),
            0xFF11 => Some(Register::Nr11),
            0xFF12 => Some(Register::Nr12),
            0xFF13 => Some(Register::Nr13),
            0xFF14 => Some(Register::Nr14),
            0xFF16 => Some(Register::Nr21),
            0xFF17 => Some(Register::Nr22),
            0xFF18 => Some(Register::Nr23),
            0xFF19 => Some(Register::Nr24),
            0xFF1A => Some(Register::Nr30),
            0xFF1B => Some(Register::Nr31),
            0xFF1C => Some(Register::Nr32),
            0xFF1D => Some(Register::Nr33),
            0xFF1E => Some(Register::Nr34),
            0xFF20 => Some(Register::Nr41),
            0xFF21 => Some(Register::Nr42),
            0xFF22 => Some(Register::Nr43),
            0xFF23 => Some(Register::Nr44),
            0xFF24 => Some(Register::Nr50),
            0xFF25 => Some(Register::Nr51),
            0xFF26 => Some(Register::Nr52),
            _ => None,
        }
    }

    /// Get the CPU address of the register
    pub fn addr(&self) -> u16 {
        *self as u16
    }

    /// The channel this register belongs to, `None` for the global NR5x registers
    pub fn channel(&self) -> Option<Channel> {
        Channel::for_addr(self.addr())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::Nr10 => "NR10 (Channel 1 Sweep)",
            Register::Nr11 => "NR11 (Channel 1 Duty/Length)",
            Register::Nr12 => "NR12 (Channel 1 Envelope)",
            Register::Nr13 => "NR13 (Channel 1 Period Low)",
            Register::Nr14 => "NR14 (Channel 1 Period High/Control)",
            Register::Nr21 => "NR21 (Channel 2 Duty/Length)",
            Register::Nr22 => "NR22 (Channel 2 Envelope)",
            Register::Nr23 => "NR23 (Channel 2 Period Low)",
            Register::Nr24 => "NR24 (Channel 2 Period High/Control)",
            Register::Nr30 => "NR30 (Channel 3 DAC Enable)",
            Register::Nr31 => "NR31 (Channel 3 Length)",
            Register::Nr32 => "NR32 (Channel 3 Output Level)",
            Register::Nr33 => "NR33 (Channel 3 Period Low)",
            Register::Nr34 => "NR34 (Channel 3 Period High/Control)",
            Register::Nr41 => "NR41 (Channel 4 Length)",
            Register::Nr42 => "NR42 (Channel 4 Envelope)",
            Register::Nr43 => "NR43 (Channel 4 Frequency/Randomness)",
            Register::Nr44 => "NR44 (Channel 4 Control)",
            Register::Nr50 => "NR50 (Master Volume)",
            Register::Nr51 => "NR51 (Sound Panning)",
            Register::Nr52 => "NR52 (Audio Master Control)",
        };
        write!(f, "{name}")
    }
}

/// One of the four APU voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Pulse with sweep (NR1x)
    Pulse1,
    /// Pulse (NR2x)
    Pulse2,
    /// Wave (NR3x and wave RAM)
    Wave,
    /// Noise (NR4x)
    Noise,
}

impl Channel {
    /// All channels in register order
    pub const ALL: [Channel; 4] = [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Wave,
        Channel::Noise,
    ];

    /// Channel owning the given APU address, `None` for NR5x and unmapped slots
    pub fn for_addr(addr: u16) -> Option<Self> {
        match addr {
            0xFF10..=0xFF14 => Some(Channel::Pulse1),
            0xFF16..=0xFF19 => Some(Channel::Pulse2),
            0xFF1A..=0xFF1E | WAVE_RAM_START..=APU_END => Some(Channel::Wave),
            0xFF20..=0xFF23 => Some(Channel::Noise),
            _ => None,
        }
    }

    /// Bit of this channel in a channel mask (channel 1 = bit 0)
    pub fn mask_bit(&self) -> u8 {
        match self {
            Channel::Pulse1 => 0x01,
            Channel::Pulse2 => 0x02,
            Channel::Wave => 0x04,
            Channel::Noise => 0x08,
        }
    }

    /// Register that silences the channel when written with zero
    ///
    /// For the wave channel this is the output level register.
    pub fn volume_register(&self) -> Register {
        match self {
            Channel::Pulse1 => Register::Nr12,
            Channel::Pulse2 => Register::Nr22,
            Channel::Wave => Register::Nr32,
            Channel::Noise => Register::Nr42,
        }
    }

    /// Both-terminal routing bits for this channel in NR51
    pub fn routing(&self) -> OutputRouting {
        match self {
            Channel::Pulse1 => OutputRouting::CH1_LEFT | OutputRouting::CH1_RIGHT,
            Channel::Pulse2 => OutputRouting::CH2_LEFT | OutputRouting::CH2_RIGHT,
            Channel::Wave => OutputRouting::CH3_LEFT | OutputRouting::CH3_RIGHT,
            Channel::Noise => OutputRouting::CH4_LEFT | OutputRouting::CH4_RIGHT,
        }
    }
}

bitflags! {
    /// Sound panning register (NR51) bitflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OutputRouting: u8 {
        /// Channel 1 to right terminal
        const CH1_RIGHT = 0x01;
        /// Channel 2 to right terminal
        const CH2_RIGHT = 0x02;
        /// Channel 3 to right terminal
        const CH3_RIGHT = 0x04;
        /// Channel 4 to right terminal
        const CH4_RIGHT = 0x08;
        /// Channel 1 to left terminal
        const CH1_LEFT = 0x10;
        /// Channel 2 to left terminal
        const CH2_LEFT = 0x20;
        /// Channel 3 to left terminal
        const CH3_LEFT = 0x40;
        /// Channel 4 to left terminal
        const CH4_LEFT = 0x80;
    }
}

bitflags! {
    /// Audio master control register (NR52) bitflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SoundControl: u8 {
        /// Channel 1 active (read-only on hardware)
        const CH1_ON = 0x01;
        /// Channel 2 active (read-only on hardware)
        const CH2_ON = 0x02;
        /// Channel 3 active (read-only on hardware)
        const CH3_ON = 0x04;
        /// Channel 4 active (read-only on hardware)
        const CH4_ON = 0x08;
        /// APU power
        const AUDIO_ON = 0x80;
    }
}

/// Volume envelope byte (NRx2): initial volume in the high nibble, decreasing
/// direction, sweep pace in the low three bits (0 holds the volume)
pub const fn envelope(initial_volume: u8, pace: u8) -> u8 {
    ((initial_volume & 0x0F) << 4) | (pace & 0x07)
}

/// Duty and length byte (NR11/NR21)
pub const fn duty_length(duty: u8, length: u8) -> u8 {
    ((duty & 0x03) << 6) | (length & 0x3F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_conversion() {
        assert_eq!(Register::from_addr(0xFF10), Some(Register::Nr10));
        assert_eq!(Register::from_addr(0xFF26), Some(Register::Nr52));
        assert_eq!(Register::from_addr(0xFF15), None); // unused NR20 slot
        assert_eq!(Register::from_addr(0xFF30), None); // wave RAM
        assert_eq!(Register::Nr43.addr(), 0xFF22);
    }

    #[test]
    fn test_channel_lookup() {
        assert_eq!(Register::Nr12.channel(), Some(Channel::Pulse1));
        assert_eq!(Register::Nr44.channel(), Some(Channel::Noise));
        assert_eq!(Register::Nr51.channel(), None);
        assert_eq!(Channel::for_addr(0xFF3F), Some(Channel::Wave));
    }

    #[test]
    fn test_envelope_bytes() {
        assert_eq!(envelope(0x0F, 0), 0xF0);
        assert_eq!(envelope(0x0F, 2), 0xF2);
        assert_eq!(duty_length(0, 1), 0x01);
    }

    #[test]
    fn test_routing_bits() {
        assert_eq!(Channel::Pulse1.routing().bits(), 0x11);
        assert_eq!(Channel::Noise.routing().bits(), 0x88);
    }
}
