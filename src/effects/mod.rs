//! Direct sound-effect driver
//!
//! Writes fixed register patterns straight to the APU:
//!
//! - tone: continuous square wave on channel 1, silenced after a frame countdown
//! - beep: short noise burst on channel 4, length timed by the hardware
//! - crash: longer decaying noise burst on channel 4
//!
//! Every effect powers the APU on, sets full master volume and routes its
//! channel to both terminals, leaving other channels' routing untouched.

use crate::hardware::registers::{duty_length, envelope, LENGTH_ENABLE, MASTER_VOLUME_MAX, TRIGGER};
use crate::hardware::{Channel, Register, SoundControl, SoundHardware};

/// Tone and noise effect driver
///
/// The only state is the tone countdown: frames left before the tone is
/// silenced, 0 when no countdown is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectDriver {
    tone_frames: u8,
}

impl EffectDriver {
    /// Create a driver with no countdown running
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames left before the tone is silenced
    pub fn tone_frames(&self) -> u8 {
        self.tone_frames
    }

    /// Check if a tone countdown is running
    pub fn tone_active(&self) -> bool {
        self.tone_frames != 0
    }

    /// Start a tone on channel 1
    ///
    /// # Arguments
    ///
    /// * `hw` - APU registers
    /// * `frequency` - 11-bit period value; higher bits are ignored
    /// * `frames` - Frames until [`tick`](Self::tick) silences the tone. 0 keeps
    ///   the tone playing until [`stop_tone`](Self::stop_tone).
    pub fn play_tone<H: SoundHardware + ?Sized>(&mut self, hw: &mut H, frequency: u16, frames: u8) {
        log::debug!("tone 0x{:03x} for {frames} frames", frequency & 0x07FF);
        self.tone_frames = frames;

        hw.write_register(Register::Nr52, SoundControl::AUDIO_ON.bits());

        hw.write_register(Register::Nr10, 0x00);
        hw.write_register(Register::Nr11, duty_length(0, 1));
        hw.write_register(Register::Nr12, envelope(0x0F, 0));
        hw.write_register(Register::Nr13, (frequency & 0x00FF) as u8);
        hw.write_register(Register::Nr14, TRIGGER | ((frequency & 0x0700) >> 8) as u8);

        hw.write_register(Register::Nr50, MASTER_VOLUME_MAX);
        hw.set_bits(Register::Nr51, Channel::Pulse1.routing().bits());
    }

    /// Silence channel 1 now and cancel the countdown
    pub fn stop_tone<H: SoundHardware + ?Sized>(&mut self, hw: &mut H) {
        self.tone_frames = 0;
        hw.write_register(Register::Nr12, 0x00);
    }

    /// Fire a short noise burst on channel 4
    ///
    /// `pitch` is OR-ed into the NR43 divisor bits; 0-7 select the divisor.
    pub fn play_beep<H: SoundHardware + ?Sized>(&mut self, hw: &mut H, pitch: u8) {
        log::debug!("beep, pitch {pitch}");
        hw.write_register(Register::Nr52, SoundControl::AUDIO_ON.bits());

        hw.write_register(Register::Nr41, 0x01);
        hw.write_register(Register::Nr42, envelope(0x0F, 0));
        // clock shift 2, 7-bit LFSR
        hw.write_register(Register::Nr43, 0x20 | 0x08 | pitch);
        hw.write_register(Register::Nr44, TRIGGER | LENGTH_ENABLE);

        hw.write_register(Register::Nr50, MASTER_VOLUME_MAX);
        hw.set_bits(Register::Nr51, Channel::Noise.routing().bits());
    }

    /// Fire a decaying crash on channel 4
    pub fn play_crash<H: SoundHardware + ?Sized>(&mut self, hw: &mut H) {
        log::debug!("crash");
        hw.write_register(Register::Nr52, SoundControl::AUDIO_ON.bits());

        hw.write_register(Register::Nr41, 0x01);
        hw.write_register(Register::Nr42, envelope(0x0F, 2));
        // clock shift 1, 15-bit LFSR, divisor 3
        hw.write_register(Register::Nr43, 0x13);
        hw.write_register(Register::Nr44, TRIGGER);

        hw.write_register(Register::Nr50, MASTER_VOLUME_MAX);
        hw.set_bits(Register::Nr51, Channel::Noise.routing().bits());
    }

    /// Count down one frame, silencing the tone when the count reaches zero
    pub fn tick<H: SoundHardware + ?Sized>(&mut self, hw: &mut H) {
        if self.tone_frames != 0 {
            self.tone_frames -= 1;
            if self.tone_frames == 0 {
                log::trace!("tone countdown expired");
                self.stop_tone(hw);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::ApuRegisters;

    #[test]
    fn test_tone_register_pattern() {
        let mut hw = ApuRegisters::new();
        let mut fx = EffectDriver::new();
        fx.play_tone(&mut hw, 0x0783, 4);

        assert_eq!(hw.read_register(Register::Nr52), 0x80);
        assert_eq!(hw.read_register(Register::Nr10), 0x00);
        assert_eq!(hw.read_register(Register::Nr11), 0x01);
        assert_eq!(hw.read_register(Register::Nr12), 0xF0);
        assert_eq!(hw.read_register(Register::Nr13), 0x83);
        assert_eq!(hw.read_register(Register::Nr14), 0x87);
        assert_eq!(hw.read_register(Register::Nr50), 0x77);
        assert_eq!(hw.read_register(Register::Nr51), 0x11);
        assert_eq!(fx.tone_frames(), 4);
    }

    #[test]
    fn test_tone_frequency_is_11_bit() {
        let mut hw = ApuRegisters::new();
        let mut fx = EffectDriver::new();
        fx.play_tone(&mut hw, 0xFFFF, 1);

        assert_eq!(hw.read_register(Register::Nr13), 0xFF);
        assert_eq!(hw.read_register(Register::Nr14), 0x87);
    }

    #[test]
    fn test_beep_register_pattern() {
        let mut hw = ApuRegisters::new();
        hw.write_register(Register::Nr51, 0x11);
        let mut fx = EffectDriver::new();
        fx.play_beep(&mut hw, 3);

        assert_eq!(hw.read_register(Register::Nr41), 0x01);
        assert_eq!(hw.read_register(Register::Nr42), 0xF0);
        assert_eq!(hw.read_register(Register::Nr43), 0x2B);
        assert_eq!(hw.read_register(Register::Nr44), 0xC0);
        assert_eq!(hw.read_register(Register::Nr51), 0x99);
        assert!(!fx.tone_active());
    }

    #[test]
    fn test_crash_register_pattern() {
        let mut hw = ApuRegisters::new();
        let mut fx = EffectDriver::new();
        fx.play_crash(&mut hw);

        assert_eq!(hw.read_register(Register::Nr52), 0x80);
        assert_eq!(hw.read_register(Register::Nr42), 0xF2);
        assert_eq!(hw.read_register(Register::Nr43), 0x13);
        assert_eq!(hw.read_register(Register::Nr44), 0x80);
        assert_eq!(hw.read_register(Register::Nr51), 0x88);
    }

    #[test]
    fn test_countdown_silences_tone() {
        let mut hw = ApuRegisters::new();
        let mut fx = EffectDriver::new();
        fx.play_tone(&mut hw, 0x0700, 2);

        fx.tick(&mut hw);
        assert_eq!(hw.read_register(Register::Nr12), 0xF0);
        fx.tick(&mut hw);
        assert_eq!(hw.read_register(Register::Nr12), 0x00);
        assert!(!fx.tone_active());
    }

    #[test]
    fn test_stop_tone_clears_countdown() {
        let mut hw = ApuRegisters::new();
        let mut fx = EffectDriver::new();
        fx.play_tone(&mut hw, 0x0700, 10);
        fx.stop_tone(&mut hw);

        assert_eq!(fx.tone_frames(), 0);
        // a later write to NR12 is not clobbered by a stale countdown
        hw.write_register(Register::Nr12, 0xA0);
        for _ in 0..10 {
            fx.tick(&mut hw);
        }
        assert_eq!(hw.read_register(Register::Nr12), 0xA0);
    }
}
