//! Driver configuration
//!
//! Selects the tracker engine variant and the few tunables the driver has.
//! Configurations are plain JSON documents:
//!
//! ```json
//! { "engine": "silent", "tracker_channels": 7, "frame_rate_hz": 59.7275 }
//! ```
//!
//! Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::music::TRACKER_CHANNELS;
use crate::tracker::{SilentEngine, TrackerEngine};
use crate::{Result, SoundError};

/// DMG frame rate (4194304 Hz / 70224 cycles per frame).
pub const DMG_FRAME_RATE_HZ: f64 = 59.7275;

/// Tracker engine implementation to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineVariant {
    /// Replay pre-rendered register streams (needs the `tracker` feature)
    RegisterStream,
    /// No music output
    Silent,
}

impl Default for EngineVariant {
    fn default() -> Self {
        if cfg!(feature = "tracker") {
            EngineVariant::RegisterStream
        } else {
            EngineVariant::Silent
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Tracker engine to build
    pub engine: EngineVariant,
    /// Channel mask the tracker engine may write (bit 0 = channel 1)
    pub tracker_channels: u8,
    /// Rate at which the host calls `update`, in Hz
    pub frame_rate_hz: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            engine: EngineVariant::default(),
            tracker_channels: TRACKER_CHANNELS,
            frame_rate_hz: DMG_FRAME_RATE_HZ,
        }
    }
}

impl DriverConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(text: &str) -> Result<Self> {
        let config: DriverConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading driver configuration from {}", path.as_ref().display());
        Self::from_json(&text)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.tracker_channels > 0x0F {
            return Err(SoundError::Config(format!(
                "tracker_channels 0x{:02x} names channels beyond 4",
                self.tracker_channels
            )));
        }
        if !self.frame_rate_hz.is_finite() || self.frame_rate_hz <= 0.0 {
            return Err(SoundError::Config(format!(
                "frame_rate_hz must be positive, got {}",
                self.frame_rate_hz
            )));
        }
        Ok(())
    }

    /// Set the engine variant
    pub fn engine(mut self, engine: EngineVariant) -> Self {
        self.engine = engine;
        self
    }

    /// Set the tracker channel mask
    pub fn tracker_channels(mut self, channels: u8) -> Self {
        self.tracker_channels = channels;
        self
    }

    /// Set the update rate
    pub fn frame_rate_hz(mut self, hz: f64) -> Self {
        self.frame_rate_hz = hz;
        self
    }

    /// Duration of one update in seconds
    pub fn frame_period_secs(&self) -> f64 {
        1.0 / self.frame_rate_hz
    }

    /// Tone countdown for a duration in seconds, rounded and clamped to 1..=255
    ///
    /// Non-positive durations give 0, the "never auto-silence" countdown.
    pub fn frames_for_secs(&self, secs: f64) -> u8 {
        if secs.is_nan() || secs <= 0.0 {
            return 0;
        }
        (secs * self.frame_rate_hz).round().clamp(1.0, u8::MAX as f64) as u8
    }

    /// Build the configured tracker engine
    ///
    /// A `register_stream` request falls back to [`SilentEngine`] when the
    /// crate is built without the `tracker` feature.
    pub fn build_engine(&self) -> Box<dyn TrackerEngine> {
        match self.engine {
            #[cfg(feature = "tracker")]
            EngineVariant::RegisterStream => {
                Box::new(crate::tracker::stream::RegisterStreamEngine::new())
            }
            #[cfg(not(feature = "tracker"))]
            EngineVariant::RegisterStream => {
                log::warn!("built without the `tracker` feature, music is silent");
                Box::new(SilentEngine)
            }
            EngineVariant::Silent => Box::new(SilentEngine),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.tracker_channels, 0x07);
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.frame_period_secs(), 0.016_742_7, epsilon = 1e-6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DriverConfig::from_json(r#"{ "engine": "silent" }"#).unwrap();
        assert_eq!(config.engine, EngineVariant::Silent);
        assert_eq!(config.tracker_channels, TRACKER_CHANNELS);
        assert_relative_eq!(config.frame_rate_hz, DMG_FRAME_RATE_HZ);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DriverConfig::from_json(r#"{ "tracker_channels": 31 }"#),
            Err(SoundError::Config(_))
        ));
        assert!(matches!(
            DriverConfig::from_json(r#"{ "frame_rate_hz": 0.0 }"#),
            Err(SoundError::Config(_))
        ));
        assert!(matches!(
            DriverConfig::from_json(r#"{ "engine": "opl3" }"#),
            Err(SoundError::Json(_))
        ));
    }

    #[test]
    fn test_json_survives_reload() {
        let config = DriverConfig::default()
            .engine(EngineVariant::Silent)
            .tracker_channels(0x03)
            .frame_rate_hz(60.0);
        let text = config.to_json().unwrap();
        assert_eq!(DriverConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn test_frames_for_secs() {
        let config = DriverConfig::default().frame_rate_hz(60.0);
        assert_eq!(config.frames_for_secs(0.5), 30);
        assert_eq!(config.frames_for_secs(0.001), 1);
        assert_eq!(config.frames_for_secs(60.0), 255);
        assert_eq!(config.frames_for_secs(0.0), 0);
        assert_eq!(config.frames_for_secs(f64::NAN), 0);
    }

    #[test]
    fn test_build_engine() {
        let engine = DriverConfig::default()
            .engine(EngineVariant::Silent)
            .build_engine();
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            DriverConfig::load("/nonexistent/dmg-sound.json"),
            Err(SoundError::Io(_))
        ));
    }

    #[cfg(not(feature = "tracker"))]
    #[test]
    fn test_register_stream_falls_back_to_silent() {
        assert_eq!(EngineVariant::default(), EngineVariant::Silent);

        let config = DriverConfig::from_json(r#"{ "engine": "register_stream" }"#).unwrap();
        let mut engine = config.build_engine();
        engine.start(crate::bank::TrackAddress(0x4000), crate::bank::BankId(3), 0x07);
        engine.set_loop(true);
        assert!(!engine.is_playing());
    }
}
