//! Player preferences
//!
//! Never persisted: a page load starts from defaults, optionally overridden by
//! the URL query string (`?muted=1&music=0&haptics=0`).

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Silence everything
    pub muted: bool,
    /// Background music on at start
    pub music: bool,

    // === Feedback ===
    /// Vibrate on tap where the device supports it
    pub haptics: bool,

    // === Accessibility ===
    /// Fewer particles, no fireworks burst
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
            music: false,
            haptics: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Defaults overlaid with recognised `key=value` pairs from a query string.
    /// Unknown keys and unparsable values are skipped.
    pub fn from_query(query: &str) -> Self {
        let mut settings = Self::default();
        for pair in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, "1"));
            if !settings.apply(key, value) {
                log::debug!("Ignoring setting {key}={value}");
            }
        }
        settings
    }

    /// Apply one setting; returns false if the key or value is not understood
    fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "volume" => parse_volume(value).map(|v| self.master_volume = v).is_some(),
            "sfx" => parse_volume(value).map(|v| self.sfx_volume = v).is_some(),
            "music_volume" => parse_volume(value).map(|v| self.music_volume = v).is_some(),
            "muted" => parse_flag(value).map(|v| self.muted = v).is_some(),
            "music" => parse_flag(value).map(|v| self.music = v).is_some(),
            "haptics" => parse_flag(value).map(|v| self.haptics = v).is_some(),
            "reduced_motion" => parse_flag(value).map(|v| self.reduced_motion = v).is_some(),
            _ => false,
        }
    }

    /// Ripple particle count after accessibility settings
    pub fn ripple_particles(&self, base: u32) -> u32 {
        if self.reduced_motion { base / 2 } else { base }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn parse_volume(value: &str) -> Option<f32> {
    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_is_default() {
        assert_eq!(Settings::from_query(""), Settings::default());
        assert_eq!(Settings::from_query("?"), Settings::default());
    }

    #[test]
    fn test_query_overrides() {
        let s = Settings::from_query("?muted=1&music=on&haptics=false&volume=0.5&sfx=7");
        assert!(s.muted);
        assert!(s.music);
        assert!(!s.haptics);
        assert_eq!(s.master_volume, 0.5);
        assert_eq!(s.sfx_volume, 1.0);
    }

    #[test]
    fn test_bare_key_and_junk() {
        let s = Settings::from_query("reduced_motion&color=red&volume=loud");
        assert!(s.reduced_motion);
        assert_eq!(s.master_volume, 0.8);
        assert_eq!(s.ripple_particles(8), 4);
    }
}
