//! Playback defaults and presets.

use std::time::Duration;

use crate::tone::ToneSpec;

// Tone shared by every preset.
pub const DEFAULT_FREQUENCY_HZ: f32 = 800.0;
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;

// 16-bit signed PCM peak.
pub const PCM_FULL_SCALE: f32 = 32_767.0;

pub const BITS_PER_BYTE: usize = 8;

// Upper bounds accepted by `ToneSpec::validate`.
pub const MAX_SAMPLE_RATE_HZ: u32 = 384_000;
pub const MAX_PULSE: Duration = Duration::from_secs(60);

/// Bytes read from the start of the file when no limit is given.
pub const DEFAULT_MAX_BYTES: usize = 50;

/// Width of the bit preview printed before playback.
pub const PREVIEW_BITS: usize = 64;

/// Named timing profiles.
///
/// `Classic` is slow enough to follow by ear; `Rapid` trades legibility for
/// covering a much larger prefix of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Classic,
    Rapid,
}

impl Preset {
    #[must_use]
    pub fn tone_spec(self) -> ToneSpec {
        let (dot, dash, gap) = match self {
            Self::Classic => (80, 240, 50),
            Self::Rapid => (5, 15, 2),
        };
        ToneSpec {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            dot: Duration::from_millis(dot),
            dash: Duration::from_millis(dash),
            gap: Duration::from_millis(gap),
        }
    }

    /// Default cap on the number of symbols played.
    #[must_use]
    pub fn max_symbols(self) -> usize {
        match self {
            Self::Classic => 200,
            Self::Rapid => 20_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Preset;

    #[test]
    fn presets_keep_dash_three_dots_long() {
        for preset in [Preset::Classic, Preset::Rapid] {
            let spec = preset.tone_spec();
            assert_eq!(spec.dash, spec.dot * 3, "{preset:?}");
            assert!(spec.validate().is_ok());
        }
    }

    #[test]
    fn classic_matches_slow_profile() {
        let spec = Preset::default().tone_spec();
        assert_eq!(spec.dot, Duration::from_millis(80));
        assert_eq!(spec.gap, Duration::from_millis(50));
        assert_eq!(Preset::Classic.max_symbols(), 200);
        assert_eq!(Preset::Rapid.max_symbols(), 20_000);
    }
}
