//! Tone parameters and 16-bit PCM synthesis.

use std::f64::consts::TAU;
use std::time::Duration;

use crate::constants::{MAX_PULSE, MAX_SAMPLE_RATE_HZ, PCM_FULL_SCALE, Preset};
use crate::sink::Pulse;
use crate::symbols::BitSymbol;

/// Pitch, sample rate and rhythm for one playback run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub sample_rate_hz: u32,
    pub dot: Duration,
    pub dash: Duration,
    pub gap: Duration,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Preset::default().tone_spec()
    }
}

impl ToneSpec {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.sample_rate_hz > 0, "sample_rate must be > 0");
        anyhow::ensure!(
            self.sample_rate_hz <= MAX_SAMPLE_RATE_HZ,
            "sample_rate must be <= {MAX_SAMPLE_RATE_HZ} Hz"
        );
        anyhow::ensure!(
            self.frequency_hz.is_finite() && self.frequency_hz > 0.0,
            "frequency must be > 0"
        );
        anyhow::ensure!(
            self.frequency_hz < (self.sample_rate_hz as f32) / 2.0,
            "frequency {} Hz is at or above Nyquist for {} Hz",
            self.frequency_hz,
            self.sample_rate_hz
        );
        anyhow::ensure!(!self.dot.is_zero(), "dot duration must be > 0");
        anyhow::ensure!(!self.dash.is_zero(), "dash duration must be > 0");
        for (what, d) in [("dot", self.dot), ("dash", self.dash), ("gap", self.gap)] {
            anyhow::ensure!(
                d <= MAX_PULSE,
                "{what} duration must be <= {}s",
                MAX_PULSE.as_secs()
            );
        }
        Ok(())
    }

    /// Length of `pulse` under this spec.
    #[must_use]
    pub fn pulse_duration(&self, pulse: Pulse) -> Duration {
        match pulse {
            Pulse::Tone(sym) => sym.duration(self),
            Pulse::Gap => self.gap,
        }
    }
}

/// Number of samples covering `duration` (truncated).
#[must_use]
pub fn sample_count(sample_rate_hz: u32, duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate_hz)) as usize
}

/// Full-scale sine burst.
///
/// `sample[i] = round(sin(2*pi*f*i/sr) * 32767)`.
#[must_use]
pub fn synthesize_tone(frequency_hz: f32, sample_rate_hz: u32, duration: Duration) -> Vec<i16> {
    let n = sample_count(sample_rate_hz, duration);
    let step = TAU * f64::from(frequency_hz) / f64::from(sample_rate_hz);
    (0..n)
        .map(|i| ((i as f64 * step).sin() * f64::from(PCM_FULL_SCALE)).round() as i16)
        .collect()
}

#[must_use]
pub fn silence(sample_rate_hz: u32, duration: Duration) -> Vec<i16> {
    vec![0; sample_count(sample_rate_hz, duration)]
}

/// Little-endian s16 bytes.
#[must_use]
pub fn pcm_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Dot, dash and gap buffers, synthesized once per run.
#[derive(Debug, Clone)]
pub struct ToneBank {
    sample_rate_hz: u32,
    dot: Vec<i16>,
    dash: Vec<i16>,
    gap: Vec<i16>,
}

impl ToneBank {
    #[must_use]
    pub fn new(spec: &ToneSpec) -> Self {
        let sr = spec.sample_rate_hz;
        Self {
            sample_rate_hz: sr,
            dot: synthesize_tone(spec.frequency_hz, sr, spec.dot),
            dash: synthesize_tone(spec.frequency_hz, sr, spec.dash),
            gap: silence(sr, spec.gap),
        }
    }

    #[must_use]
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    #[must_use]
    pub fn buffer(&self, pulse: Pulse) -> &[i16] {
        match pulse {
            Pulse::Tone(BitSymbol::Dot) => &self.dot,
            Pulse::Tone(BitSymbol::Dash) => &self.dash,
            Pulse::Gap => &self.gap,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ToneBank, ToneSpec, pcm_le_bytes, sample_count, silence, synthesize_tone};
    use crate::sink::Pulse;
    use crate::symbols::BitSymbol;

    #[test]
    fn tone_length_follows_duration() {
        assert_eq!(sample_count(44_100, Duration::from_millis(80)), 3528);
        assert_eq!(synthesize_tone(800.0, 44_100, Duration::from_millis(80)).len(), 3528);
        assert_eq!(silence(8_000, Duration::from_millis(2)).len(), 16);
        assert!(synthesize_tone(800.0, 44_100, Duration::ZERO).is_empty());
    }

    #[test]
    fn tone_samples_follow_rounded_sine() {
        // f = sr/4 visits 0, +peak, 0, -peak.
        let tone = synthesize_tone(2_000.0, 8_000, Duration::from_millis(1));
        assert_eq!(&tone[..4], &[0, 32767, 0, -32767]);

        let tone = synthesize_tone(800.0, 44_100, Duration::from_millis(10));
        let step = std::f64::consts::TAU * 800.0 / 44_100.0;
        let expect = ((7.0 * step).sin() * 32767.0).round();
        assert_eq!(f64::from(tone[7]), expect);
        assert!(tone.iter().all(|&s| s != i16::MIN));
    }

    #[test]
    fn bank_reuses_buffers_per_pulse() {
        let spec = ToneSpec::default();
        let bank = ToneBank::new(&spec);
        let a = bank.buffer(Pulse::Tone(BitSymbol::Dash)).as_ptr();
        let b = bank.buffer(Pulse::Tone(BitSymbol::Dash)).as_ptr();
        assert_eq!(a, b);
        assert_eq!(
            bank.buffer(Pulse::Tone(BitSymbol::Dash)).len(),
            3 * bank.buffer(Pulse::Tone(BitSymbol::Dot)).len()
        );
        assert!(bank.buffer(Pulse::Gap).iter().all(|&s| s == 0));
    }

    #[test]
    fn validate_rejects_bad_specs() {
        let ok = ToneSpec::default();
        assert!(ok.validate().is_ok());
        assert!(ToneSpec { sample_rate_hz: 0, ..ok }.validate().is_err());
        assert!(ToneSpec { frequency_hz: 0.0, ..ok }.validate().is_err());
        assert!(ToneSpec { frequency_hz: 30_000.0, ..ok }.validate().is_err());
        assert!(ToneSpec { dot: Duration::ZERO, ..ok }.validate().is_err());
        assert!(ToneSpec { gap: Duration::ZERO, ..ok }.validate().is_ok());
        assert!(ToneSpec { sample_rate_hz: 384_001, ..ok }.validate().is_err());
        assert!(ToneSpec { dash: Duration::from_secs(60), ..ok }.validate().is_ok());
        let huge = Duration::from_millis(u64::MAX);
        assert!(ToneSpec { dot: huge, ..ok }.validate().is_err());
        assert!(ToneSpec { dash: huge, ..ok }.validate().is_err());
        assert!(ToneSpec { gap: Duration::from_secs(61), ..ok }.validate().is_err());
    }

    #[test]
    fn pcm_bytes_are_little_endian() {
        assert_eq!(pcm_le_bytes(&[1, -2]), vec![0x01, 0x00, 0xFE, 0xFF]);
    }
}
