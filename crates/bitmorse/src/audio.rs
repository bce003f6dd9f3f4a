//! Audio utilities.
//!
//! - mono f32/i16 conversion
//! - linear resampling (tone bank rate to device rate)
//! - canonical mono 16-bit WAV writer and its reader
//! - PCM queue shared with the output callback

use std::collections::VecDeque;

use thiserror::Error;

use crate::tone::pcm_le_bytes;

/// Linearly resample `input` from `src_hz` to `dst_hz`.
#[must_use]
pub fn resample_linear_mono_f32(input: &[f32], src_hz: u32, dst_hz: u32) -> Vec<f32> {
    if src_hz == dst_hz || input.is_empty() || src_hz == 0 {
        return input.to_vec();
    }

    let new_n = (input.len() as u64) * u64::from(dst_hz) / u64::from(src_hz);
    let mut out = vec![0.0f32; new_n as usize];

    for (i, y) in out.iter_mut().enumerate() {
        let src_pos = (i as f64) * f64::from(src_hz) / f64::from(dst_hz);
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;

        let a = input.get(idx).copied().unwrap_or(0.0);
        let b = input.get(idx + 1).copied().unwrap_or(a);
        *y = a * (1.0 - frac) + b * frac;
    }

    out
}

#[must_use]
pub fn i16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| f32::from(s) / 32768.0).collect()
}

const WAV_HEADER_LEN: usize = 44;

#[derive(Debug, Clone)]
pub struct WavData {
    pub sample_rate_hz: u32,
    pub samples: Vec<i16>,
}

#[derive(Debug, Error)]
pub enum WavError {
    #[error("WAV shorter than its 44-byte header")]
    Truncated,
    #[error("header field `{0}` differs from mono 16-bit PCM")]
    Header(&'static str),
}

fn wav_header(sample_rate_hz: u32, data_size: u32) -> [u8; WAV_HEADER_LEN] {
    let mut h = [0u8; WAV_HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&36u32.wrapping_add(data_size).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&16u32.to_le_bytes());
    h[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    h[22..24].copy_from_slice(&1u16.to_le_bytes()); // mono
    h[24..28].copy_from_slice(&sample_rate_hz.to_le_bytes());
    h[28..32].copy_from_slice(&sample_rate_hz.wrapping_mul(2).to_le_bytes()); // byte rate
    h[32..34].copy_from_slice(&2u16.to_le_bytes()); // block align
    h[34..36].copy_from_slice(&16u16.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_size.to_le_bytes());
    h
}

/// Canonical 44-byte header + PCM data, mono s16le.
#[must_use]
pub fn encode_wav_mono_s16(samples: &[i16], sample_rate_hz: u32) -> Vec<u8> {
    let data = pcm_le_bytes(samples);
    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data.len());
    wav.extend_from_slice(&wav_header(sample_rate_hz, data.len() as u32));
    wav.extend_from_slice(&data);
    wav
}

/// Inverse of [`encode_wav_mono_s16`]: accepts only the header it writes.
pub fn decode_wav_mono_s16(bytes: &[u8]) -> Result<WavData, WavError> {
    let (header, data) = bytes
        .split_at_checked(WAV_HEADER_LEN)
        .ok_or(WavError::Truncated)?;
    let sample_rate_hz = u32::from_le_bytes([header[24], header[25], header[26], header[27]]);
    let expected = wav_header(sample_rate_hz, data.len() as u32);

    const FIELDS: [(&str, std::ops::Range<usize>); 5] = [
        ("RIFF", 0..12),
        ("fmt", 12..24),
        ("byte rate", 28..36),
        ("data", 36..40),
        ("data size", 40..44),
    ];
    for (name, range) in FIELDS {
        if header[range.clone()] != expected[range] {
            return Err(WavError::Header(name));
        }
    }

    let samples = data
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();
    Ok(WavData {
        sample_rate_hz,
        samples,
    })
}

/// FIFO of mono samples fed by the caller and drained by the device callback.
///
/// An empty queue yields silence so the stream never starves.
#[derive(Debug, Default)]
pub struct PcmQueue {
    buf: VecDeque<f32>,
    underruns: u64,
}

impl PcmQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Frames the callback asked for while the queue was empty.
    #[must_use]
    pub fn underruns(&self) -> u64 {
        self.underruns
    }

    pub fn push(&mut self, samples: &[f32]) {
        self.buf.extend(samples.iter().copied());
    }

    pub fn next_sample(&mut self) -> f32 {
        match self.buf.pop_front() {
            Some(s) => s,
            None => {
                self.underruns += 1;
                0.0
            }
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_linear_identity() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = resample_linear_mono_f32(&x, 44_100, 44_100);
        assert_eq!(x, y);
    }

    #[test]
    fn resample_linear_length() {
        let x = vec![0.0f32; 44_100];
        let y = resample_linear_mono_f32(&x, 44_100, 48_000);
        assert_eq!(y.len(), 48_000);
        let y = resample_linear_mono_f32(&x[..3528], 44_100, 16_000);
        assert_eq!(y.len(), 1280); // floor(3528*16000/44100)
    }

    #[test]
    fn resample_interpolates_midpoints() {
        let y = resample_linear_mono_f32(&[0.0, 1.0], 1, 2);
        assert_eq!(y, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn wav_round_trip_keeps_samples() {
        let samples = [0i16, 32767, -32767, 12];
        let wav = encode_wav_mono_s16(&samples, 8_000);
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[36..40], b"data");

        let decoded = decode_wav_mono_s16(&wav).expect("decode wav");
        assert_eq!(decoded.sample_rate_hz, 8_000);
        assert_eq!(decoded.samples, samples);
    }

    #[test]
    fn wav_rejects_other_layouts() {
        assert!(matches!(
            decode_wav_mono_s16(b"not a wav"),
            Err(WavError::Truncated)
        ));

        let mut stereo = encode_wav_mono_s16(&[1, 2], 8_000);
        stereo[22] = 2;
        assert!(matches!(
            decode_wav_mono_s16(&stereo),
            Err(WavError::Header("fmt"))
        ));

        let mut cut = encode_wav_mono_s16(&[1, 2], 8_000);
        cut.pop();
        assert!(matches!(
            decode_wav_mono_s16(&cut),
            Err(WavError::Header("RIFF"))
        ));
    }

    #[test]
    fn queue_drains_in_order_then_underruns() {
        let mut q = PcmQueue::new();
        q.push(&[0.25, -0.5]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.next_sample(), 0.25);
        assert_eq!(q.next_sample(), -0.5);
        assert_eq!(q.next_sample(), 0.0);
        assert!(q.is_empty());
        assert_eq!(q.underruns(), 1);
    }
}
