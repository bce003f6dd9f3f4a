use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Pulse, SinkError, ToneSink};
use crate::audio::encode_wav_mono_s16;
use crate::tone::{ToneBank, ToneSpec};

/// Renders the performance into a mono 16-bit WAV file instead of playing it.
///
/// Samples accumulate in memory; the file is written on `close`. Call
/// [`WavFileSink::finish`] afterwards to learn whether the write succeeded.
#[derive(Debug)]
pub struct WavFileSink {
    path: PathBuf,
    bank: Option<ToneBank>,
    samples: Vec<i16>,
    outcome: Option<std::io::Result<()>>,
}

impl WavFileSink {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            bank: None,
            samples: Vec::new(),
            outcome: None,
        }
    }

    /// Result of the write performed by `close`.
    pub fn finish(self) -> Result<PathBuf, SinkError> {
        match self.outcome {
            Some(Ok(())) => Ok(self.path),
            Some(Err(e)) => Err(SinkError::Io(e)),
            None => Err(SinkError::NotOpen),
        }
    }
}

impl ToneSink for WavFileSink {
    fn open(&mut self, spec: &ToneSpec) -> Result<(), SinkError> {
        self.bank = Some(ToneBank::new(spec));
        self.samples.clear();
        self.outcome = None;
        Ok(())
    }

    fn emit(&mut self, pulse: Pulse, _duration: Duration) -> Result<(), SinkError> {
        let bank = self.bank.as_ref().ok_or(SinkError::NotOpen)?;
        self.samples.extend_from_slice(bank.buffer(pulse));
        Ok(())
    }

    fn close(&mut self) {
        let Some(bank) = self.bank.take() else {
            return;
        };
        let wav = encode_wav_mono_s16(&self.samples, bank.sample_rate_hz());
        let outcome = std::fs::write(&self.path, wav);
        match &outcome {
            Ok(()) => tracing::info!(
                path = %self.path.display(),
                samples = self.samples.len(),
                "wrote wav"
            ),
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "wav write failed"),
        }
        self.samples = Vec::new();
        self.outcome = Some(outcome);
    }

    fn name(&self) -> &'static str {
        "wav"
    }
}
