//! Tone sinks: where pulses end up.
//!
//! The sequencer only sees [`ToneSink`]; which variant backs it is decided
//! once by the caller.

use std::time::Duration;

use thiserror::Error;

use crate::symbols::BitSymbol;
use crate::tone::ToneSpec;

#[cfg(feature = "audio")]
mod device;
mod text;
mod wav;

#[cfg(feature = "audio")]
pub use device::AudioDeviceSink;
pub use text::TextFallbackSink;
pub use wav::WavFileSink;

/// One timed unit of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pulse {
    Tone(BitSymbol),
    Gap,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink is not open")]
    NotOpen,
    #[error("no audio output device available")]
    NoDevice,
    #[error("audio device error: {0}")]
    Device(String),
    #[cfg(feature = "audio")]
    #[error("default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[cfg(feature = "audio")]
    #[error("build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[cfg(feature = "audio")]
    #[error("start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output capability for timed tone pulses.
///
/// `open` acquires whatever the sink needs for one run, `emit` blocks for
/// roughly `duration`, and `close` releases everything. `close` must be safe
/// to call on a sink that failed mid-run.
pub trait ToneSink {
    fn open(&mut self, spec: &ToneSpec) -> Result<(), SinkError>;

    fn emit(&mut self, pulse: Pulse, duration: Duration) -> Result<(), SinkError>;

    fn close(&mut self);

    /// Short label for logs and error messages.
    fn name(&self) -> &'static str;
}

/// Forwards every call to two sinks, `first` before `second`.
///
/// Used to echo markers on the terminal while the device plays.
#[derive(Debug)]
pub struct Tee<A, B> {
    pub first: A,
    pub second: B,
}

impl<A: ToneSink, B: ToneSink> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: ToneSink, B: ToneSink> ToneSink for Tee<A, B> {
    fn open(&mut self, spec: &ToneSpec) -> Result<(), SinkError> {
        self.first.open(spec)?;
        if let Err(e) = self.second.open(spec) {
            self.first.close();
            return Err(e);
        }
        Ok(())
    }

    fn emit(&mut self, pulse: Pulse, duration: Duration) -> Result<(), SinkError> {
        self.first.emit(pulse, duration)?;
        self.second.emit(pulse, duration)
    }

    fn close(&mut self) {
        self.second.close();
        self.first.close();
    }

    fn name(&self) -> &'static str {
        self.second.name()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Pulse, Tee, TextFallbackSink, ToneSink, WavFileSink};
    use crate::symbols::{BitSymbol, MarkerStyle};
    use crate::tone::ToneSpec;

    #[test]
    fn tee_feeds_both_sides() {
        let path = std::env::temp_dir().join(format!("bitmorse-tee-{}.wav", std::process::id()));
        let text = TextFallbackSink::new(Vec::new(), MarkerStyle::Ascii).unpaced();
        let mut tee = Tee::new(text, WavFileSink::new(&path));
        assert_eq!(tee.name(), "wav");

        tee.open(&ToneSpec::default()).expect("open");
        tee.emit(Pulse::Tone(BitSymbol::Dash), Duration::from_millis(240))
            .expect("emit");
        tee.emit(Pulse::Gap, Duration::from_millis(50)).expect("emit");
        tee.close();

        let Tee { first, second } = tee;
        assert_eq!(String::from_utf8(first.into_inner()).expect("utf8"), "-\n");
        let written = second.finish().expect("wav");
        std::fs::remove_file(written).expect("cleanup");
    }
}
