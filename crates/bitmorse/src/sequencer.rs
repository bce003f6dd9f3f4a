//! Linear playback of a symbol sequence through a [`ToneSink`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;

use crate::sink::{Pulse, SinkError, ToneSink};
use crate::symbols::{BitSymbol, SymbolSequence};
use crate::tone::ToneSpec;

/// What a playback run did. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayReport {
    pub symbols: usize,
    pub dots: usize,
    pub dashes: usize,
    /// Sum of tone and gap durations emitted, ignoring device latency.
    pub nominal: Duration,
    /// Stopped early through the stop flag.
    pub interrupted: bool,
}

impl PlayReport {
    fn record(&mut self, symbol: BitSymbol, spec: &ToneSpec) {
        self.symbols += 1;
        match symbol {
            BitSymbol::Dot => self.dots += 1,
            BitSymbol::Dash => self.dashes += 1,
        }
        self.nominal += symbol.duration(spec) + spec.gap;
    }
}

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("invalid tone settings: {0:#}")]
    InvalidSpec(anyhow::Error),
    #[error("open {sink} sink: {source}")]
    Open {
        sink: &'static str,
        #[source]
        source: SinkError,
    },
    #[error("{sink} sink failed after {played} symbols: {source}")]
    Sink {
        sink: &'static str,
        played: usize,
        #[source]
        source: SinkError,
    },
}

/// Closes the sink when dropped, whatever path left the playback loop.
struct OpenSink<'a, S: ToneSink + ?Sized> {
    sink: &'a mut S,
}

impl<'a, S: ToneSink + ?Sized> OpenSink<'a, S> {
    fn acquire(sink: &'a mut S, spec: &ToneSpec) -> Result<Self, PlayError> {
        sink.open(spec).map_err(|source| PlayError::Open {
            sink: sink.name(),
            source,
        })?;
        Ok(Self { sink })
    }
}

impl<S: ToneSink + ?Sized> Drop for OpenSink<'_, S> {
    fn drop(&mut self) {
        self.sink.close();
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    stop: Option<Arc<AtomicBool>>,
}

impl Sequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checked between symbols; raising it ends playback early.
    #[must_use]
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|s| s.load(Ordering::SeqCst))
    }

    /// Emit every symbol as a tone followed by a gap, strictly in order.
    pub fn play<S: ToneSink + ?Sized>(
        &self,
        seq: &SymbolSequence,
        spec: &ToneSpec,
        sink: &mut S,
    ) -> Result<PlayReport, PlayError> {
        spec.validate().map_err(PlayError::InvalidSpec)?;
        let name = sink.name();
        tracing::debug!(sink = name, symbols = seq.len(), "playback start");

        let open = OpenSink::acquire(sink, spec)?;
        let mut report = PlayReport::default();

        for symbol in seq.iter() {
            if self.stop_requested() {
                report.interrupted = true;
                break;
            }
            let fail = |source| PlayError::Sink {
                sink: name,
                played: report.symbols,
                source,
            };
            let tone = Pulse::Tone(symbol);
            open.sink
                .emit(tone, spec.pulse_duration(tone))
                .map_err(fail)?;
            open.sink.emit(Pulse::Gap, spec.gap).map_err(fail)?;
            report.record(symbol, spec);
            tracing::trace!(index = report.symbols - 1, ?symbol, "emitted");
        }

        drop(open);
        tracing::debug!(
            sink = name,
            played = report.symbols,
            interrupted = report.interrupted,
            "playback end"
        );
        Ok(report)
    }
}

/// [`Sequencer::play`] without a stop flag.
pub fn play<S: ToneSink + ?Sized>(
    seq: &SymbolSequence,
    spec: &ToneSpec,
    sink: &mut S,
) -> Result<PlayReport, PlayError> {
    Sequencer::new().play(seq, spec, sink)
}
