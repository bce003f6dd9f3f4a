use std::io::{Stdout, Write};
use std::time::Duration;

use super::{Pulse, SinkError, ToneSink};
use crate::constants::BITS_PER_BYTE;
use crate::symbols::MarkerStyle;
use crate::tone::ToneSpec;

/// Prints a marker per tone and sleeps through the pulse so the rhythm
/// survives without sound.
#[derive(Debug)]
pub struct TextFallbackSink<W: Write = Stdout> {
    out: W,
    style: MarkerStyle,
    paced: bool,
    tones: usize,
}

impl TextFallbackSink<Stdout> {
    #[must_use]
    pub fn stdout(style: MarkerStyle) -> Self {
        Self::new(std::io::stdout(), style)
    }
}

impl<W: Write> TextFallbackSink<W> {
    #[must_use]
    pub fn new(out: W, style: MarkerStyle) -> Self {
        Self {
            out,
            style,
            paced: true,
            tones: 0,
        }
    }

    /// Skip the sleeps; markers are still written.
    #[must_use]
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn wait(&self, duration: Duration) {
        if self.paced && !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<W: Write> ToneSink for TextFallbackSink<W> {
    fn open(&mut self, _spec: &ToneSpec) -> Result<(), SinkError> {
        self.tones = 0;
        Ok(())
    }

    fn emit(&mut self, pulse: Pulse, duration: Duration) -> Result<(), SinkError> {
        if let Pulse::Tone(sym) = pulse {
            // One space per byte.
            if self.tones > 0 && self.tones % BITS_PER_BYTE == 0 {
                self.out.write_all(b" ")?;
            }
            self.out.write_all(sym.marker(self.style).as_bytes())?;
            self.out.flush()?;
            self.tones += 1;
        }
        self.wait(duration);
        Ok(())
    }

    fn close(&mut self) {
        if self.tones == 0 {
            return;
        }
        if let Err(e) = writeln!(self.out).and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "text sink: final newline failed");
        }
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::TextFallbackSink;
    use crate::sink::{Pulse, ToneSink};
    use crate::symbols::{BitSymbol, MarkerStyle};
    use crate::tone::ToneSpec;

    fn run(style: MarkerStyle, pulses: &[Pulse]) -> String {
        let mut sink = TextFallbackSink::new(Vec::new(), style).unpaced();
        sink.open(&ToneSpec::default()).expect("open");
        for &p in pulses {
            sink.emit(p, Duration::from_millis(1)).expect("emit");
        }
        sink.close();
        String::from_utf8(sink.into_inner()).expect("utf8")
    }

    #[test]
    fn ascii_markers_grouped_per_byte() {
        let mut pulses = Vec::new();
        for i in 0..10 {
            let sym = if i % 2 == 0 { BitSymbol::Dash } else { BitSymbol::Dot };
            pulses.push(Pulse::Tone(sym));
            pulses.push(Pulse::Gap);
        }
        assert_eq!(run(MarkerStyle::Ascii, &pulses), "-.-.-.-. -.\n");
    }

    #[test]
    fn unicode_markers() {
        let pulses = [Pulse::Tone(BitSymbol::Dot), Pulse::Gap, Pulse::Tone(BitSymbol::Dash)];
        assert_eq!(run(MarkerStyle::Unicode, &pulses), "•—\n");
    }

    #[test]
    fn gaps_alone_print_nothing() {
        assert_eq!(run(MarkerStyle::Ascii, &[Pulse::Gap, Pulse::Gap]), "");
    }

    #[test]
    fn paced_sink_sleeps_for_pulse() {
        let mut sink = TextFallbackSink::new(Vec::new(), MarkerStyle::Ascii);
        sink.open(&ToneSpec::default()).expect("open");
        let start = std::time::Instant::now();
        sink.emit(Pulse::Tone(BitSymbol::Dot), Duration::from_millis(20))
            .expect("emit");
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
