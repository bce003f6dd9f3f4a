//! Bit to Dot/Dash symbol mapping.

use std::fmt;
use std::time::Duration;

use crate::constants::BITS_PER_BYTE;
use crate::tone::ToneSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitSymbol {
    /// Bit value 0.
    Dot,
    /// Bit value 1.
    Dash,
}

/// How symbols are drawn on a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerStyle {
    #[default]
    Unicode,
    Ascii,
}

impl BitSymbol {
    #[must_use]
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::Dash } else { Self::Dot }
    }

    #[must_use]
    pub fn marker(self, style: MarkerStyle) -> &'static str {
        match (self, style) {
            (Self::Dot, MarkerStyle::Unicode) => "•",
            (Self::Dash, MarkerStyle::Unicode) => "—",
            (Self::Dot, MarkerStyle::Ascii) => ".",
            (Self::Dash, MarkerStyle::Ascii) => "-",
        }
    }

    /// Tone length for this symbol under `spec`.
    #[must_use]
    pub fn duration(self, spec: &ToneSpec) -> Duration {
        match self {
            Self::Dot => spec.dot,
            Self::Dash => spec.dash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolSequence {
    symbols: Vec<BitSymbol>,
}

impl SymbolSequence {
    #[must_use]
    pub fn as_slice(&self) -> &[BitSymbol] {
        &self.symbols
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BitSymbol> + '_ {
        self.symbols.iter().copied()
    }

    #[must_use]
    pub fn count(&self, symbol: BitSymbol) -> usize {
        self.symbols.iter().filter(|&&s| s == symbol).count()
    }

    /// Sum of every tone and trailing gap, ignoring device latency.
    #[must_use]
    pub fn nominal_duration(&self, spec: &ToneSpec) -> Duration {
        self.iter().map(|s| s.duration(spec) + spec.gap).sum()
    }
}

impl From<Vec<BitSymbol>> for SymbolSequence {
    fn from(symbols: Vec<BitSymbol>) -> Self {
        Self { symbols }
    }
}

impl FromIterator<BitSymbol> for SymbolSequence {
    fn from_iter<I: IntoIterator<Item = BitSymbol>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}

/// Space separated `.`/`-` form.
impl fmt::Display for SymbolSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.symbols.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(s.marker(MarkerStyle::Ascii))?;
        }
        Ok(())
    }
}

/// Map every bit of `bytes` to a symbol, most significant bit first.
#[must_use]
pub fn encode(bytes: &[u8]) -> SymbolSequence {
    let mut symbols = Vec::with_capacity(bytes.len() * BITS_PER_BYTE);
    for &byte in bytes {
        for shift in (0..BITS_PER_BYTE).rev() {
            symbols.push(BitSymbol::from_bit((byte >> shift) & 1 == 1));
        }
    }
    SymbolSequence { symbols }
}

/// Keep the first `max_symbols` symbols.
///
/// `None` and `Some(0)` mean "no cap".
#[must_use]
pub fn truncate(mut seq: SymbolSequence, max_symbols: Option<usize>) -> SymbolSequence {
    if let Some(max) = max_symbols.filter(|&m| m > 0) {
        seq.symbols.truncate(max);
    }
    seq
}
