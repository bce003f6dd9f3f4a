//! Play the leading bits of a binary file as Morse-style tones.
//!
//! Pipeline:
//! - [`reader`]: bounded file prefix
//! - [`symbols`]: bit 0 = dot, bit 1 = dash, MSB first
//! - [`sequencer`]: tone + gap per symbol through a [`sink::ToneSink`]

pub mod audio;
pub mod constants;
pub mod reader;
pub mod sequencer;
pub mod sink;
pub mod symbols;
pub mod tone;

pub use constants::Preset;
pub use reader::{ByteBuffer, ReadError, read_prefix};
pub use sequencer::{PlayError, PlayReport, Sequencer, play};
pub use sink::{Pulse, SinkError, ToneSink};
pub use symbols::{BitSymbol, MarkerStyle, SymbolSequence, encode, truncate};
pub use tone::{ToneBank, ToneSpec};
