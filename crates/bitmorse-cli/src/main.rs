use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use anyhow::{Context, Result};
use bitmorse::constants::{BITS_PER_BYTE, DEFAULT_MAX_BYTES, PREVIEW_BITS};
use bitmorse::sink::{TextFallbackSink, WavFileSink};
use bitmorse::{
    ByteBuffer, MarkerStyle, PlayReport, Preset, Sequencer, SymbolSequence, ToneSink, ToneSpec,
    encode, read_prefix, truncate,
};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

const RULE: &str = "============================================================";

#[derive(Debug, Parser)]
#[command(name = "bitmorse")]
#[command(about = "Play the first bits of a binary file as Morse tones (0 = dot, 1 = dash)", long_about = None)]
struct Args {
    /// Binary file to read. Prompted for when omitted.
    file: Option<PathBuf>,

    /// Bytes to read from the start of the file.
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: usize,

    /// Symbols to play (0 = all). Defaults to the preset's cap.
    #[arg(long)]
    max_symbols: Option<usize>,

    /// Timing profile.
    #[arg(long, value_enum, default_value_t = PresetArg::Classic)]
    preset: PresetArg,

    /// Tone frequency in Hz.
    #[arg(long)]
    frequency: Option<f32>,

    /// Synthesis sample rate in Hz.
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Dot length in milliseconds.
    #[arg(long)]
    dot_ms: Option<u64>,

    /// Dash length in milliseconds.
    #[arg(long)]
    dash_ms: Option<u64>,

    /// Silence between symbols in milliseconds.
    #[arg(long)]
    gap_ms: Option<u64>,

    /// Print markers instead of using the audio device.
    #[arg(long, default_value_t = false)]
    text: bool,

    /// Use `.` and `-` instead of `•` and `—`.
    #[arg(long, default_value_t = false)]
    ascii: bool,

    /// Write the tones to a WAV file instead of playing them.
    #[arg(long, value_name = "WAV")]
    render: Option<PathBuf>,

    /// Play without asking for confirmation.
    #[arg(short, long, default_value_t = false)]
    yes: bool,

    /// More logging on stderr (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    /// 80/240/50 ms, 200 symbols.
    Classic,
    /// 5/15/2 ms, 20000 symbols.
    Rapid,
}

impl From<PresetArg> for Preset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Classic => Preset::Classic,
            PresetArg::Rapid => Preset::Rapid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirmation {
    Play,
    Cancel,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let preset = Preset::from(args.preset);
    let spec = tone_spec(&args, preset)?;
    let max_symbols = args.max_symbols.unwrap_or(preset.max_symbols());

    println!("{RULE}");
    println!("Binary File to Morse Code Player");
    println!("{RULE}");
    println!("\nConverts binary data to Morse: 0 = dot, 1 = dash");

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    let path = match &args.file {
        Some(p) => p.clone(),
        None => prompt_path(&mut input, &mut out)?,
    };

    println!("\nReading first {} bytes of file...", args.max_bytes);
    let bytes = read_prefix(&path, args.max_bytes)?;
    print_preview(&bytes);

    let seq = truncate(encode(bytes.as_bytes()), Some(max_symbols));
    println!("\nReady to play first {} symbols", seq.len());
    println!(
        "(Each byte = 8 symbols, this is about {:.1} bytes)",
        seq.len() as f64 / BITS_PER_BYTE as f64
    );

    if !args.yes && confirm(&mut input, &mut out)? == Confirmation::Cancel {
        println!("Cancelled.");
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("install ctrl-c handler")?;
    }
    let sequencer = Sequencer::new().with_stop_flag(stop);

    let style = if args.ascii {
        MarkerStyle::Ascii
    } else {
        MarkerStyle::Unicode
    };

    println!("\nPlaying Morse code ({} symbols)...\n", seq.len());
    let report = match &args.render {
        Some(wav) => render(&sequencer, &seq, &spec, wav)?,
        None => {
            let mut sink = live_sink(args.text, style);
            sequencer.play(&seq, &spec, sink.as_mut())?
        }
    };

    print_report(&report);
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("warn,bitmorse={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn tone_spec(args: &Args, preset: Preset) -> Result<ToneSpec> {
    let mut spec = preset.tone_spec();
    if let Some(hz) = args.frequency {
        spec.frequency_hz = hz;
    }
    if let Some(sr) = args.sample_rate {
        spec.sample_rate_hz = sr;
    }
    if let Some(ms) = args.dot_ms {
        spec.dot = Duration::from_millis(ms);
    }
    if let Some(ms) = args.dash_ms {
        spec.dash = Duration::from_millis(ms);
    }
    if let Some(ms) = args.gap_ms {
        spec.gap = Duration::from_millis(ms);
    }
    spec.validate().context("invalid tone settings")?;
    Ok(spec)
}

/// Audio when a device is present, otherwise the text fallback.
fn live_sink(force_text: bool, style: MarkerStyle) -> Box<dyn ToneSink> {
    #[cfg(feature = "audio")]
    {
        use bitmorse::sink::{AudioDeviceSink, Tee};

        if !force_text {
            if AudioDeviceSink::is_available() {
                let echo = TextFallbackSink::stdout(style).unpaced();
                return Box::new(Tee::new(echo, AudioDeviceSink::new()));
            }
            tracing::warn!("no audio output device; printing symbols instead");
        }
    }
    #[cfg(not(feature = "audio"))]
    {
        if !force_text {
            tracing::warn!("built without audio support; printing symbols instead");
        }
    }
    Box::new(TextFallbackSink::stdout(style))
}

fn render(
    sequencer: &Sequencer,
    seq: &SymbolSequence,
    spec: &ToneSpec,
    wav: &Path,
) -> Result<PlayReport> {
    let mut sink = WavFileSink::new(wav);
    let report = sequencer.play(seq, spec, &mut sink)?;
    let written = sink
        .finish()
        .with_context(|| format!("write {}", wav.display()))?;
    println!("Wrote {}", written.display());
    Ok(report)
}

fn prompt_path(input: &mut impl BufRead, out: &mut impl Write) -> Result<PathBuf> {
    writeln!(out, "\nEnter path to binary file:")?;
    write!(out, "> ")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("read file path")?;
    let path = clean_path(&line);
    anyhow::ensure!(!path.is_empty(), "no file path given");
    Ok(PathBuf::from(path))
}

/// Trim whitespace and one layer of surrounding quotes, as left by
/// drag-and-drop into a terminal.
fn clean_path(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
        })
        .unwrap_or(trimmed)
}

fn confirm(input: &mut impl BufRead, out: &mut impl Write) -> Result<Confirmation> {
    write!(out, "\nPress Enter to play, or 'q' to quit: ")?;
    out.flush()?;

    let mut line = String::new();
    let n = input.read_line(&mut line).context("read confirmation")?;
    Ok(parse_confirmation(n, &line))
}

fn parse_confirmation(bytes_read: usize, line: &str) -> Confirmation {
    // EOF counts as a refusal.
    if bytes_read == 0 || line.trim().eq_ignore_ascii_case("q") {
        Confirmation::Cancel
    } else {
        Confirmation::Play
    }
}

fn print_preview(bytes: &ByteBuffer) {
    println!("Read {} bytes ({} bits)", bytes.len(), bytes.bit_count());
    println!(
        "\nFirst {PREVIEW_BITS} bits: {}...",
        bytes.bit_preview(PREVIEW_BITS)
    );
}

fn print_report(report: &PlayReport) {
    println!();
    if report.interrupted {
        println!("Stopped after {} symbols.", report.symbols);
    } else {
        println!("Done!");
    }
    println!(
        "{} symbols ({} dots, {} dashes), {:.2}s nominal",
        report.symbols,
        report.dots,
        report.dashes,
        report.nominal.as_secs_f64()
    );
}
