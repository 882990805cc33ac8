//! Renders a short phrase with one of the 32 DX7 algorithms into a mono WAV file.
//!
//! Usage: `cargo run --example render-preset -- --algorithm 5 --output fm.wav`

use std::path::PathBuf;

use arg::{parse_args, Args};
use hound::{SampleFormat, WavSpec, WavWriter};

use fmsynth::{
    filters::BiquadFilter, AlgorithmTopology, BreakpointCurve, BreakpointPreset, EnvelopePreset,
    Instrument, InstrumentConfig, OperatorPreset,
};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

const SAMPLE_RATE: u32 = 44100;

// -------------------------------------------------------------------------------------------------

#[derive(Args, Debug, Default)]
struct Arguments {
    #[arg(short = "o", long = "output")]
    /// Path of the WAV file to write. By default \"render-preset.wav\".
    output_path: Option<PathBuf>,
    #[arg(short = "a", long = "algorithm")]
    /// DX7 algorithm number in range 1-32. By default 5.
    algorithm: Option<u8>,
    #[arg(short = "l", long = "log-level")]
    /// Set logging level to \"debug\", \"info\", \"warn\" or \"error\".
    /// By default \"debug\" in dev builds and \"warn\" in release builds.
    log_level: Option<log::Level>,
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args::<Arguments>();

    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        .init()?;

    // electric piano like preset: bright, decaying modulators over sustaining carriers
    let topology = AlgorithmTopology::dx7(args.algorithm.unwrap_or(5))?;
    let presets = (0..topology.operator_count())
        .map(|index| {
            let is_carrier = topology.carriers().contains(&index);
            OperatorPreset {
                output_level: if is_carrier { 99 } else { 75 },
                feedback: 5,
                frequency_ratio: if is_carrier { 1.0 } else { (index + 1) as f64 },
                envelope: EnvelopePreset {
                    levels: if is_carrier {
                        [99, 90, 80, 0]
                    } else {
                        [99, 60, 40, 0]
                    },
                    rates: [95, 60, 40, 70],
                },
                breakpoint: BreakpointPreset {
                    center_note: 60,
                    left_depth: 0,
                    right_depth: if is_carrier { 0 } else { 36 },
                    left_curve: BreakpointCurve::LinearDecrease,
                    right_curve: BreakpointCurve::ExponentialDecrease,
                },
                ..OperatorPreset::default()
            }
        })
        .collect::<Vec<_>>();

    let mut instrument = Instrument::with_preset(
        InstrumentConfig {
            sample_rate: SAMPLE_RATE,
            gain: 0.5,
            ..InstrumentConfig::default()
        },
        topology,
        &presets,
    )?;
    instrument
        .filter_chain_mut()
        .add_link(BiquadFilter::lowpass(SAMPLE_RATE, 6000.0, 0.8));

    let output_path = args
        .output_path
        .unwrap_or_else(|| PathBuf::from("render-preset.wav"));
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&output_path, spec)?;

    // play a short arpeggio, then let all voices ring out
    let block_size = SAMPLE_RATE as usize / 4;
    let mut block = vec![0.0; block_size];
    for note in [48, 55, 60, 64, 67, 72] {
        instrument.press_note(note);
        instrument.render(&mut block);
        for sample in &block {
            writer.write_sample(*sample as f32)?;
        }
    }
    instrument.release_all_voices();
    while instrument.active_voice_count() > 0 {
        instrument.render(&mut block);
        for sample in &block {
            writer.write_sample(*sample as f32)?;
        }
    }
    writer.finalize()?;

    log::info!("Wrote '{}'", output_path.display());
    Ok(())
}
