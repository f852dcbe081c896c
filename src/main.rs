//! Offline renderer: runs a WAV file through the reverb

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use fdnr::control::ReverbControls;
use fdnr::params::ParamId;
use fdnr::utils::init_logger;
use fdnr::{FixedTempo, Mode, ProcessSpec, ReverbProcessor, SharedParameters};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a mono or stereo WAV file
    Render {
        input: PathBuf,
        output: PathBuf,

        /// Preset document applied before any other option
        #[arg(long)]
        preset: Option<PathBuf>,

        /// Mode name or index
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// Load the mode's full character onto the knobs, not just MODE
        #[arg(long, default_value_t = false)]
        character: bool,

        /// Parameter override, e.g. --set MIX=80 (repeatable)
        #[arg(long = "set", value_name = "ID=VALUE", value_parser = parse_assignment)]
        overrides: Vec<(ParamId, f32)>,

        /// Host tempo used by PREDELAY_SYNC
        #[arg(long)]
        bpm: Option<f64>,

        #[arg(long, default_value_t = 512)]
        block_size: usize,

        /// Seconds of silence appended so the tail can ring out
        #[arg(long, default_value_t = 3.0)]
        tail: f32,
    },

    /// List the available modes
    Modes,

    /// Write a preset document
    Preset {
        output: PathBuf,

        /// Start from this mode's character instead of the defaults
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,
    },
}

fn parse_mode(text: &str) -> Result<Mode, String> {
    Mode::parse(text).ok_or_else(|| format!("unknown mode {:?}", text))
}

fn parse_assignment(text: &str) -> Result<(ParamId, f32), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got {:?}", text))?;
    let id = ParamId::from_key(key.trim().to_ascii_uppercase().as_str())
        .ok_or_else(|| format!("unknown parameter {:?}", key))?;
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("bad value for {}: {}", key, e))?;
    Ok((id, value))
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    match args.command {
        Command::Render {
            input,
            output,
            preset,
            mode,
            character,
            overrides,
            bpm,
            block_size,
            tail,
        } => {
            let mut processor = ReverbProcessor::new();
            let controls = processor.controls().clone();
            if let Some(path) = preset {
                let applied = controls
                    .load_preset(&path)
                    .with_context(|| format!("Failed to load preset {:?}", path))?;
                log::info!("Applied {} values from preset", applied);
            }
            if let Some(mode) = mode {
                if character {
                    controls.apply_mode_character(mode);
                } else {
                    controls.set(ParamId::Mode, mode.index() as f32);
                }
            }
            for (id, value) in overrides {
                let stored = controls.set(id, value);
                log::info!("{} = {}", id.key(), stored);
            }
            render(&mut processor, &input, &output, bpm, block_size, tail)
        }
        Command::Modes => {
            for mode in Mode::ALL {
                println!("{:2}  {}", mode.index(), mode.name());
            }
            Ok(())
        }
        Command::Preset { output, mode } => {
            let controls = ReverbControls::new(SharedParameters::new().into());
            if let Some(mode) = mode {
                controls.apply_mode_character(mode);
            }
            controls
                .save_preset(&output)
                .with_context(|| format!("Failed to write preset {:?}", output))?;
            println!("Wrote {}", output.display());
            Ok(())
        }
    }
}

fn render(
    processor: &mut ReverbProcessor,
    input: &Path,
    output: &Path,
    bpm: Option<f64>,
    block_size: usize,
    tail: f32,
) -> Result<()> {
    if block_size == 0 {
        bail!("block size must be at least 1");
    }

    let reader =
        WavReader::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let in_spec = reader.spec();
    let channels = usize::from(in_spec.channels);
    let mut samples = read_samples(reader).context("Failed to decode input samples")?;

    let tail_frames = (tail.max(0.0) * in_spec.sample_rate as f32) as usize;
    samples.resize(samples.len() + tail_frames * channels, 0.0);

    processor
        .prepare(ProcessSpec::new(
            f64::from(in_spec.sample_rate),
            block_size,
            channels,
        ))
        .map_err(|e| anyhow!("Cannot process {:?}: {}", input, e))?;

    let play_head = FixedTempo(bpm);
    for block in samples.chunks_mut(block_size * channels) {
        processor
            .process_interleaved(block, &play_head)
            .map_err(|e| anyhow!("Processing failed: {}", e))?;
    }

    let out_spec = WavSpec {
        channels: in_spec.channels,
        sample_rate: in_spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(output, out_spec)
        .with_context(|| format!("Failed to create {:?}", output))?;
    for &sample in &samples {
        writer.write_sample(sample)?;
    }
    writer.finalize().context("Failed to finalize output")?;

    log::info!(
        "Rendered {} frames to {:?}",
        samples.len() / channels,
        output
    );
    Ok(())
}

fn read_samples<R: std::io::Read>(reader: WavReader<R>) -> Result<Vec<f32>> {
    let spec = reader.spec();
    match spec.sample_format {
        SampleFormat::Float => Ok(reader.into_samples::<f32>().collect::<Result<_, _>>()?),
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            Ok(reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?)
        }
    }
}
