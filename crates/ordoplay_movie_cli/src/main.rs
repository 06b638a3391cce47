// SPDX-License-Identifier: MIT OR Apache-2.0
//! `movie-inspect` - command line tool for `OrdoPlay` movie clips.
//!
//! ```bash
//! movie-inspect tree intro.clip.ron
//! movie-inspect sample intro.clip.ron --time 0 --time 1.5
//! movie-inspect compile fade.curve.ron --rate 60 --output fade.blocks.ron
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ordoplay_movie::{compile, BlockData, Clip, KeyframeCurve, MovieSettings, Track};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "movie-inspect")]
#[command(about = "Inspect, sample and compile OrdoPlay movie clips")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Movie settings file (RON)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the track tree of a clip
    Tree {
        /// Clip file (RON)
        clip: PathBuf,
    },

    /// Print every track's value at the given times
    Sample {
        /// Clip file (RON)
        clip: PathBuf,

        /// Times to sample, in seconds
        #[arg(short, long = "time", required = true)]
        times: Vec<f32>,
    },

    /// Compile a keyframe curve into blocks
    Compile {
        /// Keyframe curve file (RON)
        curve: PathBuf,

        /// Samples per second, overriding the settings file
        #[arg(short, long)]
        rate: Option<f32>,

        /// Write the blocks here instead of printing them
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ordoplay_movie=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.settings {
        Some(path) => MovieSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => MovieSettings::default(),
    };

    match cli.command {
        Commands::Tree { clip } => print_tree(&load_clip(&clip)?),
        Commands::Sample { clip, times } => print_samples(&load_clip(&clip)?, &times),
        Commands::Compile {
            curve,
            rate,
            output,
        } => compile_curve(&curve, rate.unwrap_or(settings.sample_rate), output.as_deref())?,
    }

    Ok(())
}

fn load_clip(path: &Path) -> anyhow::Result<Clip> {
    let clip = Clip::load(path).with_context(|| format!("Failed to load clip {}", path.display()))?;
    tracing::info!(
        "Loaded {} ({} tracks, {:.2}s)",
        path.display(),
        clip.track_count(),
        clip.duration()
    );
    Ok(clip)
}

fn print_tree(clip: &Clip) {
    println!("duration: {:.3}s", clip.duration());
    for track in clip.root_tracks() {
        print_track(clip, track, 0);
    }
}

fn print_track(clip: &Clip, track: &Track, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}{} : {} ({} blocks, {:.3}s)",
        track.name,
        track.value_type(),
        track.block_count(),
        track.duration()
    );

    for block in track.blocks() {
        let end = block
            .end_time()
            .map_or_else(|| "open".to_string(), |end| format!("{end:.3}"));
        let detail = match &block.data {
            BlockData::Constant(value) => value.to_string(),
            BlockData::Samples(data) => {
                format!("{} samples at {}/s", data.samples.len(), data.sample_rate)
            }
            BlockData::Action(action) => format!("event {:?}", action.event),
        };
        println!(
            "{indent}  {} [{:.3}, {end}) {}: {detail}",
            block.id,
            block.start_time,
            block.data.kind()
        );
    }

    for child in clip.children(track.id()) {
        print_track(clip, child, depth + 1);
    }
}

fn print_samples(clip: &Clip, times: &[f32]) {
    for &time in times {
        println!("t = {time:.3}");
        for track in clip.all_tracks() {
            let Some(value) = track.value_at(time) else {
                continue;
            };
            let path = clip
                .track_path(track.id())
                .unwrap_or_else(|| track.name.clone());
            println!("  {path} = {value}");
        }
    }
}

fn compile_curve(path: &Path, sample_rate: f32, output: Option<&Path>) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read curve {}", path.display()))?;
    let curve: KeyframeCurve = ron::from_str(&content)
        .with_context(|| format!("Failed to parse curve {}", path.display()))?;

    if curve.is_empty() {
        bail!("Curve {} has no keyframes", path.display());
    }

    let blocks = compile(&curve, sample_rate)?;
    let data: Vec<_> = blocks
        .into_iter()
        .map(|block| (block.start_time, block.duration, block.data))
        .collect();

    let text = ron::ser::to_string_pretty(&data, ron::ser::PrettyConfig::default())?;
    match output {
        Some(output) => {
            std::fs::write(output, text)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!("Wrote {} blocks to {}", data.len(), output.display());
        }
        None => println!("{text}"),
    }

    Ok(())
}
