use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use livetable_client::commands;
use livetable_client::source::load_depth;
use livetable_client::{Config, DirectorySource, StreamSession};
use livetable_hand_detector::{HandDetector, Homography};
use livetable_shared::Size;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hand and screen detection for a projected table", long_about = None)]
struct Args {
    /// Options file (.toml or .json); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Frames wider than this are scaled down before detection
    #[arg(long, global = true)]
    max_width: Option<u32>,

    /// Frames taller than this are scaled down before detection
    #[arg(long, global = true)]
    max_height: Option<u32>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect hands in a single color image
    Hands {
        image: PathBuf,

        /// 16-bit depth map aligned with the image
        #[arg(long)]
        depth: Option<PathBuf>,

        /// Depth map of the empty table
        #[arg(long, requires = "depth")]
        depth_background: Option<PathBuf>,

        /// Row-major 3x3 projection applied before detection
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        projection: Option<Vec<f32>>,
    },
    /// Find the corners of the projected screen
    Corners { image: PathBuf },
    /// Projection rectifying the detected screen onto a target size
    Projection {
        image: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Projection from known corners: tlX,tlY,trX,trY,brX,brY,blX,blY
    Transform {
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        corners: Vec<f32>,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Apply a projection to an image and save the result
    Warp {
        image: PathBuf,
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        projection: Vec<f32>,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Detect hands periodically over the images of a directory
    Stream {
        dir: PathBuf,

        /// Time between two detections
        #[arg(long, default_value = "100")]
        interval_ms: u64,

        /// Depth map of the empty table
        #[arg(long)]
        depth_background: Option<PathBuf>,

        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        projection: Option<Vec<f32>>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn projection_arg(values: Option<&[f32]>) -> Result<Homography> {
    values
        .map(commands::parse_projection)
        .transpose()
        .map(Option::unwrap_or_default)
}

async fn stream(
    config: &Config,
    dir: &Path,
    interval: Duration,
    depth_background: Option<&Path>,
    projection: Homography,
) -> Result<()> {
    let mut source = DirectorySource::open(dir)?;
    if let Some(path) = depth_background {
        source = source.with_background(load_depth(path)?);
    }
    let detector = HandDetector::new()
        .with_options(config.hand.clone())?
        .with_projection(projection);
    let session = StreamSession::new(dir.display().to_string(), detector, interval);

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, stopping session");
            cancel.cancel();
        }
    });

    let summary = session.run(&mut source, |result| print_json(result)).await?;
    log::info!(
        "Session {} done: {} frames, {} skipped, {} hands",
        session.id(),
        summary.frames,
        summary.skipped,
        summary.hands
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = match &args.config {
        Some(path) => {
            log::info!("Config: {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    }
    .with_max_size(args.max_width, args.max_height);
    config.validate()?;

    match args.command {
        Command::Hands {
            image,
            depth,
            depth_background,
            projection,
        } => {
            let projection = projection_arg(projection.as_deref())?;
            let result = commands::hands(
                &config,
                &image,
                depth.as_deref(),
                depth_background.as_deref(),
                projection,
            )?;
            log::info!("{} hands, {} fingers", result.hands.len(), result.finger_count());
            print_json(&result)?;
        }
        Command::Corners { image } => match commands::corners(&config, &image)? {
            Some(response) => print_json(&response)?,
            None => {
                log::warn!("No screen found in {}", image.display());
                print_json(&serde_json::Value::Null)?;
            }
        },
        Command::Projection { image, width, height } => {
            let response = commands::projection(&config, &image, Size::new(width, height))?;
            print_json(&response)?;
        }
        Command::Transform { corners, width, height } => {
            let corners = commands::parse_corners(&corners)?;
            let response = commands::transform(&corners, Size::new(width, height))?;
            print_json(&response)?;
        }
        Command::Warp {
            image,
            projection,
            width,
            height,
            output,
        } => {
            let projection = commands::parse_projection(&projection)?;
            commands::warp(&image, &projection, Size::new(width, height), &output)?;
        }
        Command::Stream {
            dir,
            interval_ms,
            depth_background,
            projection,
        } => {
            let projection = projection_arg(projection.as_deref())?;
            stream(
                &config,
                &dir,
                Duration::from_millis(interval_ms),
                depth_background.as_deref(),
                projection,
            )
            .await
            .context("Stream session failed")?;
        }
    }

    Ok(())
}
