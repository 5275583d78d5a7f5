use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use bandcast_core::CropRegion;

#[derive(Parser)]
#[command(name = "bandcast")]
#[command(author, version, about = "Convert videos for buffer-constrained wearable displays")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a video to a device-sized MJPEG AVI
    Convert {
        /// Input video file
        #[arg(required = true)]
        input: PathBuf,

        /// Output AVI path
        #[arg(required = true)]
        output: PathBuf,

        /// Device display width in pixels
        #[arg(long)]
        width: u32,

        /// Device display height in pixels
        #[arg(long)]
        height: u32,

        /// Output frame rate (default from config)
        #[arg(long)]
        fps: Option<u32>,

        /// Starting MJPEG quality, 1-31 (default from config)
        #[arg(long)]
        quality: Option<u32>,

        /// Trim start in seconds
        #[arg(long)]
        start: Option<f64>,

        /// Trim length in seconds (0 = to end)
        #[arg(long)]
        duration: Option<f64>,

        /// Source crop rectangle as X,Y,WIDTH,HEIGHT
        #[arg(long, value_parser = parse_crop)]
        crop: Option<CropRegion>,
    },

    /// Inspect an AVI's declared stream buffer sizes
    Inspect {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a produced AVI into a playable preview
    Preview {
        /// Input AVI file
        #[arg(required = true)]
        input: PathBuf,

        /// Output preview path
        #[arg(required = true)]
        output: PathBuf,

        /// Preview format
        #[arg(long, value_enum, default_value_t = PreviewFormat::Mp4)]
        format: PreviewFormat,
    },

    /// Extract a single poster frame from a video
    Frame {
        /// Input video file
        #[arg(required = true)]
        input: PathBuf,

        /// Output image path (format from extension)
        #[arg(required = true)]
        output: PathBuf,

        /// Timestamp in seconds
        #[arg(long, default_value_t = 0.0)]
        at: f64,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PreviewFormat {
    Mp4,
    Gif,
}

fn parse_crop(s: &str) -> Result<CropRegion, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err("expected X,Y,WIDTH,HEIGHT".to_string());
    }
    let mut nums = [0u32; 4];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|e| format!("invalid crop component '{part}': {e}"))?;
    }
    Ok(CropRegion {
        x: nums[0],
        y: nums[1],
        width: nums[2],
        height: nums[3],
    })
}
