mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use bandcast::convert::{ConversionSession, ConvertObserver};
use bandcast_av::{preview, FfmpegEngine, ToolRegistry};
use bandcast_core::config::Config;
use bandcast_core::{ConversionParams, CropRegion};
use cli::{Cli, Commands, PreviewFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "bandcast=trace,bandcast_av=trace,bandcast_probe=debug,bandcast_core=debug"
                .to_string()
        } else {
            "bandcast=info,bandcast_av=info,bandcast_probe=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            width,
            height,
            fps,
            quality,
            start,
            duration,
            crop,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_convert(
                cli.config.as_deref(),
                input.as_path(),
                output.as_path(),
                width,
                height,
                fps,
                quality,
                start,
                duration,
                crop,
            ))
        }
        Commands::Inspect { file, json } => inspect_file(&file, json),
        Commands::Preview {
            input,
            output,
            format,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_preview(cli.config.as_deref(), &input, &output, format))
        }
        Commands::Frame { input, output, at } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_frame(cli.config.as_deref(), &input, &output, at))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("bandcast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Observer that narrates conversion progress to the terminal.
struct ConsoleObserver;

impl ConvertObserver for ConsoleObserver {
    fn on_start(&self) {
        println!("Converting...");
    }

    fn on_progress(&self, percent: u8) {
        println!("  {percent}%");
    }

    fn on_success(&self, output_path: &Path) {
        println!("Done: {}", output_path.display());
    }

    fn on_failure(&self, reason: &str) {
        eprintln!("Conversion failed: {reason}");
    }
}

fn build_engine(config: &Config) -> Result<FfmpegEngine> {
    let registry = ToolRegistry::discover(&config.tools);
    let timeout = Duration::from_secs(config.convert.engine_timeout_secs);
    Ok(FfmpegEngine::new(&registry, timeout)?)
}

#[allow(clippy::too_many_arguments)]
async fn run_convert(
    config_path: Option<&Path>,
    input: &Path,
    output: &Path,
    width: u32,
    height: u32,
    fps: Option<u32>,
    quality: Option<u32>,
    start: Option<f64>,
    duration: Option<f64>,
    crop: Option<CropRegion>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let config = Config::load_or_default(config_path);

    let mut params = ConversionParams::new(input, output, width, height)
        .with_fps(fps.unwrap_or(config.convert.default_fps))
        .with_quality(quality.unwrap_or(config.convert.default_quality))
        .with_trim(start, duration);
    if let Some(crop) = crop {
        params = params.with_crop(crop);
    }

    let engine = Arc::new(build_engine(&config)?);
    let session = ConversionSession::new(engine, config.convert.clone());

    let produced = session.run(params, &ConsoleObserver).await?;
    tracing::info!("conversion finished: {}", produced.display());
    Ok(())
}

fn inspect_file(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let report = bandcast_probe::inspect(file)?;

    if json {
        let json_str = serde_json::to_string_pretty(&report)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", file.display());
        println!("Stream headers: {}", report.found_headers);
        match report.max_buffer_size {
            Some(size) => println!("Max declared buffer size: {} bytes", size),
            None => println!("Max declared buffer size: not found"),
        }
    }

    Ok(())
}

async fn run_preview(
    config_path: Option<&Path>,
    input: &Path,
    output: &Path,
    format: PreviewFormat,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let config = Config::load_or_default(config_path);
    let engine = build_engine(&config)?;

    match format {
        PreviewFormat::Mp4 => preview::remux_to_mp4(&engine, input, output).await?,
        PreviewFormat::Gif => preview::gif_preview(&engine, input, output).await?,
    }

    println!("Preview written: {}", output.display());
    Ok(())
}

async fn run_frame(
    config_path: Option<&Path>,
    input: &Path,
    output: &Path,
    at: f64,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let config = Config::load_or_default(config_path);
    let engine = build_engine(&config)?;

    preview::extract_frame(&engine, input, at, output).await?;

    println!("Frame written: {}", output.display());
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path);
    let registry = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in registry.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            println!("  Default fps: {}", config.convert.default_fps);
            println!("  Default quality: {}", config.convert.default_quality);
            println!(
                "  Buffer size limit: {} bytes",
                config.convert.buffer_size_limit
            );
            for warning in config.validate() {
                println!("  warning: {warning}");
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Default fps: {}", config.convert.default_fps);
            println!("  Default quality: {}", config.convert.default_quality);
            println!(
                "  Buffer size limit: {} bytes",
                config.convert.buffer_size_limit
            );
        }
    }

    Ok(())
}
