//! SITS processor.
//!
//! Runs the satellite image time series processes against a WCS 2.0
//! coverage service:
//! - export of the aligned SITS with a manifest of the downloaded images
//! - rasterization of a reference land-cover dataset onto the SITS grid
//! - classification by an external algorithm validated against the
//!   reference land cover
//! - point queries of raster values

mod command;
mod config;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use raster_io::{extract_pixel_value, format_pixel_values};
use sits_common::Selection;
use sits_pipeline::{
    classify_and_validate, export_sits, load_coverage_records, ordered_identifiers,
    rasterize_land_cover, AlgorithmParams, DownloadOptions, ParamValue, ProcessContext,
};
use wcs_client::WcsClient;
use wcs_protocol::Interpolation;

use command::CommandAlgorithm;
use config::ProcessorConfig;

#[derive(Parser, Debug)]
#[command(name = "sits-processor")]
#[command(about = "Satellite image time series processing against a WCS 2.0 service")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "SITS_CONFIG", default_value = "config/sits.yaml")]
    config: PathBuf,

    /// WCS endpoint, overrides the configuration file
    #[arg(long, env = "SITS_WCS_URL")]
    wcs_url: Option<String>,

    /// Root of the process workspaces, overrides the configuration file
    #[arg(long, env = "SITS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the aligned SITS and write an index of the images
    Export(SitsArgs),

    /// Rasterize a reference land-cover dataset onto the SITS grid
    Rasterize {
        #[command(flatten)]
        sits: SitsArgs,

        /// Land-cover dataset identifier or title (default: the first one)
        #[arg(long)]
        land_cover: Option<String>,
    },

    /// Classify the SITS and validate the classes against the land cover
    Classify {
        #[command(flatten)]
        sits: SitsArgs,

        /// Configured algorithm name
        #[arg(long)]
        algorithm: String,

        /// Number of classes
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(2..=64))]
        nclasses: u32,

        /// Additional algorithm parameter, repeatable
        #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,

        /// Land-cover dataset identifier or title (default: the first one)
        #[arg(long)]
        land_cover: Option<String>,
    },

    /// Print the values of all bands at a WGS84 location
    Pixel {
        /// Raster file
        image: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Print a coverage description as JSON
    Describe {
        coverage_id: String,
    },
}

/// Inputs shared by the SITS processes.
#[derive(Args, Debug)]
struct SitsArgs {
    /// JSON selection (aoi/toi) of the time series
    #[arg(long)]
    selection: PathBuf,

    /// JSON list of coverage records of the time series
    #[arg(long)]
    coverages: PathBuf,

    /// Process identifier (default: generated from the current time)
    #[arg(long)]
    process_id: Option<String>,

    /// Image downscaling factor in (0, 1]
    #[arg(long, default_value = "1.0")]
    scaling_factor: f64,

    /// Interpolation used by the image re-sampling
    #[arg(long, default_value = "nearest-neighbour")]
    interp_method: Interpolation,
}

fn parse_param(s: &str) -> Result<(String, ParamValue), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    Ok((name.to_string(), ParamValue::parse(value)))
}

/// Inputs of one process run, resolved from the command line.
struct SitsJob {
    process_id: String,
    workspace: PathBuf,
    coverages: Vec<String>,
    selection: Selection,
    options: DownloadOptions,
}

impl SitsJob {
    fn prepare(args: &SitsArgs, workspace_root: &Path) -> Result<Self> {
        let selection_json = std::fs::read_to_string(&args.selection)
            .with_context(|| format!("Failed to read selection: {}", args.selection.display()))?;
        let selection = Selection::from_json(&selection_json)
            .with_context(|| format!("Invalid selection: {}", args.selection.display()))?;

        let records = load_coverage_records(&args.coverages)
            .with_context(|| format!("Failed to load coverages: {}", args.coverages.display()))?;
        let options = DownloadOptions::new(args.scaling_factor, args.interp_method)?;

        let process_id = args
            .process_id
            .clone()
            .unwrap_or_else(|| format!("sits-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S")));
        let workspace = workspace_root.join(&process_id);
        std::fs::create_dir_all(&workspace)
            .with_context(|| format!("Failed to create workspace: {}", workspace.display()))?;

        info!(
            process = %process_id,
            workspace = %workspace.display(),
            coverages = records.len(),
            "Prepared SITS process"
        );

        Ok(Self {
            process_id,
            workspace,
            coverages: ordered_identifiers(&records),
            selection,
            options,
        })
    }
}

fn print_progress(percent: u8, message: &str) {
    eprintln!("[{:>3}%] {}", percent, message);
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .context("Invalid log level")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    // Pixel queries need neither configuration nor service
    if let Commands::Pixel { image, lat, lon } = &cli.command {
        let values = extract_pixel_value(image, *lat, *lon)
            .with_context(|| format!("Failed to query {}", image.display()))?;
        println!("{}", format_pixel_values(values.as_deref()));
        return Ok(());
    }

    let config = if cli.config.exists() {
        ProcessorConfig::load(&cli.config)?
    } else {
        info!(path = %cli.config.display(), "No configuration file, using defaults");
        ProcessorConfig::default()
    };

    let wcs_url = cli
        .wcs_url
        .clone()
        .or_else(|| config.wcs.url.clone())
        .ok_or_else(|| anyhow!("No WCS URL given (--wcs-url, SITS_WCS_URL or wcs.url)"))?;
    let client = WcsClient::with_timeout(&wcs_url, config.wcs.timeout())
        .context("Failed to create WCS client")?;

    let workspace_root = cli
        .workspace
        .clone()
        .or_else(|| config.workspace.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    info!(wcs_url = %client.service_url(), "Starting SITS processor");

    match &cli.command {
        Commands::Describe { coverage_id } => {
            let description = client
                .describe_coverage(coverage_id)
                .with_context(|| format!("DescribeCoverage failed for {}", coverage_id))?;
            println!("{}", serde_json::to_string_pretty(&description)?);
        }

        Commands::Export(args) => {
            let job = SitsJob::prepare(args, &workspace_root)?;
            let mut progress = print_progress;
            let mut ctx = ProcessContext::new(&job.workspace, &job.process_id, &mut progress);

            let outputs = export_sits(
                &mut ctx,
                &client,
                &job.coverages,
                &job.selection,
                &job.options,
                |image: &Path| {
                    let filename = image
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let absolute = std::fs::canonicalize(image)?;
                    Ok((filename, format!("file://{}", absolute.display())))
                },
            )
            .context("SITS export failed")?;
            println!("{}", outputs.manifest.display());
        }

        Commands::Rasterize { sits, land_cover } => {
            let dataset = config.land_cover_dataset(land_cover.as_deref())?;
            let job = SitsJob::prepare(sits, &workspace_root)?;
            let mut progress = print_progress;
            let mut ctx = ProcessContext::new(&job.workspace, &job.process_id, &mut progress);

            let output = rasterize_land_cover(
                &mut ctx,
                &client,
                &job.coverages,
                &job.selection,
                &job.options,
                dataset,
            )
            .context("Land cover rasterization failed")?;
            println!("{}", output.display());
        }

        Commands::Classify {
            sits,
            algorithm,
            nclasses,
            params,
            land_cover,
        } => {
            let dataset = config.land_cover_dataset(land_cover.as_deref())?;
            let algorithm_config = config.algorithm(algorithm)?;
            let job = SitsJob::prepare(sits, &workspace_root)?;

            let algorithm = CommandAlgorithm::new(algorithm_config, &job.workspace);
            let params = params
                .iter()
                .cloned()
                .fold(AlgorithmParams::new(*nclasses), |p, (name, value)| p.with(name, value));

            let mut progress = print_progress;
            let mut ctx = ProcessContext::new(&job.workspace, &job.process_id, &mut progress);

            let outputs = classify_and_validate(
                &mut ctx,
                &client,
                &job.coverages,
                &job.selection,
                &job.options,
                &algorithm,
                &params,
                dataset,
            )
            .context("Classification failed")?;

            info!(
                pixels = outputs.matrix.total(),
                statistics = %outputs.statistics.display(),
                "Classification validated"
            );
            for path in outputs.algorithm.paths() {
                println!("{}", path.display());
            }
            println!("{}", outputs.land_cover.display());
            println!("{}", outputs.statistics.display());
        }

        Commands::Pixel { .. } => {}
    }

    Ok(())
}
