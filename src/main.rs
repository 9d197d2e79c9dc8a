//! Incident radiation CLI.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use incident_radiation::io::{self, results};
use incident_radiation::{
    AnalysisPeriod, ClearSkyModel, EvaluationMode, Location, Mesh, RadiationStudy, SensorGrid,
    SkyDensity, SkySource, StudyConfig,
};

#[derive(Parser)]
#[command(name = "incident-radiation")]
#[command(author, version, about = "Cumulative incident solar radiation on sensor grids", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an incident radiation study
    Run(RunArgs),
    /// Print the default study configuration as JSON
    Config,
}

#[derive(Args)]
struct RunArgs {
    /// Weather file (.epw, or .csv with timestamp,direct_normal,diffuse_horizontal)
    #[arg(long, required_unless_present = "clear_sky")]
    weather: Option<PathBuf>,
    /// Use the analytic clear sky instead of a weather file
    #[arg(long, conflicts_with = "weather")]
    clear_sky: bool,
    /// Site latitude in degrees (clear sky and CSV weather)
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<f64>,
    /// Site longitude in degrees, positive east
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<f64>,
    /// Time zone in hours from UTC
    #[arg(long, allow_hyphen_values = true)]
    timezone: Option<f64>,
    /// Site elevation in meters
    #[arg(long, default_value_t = 0.0)]
    elevation: f64,
    /// Sensor points (.pts) or sensor mesh (.stl)
    #[arg(long)]
    sensors: Vec<PathBuf>,
    /// Opaque context geometry (.stl)
    #[arg(long)]
    context: Vec<PathBuf>,
    /// Study configuration (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ground reflectance
    #[arg(long)]
    reflectance: Option<f64>,
    /// Use the 577-patch sky
    #[arg(long)]
    high_density: bool,
    /// North angle in degrees, counter-clockwise from +Y
    #[arg(long, allow_hyphen_values = true)]
    north: Option<f64>,
    /// Analysis period, e.g. "1/1 0-12/31 23"
    #[arg(long)]
    period: Option<AnalysisPeriod>,
    /// Report average irradiance (W/m2) instead of cumulative radiation (Wh/m2)
    #[arg(long)]
    average_irradiance: bool,
    /// Sensor offset along the normal in meters
    #[arg(long)]
    offset: Option<f64>,
    /// Worker threads
    #[arg(long)]
    threads: Option<usize>,
    /// Output directory
    #[arg(short, long)]
    output: PathBuf,
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Config => {
            println!("{}", StudyConfig::new().to_json()?);
            Ok(())
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let start = Instant::now();
    let config = study_config(&args)?;
    let source = sky_source(&args)?;
    let grids = read_sensor_grids(&args.sensors)?;
    let context = read_context(&args.context)?;

    let mut study = RadiationStudy::new(config);
    let output = study.run(&source, &grids, &context)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    results::write_grid_results(&args.output, &output.result, &output.grids)?;
    results::write_values_csv(&args.output.join("results.csv"), &output.result)?;
    results::write_summary(&args.output.join("summary.json"), &output.summary)?;

    info!(
        output = %args.output.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Results written"
    );
    println!("{}", serde_json::to_string_pretty(&output.summary)?);
    Ok(())
}

fn study_config(args: &RunArgs) -> Result<StudyConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            StudyConfig::from_json(&content)?
        }
        None => StudyConfig::new(),
    };
    if let Some(r) = args.reflectance {
        config.reflectance = r;
    }
    if args.high_density {
        config.sky.density = SkyDensity::high();
    }
    if let Some(north) = args.north {
        config.sky.north = north;
    }
    if let Some(period) = args.period {
        config.period = period;
    }
    if args.average_irradiance {
        config.evaluation.mode = EvaluationMode::AverageIrradiance;
    }
    if let Some(offset) = args.offset {
        config.evaluation.offset = offset;
    }
    if args.threads.is_some() {
        config.evaluation.num_threads = args.threads;
    }
    Ok(config)
}

/// Site from the location flags: all of them or none.
fn location(args: &RunArgs) -> Result<Option<Location>> {
    match (args.latitude, args.longitude, args.timezone) {
        (Some(lat), Some(lon), Some(tz)) => {
            Ok(Some(Location::new("Site", lat, lon, tz, args.elevation)))
        }
        (None, None, None) => Ok(None),
        _ => bail!("--latitude, --longitude and --timezone must be given together"),
    }
}

fn sky_source(args: &RunArgs) -> Result<SkySource> {
    let site = location(args)?;
    if args.clear_sky {
        let Some(location) = site else {
            bail!("--clear-sky requires --latitude, --longitude and --timezone");
        };
        return Ok(SkySource::ClearSky(ClearSkyModel::new(location)));
    }
    let Some(path) = &args.weather else {
        bail!("either --weather or --clear-sky is required");
    };
    Ok(SkySource::Measured(io::read_weather(path, site)?))
}

fn grid_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grid".to_string())
}

fn read_sensor_grids(paths: &[PathBuf]) -> Result<Vec<SensorGrid>> {
    if paths.is_empty() {
        bail!("at least one --sensors file is required");
    }
    paths
        .iter()
        .map(|path| {
            let name = grid_name(path);
            let is_stl = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("stl"));
            if is_stl {
                let mesh = io::read_stl(path)?;
                Ok(SensorGrid::from_mesh(&name, &mesh)?)
            } else {
                Ok(SensorGrid::new(&name, io::read_pts(path)?))
            }
        })
        .collect()
}

fn read_context(paths: &[PathBuf]) -> Result<Mesh> {
    let meshes = paths
        .iter()
        .map(|p| io::read_stl(p))
        .collect::<Result<Vec<Mesh>>>()?;
    Ok(Mesh::join_meshes(&meshes))
}
