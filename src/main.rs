use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, CommandFactory, Parser, Subcommand};
use comfy_table::{Cell, Color, Table};
use inquire::InquireError;
use tracing_subscriber::EnvFilter;

use sitekit::coverage::geocode::NominatimGeocoder;
use sitekit::coverage::location::{FixedLocation, IpLocation, LocationProvider};
use sitekit::coverage::session::{CoverageSession, SearchState};
use sitekit::coverage::{CoverageResult, CoverageZone, GeoPoint};
use sitekit::project::export::{from_json, print_html, DirectoryExporter, SystemViewer};
use sitekit::project::{Overview, Wizard};
use sitekit::prompt::run_wizard;
use sitekit::settings::{get_config_path, load_settings, save_settings, AppSettings};

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "sitekit", version, about = "Coverage checks and project overviews")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service coverage
    #[command(subcommand)]
    Coverage(CoverageCommand),
    /// Project configuration wizard
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Show or initialise the settings file
    Config {
        /// Write the current settings (defaults if none) to disk
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum CoverageCommand {
    /// Look up an address and check whether it is covered
    Check {
        /// Street address, suburb or city
        #[arg(required = true, num_args = 1..)]
        address: Vec<String>,
    },
    /// Check the current device location
    #[command(allow_negative_numbers = true)]
    Locate(LocateArgs),
    /// Check a known coordinate without any network access
    #[command(allow_negative_numbers = true)]
    Point { lat: f64, lng: f64 },
    /// List the configured coverage zones
    Zones,
}

#[derive(Args)]
struct LocateArgs {
    /// Latitude reported by the device
    #[arg(long, requires = "lng")]
    lat: Option<f64>,
    /// Longitude reported by the device
    #[arg(long, requires = "lat")]
    lng: Option<f64>,
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Fill in a new project configuration
    New,
    /// Render the overview of a saved JSON snapshot
    Render {
        file: PathBuf,
        /// Write a printable HTML document and open it
        #[arg(long)]
        html: bool,
    },
}

// ==========================================
// Main Function
// ==========================================

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(get_config_path);
    let settings = load_settings(&config_path)
        .with_context(|| format!("failed to load settings from {}", config_path.display()))?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Coverage(cmd) => run_coverage(cmd, &settings),
        Commands::Project(cmd) => run_project(cmd, &settings),
        Commands::Config { init } => {
            if init {
                save_settings(&config_path, &settings)?;
                println!("✅ Settings saved: {}", config_path.display());
            }
            println!("⚙️  {}\n", config_path.display());
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

// ==========================================
// Coverage
// ==========================================

fn run_coverage(cmd: CoverageCommand, settings: &AppSettings) -> Result<()> {
    let zones = settings.zones().context("failed to load coverage zones")?;
    let mut session = CoverageSession::new();

    match cmd {
        CoverageCommand::Check { address } => {
            let address = address.join(" ");
            let geocoder = NominatimGeocoder::new(&settings.geocoder)?;
            println!("🔍 Searching: {address}");
            show_search(session.check_address(&geocoder, &zones, &address), &zones);
        }
        CoverageCommand::Locate(args) => {
            let provider: Box<dyn LocationProvider> = match (args.lat, args.lng) {
                (Some(lat), Some(lng)) => Box::new(FixedLocation(GeoPoint::new(lat, lng))),
                _ => Box::new(IpLocation::new(&settings.location)),
            };
            println!("📍 Getting your location...");
            show_search(session.check_location(provider.as_ref(), &zones), &zones);
        }
        CoverageCommand::Point { lat, lng } => {
            show_search(session.check_point(&zones, GeoPoint::new(lat, lng)), &zones);
        }
        CoverageCommand::Zones => print_zones(&zones),
    }
    Ok(())
}

fn show_search(state: &SearchState, zones: &[CoverageZone]) {
    match state {
        SearchState::Done(report) => {
            println!("📌 {}", report.point);
            match report.result {
                CoverageResult::Covered => {
                    let name = report
                        .zone
                        .as_deref()
                        .and_then(|id| zones.iter().find(|z| z.id == id))
                        .map(|z| z.name.as_str())
                        .unwrap_or("coverage area");
                    println!("✅ Great news! You're covered ({name}).");
                }
                CoverageResult::NotCovered => {
                    println!("❌ Not covered yet. We're expanding, check back soon.");
                }
            }
        }
        SearchState::Failed(message) => println!("⚠️  {message}"),
        SearchState::Idle => println!("Please enter an address to search."),
        SearchState::Searching => {}
    }
}

fn print_zones(zones: &[CoverageZone]) {
    if zones.is_empty() {
        println!("(No coverage zones configured)");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![Cell::new("Id"), Cell::new("Name"), Cell::new("Points"), Cell::new("Color")]);
    for zone in zones {
        table.add_row(vec![
            Cell::new(&zone.id),
            Cell::new(&zone.name),
            Cell::new(zone.coordinates.len()),
            Cell::new(&zone.color).fg(hex_color(&zone.color).unwrap_or(Color::Reset)),
        ]);
    }
    println!("{table}");
}

fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb { r: channel(0)?, g: channel(2)?, b: channel(4)? })
}

// ==========================================
// Project
// ==========================================

fn run_project(cmd: ProjectCommand, settings: &AppSettings) -> Result<()> {
    let exporter = DirectoryExporter::new(settings.output_path());

    match cmd {
        ProjectCommand::New => {
            let mut wizard = Wizard::new();
            match run_wizard(&mut wizard, &exporter, &SystemViewer) {
                Ok(()) => {}
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    println!("Cancelled");
                }
                Err(e) => return Err(e).context("wizard prompt failed"),
            }
        }
        ProjectCommand::Render { file, html } => {
            let content = fs::read_to_string(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let config = from_json(&content).with_context(|| format!("{} is not a project snapshot", file.display()))?;
            let overview = Overview::from_config(&config, Local::now().date_naive());

            if html {
                let rendered = overview.render_html()?;
                let path = print_html(&exporter, &SystemViewer, &config, &rendered)?;
                println!("🖨️  Opened for printing: {}", path.display());
            } else {
                println!("{}", overview.render_table());
            }
        }
    }
    Ok(())
}
