use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use parkledger::geo::{self, LocationSource, Lookup};
use parkledger::{
    ClientTier, Coordinates, CsvExporter, ExportStatus, Ledger, LedgerConfig, RecoveryPolicy,
    Reporter,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parkledger")]
#[command(about = "Parking occupancy and billing ledger")]
struct Cli {
    /// Snapshot file
    #[arg(long, default_value = "parqueadero_data.json")]
    data: PathBuf,

    /// Operator stamped on check-outs
    #[arg(long)]
    operator: Option<String>,

    /// Car slots when starting without a snapshot
    #[arg(long, default_value_t = 50)]
    car: u32,

    /// Motorcycle slots when starting without a snapshot
    #[arg(long, default_value_t = 80)]
    motorcycle: u32,

    /// Bicycle slots when starting without a snapshot
    #[arg(long, default_value_t = 20)]
    bicycle: u32,

    /// Move an unreadable snapshot aside instead of failing
    #[arg(long)]
    recover_empty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a vehicle entering the lot
    CheckIn {
        plate: String,
        /// car, motorcycle, bicycle (or carro, moto, bici)
        kind: String,
        #[arg(long, default_value = "normal")]
        tier: String,
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Do not generate a campus location when none is given
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        no_location: bool,
    },
    /// Register a vehicle leaving the lot and print the fee
    CheckOut { plate: String },
    /// List parked vehicles
    List,
    /// Show free slots per type
    Capacity,
    /// Long stays and nearly-full types
    Alerts,
    /// Write the visit history as CSV
    Export { path: PathBuf },
    /// Revenue per operator
    Operators,
    /// Print a map link for a vehicle's location
    Locate { plate: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = LedgerConfig::new()
        .data_path(&cli.data)
        .slots("car", cli.car)
        .slots("motorcycle", cli.motorcycle)
        .slots("bicycle", cli.bicycle)
        .recovery(if cli.recover_empty {
            RecoveryPolicy::StartEmpty
        } else {
            RecoveryPolicy::FailFast
        });

    let mut ledger = Ledger::open(config)
        .with_context(|| format!("Failed to open ledger at '{}'", cli.data.display()))?;
    if let Some(operator) = cli.operator {
        info!(operator = %operator, "operator logged in");
        ledger.set_operator(operator);
    }

    match cli.command {
        Command::CheckIn {
            plate,
            kind,
            tier,
            lat,
            lon,
            no_location,
        } => check_in(&mut ledger, &plate, &kind, &tier, lat.zip(lon), no_location),
        Command::CheckOut { plate } => check_out(&mut ledger, &plate),
        Command::List => {
            if ledger.active_vehicles().is_empty() {
                println!("The lot is empty.");
            } else {
                Reporter::new(&ledger).occupancy_table().print();
            }
            Ok(())
        }
        Command::Capacity => {
            Reporter::new(&ledger).capacity_table().print();
            Ok(())
        }
        Command::Alerts => {
            let alerts = Reporter::new(&ledger).alerts(ledger.now());
            if alerts.is_empty() {
                println!("No alerts.");
            }
            for alert in alerts {
                println!("{}", alert);
            }
            Ok(())
        }
        Command::Export { path } => {
            let reporter = Reporter::new(&ledger).with_exporter(CsvExporter);
            match reporter.export_history(&path)? {
                ExportStatus::Written { rows, path } => {
                    println!("Exported {} visits to '{}'.", rows, path.display())
                }
                ExportStatus::Empty => println!("No history to export."),
                ExportStatus::Unavailable { capability } => {
                    println!("Export unavailable: {} is not installed.", capability)
                }
            }
            Ok(())
        }
        Command::Operators => {
            let reporter = Reporter::new(&ledger);
            if ledger.history().is_empty() {
                println!("No history.");
            } else {
                reporter.revenue_table().print();
            }
            Ok(())
        }
        Command::Locate { plate } => {
            match geo::locate(&ledger, &plate) {
                Lookup::Found {
                    plate,
                    coordinates,
                    source,
                } => {
                    let label = match source {
                        LocationSource::Parked => "currently parked",
                        LocationSource::LastKnown => "last known",
                    };
                    println!("{} ({}) at {}", plate, label, coordinates);
                    println!("{}", geo::map_link(coordinates));
                }
                Lookup::NoCoordinates => println!("The vehicle has no registered location."),
                Lookup::NotFound => println!("No location found for that plate."),
            }
            Ok(())
        }
    }
}

fn check_in(
    ledger: &mut Ledger,
    plate: &str,
    kind: &str,
    tier: &str,
    location: Option<(f64, f64)>,
    no_location: bool,
) -> Result<()> {
    if plate.trim().is_empty() {
        bail!("plate must not be empty");
    }
    let tier: ClientTier = tier.parse()?;
    let location = match location {
        Some((lat, lon)) => Some(Coordinates::new(lat, lon)),
        None if no_location => None,
        None => Some(geo::random_campus_location(&mut rand::thread_rng())),
    };

    let mut vehicle = ledger.new_vehicle(plate, kind).with_tier(tier);
    if let Some(location) = location {
        vehicle = vehicle.with_location(location);
    }

    let outcome = ledger.check_in(vehicle)?;
    if outcome.is_accepted() {
        println!("Check-in registered.");
    }
    for message in &outcome.messages {
        println!("{}", message);
    }
    Ok(())
}

fn check_out(ledger: &mut Ledger, plate: &str) -> Result<()> {
    match ledger.check_out(plate)? {
        Some(record) => println!(
            "Check-out registered. Total due: ${:.2} ({} hours).",
            record.total, record.hours
        ),
        None => println!("Vehicle not found."),
    }
    Ok(())
}
