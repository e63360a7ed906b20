//! SiteFinder command-line host.
//!
//! # Responsibility
//! - Layer command-line flags over `CoreConfig` loaded from the environment.
//! - Bind query flags exactly the way HTTP hosts bind request pairs.
//! - Print results as GeoJSON on stdout, errors on stderr.
//!
//! Exit codes: 0 ok, 2 request error, 1 store or setup error.

use clap::{Parser, Subcommand};
use log::error;
use sitefinder_core::{
    init_from_config, open_db_with_busy_timeout, CoreConfig, ErrorKind, FeatureCollection,
    SiteQuery, SiteQueryService, SqliteSiteRepository,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sitefinder")]
#[command(about = "Find sites near a point", version)]
struct Cli {
    /// SQLite database file (overrides SITEFINDER_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute log directory (overrides SITEFINDER_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (overrides SITEFINDER_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query sites within a radius of a point
    Query {
        #[arg(long, allow_hyphen_values = true)]
        lat: String,

        #[arg(long, allow_hyphen_values = true)]
        lon: String,

        /// Radius in miles
        #[arg(long)]
        radius: String,

        /// Only carcinogen sites
        #[arg(long)]
        carcinogen: bool,

        #[arg(long)]
        release_type: Option<String>,

        #[arg(long)]
        substrate_type: Option<String>,

        /// Comma-separated; any of these
        #[arg(long)]
        sectors: Option<String>,

        /// Comma-separated equipment flags; all required
        #[arg(long)]
        equipment: Option<String>,

        /// Comma-separated amenity flags; all required
        #[arg(long)]
        amenities: Option<String>,

        /// Comma-separated sports facility flags; all required
        #[arg(long)]
        sports_facilities: Option<String>,
    },

    /// Print one site by id
    Site {
        site_id: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    if let Err(err) = init_from_config(&config) {
        eprintln!("error: {err}");
        return ExitCode::from(1);
    }

    let conn = match open_db_with_busy_timeout(&config.db_path, config.busy_timeout) {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=cli_open module=cli status=error error={err}");
            eprintln!("error: cannot open {}: {err}", config.db_path.display());
            return ExitCode::from(1);
        }
    };
    let service = SiteQueryService::new(SqliteSiteRepository::new(&conn));

    match cli.command {
        Commands::Query {
            lat,
            lon,
            radius,
            carcinogen,
            release_type,
            substrate_type,
            sectors,
            equipment,
            amenities,
            sports_facilities,
        } => {
            let mut pairs = vec![
                ("lat", lat),
                ("lon", lon),
                ("radius", radius),
                ("carcinogen", carcinogen.to_string()),
            ];
            for (key, value) in [
                ("release_type", release_type),
                ("substrate_type", substrate_type),
                ("sectors", sectors),
                ("equipment", equipment),
                ("amenities", amenities),
                ("sports_facilities", sports_facilities),
            ] {
                if let Some(value) = value {
                    pairs.push((key, value));
                }
            }

            let result = SiteQuery::from_pairs(pairs)
                .and_then(|query| service.query_features(&query));
            match result {
                Ok(collection) => print_json(&collection),
                Err(err) => fail(err.kind(), &err),
            }
        }
        Commands::Site { site_id } => match service.site(&site_id) {
            Ok(Some(record)) => print_json(&FeatureCollection::from_records(&[record], None)),
            Ok(None) => fail(ErrorKind::NotFound, &format!("site not found: {site_id}")),
            Err(err) => fail(err.kind(), &err),
        },
    }
}

fn print_json(collection: &FeatureCollection) -> ExitCode {
    match collection.to_json() {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => fail(ErrorKind::StoreQueryFailed, &err),
    }
}

fn fail(kind: ErrorKind, err: &dyn std::fmt::Display) -> ExitCode {
    eprintln!("error[{}]: {err}", kind.as_str());
    if kind.is_client_error() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}
