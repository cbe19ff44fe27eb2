use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use log::*;

use citytrip::{
    commands::{self, Command, Context},
    config::Config,
    distance::Coordinates,
    services::{
        auth::MemoryAuth,
        geocoding::{GeocodingService, GoogleMapsService},
        location::{FixedLocation, GeocodedLocation, LocationProvider},
        storage::FsBlobStore,
        DocumentStore, MemoryStore, SupabaseService,
    },
    GenericError,
};

#[derive(Debug, Parser)]
#[command(name = "citytrip", about = "Browse, add and review city trips.")]
struct Args {
    #[arg(long, env = "CITYTRIP_LOG_LEVEL", default_value = "info")]
    log_level: LevelFilter,

    /// Serve from an in-memory store seeded with this JSON file instead of
    /// Supabase.
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    /// Your position as `lat,lng`.
    #[arg(long, global = true, value_parser = parse_position, conflicts_with = "near")]
    at: Option<Coordinates>,

    /// Your position as a place name, geocoded with Google Maps.
    #[arg(long, global = true)]
    near: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn parse_position(text: &str) -> Result<Coordinates, String> {
    Coordinates::parse(text).map_err(|why| why.to_string())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    env_logger::builder()
        .filter_module("citytrip", args.log_level)
        .parse_default_env()
        .init();
    trace!("Logger init with level {}.", args.log_level);

    if let Err(why) = run(args).await {
        error!("{}", why);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), GenericError> {
    let config = Config::from_env()?;

    let store: Arc<dyn DocumentStore> = match &args.seed {
        Some(path) => {
            let seed = serde_json::from_str(&tokio::fs::read_to_string(path).await?)?;
            debug!("Seeding in-memory store from {}.", path.display());
            Arc::new(MemoryStore::from_seed(&seed).await?)
        }
        None => Arc::new(SupabaseService::new(&config)?),
    };

    let location: Arc<dyn LocationProvider> = match (args.at, &args.near) {
        (Some(position), _) => Arc::new(FixedLocation::at(position)),
        (None, Some(place)) => {
            let geocoder: GoogleMapsService = GeocodingService::new(&config)?;
            Arc::new(GeocodedLocation::new(place, Arc::new(geocoder)))
        }
        (None, None) => Arc::new(FixedLocation::unknown()),
    };

    let auth = match config.user.clone() {
        Some(user) => MemoryAuth::signed_in(user),
        None => MemoryAuth::new(),
    };

    let ctx = Context {
        store,
        auth: Arc::new(auth),
        blobs: Arc::new(FsBlobStore::new(config.image_dir.clone())),
        location,
    };
    commands::run(&ctx, args.command).await
}
