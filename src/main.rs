use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use vendor_stock::api::{self, AppState};
use vendor_stock::shop::{self, HotReloadEvent, ShopRegistry};
use vendor_stock::{ServerConfig, VendorManager};

#[derive(Parser, Debug)]
#[command(name = "vendor-stock", about = "Vendor stock server")]
struct Args {
    /// Path to the server config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Seed for vendor RNG streams (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize logging
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "vendor_stock=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = match ServerConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    // Load the item catalog, then shop archetypes validated against it
    let shops = Arc::new(RwLock::new(ShopRegistry::from_data_dir(&config.data_dir)));

    let resolver = Arc::new(config.resolver());
    let snapshot = Arc::new(config.features.clone());
    let vendors = Arc::new(VendorManager::new(config.seed));

    // One vendor per archetype to start with
    for definition in shops.read().await.sorted() {
        vendors.spawn(&definition, &resolver, &snapshot);
    }

    if config.hot_reload && config.shops_dir().exists() {
        match shop::start_file_watcher(Arc::clone(&shops), config.data_dir.clone()) {
            Ok(mut rx) => {
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        match event {
                            HotReloadEvent::Reloaded { path, shops } => {
                                info!(
                                    "Catalog reloaded after change to {} ({} shops)",
                                    path, shops
                                );
                            }
                            HotReloadEvent::Error(e) => {
                                warn!("Catalog reload error: {}", e);
                            }
                        }
                    }
                });
            }
            Err(e) => {
                warn!("Failed to start catalog hot-reload watcher: {}", e);
            }
        }
    }

    let state = AppState {
        shops,
        vendors,
        resolver,
        snapshot,
    };

    // Spawn restock loop
    let restock_state = state.clone();
    let restock_every = Duration::from_secs(config.restock_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(restock_every);
        // The first tick fires immediately and vendors were just stocked
        interval.tick().await;
        loop {
            interval.tick().await;
            let shops = restock_state.shops.read().await;
            restock_state
                .vendors
                .restock_all(&shops, &restock_state.resolver, &restock_state.snapshot);
        }
    });

    let app = api::router(state);

    let addr: SocketAddr = match config.bind_address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address '{}': {}", config.bind_address, e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Vendor stock server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
