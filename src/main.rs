//! blockd - Clustered Block Storage Driver Daemon
//!
//! Connects to a storage backend, performs the cold catalog populate,
//! then serves the REST API while a background task reconciles stale
//! pools on a fixed cadence.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blockd::{
    ApiServer, ApiServerConfig, BackendFactory, BlockDriver, DriverConfig, Error, RefreshEngine,
    Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// blockd - Clustered block storage driver with a cached pool catalog
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML config file; CLI flags override it
    #[arg(long, env = "BLOCKD_CONFIG")]
    config: Option<String>,

    /// REST API bind address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8090")]
    api_addr: String,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: String,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: String,

    /// Backend variant (cluster or single)
    #[arg(long, env = "BLOCKD_BACKEND")]
    backend: Option<String>,

    /// Backend management API endpoint
    #[arg(long, env = "BLOCKD_ENDPOINT")]
    endpoint: Option<String>,

    /// Backend management API login
    #[arg(long, env = "BLOCKD_USERNAME")]
    username: Option<String>,

    /// Backend management API password
    #[arg(long, env = "BLOCKD_PASSWORD")]
    password: Option<String>,

    /// Tenant/vserver context
    #[arg(long, env = "BLOCKD_CONTEXT")]
    context: Option<String>,

    /// Capacity de-rating multiplier
    #[arg(long, env = "BLOCKD_SIZE_MULTIPLIER")]
    size_multiplier: Option<f64>,

    /// Staleness check interval in seconds
    #[arg(long, env = "BLOCKD_REFRESH_INTERVAL")]
    refresh_interval_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    /// Merge the config file (if any) with CLI/env overrides
    fn driver_config(&self) -> Result<DriverConfig> {
        let mut config = match &self.config {
            Some(path) => DriverConfig::from_file(path)?,
            None => DriverConfig::default(),
        };

        if let Some(backend) = &self.backend {
            config.backend = backend.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(context) = &self.context {
            config.context = context.clone();
        }
        if let Some(multiplier) = self.size_multiplier {
            config.size_multiplier = multiplier;
        }
        if let Some(interval) = self.refresh_interval_secs {
            config.refresh_interval_secs = interval;
        }

        Ok(config)
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting blockd");
    info!("  Version: {}", blockd::VERSION);
    info!("  REST API: {}", args.api_addr);

    let config = args.driver_config()?;
    let refresh_interval = config.refresh_interval_secs;

    let backend = BackendFactory::create(&config)?;
    info!("Backend adapter initialized: {}", backend.backend_name());

    let driver = BlockDriver::new(config, backend);

    // Cold path: block until the first full inventory scan completes.
    driver.setup().await?;

    let shutdown = CancellationToken::new();

    // Periodic staleness check
    spawn_refresh_loop(
        Arc::clone(driver.refresh_engine()),
        refresh_interval,
        shutdown.clone(),
    );

    // Health server
    let health_addr = args.health_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_health_server(&health_addr).await {
            error!("Health server error: {}", e);
        }
    });

    // Metrics server
    let metrics_addr = args.metrics_addr.clone();
    let metrics_driver = Arc::clone(&driver);
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(&metrics_addr, metrics_driver).await {
            error!("Metrics server error: {}", e);
        }
    });

    // REST API server
    let api_config = ApiServerConfig {
        rest_addr: args
            .api_addr
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid REST API address: {}", e)))?,
    };
    let api_server = Arc::new(ApiServer::new(api_config, Arc::clone(&driver)));

    let server = Arc::clone(&api_server);
    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            shutdown.cancel();
            api_server.shutdown();
        }
    }

    info!("Driver shutdown complete");
    Ok(())
}

// =============================================================================
// Periodic Refresh
// =============================================================================

/// Reconcile stale pools on a fixed cadence
///
/// Stats requests already trigger deferred rescans opportunistically;
/// this loop covers deployments where mutations happen but nobody asks
/// for stats.
fn spawn_refresh_loop(engine: Arc<RefreshEngine>, interval_secs: u64, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if engine.stale().is_dirty() {
                        if let Err(error) = engine.rescan_if_idle().await {
                            warn!(%error, "periodic catalog rescan failed");
                        }
                    }
                }
            }
        }
    });
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap())
        .add_directive("axum=info".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Health Server
// =============================================================================

async fn run_health_server(addr: &str) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let response = match req.uri().path() {
                "/healthz" | "/livez" => Response::builder()
                    .status(StatusCode::OK)
                    .body(Body::from("ok"))
                    .unwrap(),
                "/readyz" => Response::builder()
                    .status(StatusCode::OK)
                    .body(Body::from("ok"))
                    .unwrap(),
                _ => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("not found"))
                    .unwrap(),
            };
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid health server address: {}", e)))?;

    info!("Health server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Health server error: {}", e)))?;

    Ok(())
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: &str, driver: Arc<BlockDriver>) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};
    use prometheus::{Encoder, TextEncoder};

    let pools_gauge = prometheus::register_int_gauge!(
        "blockd_catalog_pools",
        "Number of pools in the catalog snapshot"
    )
    .map_err(|e| Error::Internal(format!("metric registration failed: {}", e)))?;
    let stale_gauge = prometheus::register_int_gauge!(
        "blockd_stale_pools",
        "Number of pools currently marked stale"
    )
    .map_err(|e| Error::Internal(format!("metric registration failed: {}", e)))?;
    let luns_gauge = prometheus::register_int_gauge!(
        "blockd_luns_tracked",
        "Number of LUNs tracked by the driver"
    )
    .map_err(|e| Error::Internal(format!("metric registration failed: {}", e)))?;

    let make_svc = make_service_fn(move |_conn| {
        let driver = Arc::clone(&driver);
        let pools_gauge = pools_gauge.clone();
        let stale_gauge = stale_gauge.clone();
        let luns_gauge = luns_gauge.clone();
        async move {
            Ok::<_, std::convert::Infallible>(service_fn(move |req: Request<Body>| {
                let driver = Arc::clone(&driver);
                let pools_gauge = pools_gauge.clone();
                let stale_gauge = stale_gauge.clone();
                let luns_gauge = luns_gauge.clone();
                async move {
                    let response = match req.uri().path() {
                        "/metrics" => {
                            let engine = driver.refresh_engine();
                            let pools = engine
                                .catalog()
                                .snapshot()
                                .map(|catalog| catalog.len())
                                .unwrap_or(0);
                            pools_gauge.set(pools as i64);
                            stale_gauge.set(engine.stale().len() as i64);
                            luns_gauge.set(driver.luns().len() as i64);

                            let encoder = TextEncoder::new();
                            let metric_families = prometheus::gather();
                            let mut buffer = Vec::new();
                            if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                                error!("Metrics encoding failed: {}", e);
                            }

                            Response::builder()
                                .status(StatusCode::OK)
                                .header("Content-Type", encoder.format_type())
                                .body(Body::from(buffer))
                                .unwrap()
                        }
                        _ => Response::builder()
                            .status(StatusCode::NOT_FOUND)
                            .body(Body::from("not found"))
                            .unwrap(),
                    };
                    Ok::<_, std::convert::Infallible>(response)
                }
            }))
        }
    });

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid metrics server address: {}", e)))?;

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}
