use clap::Parser;
use pkg_admission::policy::ResourcePolicy;
use pkg_admission::quota::QuotaLimits;
use pkg_api::server::{ClusterMode, ServerConfig, start_server};
use pkg_constants::lifecycle::{
    DEFAULT_CLUSTER_TIMEOUT_SECS, DEFAULT_LIFETIME_SECS, DEFAULT_MAX_DELETE_RETRIES,
    DEFAULT_SWEEP_INTERVAL_SECS, SWEEP_INTERVAL_DIVISOR,
};
use pkg_constants::network::DEFAULT_API_PORT;
use pkg_constants::paths::{DEFAULT_SERVER_CONFIG, DEFAULT_SERVER_DATA_DIR};
use pkg_constants::quota::{DEFAULT_MAX_DEPLOYMENTS, DEFAULT_WINDOW_SECS};
use pkg_controllers::lifecycle::LifecycleConfig;
use pkg_types::config::{GatewayConfigFile, load_config_file};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "paved-server",
    about = "Admission gateway for short-lived sandboxed deployments"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_SERVER_CONFIG)]
    config: String,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Directory for SlateDB state storage
    #[arg(long)]
    data_dir: Option<String>,

    /// Cluster backend: `kube` or `memory`
    #[arg(long)]
    cluster: Option<String>,

    /// Deployment lifetime in seconds
    #[arg(long)]
    lifetime_secs: Option<u64>,

    /// Interval between expiry sweeps in seconds
    #[arg(long)]
    sweep_interval_secs: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: GatewayConfigFile = load_config_file(&cli.config)?;
    init_tracing(cli.log_json || file_cfg.log_json.unwrap_or(false));
    info!("Config file: {}", cli.config);

    let config = resolve(cli, file_cfg)?;

    info!("Starting paved-server");
    info!("  Listen:     {}", config.addr);
    info!("  Data dir:   {}", config.data_dir);
    info!("  Cluster:    {:?}", config.cluster);
    info!("  Lifetime:   {}s", config.lifecycle.lifetime.as_secs());
    info!("  Sweep:      {}s", config.lifecycle.sweep_interval.as_secs());
    info!(
        "  Quota:      {} per {}s",
        config.quota.max_deployments,
        config.quota.window.as_secs()
    );
    info!("  Images:     {}", config.policy.allowed_images.len());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            cancel.cancel();
        }
    });

    start_server(config, cancel).await?;
    info!("paved-server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Merge: CLI args > config file > defaults, then check the result is usable.
fn resolve(cli: Cli, file: GatewayConfigFile) -> anyhow::Result<ServerConfig> {
    let port = cli.port.or(file.port).unwrap_or(DEFAULT_API_PORT);
    let data_dir = cli
        .data_dir
        .or(file.data_dir)
        .unwrap_or_else(|| DEFAULT_SERVER_DATA_DIR.to_string());
    let cluster: ClusterMode = cli
        .cluster
        .or(file.cluster)
        .as_deref()
        .unwrap_or("kube")
        .parse()?;

    let lifecycle = LifecycleConfig {
        lifetime: Duration::from_secs(
            cli.lifetime_secs
                .or(file.lifetime_secs)
                .unwrap_or(DEFAULT_LIFETIME_SECS),
        ),
        sweep_interval: Duration::from_secs(
            cli.sweep_interval_secs
                .or(file.sweep_interval_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        ),
        max_delete_retries: file
            .max_delete_retries
            .unwrap_or(DEFAULT_MAX_DELETE_RETRIES),
        cluster_timeout: Duration::from_secs(
            file.cluster_timeout_secs
                .unwrap_or(DEFAULT_CLUSTER_TIMEOUT_SECS),
        ),
    };
    let quota = QuotaLimits {
        max_deployments: file
            .quota
            .max_deployments
            .unwrap_or(DEFAULT_MAX_DEPLOYMENTS),
        window: Duration::from_secs(file.quota.window_secs.unwrap_or(DEFAULT_WINDOW_SECS)),
    };
    check_timings(&lifecycle, &quota)?;

    if file.principals.is_empty() {
        tracing::warn!("No principals configured; every API call will be rejected");
    }

    Ok(ServerConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], port)),
        data_dir,
        cluster,
        lifecycle,
        quota,
        policy: Arc::new(ResourcePolicy::from_config(&file.policy)?),
        principals: file.principals,
    })
}

fn check_timings(lifecycle: &LifecycleConfig, quota: &QuotaLimits) -> anyhow::Result<()> {
    if lifecycle.lifetime.is_zero() {
        anyhow::bail!("lifetime-secs must be greater than zero");
    }
    if lifecycle.sweep_interval.is_zero() {
        anyhow::bail!("sweep-interval-secs must be greater than zero");
    }
    let max_sweep = lifecycle.lifetime / SWEEP_INTERVAL_DIVISOR as u32;
    if lifecycle.sweep_interval > max_sweep {
        anyhow::bail!(
            "sweep-interval-secs ({}) must be at most lifetime-secs / {} ({}s)",
            lifecycle.sweep_interval.as_secs(),
            SWEEP_INTERVAL_DIVISOR,
            max_sweep.as_secs()
        );
    }
    if lifecycle.max_delete_retries == 0 {
        anyhow::bail!("max-delete-retries must be at least 1");
    }
    if lifecycle.cluster_timeout.is_zero() {
        anyhow::bail!("cluster-timeout-secs must be greater than zero");
    }
    if quota.max_deployments == 0 {
        anyhow::bail!("quota.max-deployments must be at least 1");
    }
    if quota.window.is_zero() {
        anyhow::bail!("quota.window-secs must be greater than zero");
    }
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
