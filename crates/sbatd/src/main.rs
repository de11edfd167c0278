// # sbatd - SBAT availability watcher daemon
//
// Headless shell around the core watcher. This binary only wires things
// together: it reads configuration from environment variables, resolves
// credentials, starts the watcher and turns its events into log lines.
// All polling, change-detection and token-lifecycle logic lives in
// sbat-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Credentials
// - `SBAT_USERNAME` / `SBAT_PASSWORD`: account credentials. When both are
//   set they are used directly and saved to the credential file, so later
//   runs can omit them.
// - `SBAT_CREDENTIALS_PATH`: credential file location
//   (default: sbat-credentials.json)
//
// ### Polling
// - `SBAT_BURST_SECS`: cadence during release hours (default: 30)
// - `SBAT_IDLE_SECS`: cadence outside release hours (default: 120)
//
// ### Endpoint
// - `SBAT_BASE_URL`: API base URL (default: the production SBAT API)
//
// ### Logging
// - `SBAT_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export SBAT_USERNAME=you@example.com
// export SBAT_PASSWORD=hunter2
// sbatd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use sbat_api_http::SbatApiClient;
use sbat_core::types::Credentials;
use sbat_core::{CadenceConfig, CredentialStore, FileCredentialStore, Watcher, WatcherConfig, WatcherEvent};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (includes rejected credentials)
#[derive(Debug, Clone, Copy)]
enum SbatdExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<SbatdExitCode> for ExitCode {
    fn from(code: SbatdExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    username: Option<String>,
    password: Option<String>,
    credentials_path: String,
    burst_secs: Option<u64>,
    idle_secs: Option<u64>,
    base_url: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            username: env::var("SBAT_USERNAME").ok(),
            password: env::var("SBAT_PASSWORD").ok(),
            credentials_path: env::var("SBAT_CREDENTIALS_PATH")
                .unwrap_or_else(|_| "sbat-credentials.json".to_string()),
            burst_secs: env::var("SBAT_BURST_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("SBAT_BURST_SECS is not a number: {}", e))?,
            idle_secs: env::var("SBAT_IDLE_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("SBAT_IDLE_SECS is not a number: {}", e))?,
            base_url: env::var("SBAT_BASE_URL")
                .unwrap_or_else(|_| sbat_api_http::DEFAULT_BASE_URL.to_string()),
            log_level: env::var("SBAT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.username.is_some() != self.password.is_some() {
            anyhow::bail!(
                "SBAT_USERNAME and SBAT_PASSWORD must be set together. \
                Set both, or neither to use the credential file."
            );
        }

        if self.credentials_path.is_empty() {
            anyhow::bail!("SBAT_CREDENTIALS_PATH cannot be empty");
        }

        if self.burst_secs == Some(0) {
            anyhow::bail!("SBAT_BURST_SECS must be at least 1");
        }
        if self.idle_secs == Some(0) {
            anyhow::bail!("SBAT_IDLE_SECS must be at least 1");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!(
                "SBAT_BASE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SBAT_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn watcher_config(&self) -> WatcherConfig {
        let defaults = CadenceConfig::default();
        WatcherConfig {
            cadence: CadenceConfig {
                burst_secs: self.burst_secs.unwrap_or(defaults.burst_secs),
                idle_secs: self.idle_secs.unwrap_or(defaults.idle_secs),
                ..defaults
            },
            ..WatcherConfig::default()
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SbatdExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SbatdExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SbatdExitCode::ConfigError.into();
    }

    info!("Starting sbatd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SbatdExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            SbatdExitCode::RuntimeError
        } else {
            SbatdExitCode::CleanShutdown
        }
    })
    .into()
}

/// Resolve credentials: environment overrides win and are persisted for
/// later runs, otherwise fall back to the credential file.
async fn resolve_credentials(config: &Config) -> Result<Credentials> {
    let store = FileCredentialStore::new(&config.credentials_path);

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        let credentials = Credentials::new(username, password);
        if let Err(e) = store.save(&credentials).await {
            warn!("could not save credentials to {}: {}", config.credentials_path, e);
        }
        return Ok(credentials);
    }

    store.load().await.map_err(|e| {
        anyhow::anyhow!(
            "no credentials: {} (set SBAT_USERNAME and SBAT_PASSWORD, \
            or provide {})",
            e,
            config.credentials_path
        )
    })
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let credentials = resolve_credentials(&config).await?;

    let api = SbatApiClient::new(&config.base_url)?;
    info!("using SBAT API at {}", api.base_url());

    let watcher_config = config.watcher_config();
    info!(
        "watching {} exam centers (cadence {}s/{}s)",
        watcher_config.centers.len(),
        watcher_config.cadence.burst_secs,
        watcher_config.cadence.idle_secs
    );

    // The client is both the authenticator and the slot source; clones
    // share one connection pool.
    let (watcher, mut events) =
        Watcher::new(Box::new(api.clone()), Box::new(api), watcher_config)?;

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);

    let watcher_handle =
        tokio::spawn(async move { watcher.run(credentials, stop_rx).await });

    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            error!("Signal handling error: {}", e);
        }
        // A dropped sender also stops the watcher, so failure to send
        // only means it is already gone.
        let _ = stop_tx.send(true);
    });

    // The watcher owns the sending half; the loop ends when the session is
    // over and the channel drains.
    let mut auth_failure: Option<String> = None;
    while let Some(event) = events.recv().await {
        match event {
            WatcherEvent::Started { centers } => {
                info!("session started, watching {} centers", centers);
            }
            WatcherEvent::NewSlots { centers } => {
                for (center, dates) in &centers {
                    info!("NEW SLOTS at {}: {}", center, dates.join(", "));
                }
            }
            WatcherEvent::CycleCompleted {
                centers_ok,
                centers_failed,
                seen_total,
            } => {
                if centers_failed > 0 {
                    warn!(
                        "cycle done: {} ok, {} failed, {} dates seen",
                        centers_ok, centers_failed, seen_total
                    );
                } else {
                    info!(
                        "cycle done: {} ok, {} dates seen",
                        centers_ok, seen_total
                    );
                }
            }
            WatcherEvent::Reauthenticating => {
                info!("session token expired, re-authenticating");
            }
            WatcherEvent::StoppedAuthFailure { detail } => {
                error!("authentication failed: {}", detail);
                auth_failure = Some(detail);
            }
            WatcherEvent::Stopped => {
                info!("watcher stopped");
            }
        }
    }

    watcher_handle
        .await
        .map_err(|e| anyhow::anyhow!("watcher task panicked: {}", e))??;

    if let Some(detail) = auth_failure {
        anyhow::bail!("session ended: authentication failed ({})", detail);
    }

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", received);
    Ok(())
}

/// Wait for shutdown signals (CTRL-C only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    info!("Received shutdown signal: SIGINT");
    Ok(())
}
