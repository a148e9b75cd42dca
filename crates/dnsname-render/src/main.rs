// # dnsname-render - DNS alias record renderer
//
// Thin integration layer over dnsname-core. All reconcile and render logic
// lives in the library; this binary only:
//
// 1. Reads configuration from environment variables
// 2. Initializes tracing and the runtime
// 3. Loads the cloud snapshot and the desired records
// 4. Runs one reconciliation pass
// 5. Writes the rendered output
//
// ## Configuration
//
// - `DNSNAME_CONFIG`: Path to the JSON record configuration (required)
// - `DNSNAME_SNAPSHOT`: Path to the JSON cloud snapshot (required)
// - `DNSNAME_MODE`: Overrides the configured mode (live, dry-run, terraform, cloudformation)
// - `DNSNAME_OUTPUT_DIR`: Directory for generated documents; stdout when unset
// - `DNSNAME_LOG_LEVEL`: trace, debug, info, warn or error (default info)
//
// In live mode the snapshot is the cloud: applied changes are written back
// to it.
//
// ## Example
//
// ```bash
// export DNSNAME_CONFIG=/etc/dnsname/records.json
// export DNSNAME_SNAPSHOT=/var/lib/dnsname/cloud.json
// export DNSNAME_MODE=terraform
// export DNSNAME_OUTPUT_DIR=./out
//
// dnsname-render
// ```

use anyhow::Result;
use dnsname_core::engine::EngineEvent;
use dnsname_core::{
    Backend, CloudSnapshot, MemoryCloud, ReconcileConfig, ReconcileEngine, ReconcileReport,
    RenderTarget,
};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Every record reconciled
/// - 1: Configuration or startup error
/// - 2: A record failed, or an unexpected runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnsnameExitCode {
    /// All records reconciled
    Clean = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Reconcile or runtime failure
    RuntimeError = 2,
}

impl From<DnsnameExitCode> for ExitCode {
    fn from(code: DnsnameExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    config_path: PathBuf,
    snapshot_path: PathBuf,
    mode: Option<Backend>,
    output_dir: Option<PathBuf>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let config_path = env::var("DNSNAME_CONFIG").map_err(|_| {
            anyhow::anyhow!(
                "DNSNAME_CONFIG is required. \
                Set it via: export DNSNAME_CONFIG=/etc/dnsname/records.json"
            )
        })?;
        let snapshot_path = env::var("DNSNAME_SNAPSHOT").map_err(|_| {
            anyhow::anyhow!(
                "DNSNAME_SNAPSHOT is required. \
                Set it via: export DNSNAME_SNAPSHOT=/var/lib/dnsname/cloud.json"
            )
        })?;
        let mode = match env::var("DNSNAME_MODE") {
            Ok(s) if !s.is_empty() => Some(s.parse::<Backend>()?),
            _ => None,
        };

        Ok(Self {
            config_path: PathBuf::from(config_path),
            snapshot_path: PathBuf::from(snapshot_path),
            mode,
            output_dir: env::var("DNSNAME_OUTPUT_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            log_level: env::var("DNSNAME_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.config_path.is_file() {
            anyhow::bail!(
                "DNSNAME_CONFIG does not point at a file: {}",
                self.config_path.display()
            );
        }

        if !self.snapshot_path.is_file() {
            anyhow::bail!(
                "DNSNAME_SNAPSHOT does not point at a file: {}",
                self.snapshot_path.display()
            );
        }

        if let Some(dir) = &self.output_dir
            && dir.exists()
            && !dir.is_dir()
        {
            anyhow::bail!(
                "DNSNAME_OUTPUT_DIR exists but is not a directory: {}",
                dir.display()
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DNSNAME_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DnsnameExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DnsnameExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only rendered output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsnameExitCode::ConfigError.into();
    }

    info!("Starting dnsname-render");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsnameExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Runtime error: {:#}", e);
                DnsnameExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run one reconciliation pass
async fn run(config: Config) -> Result<DnsnameExitCode> {
    let mut reconcile_config = match ReconcileConfig::load(&config.config_path).await {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return Ok(DnsnameExitCode::ConfigError);
        }
    };
    if let Some(mode) = config.mode {
        reconcile_config.mode = mode;
    }
    size_event_channel(&mut reconcile_config);

    let snapshot = match CloudSnapshot::load(&config.snapshot_path).await {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            return Ok(DnsnameExitCode::ConfigError);
        }
    };
    let cloud = snapshot.into_memory_cloud().await;

    let (engine, events) = match ReconcileEngine::new(cloud.handle(), reconcile_config) {
        Ok(pair) => pair,
        Err(e) => {
            error!("{}", e);
            return Ok(DnsnameExitCode::ConfigError);
        }
    };

    info!(
        "Configuration loaded: {} record(s), mode {}",
        engine.records().len(),
        engine.backend()
    );

    let (report, _) = reconcile(engine, events).await;

    write_output(&config, &cloud, &report).await?;

    for (record, err) in report.failures() {
        error!("DNS record {:?} failed: {}", record, err);
    }

    if report.is_success() {
        Ok(DnsnameExitCode::Clean)
    } else {
        Ok(DnsnameExitCode::RuntimeError)
    }
}

/// A single pass emits one event per record plus `Started` and `Finished`
fn size_event_channel(config: &mut ReconcileConfig) {
    let needed = config.records.len() + 2;
    if config.engine.event_channel_capacity < needed {
        debug!(
            "Raising event_channel_capacity from {} to {}",
            config.engine.event_channel_capacity, needed
        );
        config.engine.event_channel_capacity = needed;
    }
}

/// Run the pass while a spawned task logs engine events as they arrive
///
/// Returns the report and the number of events logged.
async fn reconcile(
    engine: ReconcileEngine,
    events: mpsc::Receiver<EngineEvent>,
) -> (ReconcileReport, usize) {
    let drain = tokio::spawn(drain_events(events));

    let report = engine.reconcile_all().await;
    drop(engine);

    let logged = match drain.await {
        Ok(count) => count,
        Err(e) => {
            warn!("Event drain task failed: {}", e);
            0
        }
    };
    (report, logged)
}

/// Log engine events until the engine is dropped
async fn drain_events(events: mpsc::Receiver<EngineEvent>) -> usize {
    let mut stream = ReceiverStream::new(events);
    let mut count = 0;
    while let Some(event) = stream.next().await {
        count += 1;
        match event {
            EngineEvent::RecordFailed { record_name, error } => {
                warn!("Record {} failed: {}", record_name, error);
            }
            EngineEvent::Finished { succeeded, failed } => {
                info!("Reconcile finished: {} succeeded, {} failed", succeeded, failed);
            }
            other => debug!("Engine event: {:?}", other),
        }
    }
    count
}

/// Emit what the pass rendered
async fn write_output(config: &Config, cloud: &MemoryCloud, report: &ReconcileReport) -> Result<()> {
    match &report.target {
        RenderTarget::Terraform(t) => match &config.output_dir {
            Some(dir) => {
                let path = t.write_to(dir).await?;
                info!("Wrote {} resource(s) to {}", t.len(), path.display());
            }
            None => println!("{}", t.to_json_pretty()?),
        },
        RenderTarget::CloudFormation(t) => match &config.output_dir {
            Some(dir) => {
                let path = t.write_to(dir).await?;
                info!("Wrote {} resource(s) to {}", t.len(), path.display());
            }
            None => println!("{}", t.to_json_pretty()?),
        },
        RenderTarget::DryRun(t) => print!("{}", t.report()),
        RenderTarget::Aws(t) => {
            save_snapshot(cloud, &config.snapshot_path).await?;
            info!("Applied {} change batch(es): {:?}", t.change_ids().len(), t.change_ids());
        }
    }
    Ok(())
}

async fn save_snapshot(cloud: &MemoryCloud, path: &Path) -> Result<()> {
    let mut snapshot = CloudSnapshot::capture(cloud).await;
    snapshot.save(path).await?;
    info!("Saved snapshot to {}", path.display());
    Ok(())
}
