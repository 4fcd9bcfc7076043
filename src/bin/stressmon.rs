//! Stressmon CLI - command-line front end for the scoring engine
//!
//! Commands:
//! - probe: test the connection to a sensor device
//! - monitor: run the acquisition loop against a device or simulator
//! - score: score a single sample (one-shot, pure)
//! - history: dump the durable history log

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use stressmon::{
    EngineConfig, EngineError, FileStore, HistoryStore, HttpSensorClient, MetricKind,
    MonitoringState, RawSample, ScoringPolicy, SensorClient, SimulatedSensor, StressEngine,
    UserProfile, ENGINE_VERSION, PRODUCER_NAME,
};

/// Stressmon - biometric acquisition and scoring engine
#[derive(Parser)]
#[command(name = "stressmon")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Poll a stress sensor and score its signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test the connection to a sensor device
    Probe {
        /// Device address (bare host/IP is fine)
        #[arg(short, long)]
        address: String,
    },

    /// Run the acquisition loop and print scored readings
    Monitor {
        /// Device address (bare host/IP is fine)
        #[arg(short, long, conflicts_with = "simulate")]
        address: Option<String>,

        /// Use the simulated sensor instead of a device
        #[arg(long)]
        simulate: bool,

        /// Seed for the simulated sensor
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Profile name used to tag history entries
        #[arg(long, default_value = "guest")]
        user: String,

        /// Profile age
        #[arg(long, default_value = "unknown")]
        age: String,

        /// Poll period in milliseconds
        #[arg(long, default_value = "2000")]
        interval_ms: u64,

        /// Scoring policy variant
        #[arg(long, value_enum, default_value = "primary")]
        policy: PolicyChoice,

        /// Stop after this many samples (default: run until Ctrl-C)
        #[arg(long)]
        samples: Option<u64>,

        /// Directory backing the history store
        #[arg(long, default_value = ".stressmon")]
        store: PathBuf,

        /// Metric to summarize when the run ends
        #[arg(long, value_enum)]
        analyze: Option<MetricChoice>,
    },

    /// Score a single raw sample
    Score {
        /// GSR in device ADC units (0-1023)
        #[arg(long)]
        gsr: f64,

        /// Skin temperature (celsius)
        #[arg(long)]
        temp: f64,

        /// HRV (ms)
        #[arg(long)]
        hrv: f64,

        /// Scoring policy variant
        #[arg(long, value_enum, default_value = "primary")]
        policy: PolicyChoice,
    },

    /// Dump the durable history log, oldest first
    History {
        /// Directory backing the history store
        #[arg(long, default_value = ".stressmon")]
        store: PathBuf,

        /// Output as a JSON array
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyChoice {
    /// 0.2 GSR / 0.5 inverted HRV / 0.3 temperature
    Primary,
    /// 0.6 GSR / 0.2 HRV deficit / 0.2 temperature deviation
    Overall,
}

impl PolicyChoice {
    fn to_policy(self) -> ScoringPolicy {
        match self {
            PolicyChoice::Primary => ScoringPolicy::primary(),
            PolicyChoice::Overall => ScoringPolicy::overall(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricChoice {
    Stress,
    Temperature,
    Hrv,
}

impl MetricChoice {
    fn to_metric(self) -> MetricKind {
        match self {
            MetricChoice::Stress => MetricKind::Stress,
            MetricChoice::Temperature => MetricKind::Temperature,
            MetricChoice::Hrv => MetricKind::Hrv,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(format!("{}=info", PRODUCER_NAME))
                }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), EngineError> {
    match cli.command {
        Commands::Probe { address } => cmd_probe(&address).await,
        Commands::Monitor {
            address,
            simulate,
            seed,
            user,
            age,
            interval_ms,
            policy,
            samples,
            store,
            analyze,
        } => {
            cmd_monitor(
                address.as_deref(),
                simulate,
                seed,
                UserProfile::new(user, age),
                interval_ms,
                policy.to_policy(),
                samples,
                &store,
                analyze,
            )
            .await
        }
        Commands::Score {
            gsr,
            temp,
            hrv,
            policy,
        } => cmd_score(gsr, temp, hrv, policy.to_policy()),
        Commands::History { store, json } => cmd_history(&store, json),
    }
}

async fn cmd_probe(address: &str) -> Result<(), EngineError> {
    let client = HttpSensorClient::new(address)?;
    client.probe().await?;
    println!("connected: {}", client.describe());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_monitor(
    address: Option<&str>,
    simulate: bool,
    seed: u64,
    profile: UserProfile,
    interval_ms: u64,
    policy: ScoringPolicy,
    samples: Option<u64>,
    store_dir: &Path,
    analyze: Option<MetricChoice>,
) -> Result<(), EngineError> {
    let sensor: Arc<dyn SensorClient> = if simulate {
        Arc::new(SimulatedSensor::new(seed))
    } else {
        let address = address.ok_or_else(|| {
            EngineError::ConnectionUnreachable(
                "pass --address <host> or --simulate".to_string(),
            )
        })?;
        Arc::new(HttpSensorClient::new(address)?)
    };

    let store = Arc::new(FileStore::open(store_dir)?);
    let mut engine = StressEngine::new(
        sensor,
        store,
        profile,
        EngineConfig {
            poll_interval: Duration::from_millis(interval_ms),
            policy,
        },
    );

    engine.connect().await?;
    engine.start_monitoring()?;

    let pretty = atty::is(atty::Stream::Stdout);
    let mut printed: u64 = 0;
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(100) / 2));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {}
        }

        let snapshot = engine.snapshot();

        if snapshot.samples_seen > printed {
            if let Some(reading) = snapshot.latest {
                if pretty {
                    println!(
                        "{}  score {:5.1}  {:<8}  gsr {:5.1}%  hrv {:5.1}ms  temp {:.1}C",
                        reading.observed_at.format("%H:%M:%S"),
                        reading.score,
                        reading.band.as_str(),
                        reading.metrics.gsr_pct,
                        reading.sample.hrv_ms,
                        reading.sample.temperature_c,
                    );
                } else {
                    println!("{}", serde_json::to_string(&reading)?);
                }
            }
            printed = snapshot.samples_seen;
        }

        if snapshot.monitoring == MonitoringState::StoppedOnError {
            engine.stop_monitoring();
            return Err(EngineError::ConnectionUnreachable(
                snapshot
                    .last_error
                    .unwrap_or_else(|| "monitoring stopped on error".to_string()),
            ));
        }

        if let Some(limit) = samples {
            if printed >= limit {
                break;
            }
        }
    }

    engine.stop_monitoring();

    if let Some(metric) = analyze {
        let analysis = engine.analyze_metric(metric.to_metric());
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    }

    Ok(())
}

fn cmd_score(gsr: f64, temp: f64, hrv: f64, policy: ScoringPolicy) -> Result<(), EngineError> {
    let reading = policy.score(RawSample {
        gsr,
        temperature_c: temp,
        hrv_ms: hrv,
    });
    println!("{}", serde_json::to_string_pretty(&reading)?);
    Ok(())
}

fn cmd_history(store_dir: &Path, json: bool) -> Result<(), EngineError> {
    let store = Arc::new(FileStore::open(store_dir)?);
    let entries = HistoryStore::new(store).load_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!(
                "{}  {:<16}  {:3}",
                entry.timestamp.to_rfc3339(),
                entry.user_name,
                entry.stress_score
            );
        }
        eprintln!("{} entries", entries.len());
    }
    Ok(())
}
