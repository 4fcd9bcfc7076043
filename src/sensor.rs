//! Sensor clients
//!
//! The network boundary to the physical device, behind one seam so the
//! scoring and polling stages never know whether data is live or simulated:
//! - [`HttpSensorClient`]: polls the device over its documented HTTP contract
//! - [`SimulatedSensor`]: seedable generator for deviceless operation
//!
//! Retry policy lives in the caller; a client performs exactly one request
//! per call.

use crate::error::EngineError;
use crate::types::RawSample;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Per-request timeout for device HTTP calls
pub const DEVICE_TIMEOUT: Duration = Duration::from_secs(5);

/// Path of the sample endpoint on the device
pub const DATA_PATH: &str = "/data";

/// Abstraction over a sample source.
///
/// Object-safe so the engine can hold either implementation behind
/// `Arc<dyn SensorClient>`.
pub trait SensorClient: Send + Sync {
    /// Reachability probe: succeeds only if the device answers on its root
    /// path AND the data path returns a parseable sample. No retries.
    fn probe(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Fetch a single raw sample from the data path
    fn fetch_sample(&self) -> BoxFuture<'_, Result<RawSample, EngineError>>;

    /// Human-readable source description for diagnostics
    fn describe(&self) -> String;
}

/// Live HTTP client for the sensor device
pub struct HttpSensorClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSensorClient {
    /// Create a client for a device address.
    ///
    /// The address may be a bare host/IP; a scheme is added when missing.
    pub fn new(address: &str) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(DEVICE_TIMEOUT)
            .build()
            .map_err(|e| EngineError::ConnectionUnreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: normalize_address(address),
        })
    }

    fn data_url(&self) -> String {
        format!("{}{}", self.base_url, DATA_PATH)
    }

    async fn get_sample(&self) -> Result<RawSample, EngineError> {
        let response = self
            .client
            .get(self.data_url())
            .send()
            .await
            .map_err(|e| EngineError::MalformedResponse(request_diagnostic(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::MalformedResponse(format!(
                "data path returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EngineError::MalformedResponse(request_diagnostic(&e)))?;

        parse_sample(&body)
    }
}

impl SensorClient for HttpSensorClient {
    fn probe(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        async move {
            // Root path: any 2xx verifies basic reachability
            let response = self
                .client
                .get(self.base_url.as_str())
                .send()
                .await
                .map_err(|e| EngineError::ConnectionUnreachable(request_diagnostic(&e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(EngineError::ConnectionUnreachable(format!(
                    "device returned HTTP {}",
                    status.as_u16()
                )));
            }

            // Data path must also respond and parse before the device
            // counts as connected
            self.get_sample()
                .await
                .map_err(|e| EngineError::ConnectionUnreachable(e.to_string()))?;

            Ok(())
        }
        .boxed()
    }

    fn fetch_sample(&self) -> BoxFuture<'_, Result<RawSample, EngineError>> {
        self.get_sample().boxed()
    }

    fn describe(&self) -> String {
        format!("device at {}", self.base_url)
    }
}

/// Prefix a scheme when the user supplied a bare host/IP, and strip any
/// trailing slash so path joins stay predictable.
fn normalize_address(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn request_diagnostic(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection refused: {}", error)
    } else {
        error.to_string()
    }
}

/// Parse the device's JSON data body into a raw sample.
///
/// The body must be a JSON object with numeric `gsr`, `temp`, and `hrv`
/// fields; anything else is a malformed response.
pub fn parse_sample(body: &str) -> Result<RawSample, EngineError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| EngineError::MalformedResponse(format!("invalid JSON body: {}", e)))?;

    Ok(RawSample {
        gsr: numeric_field(&value, "gsr")?,
        temperature_c: numeric_field(&value, "temp")?,
        hrv_ms: numeric_field(&value, "hrv")?,
    })
}

fn numeric_field(value: &serde_json::Value, name: &str) -> Result<f64, EngineError> {
    value
        .get(name)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| {
            EngineError::MalformedResponse(format!("missing or non-numeric field `{}`", name))
        })
}

/// Deterministic sample generator for running without hardware.
///
/// Produces a bounded random walk around resting physiology; a fixed seed
/// reproduces the same sequence.
pub struct SimulatedSensor {
    rng: Mutex<StdRng>,
    walk: Mutex<SimWalk>,
}

struct SimWalk {
    gsr: f64,
    temperature_c: f64,
    hrv_ms: f64,
}

impl SimulatedSensor {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            walk: Mutex::new(SimWalk {
                gsr: 480.0,
                temperature_c: 36.9,
                hrv_ms: 55.0,
            }),
        }
    }

    fn next_sample(&self) -> RawSample {
        let mut rng = self.rng.lock();
        let mut walk = self.walk.lock();

        walk.gsr = (walk.gsr + rng.gen_range(-60.0..60.0)).clamp(0.0, 1023.0);
        walk.temperature_c = (walk.temperature_c + rng.gen_range(-0.15..0.15)).clamp(35.0, 40.0);
        walk.hrv_ms = (walk.hrv_ms + rng.gen_range(-8.0..8.0)).clamp(0.0, 120.0);

        RawSample {
            gsr: walk.gsr,
            temperature_c: walk.temperature_c,
            hrv_ms: walk.hrv_ms,
        }
    }
}

impl SensorClient for SimulatedSensor {
    fn probe(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        async { Ok(()) }.boxed()
    }

    fn fetch_sample(&self) -> BoxFuture<'_, Result<RawSample, EngineError>> {
        let sample = self.next_sample();
        async move { Ok(sample) }.boxed()
    }

    fn describe(&self) -> String {
        "simulated sensor".to_string()
    }
}
