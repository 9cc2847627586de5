//! Process configuration, loaded once at startup from the environment.
//!
//! The canonical surface is a single `ANALYZERS_CONFIG` variable plus a
//! table of tunables (§6 of the spec). Loading is all-or-nothing: any
//! malformed record is a fatal startup error, never a partial/degraded
//! config (see `ConfigError`).

use std::time::Duration;

use crate::error::ConfigError;

/// One analyzer record parsed out of `ANALYZERS_CONFIG`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSpec {
    pub id: String,
    pub endpoint: String,
    pub weight: f64,
}

/// Tunables recognized by the core, with the defaults from spec §6.
#[derive(Debug, Clone)]
pub struct Tunables {
    pub max_consecutive_failures: u32,
    pub offline_timeout: Duration,
    pub deficit_threshold: f64,
    pub queue_capacity: usize,
    pub worker_min: usize,
    pub worker_max: usize,
    pub request_timeout: Duration,
    pub sweep_interval: Duration,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 3,
            offline_timeout: Duration::from_secs(30),
            deficit_threshold: 1000.0,
            queue_capacity: 10_000,
            worker_min: 20,
            worker_max: 50,
            request_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(5),
        }
    }
}

/// Full process configuration: the analyzer set plus the tunables table.
#[derive(Debug, Clone)]
pub struct Config {
    pub analyzers: Vec<AnalyzerSpec>,
    pub tunables: Tunables,
    pub bind_address: String,
}

impl Config {
    /// Build configuration from the process environment, falling back to
    /// the defaults documented in spec §6 where a variable is unset.
    ///
    /// `bind_address` is a CLI override (takes precedence over env/default);
    /// pass `None` to fall back to `BIND_ADDRESS` then `"0.0.0.0:8080"`.
    pub fn from_env(bind_address: Option<String>) -> Result<Self, ConfigError> {
        let analyzers = match std::env::var("ANALYZERS_CONFIG") {
            Ok(raw) if !raw.trim().is_empty() => parse_analyzers_config(&raw)?,
            _ => default_analyzers(),
        };

        let tunables = Tunables {
            max_consecutive_failures: env_u32(
                "MAX_CONSECUTIVE_FAILURES",
                Tunables::default().max_consecutive_failures,
            )?,
            offline_timeout: env_duration_secs(
                "OFFLINE_TIMEOUT",
                Tunables::default().offline_timeout,
            )?,
            deficit_threshold: env_f64(
                "DEFICIT_THRESHOLD",
                Tunables::default().deficit_threshold,
            )?,
            queue_capacity: env_usize("QUEUE_CAPACITY", Tunables::default().queue_capacity)?,
            worker_min: env_usize("WORKER_MIN", Tunables::default().worker_min)?,
            worker_max: env_usize("WORKER_MAX", Tunables::default().worker_max)?,
            request_timeout: env_duration_secs(
                "REQUEST_TIMEOUT",
                Tunables::default().request_timeout,
            )?,
            sweep_interval: env_duration_secs(
                "SWEEP_INTERVAL",
                Tunables::default().sweep_interval,
            )?,
        };

        let bind_address = bind_address
            .or_else(|| std::env::var("BIND_ADDRESS").ok())
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        Ok(Self {
            analyzers,
            tunables,
            bind_address,
        })
    }
}

/// Default four-analyzer configuration (weights 0.1, 0.2, 0.3, 0.4), used
/// when `ANALYZERS_CONFIG` is absent or empty (spec §6).
fn default_analyzers() -> Vec<AnalyzerSpec> {
    vec![
        AnalyzerSpec {
            id: "analyzer-a".to_string(),
            endpoint: "http://127.0.0.1:9101/ingest".to_string(),
            weight: 0.1,
        },
        AnalyzerSpec {
            id: "analyzer-b".to_string(),
            endpoint: "http://127.0.0.1:9102/ingest".to_string(),
            weight: 0.2,
        },
        AnalyzerSpec {
            id: "analyzer-c".to_string(),
            endpoint: "http://127.0.0.1:9103/ingest".to_string(),
            weight: 0.3,
        },
        AnalyzerSpec {
            id: "analyzer-d".to_string(),
            endpoint: "http://127.0.0.1:9104/ingest".to_string(),
            weight: 0.4,
        },
    ]
}

/// Parse `"id1:endpoint1:weight1,id2:endpoint2:weight2,..."`.
///
/// Endpoints may contain colons (e.g. `http://host:port/path`), so each
/// record is split on its *last* colon to separate the weight.
fn parse_analyzers_config(raw: &str) -> Result<Vec<AnalyzerSpec>, ConfigError> {
    let mut seen = std::collections::HashSet::new();
    let mut specs = Vec::new();

    for record in raw.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        let (head, weight_str) = record
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::MissingWeight(record.to_string()))?;

        let (id, endpoint) = head
            .split_once(':')
            .ok_or_else(|| ConfigError::EmptyField(record.to_string()))?;

        if id.is_empty() || endpoint.is_empty() {
            return Err(ConfigError::EmptyField(record.to_string()));
        }

        let weight: f64 = weight_str
            .parse()
            .map_err(|_| ConfigError::InvalidWeight {
                id: id.to_string(),
                raw: weight_str.to_string(),
            })?;

        if !(weight.is_finite() && weight > 0.0 && weight <= 1.0) {
            return Err(ConfigError::InvalidWeight {
                id: id.to_string(),
                raw: weight_str.to_string(),
            });
        }

        if !seen.insert(id.to_string()) {
            return Err(ConfigError::DuplicateId(id.to_string()));
        }

        specs.push(AnalyzerSpec {
            id: id.to_string(),
            endpoint: endpoint.to_string(),
            weight,
        });
    }

    Ok(specs)
}

fn env_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(v) => v.parse().map_err(|_| ConfigError::InvalidTunable {
            name,
            value: v,
            reason: "expected a non-negative integer".to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn env_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(v) => v.parse().map_err(|_| ConfigError::InvalidTunable {
            name,
            value: v,
            reason: "expected a non-negative integer".to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn env_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(name) {
        Ok(v) => {
            let parsed: f64 = v.parse().map_err(|_| ConfigError::InvalidTunable {
                name,
                value: v.clone(),
                reason: "expected a number".to_string(),
            })?;
            if !parsed.is_finite() || parsed < 0.0 {
                return Err(ConfigError::InvalidTunable {
                    name,
                    value: v,
                    reason: "expected a non-negative finite number".to_string(),
                });
            }
            Ok(parsed)
        }
        Err(_) => Ok(default),
    }
}

fn env_duration_secs(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(v) => {
            let secs: u64 = v.parse().map_err(|_| ConfigError::InvalidTunable {
                name,
                value: v,
                reason: "expected a non-negative integer number of seconds".to_string(),
            })?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}
