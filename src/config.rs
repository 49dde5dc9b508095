// Configuration from the process environment, optionally seeded from a .env file.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use crate::sources::ProcessTarget;

pub const DEFAULT_METRIC_KEYS: &[&str] = &[
    "cpu_max_perc",
    "cpu_avg_perc",
    "mem_max_mb",
    "mem_avg_mb",
    "mem_max_perc",
    "mem_avg_perc",
    "disk_mb",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Display name of the host record and value of the `cont=` tag.
    pub container_name: String,
    pub backend: BackendConfig,
    pub sampling: SamplingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub username: String,
    pub api_key: String,
    pub send_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SamplingConfig {
    pub read_interval_secs: u64,
    pub flush_interval_secs: u64,
    pub sleep_between_fetches_ms: u64,
    pub source_timeout_secs: u64,
    pub send_self_stats: bool,
    pub process: ProcessTarget,
    pub docker_bin: String,
    pub disk_mount: String,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub measurement_prefix: String,
    /// Ordered allow-list of fields to emit.
    pub metric_keys: Vec<String>,
}

impl AppConfig {
    /// Loads from the process environment, falling back to `ENV_FILE` (default `.env`)
    /// for keys the environment does not set.
    pub fn load() -> anyhow::Result<Self> {
        let env_file = std::env::var("ENV_FILE").unwrap_or_else(|_| ".env".into());
        let file_vars = load_env_file(&env_file)?;
        Self::from_lookup(|key| env_or_file(key, std::env::var(key).ok(), &file_vars))
    }

    /// Parse and validate config from any key lookup (e.g. a map in tests).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).with_context(|| format!("{} must be set", key));
        let number = |key: &str, value: String| {
            value
                .parse::<u64>()
                .with_context(|| format!("invalid value for {}: '{}'", key, value))
        };

        let read_interval_secs = number("READ_TICKER_TIME_SEC", required("READ_TICKER_TIME_SEC")?)?;
        let flush_interval_secs =
            number("FLUSH_TICKER_TIME_SEC", required("FLUSH_TICKER_TIME_SEC")?)?;
        let sleep_between_fetches_ms = match get("SLEEP_BETWEEN_FETCHES_MS") {
            Some(v) => number("SLEEP_BETWEEN_FETCHES_MS", v)?,
            None => 100,
        };
        let source_timeout_secs = match get("SOURCE_TIMEOUT_SEC") {
            Some(v) => number("SOURCE_TIMEOUT_SEC", v)?,
            None => 10,
        };
        let send_timeout_secs = match get("SEND_TIMEOUT_SEC") {
            Some(v) => number("SEND_TIMEOUT_SEC", v)?,
            None => 10,
        };
        let send_self_stats = match get("SEND_SELF_STATS") {
            Some(v) => v
                .parse::<bool>()
                .with_context(|| format!("invalid value for SEND_SELF_STATS: '{}'", v))?,
            None => true,
        };
        let process = get("PROCESS_NAME").map_or(ProcessTarget::Own, ProcessTarget::Named);
        let metric_keys = match get("METRIC_KEYS") {
            Some(v) => v
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            None => DEFAULT_METRIC_KEYS.iter().map(|k| k.to_string()).collect(),
        };

        let config = AppConfig {
            container_name: required("CONTAINER_NAME")?,
            backend: BackendConfig {
                url: required("GRAFANA_INFLUX_URL")?,
                username: required("GRAFANA_USERNAME")?,
                api_key: required("GRAFANA_API_KEY")?,
                send_timeout_secs,
            },
            sampling: SamplingConfig {
                read_interval_secs,
                flush_interval_secs,
                sleep_between_fetches_ms,
                source_timeout_secs,
                send_self_stats,
                process,
                docker_bin: get("DOCKER_BIN").unwrap_or_else(|| "docker".into()),
                disk_mount: get("DISK_MOUNT").unwrap_or_else(|| "/".into()),
            },
            output: OutputConfig {
                measurement_prefix: get("MEASUREMENT_PREFIX").unwrap_or_else(|| "gomon".into()),
                metric_keys,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.backend.url.starts_with("http://") || self.backend.url.starts_with("https://"),
            "GRAFANA_INFLUX_URL must be an http(s) URL, got {}",
            self.backend.url
        );
        anyhow::ensure!(
            self.sampling.read_interval_secs > 0,
            "READ_TICKER_TIME_SEC must be > 0, got {}",
            self.sampling.read_interval_secs
        );
        anyhow::ensure!(
            self.sampling.flush_interval_secs > 0,
            "FLUSH_TICKER_TIME_SEC must be > 0, got {}",
            self.sampling.flush_interval_secs
        );
        anyhow::ensure!(
            self.sampling.source_timeout_secs > 0,
            "SOURCE_TIMEOUT_SEC must be > 0, got {}",
            self.sampling.source_timeout_secs
        );
        anyhow::ensure!(
            self.backend.send_timeout_secs > 0,
            "SEND_TIMEOUT_SEC must be > 0, got {}",
            self.backend.send_timeout_secs
        );
        anyhow::ensure!(
            !self.output.metric_keys.is_empty(),
            "METRIC_KEYS must name at least one field"
        );
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sampling.read_interval_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.sampling.flush_interval_secs)
    }
}

/// Parses `KEY=VALUE` lines; blank lines and `#` comments are ignored.
pub fn parse_env_file(content: &str) -> anyhow::Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .with_context(|| format!("invalid line {} in env file: {}", n + 1, line))?;
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        vars.insert(key.trim().to_string(), value.to_string());
    }
    Ok(vars)
}

/// Environment value first, then the env file entry.
pub fn env_or_file(
    key: &str,
    env: Option<String>,
    file_vars: &HashMap<String, String>,
) -> Option<String> {
    env.or_else(|| file_vars.get(key).cloned())
}

/// Reads the variables of `path`. A missing file yields an empty map.
pub fn load_env_file(path: impl AsRef<Path>) -> anyhow::Result<HashMap<String, String>> {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    parse_env_file(&content)
}
