use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Route of the generated player page, e.g. `/st`.
    pub media_route: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    pub enabled: bool,
    pub ffmpeg_path: String,
    pub max_concurrent_jobs: Option<usize>,
    pub job_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    pub file_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

const EMBEDDED_DEFAULTS: &str = include_str!("../config/default.toml");

fn embedded_defaults() -> ::config::File<::config::FileSourceString, ::config::FileFormat> {
    ::config::File::from_str(EMBEDDED_DEFAULTS, ::config::FileFormat::Toml)
}

impl Default for AppConfig {
    /// The embedded `config/default.toml` alone, without files or environment.
    fn default() -> Self {
        let parsed = ::config::Config::builder()
            .add_source(embedded_defaults())
            .build()
            .and_then(|cfg| cfg.try_deserialize::<AppConfig>());
        match parsed {
            Ok(cfg) => cfg,
            // The file is compiled in; a failure here is a build defect
            Err(e) => panic!("embedded config/default.toml is invalid: {}", e),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { enabled: false, ffmpeg_path: "ffmpeg".to_string(), max_concurrent_jobs: None, job_timeout_secs: None }
    }
}

/// Paths served by the ops handlers; the media page cannot take them over.
pub const RESERVED_ROUTES: &[&str] = &["/healthz", "/version", "/metrics"];

/// Loads the layered configuration, lowest precedence first:
///
/// 1. embedded `config/default.toml`
/// 2. `mediashelf.toml` in the working directory
/// 3. the file named by `MEDIASHELF_CONFIG`
/// 4. `extra_file` (from `--config`), which must exist
/// 5. `MEDIASHELF__SECTION__KEY` environment variables, `.env` included
///
/// Command line flags are applied by the caller on top. Runs before the
/// subscriber is installed, so problems worth a warning are returned
/// alongside the config instead of being logged here.
pub fn load(extra_file: Option<&Path>) -> anyhow::Result<(AppConfig, Vec<String>)> {
    let mut warnings = Vec::new();
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warnings.push(format!("ignoring unreadable .env: {}", e));
        }
    }

    let mut builder = ::config::Config::builder()
        .add_source(embedded_defaults())
        .add_source(::config::File::with_name("mediashelf").required(false));
    if let Ok(path) = std::env::var("MEDIASHELF_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&path).required(false));
    }
    if let Some(path) = extra_file {
        builder = builder.add_source(::config::File::from(path).required(true));
    }
    let app_cfg: AppConfig = builder
        .add_source(::config::Environment::with_prefix("MEDIASHELF").separator("__"))
        .build()
        .with_context(|| "failed to read configuration")?
        .try_deserialize()
        .with_context(|| "invalid configuration")?;

    validate(&app_cfg)?;
    Ok((app_cfg, warnings))
}

/// Rejects values the server cannot run with. Called again after flags are applied.
pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    let server = &cfg.server;
    if server.port == 0 {
        bail!("invalid server.port: {}", server.port);
    }
    let route = server.media_route.as_str();
    if !route.starts_with('/') || route == "/" {
        bail!("server.media_route must start with '/' and must not be '/': {:?}", route);
    }
    if RESERVED_ROUTES.contains(&route) {
        bail!("server.media_route {:?} is reserved", route);
    }
    if route.contains(['{', '}']) {
        bail!("server.media_route must be a literal path, got {:?}", route);
    }

    let agg = &cfg.aggregator;
    if agg.ffmpeg_path.trim().is_empty() {
        bail!("aggregator.ffmpeg_path must not be empty");
    }
    if let Some(jobs) = agg.max_concurrent_jobs {
        if !(1..=256).contains(&jobs) {
            bail!("aggregator.max_concurrent_jobs must be in 1..=256, got {}", jobs);
        }
    }
    if agg.job_timeout_secs == Some(0) {
        bail!("aggregator.job_timeout_secs must be > 0 when set");
    }
    Ok(())
}

/// Settings that are valid but likely to cause trouble at startup.
pub fn warnings(cfg: &AppConfig) -> Vec<String> {
    let mut out = Vec::new();
    if cfg!(unix) && cfg.server.port < 1024 {
        out.push(format!("port {} is privileged and may need elevated permissions", cfg.server.port));
    }
    out
}
