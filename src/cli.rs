//! Command line flags.
//!
//! Flags override whatever the layered configuration says. The single-dash
//! long spellings `-dir` and `-ffmpeg` are accepted for compatibility with
//! older invocations and rewritten before clap sees them.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};

use crate::config::AppConfig;

/// Serve a directory over HTTP with a generated audio/video player page
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to serve
    #[arg(short = 'd', long = "dir", value_name = "PATH")]
    pub dir: PathBuf,

    /// Port to listen on (default 8080; ":8082" is accepted too)
    #[arg(short = 'p', long = "port", value_name = "PORT", value_parser = parse_port)]
    pub port: Option<u16>,

    /// Address to bind (default 0.0.0.0)
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Verbose output; -vv adds debug output
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Concatenate the audio files of every subdirectory into one track with ffmpeg
    #[arg(long = "ffmpeg")]
    pub ffmpeg: bool,

    /// Additional configuration file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parses the process arguments; prints usage and exits on error.
    pub fn parse_env() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Applies flag overrides on top of the loaded configuration.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(host) = &self.host {
            cfg.server.host = host.clone();
        }
        if self.ffmpeg {
            cfg.aggregator.enabled = true;
        }
    }

    /// Default tracing filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "error",
            1 => "info,tower_http=warn",
            _ => "debug,tower_http=debug",
        }
    }

    /// The served directory as an absolute path; it must exist.
    pub fn served_root(&self) -> anyhow::Result<PathBuf> {
        canonical_dir(&self.dir)
    }
}

/// Rewrites `-dir` / `-ffmpeg` to their double-dash forms.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-dir") => OsString::from("--dir"),
            Some("-ffmpeg") => OsString::from("--ffmpeg"),
            _ => arg,
        })
        .collect()
}

fn parse_port(value: &str) -> Result<u16, String> {
    let trimmed = value.trim().trim_start_matches(':');
    let port: u16 = trimmed.parse().map_err(|_| format!("invalid port '{value}'"))?;
    if port == 0 {
        return Err("port must be greater than zero".into());
    }
    Ok(port)
}

fn canonical_dir(path: &Path) -> anyhow::Result<PathBuf> {
    let abs = path
        .canonicalize()
        .with_context(|| format!("cannot access directory '{}'", path.display()))?;
    if !abs.is_dir() {
        anyhow::bail!("'{}' is not a directory", path.display());
    }
    Ok(abs)
}
