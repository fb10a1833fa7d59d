use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking writers alive; dropping it flushes pending lines.
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_filter`. With `file_dir` set, a second
/// ANSI-free layer writes a daily rotated `mediashelf.log` there.
pub fn init(default_filter: &str, file_dir: Option<&str>) -> anyhow::Result<LogGuards> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let file_layer = match file_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "mediashelf.log");
            let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
            guards.push(file_guard);
            Some(fmt::layer().with_ansi(false).with_writer(file_nb))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(stdout_nb))
        .with(file_layer)
        .try_init()?;

    Ok(LogGuards { _guards: guards })
}
