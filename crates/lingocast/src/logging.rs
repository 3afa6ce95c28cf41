//! Subscriber setup for binaries and tests.

use std::io;
use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format '{}'", other)),
        }
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` overrides `default_filter`. `log` records from dependencies are
/// forwarded. Calling this again once a subscriber is installed does nothing.
pub fn init(format: LogFormat, default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer: BoxedLayer = match format {
        LogFormat::Text => Box::new(fmt::layer().with_writer(io::stderr).with_target(true)),
        LogFormat::Json => Box::new(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(io::stderr),
        ),
    };

    let subscriber = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return;
    }
    // A logger may already be installed by the host application.
    let _ = tracing_log::LogTracer::init();
}
