//! Logging subscriber initialisation. The code logs through the `log` macros,
//! records are forwarded to the `tracing` subscriber installed here.

use failure::Error as FailureError;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use config::Logging;

/// Installs the global subscriber. `RUST_LOG` takes precedence over `logging.level`.
pub fn init(config: &Logging) -> Result<(), FailureError> {
    match config.format.as_str() {
        "json" => init_with_layer(config, tracing_subscriber::fmt::layer().json().with_target(true)),
        "compact" => init_with_layer(config, tracing_subscriber::fmt::layer().compact().with_target(true)),
        other => {
            init_with_layer(config, tracing_subscriber::fmt::layer().compact().with_target(true))?;
            warn!("Unknown log format {}, using compact", other);
            Ok(())
        }
    }
}

fn build_env_filter(config: &Logging) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn,tokio_core=warn", config.level)))
}

fn init_with_layer<L>(config: &Logging, fmt_layer: L) -> Result<(), FailureError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_env_filter(config))
        .try_init()?;
    Ok(())
}
