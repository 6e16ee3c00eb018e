use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter (`EnvFilter` syntax).
pub const LOG_ENV: &str = "HS9001_LOG";

/// Install the stderr subscriber. Defaults to `warn` so the prompt hook
/// prints nothing in normal operation.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| "hs9001=warn".into());
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
