use std::sync::Once;

use loader_config::Environment;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT_TEST_TRACING: Once = Once::new();

/// Installs the global tracing subscriber.
///
/// The filter is read from `RUST_LOG` and falls back to `default_filter`. Events are printed in a
/// human readable format in [`Environment::Dev`] and as JSON lines in [`Environment::Prod`].
pub fn init_tracing(environment: Environment, default_filter: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match environment {
        Environment::Dev => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init(),
        Environment::Prod => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
    }
}

/// Installs a test writer subscriber once per process.
///
/// Output is captured by the test harness and only shown for failing tests.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // Another harness may have installed a subscriber already, which is fine.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
