use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this twice
/// is harmless; the second installation is ignored.
pub fn init_tracing(service_name: &str, settings: &LoggingSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if settings.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!(service = service_name, level = %settings.level, "Tracing initialized"),
        Err(e) => eprintln!("Tracing already initialized for '{}': {}", service_name, e),
    }
}

static TEST_INIT: Once = Once::new();

/// Initialize tracing for tests (only once per process).
pub fn init_test_tracing() {
    TEST_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,portal_core=debug,approval_portal=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
