//! Logging setup.
//!
//! Compact timestamped output on stderr with per-module levels from
//! [`LoggingConfig`]. `RUST_LOG` takes precedence when set:
//!
//! ```bash
//! RUST_LOG=generic_meds_llm=debug generic-meds search --name "Dolo 650"
//! ```

use std::sync::Once;

use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Filter directive built from the config, e.g. `warn,generic_meds_llm=debug`.
pub fn filter_directive(config: &LoggingConfig) -> String {
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();

    let mut directive = config.default.clone();
    for (module, level) in modules {
        directive.push_str(&format!(",{module}={level}"));
    }
    directive
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directive(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        // Another subscriber may already be installed by an embedding app
        if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
            tracing::debug!("Global subscriber already set, keeping it");
        }
    });
}

/// Install the global subscriber with default settings (`warn`).
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        let mut config = LoggingConfig::default();
        assert_eq!(filter_directive(&config), "warn");

        config.modules.insert("generic_meds_llm".into(), "debug".into());
        config.modules.insert("generic_meds_core".into(), "info".into());
        assert_eq!(
            filter_directive(&config),
            "warn,generic_meds_core=info,generic_meds_llm=debug"
        );
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
    }
}
