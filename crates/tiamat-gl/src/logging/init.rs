use std::sync::Once;

use env_logger::WriteStyle;
use log::LevelFilter;

/// How [`init_logging`] sets up `env_logger`.
///
/// The filter is picked from `filter`, then `RUST_LOG`, then
/// `fallback_level`. Device-layer messages live under the `tiamat_gl`
/// target, so `"tiamat_gl=trace"` shows every suppressed state change.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub fallback_level: LevelFilter,
    pub write_style: WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            fallback_level: LevelFilter::Info,
            write_style: WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Self::default()
        }
    }

    fn filter_spec(&self, env: Option<String>) -> Option<String> {
        self.filter.clone().or(env).filter(|spec| !spec.trim().is_empty())
    }
}

static INIT: Once = Once::new();

/// Installs an `env_logger` backend for the process.
///
/// Only the first call does anything. A logger the host application set up
/// beforehand stays in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.write_style(config.write_style);

        match config.filter_spec(std::env::var("RUST_LOG").ok()) {
            Some(spec) => builder.parse_filters(&spec),
            None => builder.filter_level(config.fallback_level),
        };

        if let Err(err) = builder.try_init() {
            log::debug!("keeping existing logger: {err}");
        }
    });
}
