// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Logging and error monitoring initialisation.
//!
//! Logging uses `tracing` with an env-filter; the configured level acts as
//! the default when `RUST_LOG` is unset. Sentry is optional and returns a
//! guard that must be held for the process lifetime.

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// `level` is the default directive applied when `RUST_LOG` is not set.
/// Calling twice is harmless; the second call is ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("carta={level},warn")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Initialise Sentry error monitoring when enabled.
///
/// Returns a guard flushing pending events on drop, or `None` when disabled
/// or no DSN is configured.
pub fn init_sentry(
    enabled: bool,
    dsn: &str,
    environment: &str,
) -> Option<sentry::ClientInitGuard> {
    if !enabled || dsn.is_empty() {
        tracing::debug!(target: "carta.telemetry", "sentry disabled");
        return None;
    }
    Some(sentry::init((
        dsn.to_owned(),
        sentry::ClientOptions {
            environment: Some(environment.to_owned().into()),
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
