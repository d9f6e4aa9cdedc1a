//! Tracing setup.
//!
//! One call wires a `tracing_subscriber` fmt layer with an environment
//! filter. Guarded so tests and embedding hosts can call it freely;
//! only the first call installs a subscriber.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Installs the global tracing subscriber, once.
///
/// Honors `RUST_LOG` when set; defaults to `info` for this crate and
/// `warn` for everything else. Subsequent calls are no-ops.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,tutorweave=info"));
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
