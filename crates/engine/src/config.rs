//! Engine configuration module

use std::time::Duration;

use clap::Parser;

use crate::store::GUEST_TOKEN_KEY;

/// Turnstile engine configuration
#[derive(Debug, Parser)]
#[command(name = "turnstile", about = "Turnstile commerce engine", long_about = None)]
pub struct EngineConfig {
    /// Seat availability poll period, in seconds
    #[arg(long, env = "TURNSTILE_SEAT_POLL_SECONDS", default_value = "5")]
    pub seat_poll_seconds: u64,

    /// Shared store key the guest cart token lives under
    #[arg(long, env = "TURNSTILE_GUEST_TOKEN_KEY", default_value = GUEST_TOKEN_KEY)]
    pub guest_token_key: String,

    /// Log level (trace, debug, info, warn, error). The engine only emits
    /// `tracing` events; the host reads this when installing its subscriber.
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl EngineConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// The seat poll period as a [`Duration`].
    #[must_use]
    pub const fn poll_period(&self) -> Duration {
        Duration::from_secs(self.seat_poll_seconds)
    }
}
