//! Command-line flags for the `ceprace` server.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--bind` | `0.0.0.0:8000` | Listen address |
//! | `--deadline-ms` | `1000` | Race deadline in milliseconds |
//! | `--provider` | both | Provider to race, `viacep` or `apicep` (repeatable) |
//! | `--provider-timeout-ms` | `3000` | Transport timeout for each provider request |
//! | `--detach-losers` | `false` | Let losing lookups finish in the background |
//! | `--log-filter` | `info` | Log filter used when `RUST_LOG` is unset |
//!
//! Precedence for the deadline and provider URLs is flag, then `CEPRACE_*`
//! environment variable, then built-in default.

use std::net::SocketAddr;
use std::time::Duration;

use ceprace_core::{LoserPolicy, ProviderId, RaceCoordinator, RaceCoordinatorBuilder, ValidationError};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "ceprace",
    author,
    version,
    about = "Resolve postal codes by racing ViaCEP and ApiCEP"
)]
pub struct Cli {
    /// Address the HTTP listener binds to.
    #[arg(long, default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Race deadline in milliseconds [default: 1000]
    #[arg(long = "deadline-ms")]
    pub deadline_ms: Option<u64>,

    /// Provider to include in every race (viacep, apicep); repeat to add more.
    #[arg(long = "provider")]
    pub providers: Vec<ProviderId>,

    /// Transport timeout for each provider request in milliseconds [default: 3000]
    #[arg(long = "provider-timeout-ms")]
    pub provider_timeout_ms: Option<u64>,

    /// Let losing provider lookups run to completion instead of cancelling them.
    #[arg(long)]
    pub detach_losers: bool,

    /// Log filter applied when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl Cli {
    pub fn loser_policy(&self) -> LoserPolicy {
        if self.detach_losers {
            LoserPolicy::Detach
        } else {
            LoserPolicy::Cancel
        }
    }

    /// Builder with environment overrides applied and flags layered on top.
    pub fn coordinator_builder(&self) -> Result<RaceCoordinatorBuilder, ValidationError> {
        let mut builder = RaceCoordinator::builder()
            .with_loser_policy(self.loser_policy())
            .with_env_overrides()?;

        if let Some(deadline_ms) = self.deadline_ms {
            builder = builder.with_deadline(Duration::from_millis(deadline_ms));
        }
        if !self.providers.is_empty() {
            builder = builder.with_providers(&self.providers);
        }
        if let Some(timeout_ms) = self.provider_timeout_ms {
            builder = builder.with_provider_timeout_ms(timeout_ms);
        }

        Ok(builder)
    }
}
