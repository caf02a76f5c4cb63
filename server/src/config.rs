//! Server configuration, loaded from environment variables at startup.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use vibes_core::agents::RuntimeSettings;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `127.0.0.1:3000`).
    pub bind_address: SocketAddr,
    /// Provider credentials, fan-out roster and transport timeout.
    pub runtime: RuntimeSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = env_or(&lookup, "VIBES_BIND", DEFAULT_BIND);
        let bind_address = bind
            .parse()
            .with_context(|| format!("VIBES_BIND is not a socket address: {bind}"))?;
        let runtime = RuntimeSettings::from_lookup(&lookup)?;
        Ok(Self {
            bind_address,
            runtime,
        })
    }
}

/// Log filter: `VIBES_LOG`, then `RUST_LOG`, then `info`.
pub fn log_filter() -> String {
    std::env::var("VIBES_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_owned())
}

fn env_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_to_loopback() {
        let cfg = Config::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.bind_address.to_string(), DEFAULT_BIND);
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let err = Config::from_lookup(|key| (key == "VIBES_BIND").then(|| "nowhere".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("VIBES_BIND"));
    }
}
