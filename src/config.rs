use clap::{Args, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::StorageStrategy;

/// Upper bound for `--session-hours`
pub const MAX_SESSION_HOURS: u64 = 365 * 24;

/// Web server settings
///
/// Every option can also be given through the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "website", about = "Savings calculator web server")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "SAVINGS_BIND", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "SAVINGS_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the users file and per-user scenario lists
    #[arg(long, env = "SAVINGS_DATABASE", default_value = "database")]
    pub database_dir: PathBuf,

    /// How long a login stays valid, at most one year
    #[arg(
        long,
        env = "SAVINGS_SESSION_HOURS",
        default_value_t = 24,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SESSION_HOURS)
    )]
    pub session_hours: u64,
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_hours.saturating_mul(60 * 60))
    }
}

/// Storage options shared by every CLI subcommand
#[derive(Debug, Clone, Args)]
pub struct StorageOptions {
    /// Scenario server to log in to; without it scenarios stay local
    #[arg(long, global = true, env = "SAVINGS_SERVER")]
    pub server: Option<String>,

    #[arg(long, global = true, env = "SAVINGS_USER")]
    pub user: Option<String>,

    #[arg(long, global = true, env = "SAVINGS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Local scenario file, used when not logged in
    #[arg(long, global = true, env = "SAVINGS_STORE", default_value = "scenarios.bin.gz")]
    pub store: PathBuf,

    /// Request timeout for the scenario server, in seconds
    #[arg(long, global = true, default_value_t = 10)]
    pub timeout: u64,
}

impl StorageOptions {
    /// Pick the storage strategy for this run
    ///
    /// Remote storage needs a server URL and both credentials; anything less
    /// means local storage.
    pub fn strategy(&self) -> StorageStrategy {
        match (&self.server, &self.user, &self.password) {
            (Some(url), Some(username), Some(password)) => StorageStrategy::Remote {
                url: url.clone(),
                username: username.clone(),
                password: password.clone(),
                timeout: Duration::from_secs(self.timeout),
            },
            _ => StorageStrategy::Local {
                path: self.store.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        storage: StorageOptions,
    }

    #[test]
    fn server_defaults() {
        let config = ServerConfig::try_parse_from(["website"]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.session_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn session_hours_are_bounded() {
        assert!(ServerConfig::try_parse_from(["website", "--session-hours", "18446744073709551615"]).is_err());
        assert!(ServerConfig::try_parse_from(["website", "--session-hours", "0"]).is_err());
        let config = ServerConfig::try_parse_from(["website", "--session-hours", "8760"]).unwrap();
        assert_eq!(config.session_ttl(), Duration::from_secs(8760 * 3600));
    }

    #[test]
    fn partial_credentials_stay_local() {
        let parsed = Wrapper::try_parse_from(["cli", "--server", "http://x", "--user", "a", "--store", "s.bin.gz"])
            .unwrap();
        match parsed.storage.strategy() {
            StorageStrategy::Local { path } => assert_eq!(path, PathBuf::from("s.bin.gz")),
            other => panic!("expected local storage, got {:?}", other),
        }
    }

    #[test]
    fn full_credentials_go_remote() {
        let parsed = Wrapper::try_parse_from([
            "cli", "--server", "http://x", "--user", "a", "--password", "b",
        ])
        .unwrap();
        assert!(matches!(parsed.storage.strategy(), StorageStrategy::Remote { .. }));
    }
}
