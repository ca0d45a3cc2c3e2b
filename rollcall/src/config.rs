//! Service configuration: defaults, optional YAML file, `ROLLCALL_` env
//! overrides, in that precedence order.

use std::net::SocketAddr;
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::schedule::Policy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Scheduling policy (rest day, room pool, lead times).
    pub policy: Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/rollcall".to_string(),
            listen_addr: "0.0.0.0:8080".parse().expect("static addr"),
            policy: Policy::default(),
        }
    }
}

impl Config {
    /// Load configuration, optionally merging a YAML file.
    ///
    /// Env overrides use the `ROLLCALL_` prefix with `__` as the nesting
    /// separator, e.g. `ROLLCALL_POLICY__ROOMS=3`.
    pub fn load(file: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed("ROLLCALL_").split("__")).extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn defaults_load_without_a_file() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(None)?;
            assert_eq!(config.listen_addr.port(), 8080);
            assert_eq!(config.policy.rooms, 5);
            assert_eq!(config.policy.rest_day, Weekday::Sun);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_nested_policy_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ROLLCALL_DATABASE_URL", "postgresql://db/gym");
            jail.set_env("ROLLCALL_POLICY__ROOMS", "3");
            jail.set_env("ROLLCALL_POLICY__MAX_LEAD_DAYS", "30");
            let config = Config::load(None)?;
            assert_eq!(config.database_url, "postgresql://db/gym");
            assert_eq!(config.policy.rooms, 3);
            assert_eq!(config.policy.max_lead_days, 30);
            assert_eq!(config.policy.min_lead_days, 1);
            Ok(())
        });
    }
}
