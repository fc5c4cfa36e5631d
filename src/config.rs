//! Process configuration, read from the environment once at startup.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `SAYPI_ADDR` | listen address | `0.0.0.0:3000` |
//! | `SAYPI_USER_SECRET` | HMAC secret for user tokens | required |

use std::fmt;
use std::net::SocketAddr;

pub const ADDR_VAR: &str = "SAYPI_ADDR";
pub const SECRET_VAR: &str = "SAYPI_USER_SECRET";

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SAYPI_USER_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("SAYPI_ADDR: invalid socket address {value:?}")]
    InvalidAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub user_secret: Vec<u8>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, e.g. a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_owned());
        let addr = raw_addr
            .parse()
            .map_err(|source| ConfigError::InvalidAddr { value: raw_addr.clone(), source })?;

        let user_secret = lookup(SECRET_VAR)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?
            .into_bytes();

        Ok(Self { addr, user_secret })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("user_secret", &"<redacted>")
            .finish()
    }
}
