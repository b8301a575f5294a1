use std::time::Duration;

use anyhow::{Context, bail};
use duel_chess::server::OutOfTurnPolicy;
use serde::{Deserialize, Serialize};

use crate::network;


pub const PORT_ENV_VAR: &str = "PORT";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
    pub out_of_turn_policy: OutOfTurnPolicy,
    // FEN of the position every new session starts from. Classic chess start if missing.
    pub starting_fen: Option<String>,
    // How often the server pings an idle client.
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,
    // A client that sent nothing (not even a pong) for this long is considered gone.
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: network::DEFAULT_PORT,
            out_of_turn_policy: OutOfTurnPolicy::default(),
            starting_fen: None,
            ping_interval: Duration::from_secs(5),
            connection_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        let config: ServerConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.ping_interval.is_zero() {
            bail!("ping_interval must be positive");
        }
        if self.connection_timeout <= self.ping_interval {
            bail!(
                "connection_timeout ({:?}) must exceed ping_interval ({:?})",
                self.connection_timeout,
                self.ping_interval
            );
        }
        Ok(())
    }
}

// Port precedence: command line, then environment, then config file.
pub fn load_config(
    config_file: Option<&str>, port_env: Option<String>, port_arg: Option<u16>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match config_file {
        Some(filename) => {
            let contents = std::fs::read_to_string(filename)
                .with_context(|| format!("Cannot read config file '{filename}'"))?;
            ServerConfig::from_yaml(&contents)
                .with_context(|| format!("Cannot parse config file '{filename}'"))?
        }
        None => ServerConfig::default(),
    };
    if let Some(port) = port_env {
        config.port = port
            .trim()
            .parse()
            .with_context(|| format!("Invalid {PORT_ENV_VAR} environment variable: '{port}'"))?;
    }
    if let Some(port) = port_arg {
        config.port = port;
    }
    Ok(config)
}
