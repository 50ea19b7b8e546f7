//! Shared state handed to every command.

use tracing::debug;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        debug!(robot = cli.robot, config = ?cli.config, "configuration loaded");
        Ok(Self {
            config,
            robot_mode: cli.robot,
        })
    }
}
