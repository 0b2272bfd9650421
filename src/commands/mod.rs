// Single-resource lifecycle commands
pub mod lifecycle;

// Whole-config convergence
pub mod apply;

// Inspection
pub mod status;
pub mod validate;

use anyhow::Result;
use shellkit::Client;
use std::path::PathBuf;

use crate::Context;
use crate::config::ShellresConfig;
use crate::paths;
use crate::state::ShellresState;

/// Config, client and state loaded for one command invocation
pub struct Session {
    pub config: ShellresConfig,
    pub client: Client,
    pub state: ShellresState,
    pub state_path: PathBuf,
}

impl Session {
    /// Load config and state, and build a client for the provider commands
    pub fn open(ctx: &Context) -> Result<Self> {
        let config_path = paths::config_file(ctx.config.as_deref())?;
        let config = ShellresConfig::load(&config_path)?;
        let client = Client::new(config.resource_config())?;

        let state_path = paths::state_file(ctx.state.as_deref())?;
        let state = ShellresState::load(&state_path)?;

        Ok(Self {
            config,
            client,
            state,
            state_path,
        })
    }

    /// Persist state
    pub fn save(&mut self) -> Result<()> {
        self.state.touch(&self.state_path)
    }
}
