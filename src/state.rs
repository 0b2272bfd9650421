use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shellkit::{Arguments, Outputs, ResourceState};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// State Structures
// ============================================================================

/// Persisted state of every resource shellres manages
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShellresState {
    /// Recorded resources, by name
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

/// One resource believed to exist
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Identifier derived from the create command
    pub id: String,

    /// Outputs from the last successful read
    #[serde(default)]
    pub output: Outputs,

    /// Arguments the resource was created with
    #[serde(default)]
    pub arguments: Arguments,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// When the resource was last read successfully
    #[serde(default)]
    pub last_read: Option<DateTime<Utc>>,
}

impl Default for ShellresState {
    fn default() -> Self {
        Self {
            resources: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl ResourceRecord {
    /// Record a freshly created resource
    pub fn created(state: &ResourceState, arguments: &Arguments) -> Self {
        let now = Utc::now();
        Self {
            id: state.id.clone(),
            output: state.output.clone(),
            arguments: arguments.clone(),
            created_at: now,
            last_read: Some(now),
        }
    }

    /// The lifecycle state this record describes
    pub fn resource_state(&self) -> ResourceState {
        ResourceState {
            id: self.id.clone(),
            output: self.output.clone(),
        }
    }

    /// Store the outputs of a successful read
    pub fn refreshed(&mut self, state: &ResourceState) {
        self.output = state.output.clone();
        self.last_read = Some(Utc::now());
    }
}

// ============================================================================
// ShellresState Implementation
// ============================================================================

impl ShellresState {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.save(path)
    }

    /// Get a recorded resource
    pub fn get(&self, name: &str) -> Option<&ResourceRecord> {
        self.resources.get(name)
    }

    /// Apply a lifecycle state to the record for `name`
    ///
    /// A state that no longer exists removes the record.
    pub fn update(&mut self, name: &str, state: &ResourceState, arguments: &Arguments) {
        if !state.exists() {
            self.forget(name);
            return;
        }

        match self.resources.get_mut(name) {
            Some(record) if record.id == state.id => record.refreshed(state),
            _ => {
                self.resources
                    .insert(name.to_string(), ResourceRecord::created(state, arguments));
            }
        }
    }

    /// Remove a resource from state, returning whether it was recorded
    pub fn forget(&mut self, name: &str) -> bool {
        self.resources.remove(name).is_some()
    }
}
