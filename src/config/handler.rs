//! Configuration handlers: merge remote documents into the local configuration.

use super::remote::RemoteConfiguration;
use super::schema::AgentConfiguration;
use super::traits::{AgentConfigurationHandler, KeyValueStorage};
use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Storage key of the last accepted remote configuration document.
pub const REMOTE_CONFIGURATION_KEY: &str = "remote-configuration";

/// Handler backed by the built-in remote document.
pub struct DefaultConfigurationHandler {
    configuration: AgentConfiguration,
    data: Vec<u8>,
}

impl DefaultConfigurationHandler {
    pub fn new(configuration: AgentConfiguration) -> Result<Self> {
        let remote = RemoteConfiguration::default_document();
        let data = remote.encode()?;
        let mut configuration = configuration;
        configuration.merge_remote(&remote);
        Ok(Self {
            configuration,
            data,
        })
    }
}

impl AgentConfigurationHandler for DefaultConfigurationHandler {
    fn configuration(&self) -> AgentConfiguration {
        self.configuration.clone()
    }

    fn configuration_data(&self) -> Option<Vec<u8>> {
        Some(self.data.clone())
    }
}

/// Handler that persists the last accepted remote document and re-applies it
/// on start.
pub struct StoredConfigurationHandler<S: KeyValueStorage> {
    base: AgentConfiguration,
    state: RwLock<AppliedState>,
    // Serializes writers so storage and memory hold the same document.
    writer: Mutex<()>,
    storage: S,
}

struct AppliedState {
    configuration: AgentConfiguration,
    data: Option<Vec<u8>>,
}

impl<S: KeyValueStorage> StoredConfigurationHandler<S> {
    pub fn new(configuration: AgentConfiguration, storage: S) -> Self {
        let handler = Self {
            base: configuration.clone(),
            state: RwLock::new(AppliedState {
                configuration,
                data: None,
            }),
            writer: Mutex::new(()),
            storage,
        };

        match handler.storage.get(REMOTE_CONFIGURATION_KEY) {
            Ok(Some(data)) => match handler.merge(&data) {
                Ok(merged) => handler.commit(merged, data),
                Err(error) => tracing::info!(%error, "Stored remote configuration ignored"),
            },
            Ok(None) => {
                tracing::info!("Missing configuration data, aborting setting up configuration.");
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to read stored remote configuration");
            }
        }

        handler
    }

    /// Accept a new remote document: decode, merge and persist it.
    ///
    /// The in-memory configuration changes only once the document is stored.
    /// Undecodable data or a failed store leaves both untouched.
    pub fn update(&self, data: &[u8]) -> Result<()> {
        let merged = self.merge(data)?;

        let _writer = self.writer.lock();
        self.storage
            .set(REMOTE_CONFIGURATION_KEY, data)
            .context("Failed to store remote configuration")?;
        self.commit(merged, data.to_vec());
        tracing::info!(bytes = data.len(), "Remote configuration stored");
        Ok(())
    }

    /// Drop the stored document and fall back to the local configuration.
    pub fn reset(&self) -> Result<()> {
        let _writer = self.writer.lock();
        self.storage.remove(REMOTE_CONFIGURATION_KEY)?;
        let mut state = self.state.write();
        state.configuration = self.base.clone();
        state.data = None;
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn merge(&self, data: &[u8]) -> Result<AgentConfiguration> {
        if data.is_empty() {
            anyhow::bail!("Remote configuration data is empty");
        }
        let remote = RemoteConfiguration::decode(data)?;

        let mut merged = self.base.clone();
        merged.merge_remote(&remote);
        Ok(merged)
    }

    fn commit(&self, configuration: AgentConfiguration, data: Vec<u8>) {
        let mut state = self.state.write();
        state.configuration = configuration;
        state.data = Some(data);
    }
}

impl<S: KeyValueStorage> AgentConfigurationHandler for StoredConfigurationHandler<S> {
    fn configuration(&self) -> AgentConfiguration {
        self.state.read().configuration.clone()
    }

    fn configuration_data(&self) -> Option<Vec<u8>> {
        self.state.read().data.clone()
    }
}

// ── Storages ─────────────────────────────────────────────────────

/// Process-local storage.
#[derive(Default)]
pub struct InMemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One file per key under a directory.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            anyhow::bail!("Invalid storage key: {key:?}");
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.entry_path(key)?;
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))?;

        let temp_path = self
            .root
            .join(format!(".{key}.json.tmp-{}", uuid::Uuid::new_v4()));
        let written = std::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .and_then(|mut file| {
                file.write_all(value)?;
                file.sync_all()
            });
        if let Err(e) = written {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to write {}", temp_path.display()));
        }

        if let Err(e) = std::fs::rename(&temp_path, &path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }

        #[cfg(unix)]
        {
            std::fs::File::open(&self.root)
                .and_then(|dir| dir.sync_all())
                .with_context(|| format!("Failed to fsync {}", self.root.display()))?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}
