use async_trait::async_trait;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::GroceryStore;
use crate::config::{BackendKind, GroceryConfig};
use crate::error::ForkError;

/// Where a grocery list lives between calls
#[async_trait]
pub trait GroceryBackend: Send + Sync {
    /// Get the backend name (e.g., "memory", "file")
    fn backend_name(&self) -> &str;

    /// Load the stored list; an absent list is an empty store
    async fn load(&self) -> Result<GroceryStore, ForkError>;

    /// Replace the stored list
    async fn save(&self, store: &GroceryStore) -> Result<(), ForkError>;
}

/// Keeps the list for the lifetime of the process.
#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<GroceryStore>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: GroceryStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

#[async_trait]
impl GroceryBackend for MemoryBackend {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> Result<GroceryStore, ForkError> {
        Ok(self.store.lock().await.clone())
    }

    async fn save(&self, store: &GroceryStore) -> Result<(), ForkError> {
        *self.store.lock().await = store.clone();
        Ok(())
    }
}

/// Stores the list as pretty-printed JSON in a single file.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl GroceryBackend for JsonFileBackend {
    fn backend_name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<GroceryStore, ForkError> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!("No grocery list at {}", self.path.display());
            return Ok(GroceryStore::default());
        }

        let raw = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str(&raw) {
            Ok(store) => Ok(store),
            Err(e) => {
                error!(
                    "Failed to load grocery list from {}: {}",
                    self.path.display(),
                    e
                );
                Ok(GroceryStore::default())
            }
        }
    }

    async fn save(&self, store: &GroceryStore) -> Result<(), ForkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(store)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Saved grocery list to {}", self.path.display());
        Ok(())
    }
}

pub struct BackendFactory;

impl BackendFactory {
    /// Create a backend instance from configuration
    pub fn create(config: &GroceryConfig) -> Box<dyn GroceryBackend> {
        let backend: Box<dyn GroceryBackend> = match config.backend {
            BackendKind::Memory => Box::new(MemoryBackend::new()),
            BackendKind::File => Box::new(JsonFileBackend::new(&config.path)),
        };
        info!("Using '{}' grocery backend", backend.backend_name());
        backend
    }
}

/// Runs store operations against a backend: load, apply, save.
pub struct GroceryService {
    backend: Box<dyn GroceryBackend>,
}

impl GroceryService {
    pub fn new(backend: Box<dyn GroceryBackend>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &GroceryConfig) -> Self {
        Self::new(BackendFactory::create(config))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    pub async fn load(&self) -> Result<GroceryStore, ForkError> {
        self.backend.load().await
    }

    /// Apply `op` to the stored list, persist it and return the new state.
    pub async fn update<F>(&self, op: F) -> Result<GroceryStore, ForkError>
    where
        F: FnOnce(&mut GroceryStore) + Send,
    {
        let mut store = self.backend.load().await?;
        op(&mut store);
        self.backend.save(&store).await?;
        Ok(store)
    }
}
