use anyhow::{Context, Result};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, OwnedMutexGuard};

use super::balance_repository::BalanceRepository;
use super::definition_repository::DefinitionRepository;
use super::month_repository::MonthRepository;
use super::payment_source_repository::PaymentSourceRepository;
use crate::backend::domain::models::MonthKey;
use crate::backend::storage::traits::Connection;

const MONTHS_DIRECTORY: &str = "months";
const BALANCES_FILE: &str = "bank_balances.csv";
const PAYMENT_SOURCES_FILE: &str = "payment_sources.yaml";
const DEFINITIONS_FILE: &str = "definitions.yaml";

/// CsvConnection owns the data directory layout and the locks guarding it:
///
/// ```text
/// months/<YYYY-MM>.yaml
/// bank_balances.csv
/// payment_sources.yaml
/// definitions.yaml
/// ```
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: Arc<PathBuf>,
    month_locks: Arc<Mutex<HashMap<MonthKey, Arc<AsyncMutex<()>>>>>,
    source_locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
    /// Guards read-modify-write of the shared (non-month) files
    file_lock: Arc<AsyncMutex<()>>,
}

impl CsvConnection {
    /// Create a connection rooted at `base_directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        let months_path = base_path.join(MONTHS_DIRECTORY);
        if !months_path.exists() {
            fs::create_dir_all(&months_path).with_context(|| {
                format!("failed to create data directory {}", months_path.display())
            })?;
            info!("Created data directory at {}", base_path.display());
        }

        Ok(Self {
            base_directory: Arc::new(base_path),
            month_locks: Arc::new(Mutex::new(HashMap::new())),
            source_locks: Arc::new(Mutex::new(HashMap::new())),
            file_lock: Arc::new(AsyncMutex::new(())),
        })
    }

    pub fn base_directory(&self) -> &Path {
        self.base_directory.as_path()
    }

    pub fn month_file_path(&self, month: MonthKey) -> PathBuf {
        self.base_directory
            .join(MONTHS_DIRECTORY)
            .join(format!("{}.yaml", month))
    }

    pub fn balances_file_path(&self) -> PathBuf {
        self.base_directory.join(BALANCES_FILE)
    }

    pub fn payment_sources_file_path(&self) -> PathBuf {
        self.base_directory.join(PAYMENT_SOURCES_FILE)
    }

    pub fn definitions_file_path(&self) -> PathBuf {
        self.base_directory.join(DEFINITIONS_FILE)
    }

    /// Exclusive lock for one month, shared by every clone of this connection
    pub async fn lock_month(&self, month: MonthKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .month_locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(month).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Exclusive lock for one payment source's balance
    pub async fn lock_payment_source(&self, source_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .source_locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(source_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub async fn lock_files(&self) -> MutexGuard<'_, ()> {
        self.file_lock.lock().await
    }

    /// Write through a temp file and rename it over the target
    pub fn write_atomically(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents)
            .with_context(|| format!("failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .with_context(|| format!("failed to move {} into place", path.display()))?;
        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }

    /// Read a YAML list, empty when the file does not exist yet
    pub fn read_yaml_list<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_yaml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn write_yaml<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let contents = serde_yaml::to_string(value)?;
        self.write_atomically(path, contents.as_bytes())
    }
}

impl Connection for CsvConnection {
    type MonthRepository = MonthRepository;
    type BalanceRepository = BalanceRepository;
    type PaymentSourceRepository = PaymentSourceRepository;
    type DefinitionRepository = DefinitionRepository;

    fn create_month_repository(&self) -> Self::MonthRepository {
        MonthRepository::new(self.clone())
    }

    fn create_balance_repository(&self) -> Self::BalanceRepository {
        BalanceRepository::new(self.clone())
    }

    fn create_payment_source_repository(&self) -> Self::PaymentSourceRepository {
        PaymentSourceRepository::new(self.clone())
    }

    fn create_definition_repository(&self) -> Self::DefinitionRepository {
        DefinitionRepository::new(self.clone())
    }
}
