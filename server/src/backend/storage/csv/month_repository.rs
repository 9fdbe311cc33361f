use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::fs;
use tokio::sync::OwnedMutexGuard;

use super::connection::CsvConnection;
use crate::backend::domain::models::{MonthKey, MonthLedger};
use crate::backend::storage::traits::MonthStorage;

/// One YAML document per month
#[derive(Clone)]
pub struct MonthRepository {
    connection: CsvConnection,
}

impl MonthRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl MonthStorage for MonthRepository {
    async fn load_month(&self, month: MonthKey) -> Result<Option<MonthLedger>> {
        let path = self.connection.month_file_path(month);
        if !path.exists() {
            debug!("No ledger stored for {}", month);
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let ledger: MonthLedger = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse ledger {}", path.display()))?;
        debug!("Loaded {} with {} instances", month, ledger.instances.len());
        Ok(Some(ledger))
    }

    async fn store_month(&self, ledger: &MonthLedger) -> Result<()> {
        let path = self.connection.month_file_path(ledger.month);
        self.connection.write_yaml(&path, ledger)
    }

    async fn lock_month(&self, month: MonthKey) -> OwnedMutexGuard<()> {
        self.connection.lock_month(month).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::{ObligationInstance, Occurrence};
    use chrono::NaiveDate;
    use shared::{BillingPeriod, ObligationKind};
    use tempfile::TempDir;

    fn setup() -> (MonthRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        (MonthRepository::new(connection), temp_dir)
    }

    #[tokio::test]
    async fn test_missing_month_loads_as_none() {
        let (repository, _temp_dir) = setup();
        let loaded = repository.load_month(MonthKey::new(2025, 6).unwrap()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let (repository, _temp_dir) = setup();
        let month = MonthKey::new(2025, 6).unwrap();
        let mut ledger = MonthLedger::new(month);
        let mut occurrence =
            Occurrence::scheduled(1, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(), 75_00);
        occurrence.notes = Some("autopay".to_string());
        ledger.instances.push(ObligationInstance {
            id: "instance::internet".to_string(),
            definition_id: Some("definition::internet".to_string()),
            name: "Internet".to_string(),
            kind: ObligationKind::Bill,
            category_id: "utilities".to_string(),
            payment_source_id: "checking".to_string(),
            is_adhoc: false,
            is_payoff_bill: false,
            billing_period: BillingPeriod::Monthly,
            occurrences: vec![occurrence],
        });
        ledger.remember_request(Some("req-1"), "instance::internet");

        repository.store_month(&ledger).await.unwrap();
        let loaded = repository.load_month(month).await.unwrap().unwrap();
        assert_eq!(loaded, ledger);
    }

    #[tokio::test]
    async fn test_corrupt_month_is_an_error() {
        let (repository, temp_dir) = setup();
        let month = MonthKey::new(2025, 6).unwrap();
        fs::write(temp_dir.path().join("months").join("2025-06.yaml"), "instances: [").unwrap();
        assert!(repository.load_month(month).await.is_err());
    }
}
