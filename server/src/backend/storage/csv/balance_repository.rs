use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use csv::{Reader, Writer};
use log::info;

use super::connection::CsvConnection;
use crate::backend::domain::models::{BalanceSnapshot, MonthKey};
use crate::backend::storage::traits::BalanceStorage;

/// All snapshots live in one CSV: `month,payment_source_id,balance,recorded_on`
#[derive(Clone)]
pub struct BalanceRepository {
    connection: CsvConnection,
}

impl BalanceRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_all(&self) -> Result<Vec<BalanceSnapshot>> {
        let path = self.connection.balances_file_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = Reader::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut snapshots = Vec::new();
        for record in reader.deserialize() {
            let snapshot: BalanceSnapshot =
                record.with_context(|| format!("malformed row in {}", path.display()))?;
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }

    fn write_all(&self, snapshots: &[BalanceSnapshot]) -> Result<()> {
        let mut writer = Writer::from_writer(Vec::new());
        for snapshot in snapshots {
            writer.serialize(snapshot)?;
        }
        let contents = writer
            .into_inner()
            .map_err(|e| anyhow!("failed to flush balance snapshots: {}", e))?;
        self.connection
            .write_atomically(&self.connection.balances_file_path(), &contents)
    }
}

#[async_trait]
impl BalanceStorage for BalanceRepository {
    async fn list_snapshots(&self, month: MonthKey) -> Result<Vec<BalanceSnapshot>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|s| s.month == month)
            .collect())
    }

    async fn upsert_snapshots(&self, snapshots: &[BalanceSnapshot]) -> Result<()> {
        let _guard = self.connection.lock_files().await;
        let mut all = self.read_all()?;
        for snapshot in snapshots {
            match all.iter_mut().find(|existing| {
                existing.month == snapshot.month
                    && existing.payment_source_id == snapshot.payment_source_id
            }) {
                Some(existing) => *existing = snapshot.clone(),
                None => all.push(snapshot.clone()),
            }
        }
        all.sort_by(|a, b| {
            a.month
                .cmp(&b.month)
                .then_with(|| a.payment_source_id.cmp(&b.payment_source_id))
        });
        self.write_all(&all)?;
        info!("Stored {} balance snapshots", snapshots.len());
        Ok(())
    }
}
