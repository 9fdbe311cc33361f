use anyhow::Result;
use async_trait::async_trait;
use log::info;
use tokio::sync::OwnedMutexGuard;

use super::connection::CsvConnection;
use crate::backend::domain::models::PaymentSource;
use crate::backend::storage::traits::PaymentSourceStorage;

#[derive(Clone)]
pub struct PaymentSourceRepository {
    connection: CsvConnection,
}

impl PaymentSourceRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_all(&self) -> Result<Vec<PaymentSource>> {
        self.connection
            .read_yaml_list(&self.connection.payment_sources_file_path())
    }
}

#[async_trait]
impl PaymentSourceStorage for PaymentSourceRepository {
    async fn list_payment_sources(&self) -> Result<Vec<PaymentSource>> {
        self.read_all()
    }

    async fn get_payment_source(&self, source_id: &str) -> Result<Option<PaymentSource>> {
        Ok(self.read_all()?.into_iter().find(|s| s.id == source_id))
    }

    async fn store_payment_source(&self, source: &PaymentSource) -> Result<()> {
        let _guard = self.connection.lock_files().await;
        let mut sources = self.read_all()?;
        match sources.iter_mut().find(|s| s.id == source.id) {
            Some(existing) => *existing = source.clone(),
            None => sources.push(source.clone()),
        }
        self.connection
            .write_yaml(&self.connection.payment_sources_file_path(), &sources)?;
        info!("Stored payment source {} (balance {})", source.id, source.balance);
        Ok(())
    }

    async fn lock_source(&self, source_id: &str) -> OwnedMutexGuard<()> {
        self.connection.lock_payment_source(source_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PaymentSourceKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_and_update() {
        let temp_dir = TempDir::new().unwrap();
        let repository = PaymentSourceRepository::new(CsvConnection::new(temp_dir.path()).unwrap());
        let mut visa = PaymentSource {
            id: "visa".to_string(),
            name: "Visa".to_string(),
            kind: PaymentSourceKind::CreditCard,
            balance: -500_00,
            track_payoff: true,
            payoff_due_day: Some(20),
        };

        repository.store_payment_source(&visa).await.unwrap();
        visa.balance = -400_00;
        repository.store_payment_source(&visa).await.unwrap();

        let sources = repository.list_payment_sources().await.unwrap();
        assert_eq!(sources, vec![visa]);
        assert!(repository.get_payment_source("amex").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hand_written_yaml_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("payment_sources.yaml"),
            "- id: checking\n  name: Checking\n  kind: bank_account\n",
        )
        .unwrap();
        let repository = PaymentSourceRepository::new(CsvConnection::new(temp_dir.path()).unwrap());

        let checking = repository.get_payment_source("checking").await.unwrap().unwrap();
        assert_eq!(checking.balance, 0);
        assert!(!checking.track_payoff);
        assert_eq!(checking.payoff_due_day, None);
    }
}
