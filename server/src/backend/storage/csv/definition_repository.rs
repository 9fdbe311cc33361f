use anyhow::Result;
use async_trait::async_trait;
use log::info;

use super::connection::CsvConnection;
use crate::backend::domain::models::RecurringDefinition;
use crate::backend::storage::traits::DefinitionStorage;

#[derive(Clone)]
pub struct DefinitionRepository {
    connection: CsvConnection,
}

impl DefinitionRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_all(&self) -> Result<Vec<RecurringDefinition>> {
        self.connection
            .read_yaml_list(&self.connection.definitions_file_path())
    }
}

#[async_trait]
impl DefinitionStorage for DefinitionRepository {
    async fn list_definitions(&self) -> Result<Vec<RecurringDefinition>> {
        self.read_all()
    }

    async fn get_definition(&self, definition_id: &str) -> Result<Option<RecurringDefinition>> {
        Ok(self.read_all()?.into_iter().find(|d| d.id == definition_id))
    }

    async fn store_definition(&self, definition: &RecurringDefinition) -> Result<()> {
        let _guard = self.connection.lock_files().await;
        let mut definitions = self.read_all()?;
        match definitions.iter_mut().find(|d| d.id == definition.id) {
            Some(existing) => *existing = definition.clone(),
            None => definitions.push(definition.clone()),
        }
        self.connection
            .write_yaml(&self.connection.definitions_file_path(), &definitions)?;
        info!("Stored recurring definition {} ({})", definition.id, definition.name);
        Ok(())
    }
}
