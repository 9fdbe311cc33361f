use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::instance::ObligationInstance;
use super::month::MonthKey;

/// Everything recorded for one month: the instances plus the idempotency
/// keys of mutations already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthLedger {
    pub month: MonthKey,
    #[serde(default)]
    pub instances: Vec<ObligationInstance>,
    /// request_id -> id of the entity the request produced
    #[serde(default)]
    pub processed_requests: BTreeMap<String, String>,
}

impl MonthLedger {
    pub fn new(month: MonthKey) -> Self {
        Self {
            month,
            instances: Vec::new(),
            processed_requests: BTreeMap::new(),
        }
    }

    pub fn instance(&self, instance_id: &str) -> Option<&ObligationInstance> {
        self.instances.iter().find(|i| i.id == instance_id)
    }

    pub fn instance_mut(&mut self, instance_id: &str) -> Option<&mut ObligationInstance> {
        self.instances.iter_mut().find(|i| i.id == instance_id)
    }

    pub fn instance_for_definition(&self, definition_id: &str) -> Option<&ObligationInstance> {
        self.instances
            .iter()
            .find(|i| i.definition_id.as_deref() == Some(definition_id))
    }

    pub fn payoff_instance_for(&self, payment_source_id: &str) -> Option<&ObligationInstance> {
        self.instances
            .iter()
            .find(|i| i.is_payoff_bill && i.payment_source_id == payment_source_id)
    }

    /// Result id of a request that was already applied
    pub fn replayed(&self, request_id: Option<&str>) -> Option<String> {
        request_id.and_then(|key| self.processed_requests.get(key).cloned())
    }

    pub fn remember_request(&mut self, request_id: Option<&str>, produced_id: &str) {
        if let Some(key) = request_id {
            self.processed_requests
                .insert(key.to_string(), produced_id.to_string());
        }
    }
}
