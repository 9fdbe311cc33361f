//! Path parameters shared by the month-scoped endpoints.
//!
//! Segments are taken as strings and parsed here so a bad month or
//! collection name gets the same `ErrorResponse` body as any domain error.

use serde::Deserialize;
use shared::ObligationKind;

use crate::backend::domain::commands::reconciliation::{InstanceTarget, OccurrenceTarget};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::MonthKey;

pub fn parse_month(month: &str) -> Result<MonthKey, DomainError> {
    month.parse()
}

/// `bills` or `incomes`
pub fn parse_kind(segment: &str) -> Result<ObligationKind, DomainError> {
    ObligationKind::from_path_segment(segment)
        .ok_or_else(|| DomainError::UnknownKind(segment.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct MonthPath {
    pub month: String,
}

impl MonthPath {
    pub fn month(&self) -> Result<MonthKey, DomainError> {
        parse_month(&self.month)
    }
}

#[derive(Debug, Deserialize)]
pub struct KindPath {
    pub month: String,
    pub kind: String,
}

impl KindPath {
    pub fn parse(&self) -> Result<(MonthKey, ObligationKind), DomainError> {
        Ok((parse_month(&self.month)?, parse_kind(&self.kind)?))
    }
}

#[derive(Debug, Deserialize)]
pub struct InstancePath {
    pub month: String,
    pub kind: String,
    pub instance_id: String,
}

impl InstancePath {
    pub fn target(self) -> Result<InstanceTarget, DomainError> {
        Ok(InstanceTarget {
            month: parse_month(&self.month)?,
            kind: parse_kind(&self.kind)?,
            instance_id: self.instance_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OccurrencePath {
    pub month: String,
    pub kind: String,
    pub instance_id: String,
    pub occurrence_id: String,
}

impl OccurrencePath {
    pub fn target(self) -> Result<OccurrenceTarget, DomainError> {
        Ok(OccurrenceTarget {
            month: parse_month(&self.month)?,
            kind: parse_kind(&self.kind)?,
            instance_id: self.instance_id,
            occurrence_id: self.occurrence_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PayoffPath {
    pub month: String,
    pub instance_id: String,
}
