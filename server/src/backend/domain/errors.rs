//! Error taxonomy for the reconciliation domain.
//!
//! Every failure carries enough context for the caller to render a specific
//! message. `kind()` groups variants into the classes the REST layer maps to
//! status codes.

use chrono::NaiveDate;
use shared::ObligationKind;
use thiserror::Error;

use crate::backend::domain::models::MonthKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StateConflict,
    NotFound,
    NotDeletable,
    NotEditable,
    MissingDependency,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::StateConflict => "state_conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotDeletable => "not_deletable",
            ErrorKind::NotEditable => "not_editable",
            ErrorKind::MissingDependency => "missing_dependency",
            ErrorKind::Storage => "storage_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: i64, reason: String },

    #[error("invalid date {date}: {reason}")]
    InvalidDate { date: NaiveDate, reason: String },

    #[error("date {date} is outside month {month}")]
    OutOfMonth { date: NaiveDate, month: MonthKey },

    #[error("day of month must be between 1 and 31, got {0}")]
    InvalidDayOfMonth(u32),

    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("run rate must not be negative, got {0}")]
    InvalidRunRate(i64),

    #[error("name must not be empty")]
    EmptyName,

    #[error("occurrence {0} is already closed")]
    AlreadyClosed(String),

    #[error("occurrence {0} is not closed")]
    NotClosed(String),

    #[error("occurrence {0} is closed, reopen it before editing")]
    OccurrenceClosed(String),

    #[error("instance {0} already has a recurring definition")]
    AlreadyRecurring(String),

    #[error("occurrence {0} not found")]
    OccurrenceNotFound(String),

    #[error("instance {0} not found")]
    InstanceNotFound(String),

    #[error("payment source {0} not found")]
    PaymentSourceNotFound(String),

    #[error("unknown obligation collection '{0}', expected bills or incomes")]
    UnknownKind(String),

    #[error("instance {id} is not a {expected}")]
    KindMismatch { id: String, expected: ObligationKind },

    #[error("{0}")]
    NotDeletable(String),

    #[error("{0}")]
    NotEditable(String),

    #[error("missing balance snapshots for: {}", .0.join(", "))]
    MissingBalances(Vec<String>),

    #[error("payment {payment_id} was recorded but the occurrence could not be closed: {source}")]
    PayFullIncomplete {
        payment_id: String,
        #[source]
        source: Box<DomainError>,
    },

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidAmount { .. }
            | DomainError::InvalidDate { .. }
            | DomainError::OutOfMonth { .. }
            | DomainError::InvalidDayOfMonth(_)
            | DomainError::InvalidMonth(_)
            | DomainError::InvalidRunRate(_)
            | DomainError::EmptyName => ErrorKind::Validation,
            DomainError::AlreadyClosed(_)
            | DomainError::NotClosed(_)
            | DomainError::OccurrenceClosed(_)
            | DomainError::AlreadyRecurring(_) => ErrorKind::StateConflict,
            DomainError::OccurrenceNotFound(_)
            | DomainError::InstanceNotFound(_)
            | DomainError::PaymentSourceNotFound(_)
            | DomainError::UnknownKind(_)
            | DomainError::KindMismatch { .. } => ErrorKind::NotFound,
            DomainError::NotDeletable(_) => ErrorKind::NotDeletable,
            DomainError::NotEditable(_) => ErrorKind::NotEditable,
            DomainError::MissingBalances(_) => ErrorKind::MissingDependency,
            DomainError::PayFullIncomplete { source, .. } => source.kind(),
            DomainError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn invalid_amount(amount: i64, reason: impl Into<String>) -> Self {
        DomainError::InvalidAmount {
            amount,
            reason: reason.into(),
        }
    }
}
