//! Ward occupancy managers.
//!
//! - [`Lifecycle`]: the admission/discharge state machine, keeping the
//!   patient↔bed link consistent
//! - [`LabSync`]: reconciliation between a bed's embedded lab snapshot and
//!   the permanent per-patient record

mod lifecycle;
mod sync;

pub use lifecycle::{AdmissionIntake, Lifecycle};
pub use sync::{LabSync, SyncReport};

use thiserror::Error;

use crate::db::DbError;

/// Ward operation errors. Validation variants are raised before any write.
#[derive(Error, Debug)]
pub enum WardError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Bed {0} not found")]
    BedNotFound(i64),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Bed {0} is already occupied")]
    BedOccupied(i64),

    #[error("Bed {0} has no occupant")]
    BedNotOccupied(i64),

    #[error("Patient {patient} already occupies bed {bed}")]
    PatientAlreadyAdmitted { patient: String, bed: i64 },

    #[error("Sync incomplete, {} metric(s) failed: {}", .failed.len(), .failed.join("; "))]
    SyncIncomplete { failed: Vec<String> },
}

pub type WardResult<T> = Result<T, WardError>;
