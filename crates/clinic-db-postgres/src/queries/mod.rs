//! SQL query modules for the PostgreSQL backend.
//!
//! Each module holds the statements for one group of tables. Rows are read
//! as tuples and converted into the record types of `clinic-storage`.

pub mod accounts;
pub mod appointments;
pub mod billing;
pub mod clinical;
pub mod profiles;
pub mod reports;

use clinic_storage::{AppointmentStatus, StorageError, StorageResult};

/// Parses a status column. The check constraint keeps the column closed, so
/// a failure here means the schema and the code disagree.
pub(crate) fn parse_status(value: &str) -> StorageResult<AppointmentStatus> {
    value
        .parse()
        .map_err(|_| StorageError::database(format!("Unexpected appointment status '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_column_parsing() {
        assert_eq!(parse_status("No-Show").unwrap(), AppointmentStatus::NoShow);
        assert!(parse_status("Lost").unwrap_err().is_internal());
    }
}
