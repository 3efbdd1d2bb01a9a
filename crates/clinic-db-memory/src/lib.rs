//! In-memory record store for the clinic server.
//!
//! This crate provides an in-memory implementation of the `ClinicStorage`
//! trait from `clinic-storage`. It enforces the same uniqueness and
//! reference constraints as the relational schema, and registration writes
//! become visible only on commit.
//!
//! # Example
//!
//! ```ignore
//! use clinic_db_memory::InMemoryStorage;
//! use clinic_storage::ClinicStorage;
//!
//! let storage = InMemoryStorage::new();
//! let patients = storage.list_patients().await?;
//! ```

pub mod storage;
mod tables;
pub mod transaction;

pub use clinic_storage::{ClinicStorage, StorageError};
pub use storage::InMemoryStorage;
pub use transaction::InMemoryRegistration;

/// Creates a new shared in-memory store.
pub fn create_storage() -> clinic_storage::DynStorage {
    std::sync::Arc::new(InMemoryStorage::new())
}
