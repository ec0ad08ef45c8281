//! Implementations of the workflow's storage collaborators.

pub mod memory;
pub mod postgres;

pub use memory::{MemorySubjectDirectory, MemoryTokenStore};
pub use postgres::{PgSubjectDirectory, PgTokenStore};
