//! Process-local store used when no database is configured.
//!
//! One [`InMemoryStore`] implements both the roster and the location store so
//! the relational rules hold without PostgreSQL: samples need an existing
//! owner, deleting a user cascades to their samples and clears
//! `created_by` back-references. Data lives only as long as the process.

mod store;

pub use store::InMemoryStore;
