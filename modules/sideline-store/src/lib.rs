//! Document store for accounts, content, challenges, votes and reactions.
//!
//! Every counter lives inside a `CountedSet`, and the only way to change one
//! is a `SetMutation` applied by the store as part of an atomic update.
//! Uniqueness of votes and reactions is enforced here, not by callers.

pub mod error;
pub mod memory;
pub mod mutation;
pub mod postgres;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use mutation::{Applied, AtomicUpdate, DocKey, Document, SetField, SetMutation, SetOp};
pub use postgres::PgDocumentStore;
pub use store::DocumentStore;
